//! History stores.
//!
//! Records are keyed by match id. Writing a record for an id that already
//! exists replaces the match data but keeps the user's `starred` and
//! `visibility` choices and the original `created_at`.
//!
//! Persistence is best-effort from the controller's point of view: store
//! errors are returned here, and the controller logs and swallows them.

use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::record::{SavedMatch, Visibility};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no saved match with id {0}")]
    NotFound(Uuid),

    #[error("history lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Durable storage for saved matches.
pub trait HistoryStore: Send + Sync {
    /// Insert or replace a record by id.
    fn put(&self, record: SavedMatch) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<SavedMatch>>;

    /// All records, newest first; ties are ordered by id.
    fn list(&self) -> Result<Vec<SavedMatch>>;

    /// Flip `starred`; returns the new value.
    fn toggle_star(&self, id: Uuid) -> Result<bool>;

    fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<()>;

    /// Remove a record; returns whether it existed.
    fn delete(&self, id: Uuid) -> Result<bool>;
}

/// In-memory record collection shared by the store implementations.
#[derive(Clone, Debug, Default)]
struct HistoryBook {
    records: FxHashMap<Uuid, SavedMatch>,
}

impl HistoryBook {
    fn from_records(records: Vec<SavedMatch>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    fn put(&mut self, mut record: SavedMatch) {
        if let Some(existing) = self.records.get(&record.id) {
            // A late in-progress snapshot never replaces the terminal record.
            if existing.outcome.is_final() && !record.outcome.is_final() {
                debug!(id = %record.id, "ignoring stale snapshot of a finished match");
                return;
            }
            record.starred = existing.starred;
            record.visibility = existing.visibility;
            record.created_at = existing.created_at;
        }
        self.records.insert(record.id, record);
    }

    fn list(&self) -> Vec<SavedMatch> {
        let mut all: Vec<_> = self.records.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut SavedMatch> {
        self.records.get_mut(&id).ok_or(HistoryError::NotFound(id))
    }
}

/// Volatile store, mainly for tests and single-session hosts.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    book: RwLock<HistoryBook>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn put(&self, record: SavedMatch) -> Result<()> {
        self.book.write().map_err(|_| HistoryError::Poisoned)?.put(record);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<SavedMatch>> {
        let book = self.book.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(book.records.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<SavedMatch>> {
        Ok(self.book.read().map_err(|_| HistoryError::Poisoned)?.list())
    }

    fn toggle_star(&self, id: Uuid) -> Result<bool> {
        let mut book = self.book.write().map_err(|_| HistoryError::Poisoned)?;
        let record = book.get_mut(id)?;
        record.starred = !record.starred;
        Ok(record.starred)
    }

    fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<()> {
        let mut book = self.book.write().map_err(|_| HistoryError::Poisoned)?;
        book.get_mut(id)?.visibility = visibility;
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut book = self.book.write().map_err(|_| HistoryError::Poisoned)?;
        Ok(book.records.remove(&id).is_some())
    }
}

/// Store backed by a single JSON document holding every record.
///
/// The whole file is rewritten after each mutation, via a sibling temp
/// file and a rename.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    book: RwLock<HistoryBook>,
}

impl JsonFileHistory {
    /// Open a store, loading existing records if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records: Vec<SavedMatch> = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Vec::new()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = records.len(), "history loaded");

        Ok(Self {
            path,
            book: RwLock::new(HistoryBook::from_records(records)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, book: &HistoryBook) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&book.list())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `f` to a copy of the records and keep it only once it is on disk.
    fn mutate<T>(&self, f: impl FnOnce(&mut HistoryBook) -> Result<T>) -> Result<T> {
        let mut book = self.book.write().map_err(|_| HistoryError::Poisoned)?;
        let mut next = book.clone();
        let out = f(&mut next)?;
        self.flush(&next)?;
        *book = next;
        Ok(out)
    }
}

impl HistoryStore for JsonFileHistory {
    fn put(&self, record: SavedMatch) -> Result<()> {
        self.mutate(|book| {
            book.put(record);
            Ok(())
        })
    }

    fn get(&self, id: Uuid) -> Result<Option<SavedMatch>> {
        let book = self.book.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(book.records.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<SavedMatch>> {
        Ok(self.book.read().map_err(|_| HistoryError::Poisoned)?.list())
    }

    fn toggle_star(&self, id: Uuid) -> Result<bool> {
        self.mutate(|book| {
            let record = book.get_mut(id)?;
            record.starred = !record.starred;
            Ok(record.starred)
        })
    }

    fn set_visibility(&self, id: Uuid, visibility: Visibility) -> Result<()> {
        self.mutate(|book| {
            book.get_mut(id)?.visibility = visibility;
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        self.mutate(|book| Ok(book.records.remove(&id).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseDefinition, CaseText, ClaimPoint};
    use crate::core::{MatchState, Outcome};
    use chrono::Duration;

    fn record() -> SavedMatch {
        let text = CaseText {
            title: "The People v. The Toaster".into(),
            charge: "Burning the bagel".into(),
            context: "Breakfast went wrong.".into(),
            central_tension: "Can an appliance intend harm?".into(),
            opening_statement: "The bagel speaks for itself.".into(),
        };
        let case = CaseDefinition::new(
            text,
            vec![ClaimPoint::new("A1", "It was set to 7", "dial")],
            vec![ClaimPoint::new("D1", "The dial is broken", "receipt")],
        )
        .unwrap();
        let mut state = MatchState::new(100);
        state.case = Some(case);
        state.outcome = Some(Outcome::Won);
        SavedMatch::from_state(&state).unwrap()
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("history-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn test_put_preserves_user_flags() {
        let store = MemoryHistory::new();
        let rec = record();
        let id = rec.id;
        store.put(rec.clone()).unwrap();

        assert!(store.toggle_star(id).unwrap());
        store.set_visibility(id, Visibility::Private).unwrap();

        let mut updated = rec;
        updated.exchange_count = 9;
        store.put(updated).unwrap();

        let got = store.get(id).unwrap().unwrap();
        assert_eq!(got.exchange_count, 9);
        assert!(got.starred);
        assert_eq!(got.visibility, Visibility::Private);
    }

    #[test]
    fn test_final_record_not_downgraded() {
        let store = MemoryHistory::new();
        let rec = record();
        let id = rec.id;
        store.put(rec.clone()).unwrap();

        let mut stale = rec;
        stale.outcome = crate::history::RecordOutcome::InProgress;
        store.put(stale).unwrap();

        assert!(store.get(id).unwrap().unwrap().outcome.is_final());
    }

    #[test]
    fn test_list_newest_first() {
        let store = MemoryHistory::new();
        let mut old = record();
        old.created_at -= Duration::hours(1);
        let new = record();
        store.put(old.clone()).unwrap();
        store.put(new.clone()).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[test]
    fn test_list_ties_ordered_by_id() {
        let store = MemoryHistory::new();
        let first = record();
        let mut recs: Vec<SavedMatch> = (0..5)
            .map(|_| {
                let mut r = record();
                r.created_at = first.created_at;
                r
            })
            .collect();
        for r in &recs {
            store.put(r.clone()).unwrap();
        }

        recs.sort_by_key(|r| r.id);
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, recs.iter().map(|r| r.id).collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_record() {
        let store = MemoryHistory::new();
        let id = Uuid::new_v4();

        assert!(store.get(id).unwrap().is_none());
        assert!(matches!(store.toggle_star(id), Err(HistoryError::NotFound(_))));
        assert!(!store.delete(id).unwrap());
    }

    #[test]
    fn test_json_file_reload() {
        let path = temp_path();
        let rec = record();
        let id = rec.id;
        {
            let store = JsonFileHistory::open(&path).unwrap();
            store.put(rec).unwrap();
            store.toggle_star(id).unwrap();
        }

        let store = JsonFileHistory::open(&path).unwrap();
        let got = store.get(id).unwrap().unwrap();
        assert!(got.starred);
        assert_eq!(got.outcome, crate::history::RecordOutcome::Won);

        assert!(store.delete(id).unwrap());
        let reopened = JsonFileHistory::open(&path).unwrap();
        assert!(reopened.list().unwrap().is_empty());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_json_file_failed_write_not_kept() {
        // A regular file where a directory should be makes every flush fail.
        let blocker = temp_path();
        fs::write(&blocker, "not a directory").unwrap();
        let store = JsonFileHistory::open(blocker.join("sub").join("history.json")).unwrap();

        let rec = record();
        let id = rec.id;
        assert!(store.put(rec).is_err());
        assert!(store.get(id).unwrap().is_none());
        assert!(store.list().unwrap().is_empty());

        fs::remove_file(&blocker).ok();
    }

    #[test]
    fn test_json_file_missing_or_empty() {
        let path = temp_path();
        assert!(JsonFileHistory::open(&path).unwrap().list().unwrap().is_empty());

        fs::write(&path, "  \n").unwrap();
        assert!(JsonFileHistory::open(&path).unwrap().list().unwrap().is_empty());
        fs::remove_file(&path).ok();
    }
}
