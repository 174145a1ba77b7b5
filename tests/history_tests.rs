//! History tests.
//!
//! Terminal records, scoring, JSON persistence, and resuming a match
//! from a saved record.

mod common;

use std::sync::Arc;

use common::{chat_controller, counsel, Fixture};
use courtroom_engine::{
    match_score, HistoryStore, JsonFileHistory, MatchConfig, MatchController, MemoryHistory,
    Outcome, Phase, RecordOutcome, SavedMatch, Visibility,
};
use uuid::Uuid;

fn temp_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("courtroom-history-{}.json", Uuid::new_v4()))
}

/// Play a short match that the defendant loses on exchange three.
async fn lost_match(controller: &MatchController, fixture: &Fixture) -> SavedMatch {
    fixture.counsel.push(Ok(counsel(10.0, 10.0)));
    fixture.counsel.push(Ok(counsel(10.0, 10.0)));
    fixture.counsel.push(Ok(counsel(5.0, 25.0)));

    controller.submit_message(&fixture.agents, "Objection!").await.unwrap();
    controller.submit_message(&fixture.agents, "Exhibit D1.").await.unwrap();
    let report = controller.submit_message(&fixture.agents, "Oh no.").await.unwrap();
    assert_eq!(report.outcome, Outcome::Lost);
    report.saved.unwrap()
}

#[test]
fn test_score_example() {
    assert_eq!(match_score(100, 40, 10, RecordOutcome::Won), 140);
    assert_eq!(match_score(100, 100, 0, RecordOutcome::Lost), 0);
}

/// Exporting and reloading keeps messages, health, and the case.
#[tokio::test]
async fn test_round_trip() {
    let fixture = Fixture::new();
    let controller = chat_controller(MatchConfig::default().with_max_hp(40), &fixture).await;
    let saved = lost_match(&controller, &fixture).await;
    let state = controller.state();

    let json = serde_json::to_string(&saved).unwrap();
    let loaded: SavedMatch = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, saved);

    let restored = loaded.to_state();
    assert_eq!(restored.messages, state.messages);
    assert_eq!(restored.health, state.health);
    assert_eq!(restored.case, state.case);
    assert_eq!(restored.defense_points, state.defense_points);
    assert!(!restored.evidence.is_available("D1"));
    assert_eq!(restored.phase, Phase::Ended);
    assert_eq!(restored.outcome, Some(Outcome::Lost));

    // 35 damage dealt, 3 exchanges, no win bonus.
    assert_eq!(restored.health.attorney_hp(), 5);
    assert_eq!(saved.score, 35 + 9);
}

/// The terminal record reaches the store once, with the final outcome.
#[tokio::test]
async fn test_terminal_record_saved() {
    let fixture = Fixture::new();
    let store = Arc::new(MemoryHistory::new());
    let controller = MatchController::new(MatchConfig::default().with_max_hp(40))
        .unwrap()
        .with_history(store.clone());
    common::in_chat(&controller, &fixture).await;

    let saved = lost_match(&controller, &fixture).await;

    let stored = store.get(saved.id).unwrap().unwrap();
    assert_eq!(stored.outcome, RecordOutcome::Lost);
    assert_eq!(stored.exchange_count, 3);
    assert_eq!(stored.score, saved.score);
    assert_eq!(store.list().unwrap().len(), 1);
}

/// Records survive a reopen of the JSON file, with the user's flags.
#[tokio::test]
async fn test_json_file_history() {
    let path = temp_path();
    let fixture = Fixture::new();
    let store = Arc::new(JsonFileHistory::open(&path).unwrap());
    let controller = chat_controller(MatchConfig::default(), &fixture)
        .await
        .with_history(store.clone());

    let report = controller.surrender(&fixture.agents).await.unwrap();
    let id = report.saved.unwrap().id;
    assert!(store.toggle_star(id).unwrap());
    store.set_visibility(id, Visibility::Private).unwrap();

    let reopened = JsonFileHistory::open(&path).unwrap();
    let records = reopened.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, RecordOutcome::Lost);
    assert!(records[0].starred);
    assert_eq!(records[0].visibility, Visibility::Private);
    assert_eq!(records[0].score, 3);

    std::fs::remove_file(&path).ok();
}

/// Older records without score or visibility still load.
#[tokio::test]
async fn test_tolerant_loading() {
    let fixture = Fixture::new();
    let controller = chat_controller(MatchConfig::default(), &fixture).await;
    let saved = controller.surrender(&fixture.agents).await.unwrap().saved.unwrap();

    let mut value = serde_json::to_value(&saved).unwrap();
    let object = value.as_object_mut().unwrap();
    for key in ["score", "starred", "visibility", "prosecutionPoints", "defensePoints"] {
        object.remove(key);
    }
    let case = object.remove("caseDefinition").unwrap();
    object.insert("caseData".into(), case);

    let loaded: SavedMatch = serde_json::from_value(value).unwrap();
    assert_eq!(loaded.score, 0);
    assert!(!loaded.starred);
    assert_eq!(loaded.visibility, Visibility::Public);

    // Point tables fall back to the case's own.
    let state = loaded.to_state();
    assert_eq!(state.defense_points.len(), 3);
}

/// An in-progress record resumes in chat and can keep playing.
#[tokio::test]
async fn test_resume_in_progress() {
    let fixture = Fixture::new();
    let first = chat_controller(MatchConfig::default(), &fixture).await;
    first.submit_message(&fixture.agents, "Objection!").await.unwrap();
    let saved = SavedMatch::from_state(&first.state()).unwrap();
    assert_eq!(saved.outcome, RecordOutcome::InProgress);

    let second = MatchController::new(MatchConfig::default()).unwrap();
    second.resume(&saved).unwrap();
    assert_eq!(second.phase(), Phase::Chat);
    assert_eq!(second.state().id, saved.id);

    let report = second.submit_message(&fixture.agents, "Exhibit D2.").await.unwrap();
    assert_eq!(report.exchange, 2);
    assert_eq!(report.evidence_used.as_deref(), Some("D2"));
    assert_eq!(second.health().attorney_hp(), 80);
}

/// A finished record resumes as ended and cannot be played on.
#[tokio::test]
async fn test_resume_finished() {
    let fixture = Fixture::new();
    let first = chat_controller(MatchConfig::default(), &fixture).await;
    let saved = first.surrender(&fixture.agents).await.unwrap().saved.unwrap();

    let second = MatchController::new(MatchConfig::default()).unwrap();
    second.resume(&saved).unwrap();

    assert_eq!(second.phase(), Phase::Ended);
    assert!(second.submit_message(&fixture.agents, "Wait!").await.is_err());
}

/// A record with health above the maximum resumes clamped.
#[tokio::test]
async fn test_resume_clamps_health() {
    let fixture = Fixture::new();
    let first = chat_controller(MatchConfig::default(), &fixture).await;
    first.submit_message(&fixture.agents, "Objection!").await.unwrap();
    let saved = SavedMatch::from_state(&first.state()).unwrap();

    let mut value = serde_json::to_value(&saved).unwrap();
    value["finalHealth"]["attorneyHP"] = serde_json::json!(250);
    let loaded: SavedMatch = serde_json::from_value(value).unwrap();

    let second = MatchController::new(MatchConfig::default()).unwrap();
    second.resume(&loaded).unwrap();
    let health = second.health();
    assert_eq!(health.attorney_hp(), 100);
    assert!(health.defendant_hp() <= health.max_hp());
}
