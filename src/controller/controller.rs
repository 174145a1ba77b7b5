//! The match phase controller.
//!
//! One `MatchController` owns one match. It runs the phase machine
//!
//! ```text
//! splash -> generating -> intro -> chat -> surrender -> ended (lost)
//!                                      \-> ended (won on attorney KO)
//!                                      \-> ended (lost on defendant KO)
//! ```
//!
//! and processes one round at a time. A round is computed on a working
//! copy of the state (cheap, the collections are persistent) and
//! committed only once the opposing counsel's reply has been validated,
//! so a failed agent call leaves the match exactly as it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::suggestions::{enforce_surrender_last, fallback_suggestions, SURRENDER_TEXT};
use crate::agents::{
    call_agent, normalize_case, normalize_counsel, normalize_suggestions, Agents, ContextBundle,
    CounselRequest, SuggestionRequest, SuggestionSet, SURRENDER_INTENSITY,
};
use crate::case::CaseDefinition;
use crate::core::{
    DamagePolicy, EngineError, HealthState, MatchConfig, MatchState, Message, Outcome, Phase,
    Result, Sender, Side, ValidationError,
};
use crate::damage::{DamageOutcome, DamageResolver, DamageRoll, KoCheck};
use crate::history::{HistoryStore, SavedMatch};
use crate::ledger::{AnalysisState, PointLedger};

/// Intensity of the opening statement.
pub const OPENING_INTENSITY: u8 = 5;

/// Progress notifications, sent as a round's sub-phases complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    PhaseChanged { phase: Phase },
    ReplyReceived { exchange: u32, intensity: u8 },
    EvidenceUsed { card_id: String, bonus: u32 },
    AttackResolved { damage: u32, attorney_hp: u32 },
    CounterResolved { damage: u32, defendant_hp: u32 },
    SuggestionsReady { count: usize },
    MatchEnded { outcome: Outcome },
}

/// Everything a completed round did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundReport {
    /// Exchange number of this round.
    pub exchange: u32,
    /// Card consumed this round, if any.
    pub evidence_used: Option<String>,
    pub damage: DamageOutcome,
    pub outcome: Outcome,
    /// Suggested replies for the next round; `None` once the match is over.
    pub advice: Option<SuggestionSet>,
    /// The terminal record, produced once when the match ends.
    pub saved: Option<SavedMatch>,
}

impl RoundReport {
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self.outcome, Outcome::Won | Outcome::Lost)
    }
}

/// Clears the busy flag when a round finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives a single match.
///
/// All operations take `&self`: the controller can be shared (for example
/// behind an `Arc`) and queried while a round is in flight. A second
/// mutating call during a round fails with [`EngineError::Busy`].
pub struct MatchController {
    config: MatchConfig,
    resolver: DamageResolver,
    state: RwLock<MatchState>,
    busy: AtomicBool,
    terminal_saved: AtomicBool,
    history: Option<Arc<dyn HistoryStore>>,
    observer: Option<UnboundedSender<RoundEvent>>,
}

impl MatchController {
    /// Create a controller for a fresh match in the `splash` phase.
    pub fn new(config: MatchConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver: DamageResolver::new(&config),
            state: RwLock::new(MatchState::new(config.max_hp)),
            busy: AtomicBool::new(false),
            terminal_saved: AtomicBool::new(false),
            history: None,
            observer: None,
            config,
        })
    }

    /// Persist snapshots and terminal records to `store`.
    #[must_use]
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Stream [`RoundEvent`]s to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: UnboundedSender<RoundEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// A copy of the committed match state.
    #[must_use]
    pub fn state(&self) -> MatchState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.read().unwrap_or_else(PoisonError::into_inner).phase
    }

    #[must_use]
    pub fn health(&self) -> HealthState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).health
    }

    /// Check if a round is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    // === Setup ===

    /// Fetch and validate a case: `splash -> generating -> intro`.
    ///
    /// On any failure the match returns to `splash` with no case.
    pub async fn start_match(&self, agents: &Agents) -> Result<CaseDefinition> {
        let _busy = self.acquire()?;
        let id = {
            let mut state = self.write();
            expect_phase(state.phase, Phase::Splash)?;
            state.phase = Phase::Generating;
            state.id
        };
        self.emit(RoundEvent::PhaseChanged { phase: Phase::Generating });
        info!(match_id = %id, "generating case");

        let generated = async {
            let payload =
                call_agent(self.config.agent_timeout(), agents.case_generator.generate_case()).await?;
            Ok::<_, EngineError>(normalize_case(payload)?)
        }
        .await;

        let case = match generated {
            Ok(case) => case,
            Err(err) => {
                warn!(match_id = %id, error = %err, "case generation failed");
                self.update(id, |state| state.phase = Phase::Splash)?;
                self.emit(RoundEvent::PhaseChanged { phase: Phase::Splash });
                return Err(err);
            }
        };

        self.update(id, |state| {
            state.prosecution_points = case.points(Side::Attorney).iter().cloned().collect();
            state.defense_points = case.points(Side::Defendant).iter().cloned().collect();
            state.analysis =
                AnalysisState::for_points(&state.prosecution_points, &state.defense_points);
            state.case = Some(case.clone());
            state.phase = Phase::Intro;
        })?;
        self.emit(RoundEvent::PhaseChanged { phase: Phase::Intro });
        info!(match_id = %id, title = case.title(), "case ready");

        Ok(case)
    }

    /// Choose the defense claims to carry as evidence cards.
    ///
    /// Only allowed in `intro`; replaces any earlier selection. Returns the
    /// number of cards created (unknown ids are skipped).
    pub fn select_evidence<S: AsRef<str>>(&self, ids: &[S]) -> Result<usize> {
        let _busy = self.acquire()?;
        if ids.len() > self.config.evidence_slots {
            return Err(EngineError::TooManyEvidence {
                requested: ids.len(),
                limit: self.config.evidence_slots,
            });
        }

        let mut state = self.write();
        expect_phase(state.phase, Phase::Intro)?;
        let state = &mut *state;
        let count = state.evidence.select(&state.defense_points, ids);
        debug!(match_id = %state.id, count, "evidence selected");
        Ok(count)
    }

    /// Open the courtroom: `intro -> chat`.
    ///
    /// The opening statement becomes the first attorney message, then the
    /// first set of suggestions is fetched.
    pub async fn begin_chat(&self, agents: &Agents) -> Result<SuggestionSet> {
        let _busy = self.acquire()?;
        let opened = {
            let mut state = self.write();
            expect_phase(state.phase, Phase::Intro)?;
            let opening = state
                .case
                .as_ref()
                .map(|case| case.opening_statement().to_string())
                .ok_or(ValidationError::MissingField("case"))?;
            state.phase = Phase::Chat;
            state.outcome = Some(Outcome::Pending);
            state.push_message(Message::new(opening, Sender::Attorney, Some(OPENING_INTENSITY)));
            state.clone()
        };
        self.emit(RoundEvent::PhaseChanged { phase: Phase::Chat });
        info!(match_id = %opened.id, "chat started");

        let advice = self.fetch_suggestions(agents, &opened).await;
        self.update(opened.id, |state| state.suggestions = advice.suggestions.clone())?;
        Ok(advice)
    }

    // === Rounds ===

    /// Send a free-text message.
    ///
    /// The first unused evidence card whose id appears in the text is
    /// deployed. Sending the canonical surrender text surrenders.
    pub async fn submit_message(&self, agents: &Agents, text: &str) -> Result<RoundReport> {
        if text.trim() == SURRENDER_TEXT {
            return self.surrender(agents).await;
        }
        self.run_round(agents, text, None).await
    }

    /// Send a message while explicitly deploying `card_id`.
    ///
    /// Fails with [`EngineError::EvidenceUnavailable`] if the card was never
    /// selected or is already spent; the match is left untouched.
    pub async fn submit_with_evidence(
        &self,
        agents: &Agents,
        text: &str,
        card_id: &str,
    ) -> Result<RoundReport> {
        self.run_round(agents, text, Some(card_id)).await
    }

    async fn run_round(&self, agents: &Agents, text: &str, card: Option<&str>) -> Result<RoundReport> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField("message").into());
        }

        let _busy = self.acquire()?;
        let before = self.state();
        expect_phase(before.phase, Phase::Chat)?;
        if let Some(id) = card {
            if !before.evidence.is_available(id) {
                return Err(EngineError::EvidenceUnavailable(id.to_string()));
            }
        }

        let request = CounselRequest {
            context: ContextBundle::build(&before),
            user_message: text.to_string(),
            surrender: false,
        };
        let payload = call_agent(self.config.agent_timeout(), agents.counsel.respond(&request)).await?;
        let reply = normalize_counsel(payload, &self.config, false)?;

        let mut next = before;
        next.push_message(Message::new(text, Sender::User, None));
        next.exchange_count += 1;
        next.suggestions.clear();
        let exchange = next.exchange_count;

        let evidence_used = match card {
            Some(id) => next.evidence.use_card(id).then(|| id.to_string()),
            None => next.evidence.consume_from_message(text),
        };
        let mut roll = reply.damage;
        if let Some(id) = &evidence_used {
            roll.bonus = self.config.evidence_bonus;
            debug!(match_id = %next.id, card = %id, bonus = roll.bonus, "evidence deployed");
            self.emit(RoundEvent::EvidenceUsed { card_id: id.clone(), bonus: roll.bonus });
        }

        let applied =
            PointLedger::apply_updates(&mut next.prosecution_points, &mut next.defense_points, &reply.point_updates);
        next.analysis = next
            .analysis
            .recalc_scores(&next.prosecution_points, &next.defense_points)
            .apply_fallacies(&reply.fallacies, exchange)
            .apply_assumptions(&reply.assumptions);
        debug!(
            match_id = %next.id,
            exchange,
            points = applied,
            fallacies = reply.fallacies.len(),
            assumptions = reply.assumptions.len(),
            "analysis updated"
        );

        next.push_message(Message::new(reply.message, Sender::Attorney, Some(reply.intensity)));
        self.emit(RoundEvent::ReplyReceived { exchange, intensity: reply.intensity });

        let damage = self.resolve_damage(&mut next.health, &roll).await;
        let outcome = match damage.ko {
            KoCheck::AttorneyKo => Outcome::Won,
            KoCheck::DefendantKo => Outcome::Lost,
            KoCheck::None => Outcome::Pending,
        };
        next.outcome = Some(outcome);
        if damage.ko.is_ko() {
            next.phase = Phase::Ended;
        }
        self.commit(&next)?;

        if damage.ko.is_ko() {
            return Ok(RoundReport {
                exchange,
                evidence_used,
                damage,
                outcome,
                advice: None,
                saved: self.finish(&next, outcome),
            });
        }

        let advice = self.fetch_suggestions(agents, &next).await;
        next.suggestions = advice.suggestions.clone();
        self.update(next.id, |state| state.suggestions = advice.suggestions.clone())?;
        self.snapshot_in_progress(&next);

        Ok(RoundReport {
            exchange,
            evidence_used,
            damage,
            outcome,
            advice: Some(advice),
            saved: None,
        })
    }

    /// Apply a round's damage under the configured policy.
    ///
    /// Sequential rounds stop after the attack phase on an attorney KO;
    /// otherwise they pause for the presentation delay before countering.
    async fn resolve_damage(&self, health: &mut HealthState, roll: &DamageRoll) -> DamageOutcome {
        if self.resolver.policy() == DamagePolicy::Simultaneous {
            let outcome = self.resolver.resolve(health, roll);
            self.emit(RoundEvent::AttackResolved {
                damage: outcome.to_attorney,
                attorney_hp: health.attorney_hp(),
            });
            self.emit(RoundEvent::CounterResolved {
                damage: roll.counter,
                defendant_hp: health.defendant_hp(),
            });
            return outcome;
        }

        let to_attorney = roll.user_damage();
        let ko = DamageResolver::attack_phase(health, roll);
        self.emit(RoundEvent::AttackResolved {
            damage: to_attorney,
            attorney_hp: health.attorney_hp(),
        });
        if ko.is_ko() {
            return DamageOutcome { to_attorney, to_defendant: None, ko };
        }

        let delay = self.config.phase_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let ko = DamageResolver::counter_phase(health, roll);
        self.emit(RoundEvent::CounterResolved {
            damage: roll.counter,
            defendant_hp: health.defendant_hp(),
        });
        DamageOutcome {
            to_attorney,
            to_defendant: Some(roll.counter),
            ko,
        }
    }

    /// Concede the match.
    ///
    /// Health is never touched. The counsel agent is asked for a victory
    /// speech, but the match ends in a loss whether or not one arrives.
    pub async fn surrender(&self, agents: &Agents) -> Result<RoundReport> {
        let _busy = self.acquire()?;
        let mut next = self.state();
        expect_phase(next.phase, Phase::Chat)?;

        let context = ContextBundle::build(&next);
        next.push_message(Message::new(SURRENDER_TEXT, Sender::User, None));
        next.exchange_count += 1;
        next.suggestions.clear();
        next.phase = Phase::Surrender;
        self.commit(&next)?;
        info!(match_id = %next.id, exchange = next.exchange_count, "defendant surrendered");

        let request = CounselRequest {
            context,
            user_message: SURRENDER_TEXT.to_string(),
            surrender: true,
        };
        let speech = async {
            let payload =
                call_agent(self.config.agent_timeout(), agents.counsel.respond(&request)).await?;
            Ok::<_, EngineError>(normalize_counsel(payload, &self.config, true)?)
        }
        .await;
        match speech {
            Ok(reply) => next.push_message(Message::new(
                reply.message,
                Sender::Attorney,
                Some(SURRENDER_INTENSITY),
            )),
            Err(err) => warn!(match_id = %next.id, error = %err, "no victory speech"),
        }

        next.outcome = Some(Outcome::Lost);
        next.phase = Phase::Ended;
        self.commit(&next)?;

        Ok(RoundReport {
            exchange: next.exchange_count,
            evidence_used: None,
            damage: DamageOutcome {
                to_attorney: 0,
                to_defendant: None,
                ko: KoCheck::None,
            },
            outcome: Outcome::Lost,
            advice: None,
            saved: self.finish(&next, Outcome::Lost),
        })
    }

    /// Fetch a new suggestion set for the current state.
    pub async fn refresh_suggestions(&self, agents: &Agents) -> Result<SuggestionSet> {
        let _busy = self.acquire()?;
        let current = self.state();
        expect_phase(current.phase, Phase::Chat)?;

        let advice = self.fetch_suggestions(agents, &current).await;
        self.update(current.id, |state| state.suggestions = advice.suggestions.clone())?;
        Ok(advice)
    }

    // === Lifecycle ===

    /// Discard the match and return to `splash` with a new match id.
    ///
    /// Works from any phase. A round still in flight keeps the controller
    /// busy until it finishes, then fails with [`EngineError::Superseded`].
    pub fn reset(&self) {
        let fresh = MatchState::new(self.config.max_hp);
        info!(match_id = %fresh.id, "match reset");
        *self.write() = fresh;
        self.terminal_saved.store(false, Ordering::Release);
        self.emit(RoundEvent::PhaseChanged { phase: Phase::Splash });
    }

    /// Replace the current match with a saved one.
    ///
    /// Finished records resume in `ended`, others in `chat`.
    pub fn resume(&self, saved: &SavedMatch) -> Result<()> {
        let _busy = self.acquire()?;
        let state = saved.to_state();
        let phase = state.phase;
        info!(match_id = %state.id, %phase, "match resumed");

        *self.write() = state;
        self.terminal_saved
            .store(saved.outcome.is_final(), Ordering::Release);
        self.emit(RoundEvent::PhaseChanged { phase });
        Ok(())
    }

    // === Internals ===

    fn acquire(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MatchState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the committed state, unless the match was reset meanwhile.
    fn commit(&self, next: &MatchState) -> Result<()> {
        let mut state = self.write();
        if state.id != next.id {
            return Err(EngineError::Superseded);
        }
        let changed = state.phase != next.phase;
        *state = next.clone();
        drop(state);

        if changed {
            self.emit(RoundEvent::PhaseChanged { phase: next.phase });
        }
        Ok(())
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut MatchState)) -> Result<()> {
        let mut state = self.write();
        if state.id != id {
            return Err(EngineError::Superseded);
        }
        f(&mut state);
        Ok(())
    }

    fn emit(&self, event: RoundEvent) {
        if let Some(observer) = &self.observer {
            // A dropped receiver just means nobody is watching.
            let _ = observer.send(event);
        }
    }

    async fn fetch_suggestions(&self, agents: &Agents, state: &MatchState) -> SuggestionSet {
        let threshold = self.config.surrender_after_exchanges;
        let request = SuggestionRequest {
            context: ContextBundle::build(state),
            exchange_count: state.exchange_count,
            surrender_required: state.exchange_count >= threshold,
        };

        let fetched = async {
            let payload =
                call_agent(self.config.agent_timeout(), agents.suggester.suggest(&request)).await?;
            Ok::<_, EngineError>(normalize_suggestions(payload)?)
        }
        .await;

        let set = fetched.unwrap_or_else(|err| {
            warn!(match_id = %state.id, error = %err, "suggestion agent failed, using fallback");
            fallback_set()
        });
        let suggestions = enforce_surrender_last(set.suggestions, state.exchange_count, threshold);
        self.emit(RoundEvent::SuggestionsReady { count: suggestions.len() });

        SuggestionSet { suggestions, ..set }
    }

    /// Produce the terminal record, at most once per match.
    fn finish(&self, state: &MatchState, outcome: Outcome) -> Option<SavedMatch> {
        info!(
            match_id = %state.id,
            ?outcome,
            attorney_hp = state.health.attorney_hp(),
            defendant_hp = state.health.defendant_hp(),
            exchanges = state.exchange_count,
            "match ended"
        );
        self.emit(RoundEvent::MatchEnded { outcome });

        if self.terminal_saved.swap(true, Ordering::AcqRel) {
            return None;
        }
        let record = SavedMatch::from_state(state)?;

        if let Some(store) = &self.history {
            match store.put(record.clone()) {
                Ok(()) => info!(match_id = %record.id, score = record.score, "match saved"),
                Err(err) => warn!(match_id = %record.id, error = %err, "failed to save match"),
            }
        }
        Some(record)
    }

    /// Write a best-effort snapshot without waiting for it.
    fn snapshot_in_progress(&self, state: &MatchState) {
        let Some(store) = self.history.clone() else {
            return;
        };
        let Some(record) = SavedMatch::from_state(state) else {
            return;
        };

        tokio::task::spawn_blocking(move || {
            if let Err(err) = store.put(record) {
                warn!(error = %err, "in-progress snapshot failed");
            }
        });
    }
}

impl std::fmt::Debug for MatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchController")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

fn expect_phase(actual: Phase, expected: Phase) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(EngineError::InvalidPhase { expected, actual })
    }
}

fn fallback_set() -> SuggestionSet {
    SuggestionSet {
        suggestions: fallback_suggestions(),
        defense_analysis: "No analysis".to_string(),
        recommended_strategy: "No recommendation".to_string(),
    }
}
