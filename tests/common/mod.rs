//! Scripted agents and setup helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use courtroom_engine::agents::{CaseGenerator, CounselRequest, OpposingCounsel, SuggestionAgent};
use courtroom_engine::{
    AgentError, Agents, CasePayload, CounselPayload, MatchConfig, MatchController,
    SuggestionPayload, SuggestionRequest,
};

/// A small case: two prosecution claims, three defense claims.
pub fn case_payload() -> CasePayload {
    serde_json::from_value(json!({
        "title": "The People v. Gerald Pumpernickel",
        "charge": "Eating the last office donut",
        "context": "A donut vanished from the break room on a Friday.",
        "philosophical_tension": "Is a shared resource owned by whoever claims it first?",
        "opening_statement": "The evidence will show a clear pattern of pastry appropriation.",
        "attorney_points": [
            {"id": "A1", "claim": "Sprinkles were found on the desk", "evidence": "Photo"},
            {"id": "A2", "claim": "He was alone at 3pm", "evidence": "Badge log"}
        ],
        "defendant_points": [
            {"id": "D1", "claim": "He is allergic to sprinkles", "evidence": "Medical record"},
            {"id": "D2", "claim": "The cleaner left at 3pm", "evidence": "Timesheet"},
            {"id": "D3", "claim": "The box was empty by noon", "evidence": "Slack message"}
        ]
    }))
    .unwrap()
}

/// A plain counsel reply dealing the given damage.
pub fn counsel(attack: f64, counter: f64) -> CounselPayload {
    CounselPayload {
        message: Some("Overruled. Your argument crumbles like a stale cruller.".into()),
        intensity_level: Some(4.0),
        damage_to_attorney: Some(attack),
        damage_to_defendant: Some(counter),
        ..CounselPayload::default()
    }
}

pub fn suggestions(texts: &[&str]) -> SuggestionPayload {
    serde_json::from_value(json!({
        "suggestions": texts
            .iter()
            .map(|t| json!({"text": t, "type": "strategic"}))
            .collect::<Vec<_>>(),
        "defense_analysis": "The prosecution relies on timing.",
        "recommended_strategy": "Attack the badge log."
    }))
    .unwrap()
}

pub struct FakeCase {
    reply: Result<CasePayload, AgentError>,
}

impl FakeCase {
    pub fn ok(payload: CasePayload) -> Self {
        Self { reply: Ok(payload) }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(AgentError::Transport("503 service unavailable".into())),
        }
    }
}

#[async_trait]
impl CaseGenerator for FakeCase {
    async fn generate_case(&self) -> Result<CasePayload, AgentError> {
        self.reply.clone()
    }
}

/// Replays queued replies, then falls back to `counsel(5, 5)`.
#[derive(Default)]
pub struct FakeCounsel {
    script: Mutex<VecDeque<Result<CounselPayload, AgentError>>>,
    requests: Mutex<Vec<CounselRequest>>,
    delay: Duration,
}

impl FakeCounsel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn push(&self, reply: Result<CounselPayload, AgentError>) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<CounselRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OpposingCounsel for FakeCounsel {
    async fn respond(&self, request: &CounselRequest) -> Result<CounselPayload, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(counsel(5.0, 5.0)))
    }
}

/// Replays queued suggestion sets, then falls back to four plain entries.
#[derive(Default)]
pub struct FakeSuggester {
    script: Mutex<VecDeque<Result<SuggestionPayload, AgentError>>>,
}

impl FakeSuggester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Result<SuggestionPayload, AgentError>) {
        self.script.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl SuggestionAgent for FakeSuggester {
    async fn suggest(&self, _request: &SuggestionRequest) -> Result<SuggestionPayload, AgentError> {
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(suggestions(&[
                "Your Honor, that is hearsay!",
                "Where is the donut now?",
                "My client was at the gym.",
                "Let me show the timesheet.",
            ]))
        })
    }
}

pub struct Fixture {
    pub counsel: Arc<FakeCounsel>,
    pub suggester: Arc<FakeSuggester>,
    pub agents: Agents,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_counsel(FakeCounsel::new())
    }

    pub fn with_counsel(counsel: FakeCounsel) -> Self {
        let counsel = Arc::new(counsel);
        let suggester = Arc::new(FakeSuggester::new());
        let agents = Agents::new(
            Arc::new(FakeCase::ok(case_payload())),
            counsel.clone(),
            suggester.clone(),
        );
        Self { counsel, suggester, agents }
    }
}

/// Drive a controller through setup into `chat`, carrying D1 and D2.
pub async fn in_chat(controller: &MatchController, fixture: &Fixture) {
    controller.start_match(&fixture.agents).await.unwrap();
    controller.select_evidence(&["D1", "D2"]).unwrap();
    controller.begin_chat(&fixture.agents).await.unwrap();
}

pub async fn chat_controller(config: MatchConfig, fixture: &Fixture) -> MatchController {
    let controller = MatchController::new(config).unwrap();
    in_chat(&controller, fixture).await;
    controller
}
