//! Agent seams.
//!
//! The engine talks to three external agents. Implementations may call a
//! language model, replay a script, or anything else; the engine only
//! sees raw payloads and normalizes them itself.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::context::ContextBundle;
use super::payload::{CasePayload, CounselPayload, SuggestionPayload};
use crate::core::AgentError;

/// Request for one opposing-counsel reply.
#[derive(Clone, Debug)]
pub struct CounselRequest {
    pub context: ContextBundle,
    /// The user's latest message (not yet in the transcript).
    pub user_message: String,
    /// Ask for a zero-damage victory speech instead of a normal reply.
    pub surrender: bool,
}

/// Request for a fresh set of suggested replies.
#[derive(Clone, Debug)]
pub struct SuggestionRequest {
    pub context: ContextBundle,
    pub exchange_count: u32,
    /// The list will end with a surrender entry regardless; agents may
    /// use this to phrase the others accordingly.
    pub surrender_required: bool,
}

/// Produces a new case.
#[async_trait]
pub trait CaseGenerator: Send + Sync {
    async fn generate_case(&self) -> Result<CasePayload, AgentError>;
}

/// Voices the prosecuting attorney.
#[async_trait]
pub trait OpposingCounsel: Send + Sync {
    async fn respond(&self, request: &CounselRequest) -> Result<CounselPayload, AgentError>;
}

/// Proposes replies for the user.
#[async_trait]
pub trait SuggestionAgent: Send + Sync {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<SuggestionPayload, AgentError>;
}

/// The agents one match talks to.
#[derive(Clone)]
pub struct Agents {
    pub case_generator: Arc<dyn CaseGenerator>,
    pub counsel: Arc<dyn OpposingCounsel>,
    pub suggester: Arc<dyn SuggestionAgent>,
}

impl Agents {
    pub fn new(
        case_generator: Arc<dyn CaseGenerator>,
        counsel: Arc<dyn OpposingCounsel>,
        suggester: Arc<dyn SuggestionAgent>,
    ) -> Self {
        Self {
            case_generator,
            counsel,
            suggester,
        }
    }
}

/// Await an agent call, optionally bounded by a timeout.
pub async fn call_agent<T>(
    timeout: Option<Duration>,
    call: impl Future<Output = Result<T, AgentError>>,
) -> Result<T, AgentError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AgentError::Timeout(limit.as_millis() as u64))?,
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_call_agent_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AgentError>(())
        };

        let err = call_agent(Some(Duration::from_secs(5)), slow).await.unwrap_err();
        assert_eq!(err, AgentError::Timeout(5000));
    }

    #[tokio::test]
    async fn test_call_agent_without_limit() {
        let fast = async { Ok::<_, AgentError>(7) };
        assert_eq!(call_agent(None, fast).await.unwrap(), 7);
    }
}
