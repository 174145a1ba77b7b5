//! Raw agent payloads.
//!
//! These mirror the JSON the agents are asked to produce, with every
//! field optional. Nothing here is trusted; `normalize` turns payloads
//! into engine types or rejects them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// A claim as sent by the case generator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub id: Option<String>,
    pub claim: Option<String>,
    pub evidence: Option<String>,
    pub status: Option<String>,
}

/// Case generator response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CasePayload {
    pub title: Option<String>,
    pub charge: Option<String>,
    pub context: Option<String>,
    pub philosophical_tension: Option<String>,
    pub attorney_points: Option<Vec<PointPayload>>,
    pub defendant_points: Option<Vec<PointPayload>>,
    pub opening_statement: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointUpdatePayload {
    pub id: Option<String>,
    pub new_status: Option<String>,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FallacyPayload {
    pub side: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub context: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionPayload {
    pub side: Option<String>,
    pub assumption: Option<String>,
    pub new_state: Option<String>,
}

/// Opposing counsel response for one round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CounselPayload {
    pub message: Option<String>,
    pub updated_points: Option<Vec<PointUpdatePayload>>,
    pub fallacies_identified: Option<Vec<FallacyPayload>>,
    pub assumptions_challenged: Option<Vec<AssumptionPayload>>,
    #[serde(alias = "intensity")]
    pub intensity_level: Option<f64>,
    pub damage_to_attorney: Option<f64>,
    pub damage_to_defendant: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionEntryPayload {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub variant: Option<String>,
}

/// Suggestion agent response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPayload {
    pub suggestions: Option<Vec<SuggestionEntryPayload>>,
    pub defense_analysis: Option<String>,
    pub recommended_strategy: Option<String>,
}

/// Parse a payload out of free-form model output.
///
/// Takes the span from the first `{` to the last `}`, so commentary
/// around the JSON object is ignored.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, AgentError> {
    let start = text.find('{');
    let end = text.rfind('}');

    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(AgentError::Malformed("no JSON object in agent output".into())),
    };

    serde_json::from_str(json).map_err(|e| AgentError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_commentary() {
        let text = r#"Sure! Here is the reply:
{"message": "Objection.", "intensity_level": 7}
Hope that helps."#;

        let payload: CounselPayload = parse_payload(text).unwrap();
        assert_eq!(payload.message.as_deref(), Some("Objection."));
        assert_eq!(payload.intensity_level, Some(7.0));
        assert_eq!(payload.damage_to_attorney, None);
    }

    #[test]
    fn test_parse_no_object() {
        let err = parse_payload::<CounselPayload>("I refuse to answer in JSON").unwrap_err();
        assert!(matches!(err, AgentError::Malformed(_)));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_payload::<CounselPayload>("{ message: unquoted }").unwrap_err();
        assert!(matches!(err, AgentError::Malformed(_)));
    }

    #[test]
    fn test_intensity_alias() {
        let payload: CounselPayload = parse_payload(r#"{"intensity": 4}"#).unwrap();
        assert_eq!(payload.intensity_level, Some(4.0));
    }
}
