//! Context bundle: the plain-text view of a match sent with every agent call.
//!
//! Built fresh for each request from the current `MatchState` and never
//! stored. Sections are labeled so a language model can find them.

use im::Vector;
use std::fmt::Write;

use crate::case::{ClaimPoint, PointStatus};
use crate::core::{MatchState, Message, Sender, Side};
use crate::ledger::AnalysisState;

/// Rendered context for one agent call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextBundle(String);

impl ContextBundle {
    /// Render every section that has content.
    #[must_use]
    pub fn build(state: &MatchState) -> Self {
        let mut out = String::new();

        if let Some(case) = &state.case {
            section(&mut out, "CASE");
            let _ = writeln!(out, "# {}\n", case.title());
            let _ = writeln!(out, "Charge: {}", case.charge());
            let _ = writeln!(out, "Context: {}", case.context());
            let _ = writeln!(out, "Central question: {}\n", case.central_tension());
        }

        for side in Side::ALL {
            let points = state.points(side);
            if points.is_empty() {
                continue;
            }
            section(
                &mut out,
                match side {
                    Side::Attorney => "PROSECUTION CLAIMS",
                    Side::Defendant => "DEFENSE CLAIMS",
                },
            );
            render_points(&mut out, points);
        }

        if !state.evidence.is_empty() {
            section(&mut out, "DEFENSE EVIDENCE CARDS");
            for card in state.evidence.cards() {
                let mark = if card.used { "used" } else { "available" };
                let _ = writeln!(out, "- {} ({mark}): {}", card.id, card.claim);
            }
            out.push('\n');
        }

        if !state.messages.is_empty() {
            section(&mut out, "TRANSCRIPT");
            render_transcript(&mut out, state.messages.iter());
        }

        section(&mut out, "ANALYSIS");
        render_analysis(&mut out, &state.analysis);

        Self(out)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ContextBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn section(out: &mut String, label: &str) {
    let _ = writeln!(out, "=== {label} ===");
}

fn render_points(out: &mut String, points: &Vector<ClaimPoint>) {
    out.push_str("| ID | Claim | Evidence | Status |\n");
    out.push_str("|----|-------|----------|--------|\n");
    for p in points {
        let _ = writeln!(out, "| {} | {} | {} | {} |", p.id, p.claim, p.evidence, p.status);
    }

    out.push_str("\nConcessions:\n");
    let mut any = false;
    for p in points.iter().filter(|p| p.status == PointStatus::Refuted) {
        let _ = writeln!(out, "- {}: {}", p.id, p.claim);
        any = true;
    }
    if !any {
        out.push_str("- None\n");
    }
    out.push('\n');
}

/// Each run of attorney messages opens a new exchange header.
fn render_transcript<'a>(out: &mut String, messages: impl Iterator<Item = &'a Message>) {
    let mut exchange = 0;
    let mut last: Option<Sender> = None;

    for msg in messages {
        if msg.sender == Sender::Attorney && last != Some(Sender::Attorney) {
            exchange += 1;
            let _ = writeln!(out, "## Exchange {exchange}");
        }
        let label = match msg.sender {
            Sender::Attorney => "Attorney",
            Sender::User => "User",
        };
        let _ = writeln!(out, "**{label}:** {}\n", msg.text);
        last = Some(msg.sender);
    }
}

fn render_analysis(out: &mut String, analysis: &AnalysisState) {
    out.push_str("Key assumptions:\n| Side | Assumption | State |\n|------|------------|-------|\n");
    if analysis.assumptions.is_empty() {
        out.push_str("| - | - | - |\n");
    }
    for a in &analysis.assumptions {
        let _ = writeln!(out, "| {} | {} | {} |", a.side, a.assumption, a.state.label());
    }

    out.push_str("\nFallacies:\n| Side | Type | Context | Exchange |\n|------|------|---------|----------|\n");
    if analysis.fallacies.is_empty() {
        out.push_str("| - | - | - | - |\n");
    }
    for f in &analysis.fallacies {
        let _ = writeln!(out, "| {} | {} | {} | {} |", f.side, f.kind, f.context, f.exchange_number);
    }

    out.push_str("\nScore:\n");
    for (side, score) in analysis.scores.iter() {
        let _ = writeln!(
            out,
            "- {side}: {} valid points, {} fallacies, {} challenged",
            score.valid_points, score.fallacies, score.challenged
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseDefinition, CaseText};
    use crate::ledger::FallacyReport;

    fn state() -> MatchState {
        let case = CaseDefinition::new(
            CaseText {
                title: "The People v. Ned Fumble".into(),
                charge: "Returning a library book 40 years late".into(),
                context: "The book was about punctuality.".into(),
                central_tension: "Does intent outweigh outcome?".into(),
                opening_statement: "Forty years.".into(),
            },
            vec![ClaimPoint::new("A1", "He kept it on purpose", "Bookmark at page 2")],
            vec![
                ClaimPoint::new("D1", "He forgot", "Memory exam").with_status(PointStatus::Refuted),
                ClaimPoint::new("D2", "The library moved", "Zoning records"),
            ],
        )
        .unwrap();

        let mut state = MatchState::new(100);
        state.prosecution_points = case.points(Side::Attorney).iter().cloned().collect();
        state.defense_points = case.points(Side::Defendant).iter().cloned().collect();
        state.case = Some(case);
        state
    }

    #[test]
    fn test_sections_present() {
        let bundle = ContextBundle::build(&state());
        let text = bundle.as_str();

        assert!(text.contains("=== CASE ==="));
        assert!(text.contains("# The People v. Ned Fumble"));
        assert!(text.contains("=== PROSECUTION CLAIMS ==="));
        assert!(text.contains("| D2 | The library moved | Zoning records | unchallenged |"));
        assert!(text.contains("- D1: He forgot"));
        assert!(text.contains("=== ANALYSIS ==="));
        assert!(!text.contains("=== TRANSCRIPT ==="));
    }

    #[test]
    fn test_transcript_exchanges() {
        let mut state = state();
        state.push_message(Message::new("Forty years.", Sender::Attorney, None));
        state.push_message(Message::new("Objection!", Sender::User, None));
        state.push_message(Message::new("Overruled.", Sender::Attorney, Some(5)));

        let text = ContextBundle::build(&state).into_string();

        assert!(text.contains("## Exchange 1\n**Attorney:** Forty years."));
        assert!(text.contains("**User:** Objection!"));
        assert!(text.contains("## Exchange 2\n**Attorney:** Overruled."));
    }

    #[test]
    fn test_analysis_rows() {
        let mut state = state();
        state.analysis = state.analysis.apply_fallacies(
            &[FallacyReport {
                side: Side::Attorney,
                kind: "appeal to emotion".into(),
                context: "the poor librarian".into(),
            }],
            1,
        );

        let text = ContextBundle::build(&state).into_string();
        assert!(text.contains("| attorney | appeal to emotion | the poor librarian | 1 |"));
        assert!(text.contains("- attorney: 0 valid points, 1 fallacies, 0 challenged"));
    }
}
