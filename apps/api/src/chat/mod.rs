// Chat-driven document editing: turn orchestration plus the pure helpers it
// leans on.

pub mod classify;
pub mod handlers;
pub mod heuristics;
pub mod history;
pub mod orchestrator;

/// Outcome of one processed turn, whether it came from the backend or from
/// the offline heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub updated_markdown: String,
    pub response_message: String,
    pub has_updates: Option<bool>,
}
