/// The operator-selected global deployment mode. Governs how far
/// `Dispatcher` is allowed to go with an AI-generated draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    /// Never sends external mail; files drafts as pending + internal notes.
    Shadow,
    /// Queues every draft for human approval; escalates on low confidence.
    Assisted,
    /// Sends confident, non-escalated drafts immediately; falls back to
    /// `Assisted` behaviour otherwise.
    Autonomous,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Shadow => "SHADOW",
            Self::Assisted => "ASSISTED",
            Self::Autonomous => "AUTONOMOUS",
        };
        write!(f, "{s}")
    }
}
