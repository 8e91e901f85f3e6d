use serde::{Deserialize, Serialize};

/// Top-level wizard position. Exactly one step is active at a time; the
/// regenerating sub-state of an edit never leaves `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppStep {
    Landing,
    Upload,
    Interview,
    Color,
    Generating,
    Result,
}

impl AppStep {
    pub fn label(&self) -> &'static str {
        match self {
            AppStep::Landing => "landing",
            AppStep::Upload => "upload",
            AppStep::Interview => "interview",
            AppStep::Color => "color",
            AppStep::Generating => "generating",
            AppStep::Result => "result",
        }
    }
}

impl std::fmt::Display for AppStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
