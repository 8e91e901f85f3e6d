use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::TextDiff;
use uuid::Uuid;

/// One generate/edit call as recorded in `journal.json`. Edits chain to the
/// version they modified through `parent_version_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardVersion {
    pub version_id: String,
    pub parent_version_id: Option<String>,
    pub action: String,
    pub prompt: String,
    pub prompt_diff: Option<Vec<String>>,
    pub fingerprint: String,
    pub artifact_path: Option<String>,
    pub created_at: String,
}

/// Append-only record of what the session asked the renderer to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardJournal {
    #[serde(skip)]
    path: PathBuf,
    pub schema_version: u64,
    pub journal_id: String,
    pub created_at: String,
    pub versions: Vec<CardVersion>,
}

impl CardJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema_version: 1,
            journal_id: Uuid::new_v4().to_string(),
            created_at: now_utc_iso(),
            versions: Vec::new(),
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let parsed = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<CardJournal>(&raw).ok());
        match parsed {
            Some(mut journal) => {
                journal.path = path;
                journal
            }
            None => Self::new(path),
        }
    }

    pub fn add_version(
        &mut self,
        action: &str,
        prompt: &str,
        fingerprint: &str,
        parent_version_id: Option<&str>,
        artifact_path: Option<&str>,
    ) -> &CardVersion {
        let parent_prompt = parent_version_id
            .and_then(|id| self.versions.iter().find(|entry| entry.version_id == id))
            .map(|entry| entry.prompt.clone());
        let version = CardVersion {
            version_id: format!("v{}", self.versions.len() + 1),
            parent_version_id: parent_version_id.map(str::to_string),
            action: action.to_string(),
            prompt: prompt.to_string(),
            prompt_diff: prompt_diff(parent_prompt.as_deref(), prompt),
            fingerprint: fingerprint.to_string(),
            artifact_path: artifact_path.map(str::to_string),
            created_at: now_utc_iso(),
        };
        self.versions.push(version);
        self.versions.last().expect("version just pushed")
    }

    pub fn latest(&self) -> Option<&CardVersion> {
        self.versions.last()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload: Value = serde_json::to_value(self)?;
        std::fs::write(&self.path, serde_json::to_string_pretty(&payload)?)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn prompt_diff(prev: Option<&str>, curr: &str) -> Option<Vec<String>> {
    let prev = prev?;
    let diff = TextDiff::from_lines(prev, curr);
    let rendered = diff.unified_diff().header("prev", "curr").to_string();
    Some(rendered.lines().map(str::to_string).collect())
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
