use cardwizard_contracts::creature::CreatureData;
use cardwizard_contracts::wizard::{merge_transcript, AppStep};

use crate::{CardImage, CardStudio};

pub const GENERATION_ERROR_MESSAGE: &str =
    "Oh no! The creation machine got jammed. Please try again.";
pub const EDIT_ALERT_MESSAGE: &str = "The magic wand fizzled! Try a different instruction.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Card stored, step moved to `Result`.
    Generated,
    /// Step routed back to `Interview` with the inline error banner set.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Empty instruction or no artifact yet; no service call was issued.
    Skipped,
    /// Artifact replaced; edit mode exited and the instruction cleared.
    Applied,
    /// Service failed; edit mode and the instruction are retained so the
    /// user can retry without retyping. `alert` is the blocking
    /// acknowledgment to show, a separate channel from the generate-path
    /// banner.
    Failed { alert: String },
}

/// The top-level wizard controller. Pure state: every operation is a plain
/// transition, and the external service arrives as an injected `&mut
/// CardStudio` rather than ambient state.
#[derive(Debug)]
pub struct WizardSession {
    step: AppStep,
    creature: CreatureData,
    card: Option<CardImage>,
    error: Option<String>,
    editing: bool,
    edit_instruction: String,
    regenerating: bool,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self {
            step: AppStep::Landing,
            creature: CreatureData::default(),
            card: None,
            error: None,
            editing: false,
            edit_instruction: String::new(),
            regenerating: false,
        }
    }
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AppStep {
        self.step
    }

    pub fn creature(&self) -> &CreatureData {
        &self.creature
    }

    /// Controlled write handle for the interview and color steps.
    pub fn creature_mut(&mut self) -> &mut CreatureData {
        &mut self.creature
    }

    pub fn card(&self) -> Option<&CardImage> {
        self.card.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn edit_instruction(&self) -> &str {
        &self.edit_instruction
    }

    pub fn is_regenerating(&self) -> bool {
        self.regenerating
    }

    /// Landing → Upload.
    pub fn begin(&mut self) {
        if self.step == AppStep::Landing {
            self.step = AppStep::Upload;
        }
    }

    /// Confirmed sketch handoff: Upload → Interview. One-way; a later
    /// retake on the upload screen never reaches this state again.
    pub fn attach_sketch(&mut self, encoded: String) {
        if self.step != AppStep::Upload {
            return;
        }
        self.creature.sketch_base64 = Some(encoded);
        self.step = AppStep::Interview;
    }

    /// Interview → Color. The interview machine has already validated the
    /// name and applied the damage fallback by the time it reports
    /// completion.
    pub fn finish_interview(&mut self) {
        if self.step == AppStep::Interview {
            self.step = AppStep::Color;
        }
    }

    /// Color → Generating → Result, or fail backward: on any service error
    /// or empty artifact the step returns to Interview (not Color) with the
    /// inline banner set, leaving every answer intact for revision.
    pub fn render_card(&mut self, studio: &mut CardStudio) -> GenerateOutcome {
        if self.step != AppStep::Color {
            return GenerateOutcome::Failed;
        }
        self.step = AppStep::Generating;
        match studio.generate_card(&self.creature) {
            Ok(card) if !card.is_empty() => {
                self.card = Some(card);
                self.step = AppStep::Result;
                GenerateOutcome::Generated
            }
            Ok(_) | Err(_) => {
                self.error = Some(GENERATION_ERROR_MESSAGE.to_string());
                self.step = AppStep::Interview;
                GenerateOutcome::Failed
            }
        }
    }

    pub fn start_edit(&mut self) {
        if self.step == AppStep::Result && self.card.is_some() {
            self.editing = true;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = false;
        self.edit_instruction.clear();
    }

    pub fn set_edit_instruction(&mut self, text: impl Into<String>) {
        self.edit_instruction = text.into();
    }

    /// Dictated text lands in the in-progress instruction with the same
    /// append-with-space rule the interview uses.
    pub fn append_edit_voice(&mut self, transcript: &str) {
        self.edit_instruction = merge_transcript(&self.edit_instruction, transcript);
    }

    /// Submit the in-progress instruction against the current artifact.
    /// Whitespace-only instructions and missing artifacts are no-ops.
    pub fn submit_edit(&mut self, studio: &mut CardStudio) -> EditOutcome {
        if self.edit_instruction.trim().is_empty() {
            return EditOutcome::Skipped;
        }
        let Some(current) = self.card.clone() else {
            return EditOutcome::Skipped;
        };

        self.regenerating = true;
        let result = studio.edit_card(&current, &self.edit_instruction);
        self.regenerating = false;

        match result {
            Ok(card) if !card.is_empty() => {
                self.card = Some(card);
                self.editing = false;
                self.edit_instruction.clear();
                EditOutcome::Applied
            }
            Ok(_) | Err(_) => EditOutcome::Failed {
                alert: EDIT_ALERT_MESSAGE.to_string(),
            },
        }
    }

    /// Back to the start: defaults for the creature, no artifact, no error,
    /// no edit state.
    pub fn reset(&mut self) {
        *self = WizardSession::new();
    }
}
