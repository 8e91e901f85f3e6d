mod interview;
mod questions;
mod steps;
mod voice;

pub use interview::{AdvanceOutcome, InterviewMachine, NAME_REQUIRED_MESSAGE};
pub use questions::{Field, InputKind, QuestionSpec, INTERVIEW_QUESTIONS};
pub use steps::AppStep;
pub use voice::{
    capitalize_first, merge_transcript, parse_number_transcript, VoiceCapture, VoiceHandle,
    VoiceMode, VoiceSubscription,
};
