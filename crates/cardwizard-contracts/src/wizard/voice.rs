use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceMode {
    Text,
    Number,
}

/// Extract the digit characters of an utterance and parse them as one
/// integer. Utterances with no digits are discarded (`None`), so "fifty"
/// never writes a field while "I think 75 maybe" yields 75.
pub fn parse_number_transcript(transcript: &str) -> Option<i64> {
    let digits: String = transcript.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Append rule for dictated text: a field that already has content gains the
/// utterance after a single space, an empty field takes it verbatim.
pub fn merge_transcript(existing: &str, utterance: &str) -> String {
    if existing.is_empty() {
        utterance.to_string()
    } else {
        format!("{existing} {utterance}")
    }
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug)]
struct SubscriptionState {
    live: AtomicBool,
    slot: Mutex<Option<String>>,
}

/// Receiving half of one capture activation. Owned by the field that started
/// listening; dropping or cancelling it invalidates the paired handle, so a
/// transcript arriving after the user navigated away is dropped instead of
/// being written into whatever field is focused now.
#[derive(Debug)]
pub struct VoiceSubscription {
    inner: Arc<SubscriptionState>,
}

/// Delivering half, handed to the recognizer. Cloneable so the recognizer
/// can retry delivery from wherever its callback fires.
#[derive(Debug, Clone)]
pub struct VoiceHandle {
    inner: Arc<SubscriptionState>,
}

impl VoiceSubscription {
    pub fn new() -> (VoiceSubscription, VoiceHandle) {
        let inner = Arc::new(SubscriptionState {
            live: AtomicBool::new(true),
            slot: Mutex::new(None),
        });
        (
            VoiceSubscription {
                inner: Arc::clone(&inner),
            },
            VoiceHandle { inner },
        )
    }

    pub fn cancel(&self) {
        self.inner.live.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Drain the delivered transcript, if one arrived while live.
    pub fn take(&self) -> Option<String> {
        match self.inner.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        }
    }
}

impl Drop for VoiceSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl VoiceHandle {
    /// Deliver a recognized transcript. Returns `false` without storing
    /// anything once the subscription was cancelled.
    pub fn deliver(&self, transcript: &str) -> bool {
        if !self.inner.live.load(Ordering::SeqCst) {
            return false;
        }
        match self.inner.slot.lock() {
            Ok(mut slot) => {
                *slot = Some(transcript.to_string());
                true
            }
            Err(_) => false,
        }
    }
}

/// External speech-recognition capability. Implementations deliver at most
/// one transcript per activation through the handle; recognition failures
/// are absorbed silently and simply never deliver.
pub trait VoiceCapture {
    fn is_available(&self) -> bool;
    fn start_listening(&self, mode: VoiceMode, handle: VoiceHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_transcripts_keep_only_digits() {
        assert_eq!(parse_number_transcript("I think 75 maybe"), Some(75));
        assert_eq!(parse_number_transcript("100 HP"), Some(100));
        assert_eq!(parse_number_transcript("fifty"), None);
        assert_eq!(parse_number_transcript(""), None);
        // Digits are concatenated, not summed.
        assert_eq!(parse_number_transcript("7 and 5"), Some(75));
    }

    #[test]
    fn merge_appends_with_a_single_space() {
        assert_eq!(merge_transcript("Roars", "loudly"), "Roars loudly");
        assert_eq!(merge_transcript("", "fire breath"), "fire breath");
    }

    #[test]
    fn capitalize_only_touches_the_first_character() {
        assert_eq!(capitalize_first("fire breath"), "Fire breath");
        assert_eq!(capitalize_first("Roars loudly"), "Roars loudly");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn live_subscription_receives_a_delivery() {
        let (subscription, handle) = VoiceSubscription::new();
        assert!(handle.deliver("spiky tail"));
        assert_eq!(subscription.take().as_deref(), Some("spiky tail"));
        // Drained; nothing left.
        assert!(subscription.take().is_none());
    }

    #[test]
    fn cancelled_subscription_drops_late_results() {
        let (subscription, handle) = VoiceSubscription::new();
        subscription.cancel();
        assert!(!handle.deliver("too late"));
        assert!(subscription.take().is_none());
        assert!(!subscription.is_live());
    }

    #[test]
    fn dropping_the_subscription_invalidates_the_handle() {
        let (subscription, handle) = VoiceSubscription::new();
        drop(subscription);
        assert!(!handle.deliver("orphaned"));
    }
}
