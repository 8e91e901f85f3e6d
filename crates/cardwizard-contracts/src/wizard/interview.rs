use rand::Rng;

use crate::creature::CreatureData;

use super::questions::{Field, InputKind, QuestionSpec, INTERVIEW_QUESTIONS};
use super::voice::{capitalize_first, merge_transcript, parse_number_transcript};

pub const NAME_REQUIRED_MESSAGE: &str = "Please give your monster a name!";

const DAMAGE_ROLL_MIN: i64 = 30;
const DAMAGE_ROLL_MAX: i64 = 79;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the next question.
    Moved,
    /// Stayed on the last question; the named requirement is unmet.
    Blocked(String),
    /// All questions answered; control passes to the next wizard step.
    Completed,
}

/// Cursor over the static question catalog. Forward/back navigation plus the
/// per-kind answer handling; the creature itself lives with the orchestrator
/// and is borrowed in for each write.
#[derive(Debug, Default)]
pub struct InterviewMachine {
    index: usize,
}

impl InterviewMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn question(&self) -> &'static QuestionSpec {
        &INTERVIEW_QUESTIONS[self.index]
    }

    pub fn is_last(&self) -> bool {
        self.index == INTERVIEW_QUESTIONS.len() - 1
    }

    /// `(current, total)` for the progress indicator, 1-based.
    pub fn progress(&self) -> (usize, usize) {
        (self.index + 1, INTERVIEW_QUESTIONS.len())
    }

    /// Step back one question. No-op on the first.
    pub fn retreat(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step forward. On the last question this validates the name, applies
    /// the damage fallback roll, and reports completion instead of moving.
    pub fn advance(&mut self, creature: &mut CreatureData) -> AdvanceOutcome {
        if !self.is_last() {
            self.index += 1;
            return AdvanceOutcome::Moved;
        }
        if creature.name.trim().is_empty() {
            return AdvanceOutcome::Blocked(NAME_REQUIRED_MESSAGE.to_string());
        }
        if creature.special_ability_damage == 0 {
            creature.special_ability_damage =
                rand::thread_rng().gen_range(DAMAGE_ROLL_MIN..=DAMAGE_ROLL_MAX);
        }
        AdvanceOutcome::Completed
    }

    /// Write a typed answer into the field the current question names.
    /// Returns whether anything was written.
    pub fn record_answer(&self, creature: &mut CreatureData, raw: &str) -> bool {
        let question = self.question();
        match question.kind {
            InputKind::Text | InputKind::Textarea => {
                question.field.write_text(creature, raw.to_string());
                true
            }
            InputKind::Number => {
                let value = parse_number_transcript(raw).unwrap_or(0);
                question.field.write_number(creature, value);
                true
            }
            InputKind::Select => match crate::creature::MonsterType::parse(raw) {
                Some(kind) => {
                    creature.element = kind;
                    true
                }
                None => false,
            },
        }
    }

    /// Apply a voice transcript to the current question. Number questions
    /// take the digit parse or discard the utterance; text questions append
    /// with a space and capitalize the first character; select questions are
    /// not wired to voice.
    pub fn record_voice(&self, creature: &mut CreatureData, transcript: &str) -> bool {
        let question = self.question();
        match question.kind {
            InputKind::Number => match parse_number_transcript(transcript) {
                Some(value) => {
                    question.field.write_number(creature, value);
                    true
                }
                None => false,
            },
            InputKind::Text | InputKind::Textarea => {
                let existing = question.field.read(creature);
                let merged = capitalize_first(&merge_transcript(&existing, transcript));
                question.field.write_text(creature, merged);
                true
            }
            InputKind::Select => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::MonsterType;

    fn machine_at(index: usize) -> InterviewMachine {
        let mut machine = InterviewMachine::new();
        let mut creature = CreatureData::default();
        for _ in 0..index {
            machine.advance(&mut creature);
        }
        machine
    }

    #[test]
    fn retreat_stops_at_the_first_question() {
        let mut machine = InterviewMachine::new();
        assert!(!machine.retreat());
        assert_eq!(machine.index(), 0);

        let mut machine = machine_at(2);
        assert!(machine.retreat());
        assert_eq!(machine.index(), 1);
    }

    #[test]
    fn advance_walks_forward_until_the_last_question() {
        let mut machine = InterviewMachine::new();
        let mut creature = CreatureData::default();
        for expected in 1..INTERVIEW_QUESTIONS.len() {
            assert_eq!(machine.advance(&mut creature), AdvanceOutcome::Moved);
            assert_eq!(machine.index(), expected);
        }
        assert!(machine.is_last());
        assert_eq!(machine.progress(), (6, 6));
    }

    #[test]
    fn completion_is_blocked_while_the_name_is_blank() {
        let mut machine = machine_at(INTERVIEW_QUESTIONS.len() - 1);
        let mut creature = CreatureData::default();
        creature.name = "   ".to_string();
        let outcome = machine.advance(&mut creature);
        assert_eq!(
            outcome,
            AdvanceOutcome::Blocked(NAME_REQUIRED_MESSAGE.to_string())
        );
        // The index never leaves the last question on a blocked advance.
        assert!(machine.is_last());

        creature.name = "Blaze".to_string();
        assert_eq!(machine.advance(&mut creature), AdvanceOutcome::Completed);
    }

    #[test]
    fn zero_damage_gets_a_roll_in_range_on_completion() {
        let mut machine = machine_at(INTERVIEW_QUESTIONS.len() - 1);
        let mut creature = CreatureData::default();
        creature.name = "Blaze".to_string();
        creature.special_ability_damage = 0;
        assert_eq!(machine.advance(&mut creature), AdvanceOutcome::Completed);
        assert!((30..=79).contains(&creature.special_ability_damage));
    }

    #[test]
    fn preset_damage_survives_completion_unchanged() {
        let mut machine = machine_at(INTERVIEW_QUESTIONS.len() - 1);
        let mut creature = CreatureData::default();
        creature.name = "Blaze".to_string();
        creature.special_ability_damage = 120;
        assert_eq!(machine.advance(&mut creature), AdvanceOutcome::Completed);
        assert_eq!(creature.special_ability_damage, 120);
    }

    #[test]
    fn answers_land_in_the_field_the_question_names() {
        let mut creature = CreatureData::default();

        let machine = machine_at(0);
        assert!(machine.record_answer(&mut creature, "Blaze"));
        assert_eq!(creature.name, "Blaze");

        let machine = machine_at(1);
        assert!(machine.record_answer(&mut creature, "electric"));
        assert_eq!(creature.element, MonsterType::Electric);
        assert!(!machine.record_answer(&mut creature, "granite"));
        assert_eq!(creature.element, MonsterType::Electric);

        let machine = machine_at(2);
        assert!(machine.record_answer(&mut creature, "60"));
        assert_eq!(creature.hp, 60);
        assert!(machine.record_answer(&mut creature, "lots"));
        assert_eq!(creature.hp, 0);
    }

    #[test]
    fn voice_appends_and_capitalizes_on_text_questions() {
        let mut creature = CreatureData::default();
        let machine = machine_at(4); // special ability, text

        assert!(machine.record_voice(&mut creature, "fire breath"));
        assert_eq!(creature.special_ability, "Fire breath");

        creature.special_ability = "Roars".to_string();
        assert!(machine.record_voice(&mut creature, "loudly"));
        assert_eq!(creature.special_ability, "Roars loudly");
    }

    #[test]
    fn voice_number_parse_failures_write_nothing() {
        let mut creature = CreatureData::default();
        let machine = machine_at(2); // hp, number
        assert!(!machine.record_voice(&mut creature, "fifty"));
        assert_eq!(creature.hp, 50);
        assert!(machine.record_voice(&mut creature, "I think 75 maybe"));
        assert_eq!(creature.hp, 75);
    }

    #[test]
    fn late_voice_results_after_navigation_are_dropped() {
        use crate::wizard::VoiceSubscription;

        let mut creature = CreatureData::default();
        let mut machine = machine_at(0); // name question
        let (subscription, handle) = VoiceSubscription::new();
        // The user moves on before the recognizer finishes.
        machine.advance(&mut creature);
        subscription.cancel();
        assert!(!handle.deliver("Blaze"));
        assert!(subscription.take().is_none());
        assert_eq!(creature.name, "");
    }

    #[test]
    fn voice_is_not_wired_to_the_element_select() {
        let mut creature = CreatureData::default();
        let machine = machine_at(1);
        assert!(!machine.record_voice(&mut creature, "Water"));
        assert_eq!(creature.element, MonsterType::Fire);
    }
}
