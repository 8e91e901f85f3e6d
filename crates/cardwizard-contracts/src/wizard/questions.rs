use crate::creature::CreatureData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Select,
    Number,
    Textarea,
}

/// The creature field a question writes. Each question touches exactly one
/// field; the only cross-field effect in the whole interview is the damage
/// fallback applied at completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Element,
    Hp,
    SketchFeatures,
    SpecialAbility,
    Description,
}

impl Field {
    pub fn read(&self, creature: &CreatureData) -> String {
        match self {
            Field::Name => creature.name.clone(),
            Field::Element => creature.element.label().to_string(),
            Field::Hp => creature.hp.to_string(),
            Field::SketchFeatures => creature.sketch_features.clone(),
            Field::SpecialAbility => creature.special_ability.clone(),
            Field::Description => creature.description.clone(),
        }
    }

    pub fn write_text(&self, creature: &mut CreatureData, value: String) {
        match self {
            Field::Name => creature.name = value,
            Field::SketchFeatures => creature.sketch_features = value,
            Field::SpecialAbility => creature.special_ability = value,
            Field::Description => creature.description = value,
            Field::Element | Field::Hp => {}
        }
    }

    pub fn write_number(&self, creature: &mut CreatureData, value: i64) {
        if matches!(self, Field::Hp) {
            creature.hp = value;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuestionSpec {
    pub field: Field,
    pub question: &'static str,
    pub helper: &'static str,
    pub kind: InputKind,
    pub options: &'static [&'static str],
}

pub const INTERVIEW_QUESTIONS: &[QuestionSpec] = &[
    QuestionSpec {
        field: Field::Name,
        question: "What is this creature's name?",
        helper: "Every hero needs a cool name!",
        kind: InputKind::Text,
        options: &[],
    },
    QuestionSpec {
        field: Field::Element,
        question: "What element is it?",
        helper: "Does it like fire, water, or maybe electricity?",
        kind: InputKind::Select,
        options: &[
            "Fire",
            "Water",
            "Grass",
            "Electric",
            "Psychic",
            "Fighting",
            "Darkness",
            "Metal",
            "Fairy",
            "Dragon",
        ],
    },
    QuestionSpec {
        field: Field::Hp,
        question: "How much health (HP) does it have?",
        helper: "Is it a tiny baby (30-50) or a giant boss (100+)?",
        kind: InputKind::Number,
        options: &[],
    },
    QuestionSpec {
        field: Field::SketchFeatures,
        question: "Look at your drawing. What are the specific shapes?",
        helper: "Example: 'The circles are eyes', 'The scribble in the middle is energy', 'The triangles are spikes'.",
        kind: InputKind::Textarea,
        options: &[],
    },
    QuestionSpec {
        field: Field::SpecialAbility,
        question: "What is its super power attack?",
        helper: "Does it shoot lasers? Roll fast? Sing a sleepy song?",
        kind: InputKind::Text,
        options: &[],
    },
    QuestionSpec {
        field: Field::Description,
        question: "Tell me a fun fact about where it lives!",
        helper: "Does it hide in volcanoes? Sleep in clouds?",
        kind: InputKind::Textarea,
        options: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::MonsterType;

    #[test]
    fn catalog_lists_six_questions_in_interview_order() {
        let fields: Vec<Field> = INTERVIEW_QUESTIONS.iter().map(|q| q.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Element,
                Field::Hp,
                Field::SketchFeatures,
                Field::SpecialAbility,
                Field::Description,
            ]
        );
    }

    #[test]
    fn element_options_match_the_monster_type_enum() {
        let question = INTERVIEW_QUESTIONS
            .iter()
            .find(|q| q.field == Field::Element)
            .unwrap();
        assert_eq!(question.kind, InputKind::Select);
        let labels: Vec<&str> = MonsterType::ALL.iter().map(|kind| kind.label()).collect();
        assert_eq!(question.options, labels.as_slice());
    }

    #[test]
    fn field_accessors_target_exactly_one_field() {
        let mut creature = CreatureData::default();
        Field::Name.write_text(&mut creature, "Blaze".to_string());
        Field::Hp.write_number(&mut creature, 60);
        assert_eq!(creature.name, "Blaze");
        assert_eq!(creature.hp, 60);
        assert_eq!(creature.description, "");

        // Number writes are ignored by text fields and vice versa.
        Field::Name.write_number(&mut creature, 99);
        Field::Hp.write_text(&mut creature, "oops".to_string());
        assert_eq!(creature.name, "Blaze");
        assert_eq!(creature.hp, 60);

        assert_eq!(Field::Hp.read(&creature), "60");
        assert_eq!(Field::Element.read(&creature), "Fire");
    }
}
