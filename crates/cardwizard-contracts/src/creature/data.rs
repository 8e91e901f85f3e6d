use serde::{Deserialize, Serialize};

/// Elemental type printed on the card frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterType {
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Fighting,
    Darkness,
    Metal,
    Fairy,
    Dragon,
}

impl MonsterType {
    pub const ALL: [MonsterType; 10] = [
        MonsterType::Fire,
        MonsterType::Water,
        MonsterType::Grass,
        MonsterType::Electric,
        MonsterType::Psychic,
        MonsterType::Fighting,
        MonsterType::Darkness,
        MonsterType::Metal,
        MonsterType::Fairy,
        MonsterType::Dragon,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MonsterType::Fire => "Fire",
            MonsterType::Water => "Water",
            MonsterType::Grass => "Grass",
            MonsterType::Electric => "Electric",
            MonsterType::Psychic => "Psychic",
            MonsterType::Fighting => "Fighting",
            MonsterType::Darkness => "Darkness",
            MonsterType::Metal => "Metal",
            MonsterType::Fairy => "Fairy",
            MonsterType::Dragon => "Dragon",
        }
    }

    pub fn parse(raw: &str) -> Option<MonsterType> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(needle))
    }
}

impl std::fmt::Display for MonsterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Policy the renderer follows when combining the selected colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorHarmony {
    Harmonize,
    Contrast,
    #[serde(rename = "Surprise Me")]
    SurpriseMe,
}

impl ColorHarmony {
    pub const ALL: [ColorHarmony; 3] = [
        ColorHarmony::Harmonize,
        ColorHarmony::Contrast,
        ColorHarmony::SurpriseMe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColorHarmony::Harmonize => "Harmonize",
            ColorHarmony::Contrast => "Contrast",
            ColorHarmony::SurpriseMe => "Surprise Me",
        }
    }

    pub fn parse(raw: &str) -> Option<ColorHarmony> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|harmony| harmony.label().eq_ignore_ascii_case(needle))
    }
}

impl std::fmt::Display for ColorHarmony {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the wizard collects about one creature. A single live instance
/// exists per session, owned by the orchestrator; steps receive it as a
/// controlled `&mut` and only touch the fields their question names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureData {
    pub name: String,
    pub element: MonsterType,
    pub hp: i64,
    pub description: String,
    pub special_ability: String,
    pub special_ability_damage: i64,
    /// Data URI or raw base64 of the confirmed sketch photo. `None` until
    /// the upload step completes; never cleared again within the session.
    pub sketch_base64: Option<String>,
    pub sketch_features: String,
    /// Set-like, insertion order preserved, capped at 3 entries.
    pub selected_colors: Vec<String>,
    pub color_harmony: ColorHarmony,
}

impl Default for CreatureData {
    fn default() -> Self {
        Self {
            name: String::new(),
            element: MonsterType::Fire,
            hp: 50,
            description: String::new(),
            special_ability: String::new(),
            special_ability_damage: 40,
            sketch_base64: None,
            sketch_features: String::new(),
            selected_colors: Vec::new(),
            color_harmony: ColorHarmony::Harmonize,
        }
    }
}

impl CreatureData {
    pub fn has_sketch(&self) -> bool {
        self.sketch_base64
            .as_deref()
            .map(|encoded| !encoded.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let creature = CreatureData::default();
        assert_eq!(creature.name, "");
        assert_eq!(creature.element, MonsterType::Fire);
        assert_eq!(creature.hp, 50);
        assert_eq!(creature.special_ability_damage, 40);
        assert!(creature.sketch_base64.is_none());
        assert!(creature.selected_colors.is_empty());
        assert_eq!(creature.color_harmony, ColorHarmony::Harmonize);
    }

    #[test]
    fn monster_type_parse_is_case_insensitive() {
        assert_eq!(MonsterType::parse("fire"), Some(MonsterType::Fire));
        assert_eq!(MonsterType::parse(" DRAGON "), Some(MonsterType::Dragon));
        assert_eq!(MonsterType::parse("rock"), None);
    }

    #[test]
    fn harmony_round_trips_through_display_labels() {
        for harmony in ColorHarmony::ALL {
            assert_eq!(ColorHarmony::parse(harmony.label()), Some(harmony));
        }
        assert_eq!(ColorHarmony::SurpriseMe.label(), "Surprise Me");
    }

    #[test]
    fn serde_keeps_surprise_me_label() -> anyhow::Result<()> {
        let raw = serde_json::to_string(&ColorHarmony::SurpriseMe)?;
        assert_eq!(raw, "\"Surprise Me\"");
        let parsed: ColorHarmony = serde_json::from_str(&raw)?;
        assert_eq!(parsed, ColorHarmony::SurpriseMe);
        Ok(())
    }
}
