mod colors;
mod data;

pub use colors::{catalog_color, ColorSpec, COLOR_CATALOG, MAX_SELECTED_COLORS, MIN_SELECTED_COLORS};
pub use data::{ColorHarmony, CreatureData, MonsterType};
