use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mana colors in Magic: The Gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManaColor {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "C")]
    Colorless,
}

impl ManaColor {
    /// The five colors, in WUBRG order
    pub const COLORS: [ManaColor; 5] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    /// Order in which leftover pool mana is spent on generic requirements
    pub const GENERIC_ORDER: [ManaColor; 6] = [
        ManaColor::Colorless,
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    /// Convert to the single character representation
    pub fn to_char(&self) -> char {
        match self {
            ManaColor::White => 'W',
            ManaColor::Blue => 'U',
            ManaColor::Black => 'B',
            ManaColor::Red => 'R',
            ManaColor::Green => 'G',
            ManaColor::Colorless => 'C',
        }
    }

    pub fn from_char(c: char) -> Option<ManaColor> {
        match c.to_ascii_uppercase() {
            'W' => Some(ManaColor::White),
            'U' => Some(ManaColor::Blue),
            'B' => Some(ManaColor::Black),
            'R' => Some(ManaColor::Red),
            'G' => Some(ManaColor::Green),
            'C' => Some(ManaColor::Colorless),
            _ => None,
        }
    }
}

impl fmt::Display for ManaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Structured mana cost of a spell or ability.
///
/// `hybrids` are `{A/B}` symbols, `two_brids` are `{N/C}` symbols payable with
/// one mana of the color or N generic, and `phyrexian` symbols are payable with
/// one mana of the color or 2 life.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaCost {
    #[serde(default)]
    pub generic: u32,
    #[serde(default)]
    pub colorless: u32,
    #[serde(default)]
    pub colored: BTreeMap<ManaColor, u32>,
    #[serde(default)]
    pub hybrids: Vec<(ManaColor, ManaColor)>,
    #[serde(default)]
    pub two_brids: Vec<(u32, ManaColor)>,
    #[serde(default)]
    pub phyrexian: Vec<ManaColor>,
}

impl ManaCost {
    /// Colored requirement for one of the five colors. A `C` entry in the
    /// colored map counts toward the colorless requirement instead.
    pub fn colored_required(&self, color: ManaColor) -> u32 {
        if color == ManaColor::Colorless {
            return 0;
        }
        self.colored.get(&color).copied().unwrap_or(0)
    }

    pub fn colorless_required(&self) -> u32 {
        self.colorless + self.colored.get(&ManaColor::Colorless).copied().unwrap_or(0)
    }

    /// Whether the cost has any symbol that needs an explicit payment choice
    pub fn is_complex(&self) -> bool {
        !self.hybrids.is_empty() || !self.two_brids.is_empty() || !self.phyrexian.is_empty()
    }

    /// Total mana required by the simple (non-choice) components
    pub fn total_value(&self) -> u32 {
        let colored: u32 = ManaColor::COLORS
            .iter()
            .map(|c| self.colored_required(*c))
            .sum();
        colored + self.colorless_required() + self.generic
    }
}

/// Card types an object can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Land,
    Creature,
    Artifact,
    Enchantment,
    Planeswalker,
    Battle,
    Instant,
    Sorcery,
    #[serde(other)]
    Other,
}

/// Keywords the assistance layer cares about. Anything else is kept as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Trample,
    #[serde(other)]
    Other,
}
