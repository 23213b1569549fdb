use crate::card::{Keyword, ObjectType};
use crate::game::state::lenient_list;
use crate::replacement::effects::ReplacementEffect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-assigned object identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

/// Engine-assigned player identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId(s.to_string())
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

/// Game zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Stack,
    Exile,
    Command,
    #[serde(other)]
    Other,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Library => "library",
            Zone::Hand => "hand",
            Zone::Battlefield => "battlefield",
            Zone::Graveyard => "graveyard",
            Zone::Stack => "stack",
            Zone::Exile => "exile",
            Zone::Command => "command zone",
            Zone::Other => "unknown zone",
        };
        f.write_str(name)
    }
}

/// An object as the rules engine last reported it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObjectSnapshot {
    pub id: ObjectId,
    pub zone: Zone,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<PlayerId>,
    #[serde(default)]
    pub controller_id: Option<PlayerId>,
    #[serde(default)]
    pub types: Vec<ObjectType>,
    #[serde(default)]
    pub power: Option<i32>,
    #[serde(default)]
    pub toughness: Option<i32>,
    #[serde(default)]
    pub damage: u32,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub temporary_effects: Vec<ReplacementEffect>,
}

impl GameObjectSnapshot {
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn has_type(&self, object_type: ObjectType) -> bool {
        self.types.contains(&object_type)
    }

    /// Name for labels, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id.0)
    }

    /// Power clamped at zero, as combat damage is dealt
    pub fn combat_power(&self) -> u32 {
        self.power.unwrap_or(0).max(0) as u32
    }

    /// Damage still needed to destroy this creature
    pub fn remaining_toughness(&self) -> u32 {
        let toughness = self.toughness.unwrap_or(0) as i64;
        (toughness - self.damage as i64).max(0) as u32
    }

    pub fn local_effects(&self) -> &[ReplacementEffect] {
        &self.temporary_effects
    }
}
