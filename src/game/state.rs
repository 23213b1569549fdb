use crate::game::combat::CombatState;
use crate::game::mana::ManaPool;
use crate::game::stack::StackItem;
use crate::game::zones::{GameObjectSnapshot, ObjectId, PlayerId, Zone};
use crate::replacement::effects::ReplacementEffect;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Deserialize a list, dropping records that don't parse instead of failing
/// the whole snapshot. A missing or null list reads as empty.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    let raw = raw.unwrap_or_default();
    let total = raw.len();
    let parsed: Vec<T> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if parsed.len() < total {
        debug!(dropped = total - parsed.len(), "skipped malformed records");
    }
    Ok(parsed)
}

/// Turn steps as reported by the rules engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    PrecombatMain,
    BeginningOfCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndOfCombat,
    PostcombatMain,
    End,
    Cleanup,
    #[default]
    #[serde(other)]
    Other,
}

impl Step {
    pub fn is_combat_damage(&self) -> bool {
        matches!(self, Step::CombatDamage)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    #[serde(default)]
    pub step: Step,
    #[serde(default)]
    pub active_player_id: Option<PlayerId>,
    #[serde(default)]
    pub combat_state: Option<CombatState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    #[serde(default)]
    pub life: i32,
    #[serde(default)]
    pub mana_pool: ManaPool,
}

/// Complete, immutable game state supplied by the rules engine after each action.
///
/// A new snapshot replaces the previous one wholesale; nothing in this crate
/// mutates one in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default)]
    pub players: Vec<PlayerSnapshot>,
    #[serde(default)]
    pub objects: Vec<GameObjectSnapshot>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub stack: Vec<StackItem>,
    #[serde(default)]
    pub turn: TurnState,
    #[serde(default, deserialize_with = "lenient_list")]
    pub replacement_effects: Vec<ReplacementEffect>,
}

impl GameSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: &str) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn object(&self, id: &ObjectId) -> Option<&GameObjectSnapshot> {
        self.objects.iter().find(|o| &o.id == id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn battlefield(&self) -> impl Iterator<Item = &GameObjectSnapshot> {
        self.objects.iter().filter(|o| o.zone == Zone::Battlefield)
    }

    /// Objects that back a spell currently on the stack, in stack order
    pub fn spell_objects(&self) -> Vec<&GameObjectSnapshot> {
        self.stack
            .iter()
            .filter(|item| item.is_spell())
            .filter_map(|item| item.source_id())
            .filter_map(|id| self.object(id))
            .collect()
    }

    pub fn combat(&self) -> Option<&CombatState> {
        self.turn.combat_state.as_ref()
    }
}
