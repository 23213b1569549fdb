use crate::card::AbilityGraph;
use crate::game::zones::{ObjectId, PlayerId};
use serde::{Deserialize, Serialize};

/// A chosen target: an object or a player
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TargetRef {
    Object(ObjectId),
    Player(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackKind {
    Spell,
    Ability,
    #[serde(rename = "ability-graph", alias = "ability_graph")]
    AbilityGraph,
    #[serde(other)]
    Other,
}

/// Targets and ownership recorded when the spell or ability was put on the stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionContext {
    #[serde(default)]
    pub controller_id: Option<PlayerId>,
    #[serde(default)]
    pub source_id: Option<ObjectId>,
    #[serde(default)]
    pub targets: Vec<TargetRef>,
}

impl ResolutionContext {
    pub fn target_objects(&self) -> impl Iterator<Item = &ObjectId> {
        self.targets.iter().filter_map(|t| match t {
            TargetRef::Object(id) => Some(id),
            TargetRef::Player(_) => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackPayload {
    #[serde(default)]
    pub graph: Option<AbilityGraph>,
    #[serde(default)]
    pub context: Option<ResolutionContext>,
    #[serde(default)]
    pub source_object_id: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackItem {
    pub kind: StackKind,
    #[serde(default)]
    pub payload: StackPayload,
}

impl StackItem {
    /// The object that is the source of this spell or ability
    pub fn source_id(&self) -> Option<&ObjectId> {
        self.payload.source_object_id.as_ref().or_else(|| {
            self.payload
                .context
                .as_ref()
                .and_then(|c| c.source_id.as_ref())
        })
    }

    pub fn is_spell(&self) -> bool {
        self.kind == StackKind::Spell
    }
}
