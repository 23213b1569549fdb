use crate::card::{AbilityGraph, EffectNode, GraphVisitor, ObjectType, TargetDiscriminator};
use crate::game::state::{GameSnapshot, PlayerSnapshot};
use crate::game::zones::{GameObjectSnapshot, Zone};
use serde::Serialize;
use std::collections::BTreeSet;

/// What the ability being prepared may target, derived from its effect nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetHints {
    pub allow_objects: bool,
    pub allow_players: bool,
    /// Permitted object types; empty means any type
    pub object_types: BTreeSet<ObjectType>,
    /// Spells on the stack are the candidate objects
    pub target_spells: bool,
}

/// Whether candidate objects come from the battlefield or the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    Objects,
    Spells,
}

#[derive(Default)]
struct TargetScan {
    objects: bool,
    players: bool,
    spells: bool,
    unrestricted: bool,
    types: BTreeSet<ObjectType>,
}

impl TargetScan {
    fn restrict(&mut self, object_type: ObjectType) {
        self.objects = true;
        self.types.insert(object_type);
    }
}

impl GraphVisitor for TargetScan {
    fn visit_effect(&mut self, node: &EffectNode) {
        let Some(target) = node.target else {
            return;
        };
        match target {
            TargetDiscriminator::Any => {
                self.objects = true;
                self.players = true;
                self.unrestricted = true;
            }
            TargetDiscriminator::Permanent => {
                self.objects = true;
                self.unrestricted = true;
            }
            TargetDiscriminator::Creature => self.restrict(ObjectType::Creature),
            TargetDiscriminator::Planeswalker => self.restrict(ObjectType::Planeswalker),
            TargetDiscriminator::Artifact => self.restrict(ObjectType::Artifact),
            TargetDiscriminator::Enchantment => self.restrict(ObjectType::Enchantment),
            TargetDiscriminator::Player => self.players = true,
            TargetDiscriminator::Spell => self.spells = true,
            TargetDiscriminator::SelfRef | TargetDiscriminator::Unrecognized => {}
        }
    }
}

impl TargetHints {
    /// Scan the graph's effect nodes and merge what each one may target
    pub fn derive(graph: &AbilityGraph) -> Self {
        let mut scan = TargetScan::default();
        graph.walk(&mut scan);

        TargetHints {
            allow_objects: scan.objects,
            allow_players: scan.players,
            object_types: if scan.unrestricted {
                BTreeSet::new()
            } else {
                scan.types
            },
            target_spells: scan.spells,
        }
    }

    pub fn mode(&self) -> TargetingMode {
        if self.target_spells {
            TargetingMode::Spells
        } else {
            TargetingMode::Objects
        }
    }

    fn type_allowed(&self, object: &GameObjectSnapshot) -> bool {
        self.object_types.is_empty() || object.types.iter().any(|t| self.object_types.contains(t))
    }

    /// Whether the object may currently be chosen as a target
    pub fn admits_object(&self, object: &GameObjectSnapshot, snapshot: &GameSnapshot) -> bool {
        let on_battlefield =
            self.allow_objects && object.zone == Zone::Battlefield && self.type_allowed(object);
        let spell = self.target_spells
            && object.zone == Zone::Stack
            && snapshot.spell_objects().iter().any(|s| s.id == object.id);
        on_battlefield || spell
    }

    /// Candidate objects in snapshot order: filtered battlefield permanents,
    /// then spells on the stack when spells are targeted
    pub fn candidate_objects<'a>(&self, snapshot: &'a GameSnapshot) -> Vec<&'a GameObjectSnapshot> {
        let mut candidates: Vec<&GameObjectSnapshot> = Vec::new();
        if self.allow_objects {
            candidates.extend(snapshot.battlefield().filter(|o| self.type_allowed(o)));
        }
        if self.target_spells {
            candidates.extend(snapshot.spell_objects());
        }
        candidates
    }

    pub fn candidate_players<'a>(&self, snapshot: &'a GameSnapshot) -> Vec<&'a PlayerSnapshot> {
        if self.allow_players {
            snapshot.players.iter().collect()
        } else {
            Vec::new()
        }
    }
}
