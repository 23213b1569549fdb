//! Combat bookkeeping: which creatures deal damage in the current pass and how
//! an attacker's damage is assigned across its ordered blockers.

use crate::card::Keyword;
use crate::game::state::GameSnapshot;
use crate::game::zones::{GameObjectSnapshot, ObjectId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    #[serde(default)]
    pub attackers: Vec<ObjectId>,
    /// Attacker -> blockers in damage assignment order
    #[serde(default)]
    pub blockers: BTreeMap<ObjectId, Vec<ObjectId>>,
    #[serde(default)]
    pub defending_player_id: Option<PlayerId>,
    #[serde(default)]
    pub first_strike_resolved: bool,
}

impl CombatState {
    pub fn blockers_of(&self, attacker: &ObjectId) -> &[ObjectId] {
        self.blockers.get(attacker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Attackers followed by every declared blocker
    fn combatants(&self) -> impl Iterator<Item = &ObjectId> {
        self.attackers.iter().chain(self.blockers.values().flatten())
    }
}

/// Which combat damage pass is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPass {
    /// No creature in combat has first strike or double strike
    Single,
    FirstStrike,
    Regular,
}

impl CombatPass {
    /// Work out the current pass from the combat state and the combatants' keywords
    pub fn current(snapshot: &GameSnapshot, combat: &CombatState) -> CombatPass {
        let split = combat
            .combatants()
            .filter_map(|id| snapshot.object(id))
            .any(|o| o.has_keyword(Keyword::FirstStrike) || o.has_keyword(Keyword::DoubleStrike));

        if !split {
            CombatPass::Single
        } else if combat.first_strike_resolved {
            CombatPass::Regular
        } else {
            CombatPass::FirstStrike
        }
    }

    /// Whether a creature deals combat damage in this pass
    pub fn includes(&self, creature: &GameObjectSnapshot) -> bool {
        let first = creature.has_keyword(Keyword::FirstStrike);
        let double = creature.has_keyword(Keyword::DoubleStrike);
        match self {
            CombatPass::Single => true,
            CombatPass::FirstStrike => first || double,
            CombatPass::Regular => !first,
        }
    }
}

/// Damage needed for a blocker to count as lethally damaged
pub fn lethal_threshold(blocker: &GameObjectSnapshot, attacker_has_deathtouch: bool) -> u32 {
    if attacker_has_deathtouch {
        1
    } else {
        blocker.remaining_toughness()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LethalAssignment {
    /// Damage assigned to each blocker, in blocker order
    pub assigned: Vec<u32>,
    /// Damage left after every blocker received its lethal threshold
    pub overflow: u32,
}

/// Assign an attacker's power across ordered blockers, each receiving at most
/// its lethal threshold before the next one is considered.
pub fn assign_lethal_damage(power: u32, thresholds: &[u32]) -> LethalAssignment {
    let mut remaining = power;
    let assigned = thresholds
        .iter()
        .map(|threshold| {
            let dealt = remaining.min(*threshold);
            remaining -= dealt;
            dealt
        })
        .collect();

    LethalAssignment {
        assigned,
        overflow: remaining,
    }
}
