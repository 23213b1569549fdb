//! Detection of events that two or more replacement, prevention, or
//! redirection effects want to modify, so the player can pick which applies.

pub mod combat;
pub mod conflict;
pub mod damage;
pub mod effects;
pub mod stack;
pub mod zone;

pub use combat::combat_damage_conflicts;
pub use conflict::{ConflictEntry, ConflictOption, OptionAction};
pub use damage::damage_conflicts;
pub use effects::{DamagePrevention, DamageRedirect, ReplacementEffect, ZoneChangeReplacement};
pub use stack::stack_damage_conflicts;
pub use zone::zone_change_conflicts;

use crate::game::stack::TargetRef;
use crate::game::state::GameSnapshot;
use crate::game::zones::ObjectId;
use tracing::debug;

pub(crate) fn object_name(snapshot: &GameSnapshot, id: &ObjectId) -> String {
    snapshot
        .object(id)
        .map(|o| o.display_name().to_string())
        .unwrap_or_else(|| id.to_string())
}

pub(crate) fn target_name(snapshot: &GameSnapshot, target: &TargetRef) -> String {
    match target {
        TargetRef::Object(id) => object_name(snapshot, id),
        TargetRef::Player(id) => format!("player {}", id),
    }
}

/// Every conflict the player must resolve in this snapshot: zone changes,
/// non-combat damage, damage from the stack, then live combat damage.
pub fn detect_conflicts(snapshot: &GameSnapshot) -> Vec<ConflictEntry> {
    let zone = zone_change_conflicts(snapshot);
    let damage = damage_conflicts(snapshot);
    let stack = stack_damage_conflicts(snapshot);
    let combat = combat_damage_conflicts(snapshot);
    debug!(
        zone = zone.len(),
        damage = damage.len(),
        stack = stack.len(),
        combat = combat.len(),
        "replacement conflicts detected"
    );

    let mut entries = zone;
    entries.extend(damage);
    entries.extend(stack);
    entries.extend(combat);
    entries
}
