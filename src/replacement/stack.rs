use crate::game::stack::TargetRef;
use crate::game::state::GameSnapshot;
use crate::replacement::conflict::ConflictEntry;
use crate::replacement::effects::EffectIndex;
use crate::replacement::{object_name, target_name};

/// Damage spells and abilities waiting on the stack whose damage to a recorded
/// target could be redirected or prevented in more than one way.
pub fn stack_damage_conflicts(snapshot: &GameSnapshot) -> Vec<ConflictEntry> {
    let index = EffectIndex::new(snapshot);
    let mut entries = Vec::new();

    for (position, item) in snapshot.stack.iter().enumerate() {
        let deals_damage = item
            .payload
            .graph
            .as_ref()
            .is_some_and(|g| g.has_effect("damage"));
        let Some(context) = item.payload.context.as_ref().filter(|_| deals_damage) else {
            continue;
        };

        let source = item.source_id();
        let redirects = source
            .map(|id| index.redirects_from(id))
            .unwrap_or_default();
        let source_label = source
            .map(|id| object_name(snapshot, id))
            .unwrap_or_else(|| format!("stack item {}", position));
        let source_key = source.map(|id| id.0.as_str()).unwrap_or("-");

        for target in &context.targets {
            if let TargetRef::Object(id) = target {
                if snapshot.object(id).is_none() {
                    continue;
                }
            }
            let effects = redirects
                .iter()
                .copied()
                .chain(index.preventions_for(target));
            let target_key = match target {
                TargetRef::Object(id) => format!("object:{}", id),
                TargetRef::Player(id) => format!("player:{}", id),
            };
            entries.extend(ConflictEntry::new(
                format!("stack:{}:{}:{}", position, source_key, target_key),
                format!(
                    "Damage from {} to {}",
                    source_label,
                    target_name(snapshot, target)
                ),
                effects,
            ));
        }
    }

    entries
}
