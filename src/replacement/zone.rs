use crate::game::state::GameSnapshot;
use crate::game::zones::{GameObjectSnapshot, Zone};
use crate::replacement::conflict::ConflictEntry;
use crate::replacement::effects::ReplacementEffect;

/// Zone-change effects bearing on one object, grouped by the `(from, to)`
/// move they replace, in first-seen order.
fn grouped_effects<'a>(
    snapshot: &'a GameSnapshot,
    object: &'a GameObjectSnapshot,
) -> Vec<((Zone, Zone), Vec<&'a ReplacementEffect>)> {
    let local = object.local_effects().iter();
    let global = snapshot.replacement_effects.iter().filter(|e| {
        e.as_zone_change()
            .is_some_and(|z| z.object_id.as_ref().map_or(true, |id| id == &object.id))
    });

    let mut groups: Vec<((Zone, Zone), Vec<&ReplacementEffect>)> = Vec::new();
    for effect in local.chain(global) {
        let Some(zone) = effect.as_zone_change() else {
            continue;
        };
        let (Some(from), Some(to), Some(_)) = (zone.from_zone, zone.to_zone, zone.replacement_zone)
        else {
            continue;
        };
        match groups.iter_mut().find(|(move_, _)| *move_ == (from, to)) {
            Some((_, effects)) => effects.push(effect),
            None => groups.push(((from, to), vec![effect])),
        }
    }
    groups
}

/// Objects with two or more replacements for the same zone change
pub fn zone_change_conflicts(snapshot: &GameSnapshot) -> Vec<ConflictEntry> {
    let mut entries = Vec::new();
    for object in &snapshot.objects {
        for ((from, to), effects) in grouped_effects(snapshot, object) {
            let key = format!("zone:{}:{:?}:{:?}", object.id, from, to);
            let label = format!(
                "{} would move from {} to {}",
                object.display_name(),
                from,
                to
            );
            entries.extend(ConflictEntry::new(key, label, effects));
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_with(global: serde_json::Value, local: serde_json::Value) -> GameSnapshot {
        serde_json::from_value(json!({
            "objects": [{"id": "o1", "name": "Grizzly Bears", "zone": "battlefield", "temporary_effects": local}],
            "replacement_effects": global
        }))
        .unwrap()
    }

    fn to_exile(id: &str) -> serde_json::Value {
        json!({"type": "replace_zone_change", "id": id, "object_id": "o1",
               "from_zone": "battlefield", "to_zone": "graveyard", "replacement_zone": "exile"})
    }

    #[test]
    fn test_single_effect_is_not_reported() {
        let snapshot = snapshot_with(json!([to_exile("rz1")]), json!([]));
        assert!(zone_change_conflicts(&snapshot).is_empty());
    }

    #[test]
    fn test_second_effect_for_same_move_is_reported() {
        let local = json!([{"type": "replace_zone_change", "id": "rz2",
            "from_zone": "battlefield", "to_zone": "graveyard", "replacement_zone": "hand"}]);
        let snapshot = snapshot_with(json!([to_exile("rz1")]), local);

        let entries = zone_change_conflicts(&snapshot);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "zone:o1:Battlefield:Graveyard");
        assert_eq!(entries[0].label(), "Grizzly Bears would move from battlefield to graveyard");
        let ids: Vec<_> = entries[0].options().iter().map(|o| o.effect_id.as_str()).collect();
        assert_eq!(ids, vec!["rz2", "rz1"]);
    }

    #[test]
    fn test_different_moves_do_not_conflict() {
        let other_move = json!({"type": "replace_zone_change", "id": "rz2", "object_id": "o1",
            "from_zone": "battlefield", "to_zone": "hand", "replacement_zone": "exile"});
        let snapshot = snapshot_with(json!([to_exile("rz1"), other_move]), json!([]));
        assert!(zone_change_conflicts(&snapshot).is_empty());
    }

    #[test]
    fn test_effect_for_other_object_ignored() {
        let other = json!({"type": "replace_zone_change", "id": "rz2", "object_id": "o2",
            "from_zone": "battlefield", "to_zone": "graveyard", "replacement_zone": "exile"});
        let snapshot = snapshot_with(json!([to_exile("rz1"), other]), json!([]));
        assert!(zone_change_conflicts(&snapshot).is_empty());
    }

    #[test]
    fn test_incomplete_effect_excluded() {
        let incomplete = json!({"type": "replace_zone_change", "id": "rz2", "object_id": "o1",
            "from_zone": "battlefield", "to_zone": "graveyard"});
        let snapshot = snapshot_with(json!([to_exile("rz1"), incomplete]), json!([]));
        assert!(zone_change_conflicts(&snapshot).is_empty());
    }

    #[test]
    fn test_unscoped_global_effect_applies_to_every_object() {
        let anywhere = json!({"type": "replace_zone_change", "id": "rest-in-peace",
            "from_zone": "battlefield", "to_zone": "graveyard", "replacement_zone": "exile"});
        let snapshot = snapshot_with(json!([to_exile("rz1"), anywhere]), json!([]));
        assert_eq!(zone_change_conflicts(&snapshot).len(), 1);
    }
}
