use crate::game::state::GameSnapshot;
use crate::game::zones::ObjectId;
use crate::replacement::conflict::ConflictEntry;
use crate::replacement::effects::EffectIndex;
use crate::replacement::object_name;

/// Sources that some redirect effect applies to, in first-seen order
fn redirected_sources(snapshot: &GameSnapshot) -> Vec<&ObjectId> {
    let mut sources: Vec<&ObjectId> = Vec::new();
    let global = snapshot
        .replacement_effects
        .iter()
        .filter_map(|e| e.as_redirect())
        .filter_map(|r| r.source_id.as_ref());
    let local = snapshot
        .objects
        .iter()
        .filter(|o| o.local_effects().iter().any(|e| e.as_redirect().is_some()))
        .map(|o| &o.id);

    for source in global.chain(local) {
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

/// Non-combat damage conflicts: per redirected source, per shielded player, and
/// per object carrying several prevention shields.
pub fn damage_conflicts(snapshot: &GameSnapshot) -> Vec<ConflictEntry> {
    let index = EffectIndex::new(snapshot);
    let mut entries = Vec::new();

    for source in redirected_sources(snapshot) {
        let effects = index
            .redirects_from(source)
            .into_iter()
            .chain(index.preventions_from(source));
        entries.extend(ConflictEntry::new(
            format!("damage:source:{}", source),
            format!("Damage dealt by {}", object_name(snapshot, source)),
            effects,
        ));
    }

    for player in &snapshot.players {
        entries.extend(ConflictEntry::new(
            format!("damage:player:{}", player.id),
            format!("Damage dealt to player {}", player.id),
            index.preventions_for_player(&player.id),
        ));
    }

    for object in &snapshot.objects {
        entries.extend(ConflictEntry::new(
            format!("damage:object:{}", object.id),
            format!("Damage dealt to {}", object.display_name()),
            index.preventions_for_object(&object.id),
        ));
    }

    entries
}
