use crate::card::Keyword;
use crate::game::combat::{assign_lethal_damage, lethal_threshold, CombatPass};
use crate::game::state::GameSnapshot;
use crate::game::zones::GameObjectSnapshot;
use crate::replacement::conflict::ConflictEntry;
use crate::replacement::effects::EffectIndex;

/// Conflicts over combat damage about to be dealt in the current pass.
/// Empty outside the combat damage step.
pub fn combat_damage_conflicts(snapshot: &GameSnapshot) -> Vec<ConflictEntry> {
    let mut entries = Vec::new();
    if !snapshot.turn.step.is_combat_damage() {
        return entries;
    }
    let Some(combat) = snapshot.combat() else {
        return entries;
    };

    let index = EffectIndex::new(snapshot);
    let pass = CombatPass::current(snapshot, combat);
    let defender = combat.defending_player_id.as_ref();

    for attacker in combat.attackers.iter().filter_map(|id| snapshot.object(id)) {
        // Damage the attacker deals needs it in this pass; damage its blockers
        // deal back needs only them.
        let strikes = pass.includes(attacker);
        let redirects = index.redirects_from(&attacker.id);
        let declared = combat.blockers_of(&attacker.id);

        if declared.is_empty() {
            if let (true, Some(player)) = (strikes, defender) {
                entries.extend(ConflictEntry::new(
                    format!("combat:{}:player:{}", attacker.id, player),
                    format!(
                        "Combat damage from {} to player {}",
                        attacker.display_name(),
                        player
                    ),
                    redirects.iter().copied().chain(index.preventions_for_player(player)),
                ));
            }
            continue;
        }

        let blockers: Vec<&GameObjectSnapshot> =
            declared.iter().filter_map(|id| snapshot.object(id)).collect();

        for blocker in &blockers {
            if strikes {
                entries.extend(ConflictEntry::new(
                    format!("combat:{}:blocker:{}", attacker.id, blocker.id),
                    format!(
                        "Combat damage from {} to {}",
                        attacker.display_name(),
                        blocker.display_name()
                    ),
                    redirects
                        .iter()
                        .copied()
                        .chain(index.preventions_for_object(&blocker.id)),
                ));
            }
            if pass.includes(blocker) {
                entries.extend(ConflictEntry::new(
                    format!("combat:{}:attacker:{}", blocker.id, attacker.id),
                    format!(
                        "Combat damage from {} to {}",
                        blocker.display_name(),
                        attacker.display_name()
                    ),
                    index
                        .redirects_from(&blocker.id)
                        .into_iter()
                        .chain(index.preventions_for_object(&attacker.id)),
                ));
            }
        }

        if !strikes || !attacker.has_keyword(Keyword::Trample) {
            continue;
        }
        let deathtouch = attacker.has_keyword(Keyword::Deathtouch);
        let thresholds: Vec<u32> = blockers
            .iter()
            .map(|b| lethal_threshold(b, deathtouch))
            .collect();
        let assignment = assign_lethal_damage(attacker.combat_power(), &thresholds);

        if let (Some(player), true) = (defender, assignment.overflow > 0) {
            entries.extend(ConflictEntry::new(
                format!("combat:{}:trample:{}", attacker.id, player),
                format!(
                    "{} trample damage from {} to player {}",
                    assignment.overflow,
                    attacker.display_name(),
                    player
                ),
                redirects.iter().copied().chain(index.preventions_for_player(player)),
            ));
        }
    }

    entries
}
