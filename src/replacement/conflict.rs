use crate::game::stack::TargetRef;
use crate::game::zones::Zone;
use crate::replacement::effects::ReplacementEffect;
use serde::Serialize;
use std::collections::HashSet;

/// What choosing an option would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OptionAction {
    ZoneChange { to: Option<Zone> },
    Redirect { to: Option<TargetRef> },
    Prevent { amount: Option<u32> },
}

/// One competing effect the player can choose to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictOption {
    pub effect_id: String,
    pub description: String,
    #[serde(flatten)]
    pub action: OptionAction,
}

impl From<&ReplacementEffect> for ConflictOption {
    fn from(effect: &ReplacementEffect) -> Self {
        let action = match effect {
            ReplacementEffect::ReplaceZoneChange(e) => OptionAction::ZoneChange {
                to: e.replacement_zone,
            },
            ReplacementEffect::RedirectDamage(e) => OptionAction::Redirect {
                to: e.redirect_to.clone(),
            },
            ReplacementEffect::PreventDamage(e) => OptionAction::Prevent { amount: e.amount },
        };
        ConflictOption {
            effect_id: effect.identity(),
            description: effect.describe(),
            action,
        }
    }
}

/// An event that two or more effects want to modify; the player picks which applies.
///
/// Only constructible through [`ConflictEntry::new`], which refuses fewer than
/// two distinct options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictEntry {
    key: String,
    label: String,
    options: Vec<ConflictOption>,
}

impl ConflictEntry {
    /// Build an entry from candidate effects, dropping duplicates by effect
    /// identity. Returns `None` when fewer than two distinct options remain.
    pub fn new<'a, I>(key: impl Into<String>, label: impl Into<String>, effects: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ReplacementEffect>,
    {
        let mut seen = HashSet::new();
        let options: Vec<ConflictOption> = effects
            .into_iter()
            .map(ConflictOption::from)
            .filter(|o| seen.insert(o.effect_id.clone()))
            .collect();

        if options.len() < 2 {
            return None;
        }
        Some(ConflictEntry {
            key: key.into(),
            label: label.into(),
            options,
        })
    }

    /// Stable identity of the conflicting event across snapshots
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn options(&self) -> &[ConflictOption] {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prevention(id: &str) -> ReplacementEffect {
        serde_json::from_value(serde_json::json!({"type": "prevent_damage", "id": id, "amount": 1}))
            .unwrap()
    }

    #[test]
    fn test_single_option_is_not_a_conflict() {
        let effects = [prevention("p1")];
        assert!(ConflictEntry::new("k", "label", effects.iter()).is_none());
    }

    #[test]
    fn test_duplicates_collapse() {
        let effects = [prevention("p1"), prevention("p1")];
        assert!(ConflictEntry::new("k", "label", effects.iter()).is_none());

        let effects = [prevention("p1"), prevention("p1"), prevention("p2")];
        let entry = ConflictEntry::new("k", "label", effects.iter()).unwrap();
        assert_eq!(entry.options().len(), 2);
        assert_eq!(entry.key(), "k");
    }

    #[test]
    fn test_option_serializes_flat() {
        let option = ConflictOption::from(&prevention("p1"));
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["action"], "prevent");
        assert_eq!(json["amount"], 1);
        assert_eq!(json["effect_id"], "p1");
    }
}
