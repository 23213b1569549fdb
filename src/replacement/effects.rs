use crate::game::stack::TargetRef;
use crate::game::state::GameSnapshot;
use crate::game::zones::{ObjectId, PlayerId, Zone};
use serde::{Deserialize, Serialize};

/// A replacement, prevention, or redirection effect, discriminated by `type`.
///
/// Global effects live on the snapshot; local ones are attached to an object
/// as temporary effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplacementEffect {
    ReplaceZoneChange(ZoneChangeReplacement),
    RedirectDamage(DamageRedirect),
    PreventDamage(DamagePrevention),
}

/// "If <object> would move from <from_zone> to <to_zone>, put it into <replacement_zone> instead"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneChangeReplacement {
    #[serde(default)]
    pub id: Option<String>,
    /// Absent means the effect applies to any object
    #[serde(default)]
    pub object_id: Option<ObjectId>,
    #[serde(default)]
    pub from_zone: Option<Zone>,
    #[serde(default)]
    pub to_zone: Option<Zone>,
    #[serde(default)]
    pub replacement_zone: Option<Zone>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRedirect {
    #[serde(default)]
    pub id: Option<String>,
    /// Source whose damage is redirected. Local effects imply their object.
    #[serde(default)]
    pub source_id: Option<ObjectId>,
    #[serde(default)]
    pub redirect_to: Option<TargetRef>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamagePrevention {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source_id: Option<ObjectId>,
    #[serde(default)]
    pub target_player_id: Option<PlayerId>,
    #[serde(default)]
    pub target_object_id: Option<ObjectId>,
    /// `None` prevents all damage
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ReplacementEffect {
    fn raw_id(&self) -> Option<&str> {
        match self {
            ReplacementEffect::ReplaceZoneChange(e) => e.id.as_deref(),
            ReplacementEffect::RedirectDamage(e) => e.id.as_deref(),
            ReplacementEffect::PreventDamage(e) => e.id.as_deref(),
        }
    }

    /// Stable identity: the engine id, or the canonical JSON form for id-less records
    pub fn identity(&self) -> String {
        match self.raw_id() {
            Some(id) => id.to_string(),
            None => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Human-readable description, falling back to a generated one
    pub fn describe(&self) -> String {
        match self {
            ReplacementEffect::ReplaceZoneChange(e) => e.description.clone().unwrap_or_else(|| {
                match e.replacement_zone {
                    Some(zone) => format!("Put it into {} instead", zone),
                    None => "Replace zone change".to_string(),
                }
            }),
            ReplacementEffect::RedirectDamage(e) => {
                e.description.clone().unwrap_or_else(|| match &e.redirect_to {
                    Some(TargetRef::Object(id)) => format!("Redirect damage to {}", id),
                    Some(TargetRef::Player(id)) => format!("Redirect damage to player {}", id),
                    None => "Redirect damage".to_string(),
                })
            }
            ReplacementEffect::PreventDamage(e) => {
                e.description.clone().unwrap_or_else(|| match e.amount {
                    Some(n) => format!("Prevent the next {} damage", n),
                    None => "Prevent all damage".to_string(),
                })
            }
        }
    }

    pub fn as_zone_change(&self) -> Option<&ZoneChangeReplacement> {
        match self {
            ReplacementEffect::ReplaceZoneChange(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_redirect(&self) -> Option<&DamageRedirect> {
        match self {
            ReplacementEffect::RedirectDamage(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_prevention(&self) -> Option<&DamagePrevention> {
        match self {
            ReplacementEffect::PreventDamage(e) => Some(e),
            _ => None,
        }
    }
}

/// Lookups of the effects that bear on a given damage source or recipient
#[derive(Clone, Copy)]
pub(crate) struct EffectIndex<'a> {
    snapshot: &'a GameSnapshot,
}

impl<'a> EffectIndex<'a> {
    pub fn new(snapshot: &'a GameSnapshot) -> Self {
        EffectIndex { snapshot }
    }

    fn local(&self, id: &ObjectId) -> &'a [ReplacementEffect] {
        self.snapshot
            .object(id)
            .map(|o| o.local_effects())
            .unwrap_or(&[])
    }

    /// Redirects of damage dealt by `source`: global ones naming it plus its own
    pub fn redirects_from(&self, source: &ObjectId) -> Vec<&'a ReplacementEffect> {
        let global = self.snapshot.replacement_effects.iter().filter(|e| {
            e.as_redirect()
                .is_some_and(|r| r.source_id.as_ref() == Some(source))
        });
        let local = self.local(source).iter().filter(|e| {
            e.as_redirect()
                .is_some_and(|r| r.source_id.as_ref().map_or(true, |s| s == source))
        });
        global.chain(local).collect()
    }

    /// Global preventions of damage from `source` that name no recipient
    pub fn preventions_from(&self, source: &ObjectId) -> Vec<&'a ReplacementEffect> {
        self.snapshot
            .replacement_effects
            .iter()
            .filter(|e| {
                e.as_prevention().is_some_and(|p| {
                    p.source_id.as_ref() == Some(source)
                        && p.target_player_id.is_none()
                        && p.target_object_id.is_none()
                })
            })
            .collect()
    }

    /// Preventions shielding an object: its own plus global ones naming it
    pub fn preventions_for_object(&self, id: &ObjectId) -> Vec<&'a ReplacementEffect> {
        let local = self
            .local(id)
            .iter()
            .filter(|e| e.as_prevention().is_some());
        let global = self.snapshot.replacement_effects.iter().filter(|e| {
            e.as_prevention()
                .is_some_and(|p| p.target_object_id.as_ref() == Some(id))
        });
        local.chain(global).collect()
    }

    pub fn preventions_for_player(&self, id: &PlayerId) -> Vec<&'a ReplacementEffect> {
        self.snapshot
            .replacement_effects
            .iter()
            .filter(|e| {
                e.as_prevention()
                    .is_some_and(|p| p.target_player_id.as_ref() == Some(id))
            })
            .collect()
    }

    pub fn preventions_for(&self, target: &TargetRef) -> Vec<&'a ReplacementEffect> {
        match target {
            TargetRef::Object(id) => self.preventions_for_object(id),
            TargetRef::Player(id) => self.preventions_for_player(id),
        }
    }
}
