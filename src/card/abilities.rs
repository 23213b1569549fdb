use serde::{Deserialize, Serialize};

/// Node/edge description of a card ability: triggers, conditions, and the
/// effects they lead to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityGraph {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// A single node of an ability graph, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum GraphNode {
    Trigger(TriggerNode),
    Condition(ConditionNode),
    Effect(EffectNode),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerNode {
    pub id: String,
    #[serde(default)]
    pub event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionNode {
    pub id: String,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectNode {
    pub id: String,
    /// Effect name as the rules engine spells it, e.g. `damage`, `destroy`.
    /// Empty when the engine omits it.
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub target: Option<TargetDiscriminator>,
    #[serde(default)]
    pub amount: Option<u32>,
}

impl EffectNode {
    pub fn is(&self, effect: &str) -> bool {
        self.effect.eq_ignore_ascii_case(effect)
    }
}

/// What an effect node says it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDiscriminator {
    Any,
    Creature,
    Player,
    Planeswalker,
    Artifact,
    Enchantment,
    Permanent,
    Spell,
    #[serde(rename = "self")]
    SelfRef,
    #[serde(other)]
    Unrecognized,
}

/// Visitor over the nodes of an [`AbilityGraph`]. Every method defaults to a no-op.
pub trait GraphVisitor {
    fn visit_trigger(&mut self, _node: &TriggerNode) {}
    fn visit_condition(&mut self, _node: &ConditionNode) {}
    fn visit_effect(&mut self, _node: &EffectNode) {}
}

impl AbilityGraph {
    /// Walk every node in declaration order
    pub fn walk<V: GraphVisitor + ?Sized>(&self, visitor: &mut V) {
        for node in &self.nodes {
            match node {
                GraphNode::Trigger(n) => visitor.visit_trigger(n),
                GraphNode::Condition(n) => visitor.visit_condition(n),
                GraphNode::Effect(n) => visitor.visit_effect(n),
                GraphNode::Unknown => {}
            }
        }
    }

    /// Whether any EFFECT node carries the given effect name
    pub fn has_effect(&self, effect: &str) -> bool {
        let mut finder = EffectFinder {
            effect,
            found: false,
        };
        self.walk(&mut finder);
        finder.found
    }
}

struct EffectFinder<'a> {
    effect: &'a str,
    found: bool,
}

impl GraphVisitor for EffectFinder<'_> {
    fn visit_effect(&mut self, node: &EffectNode) {
        if node.is(self.effect) {
            self.found = true;
        }
    }
}
