pub mod abilities;
pub mod types;

pub use abilities::{
    AbilityGraph, ConditionNode, EffectNode, GraphEdge, GraphNode, GraphVisitor,
    TargetDiscriminator, TriggerNode,
};
pub use types::{Keyword, ManaColor, ManaCost, ObjectType};
