pub mod combat;
pub mod mana;
pub mod stack;
pub mod state;
pub mod zones;

pub use combat::{assign_lethal_damage, lethal_threshold, CombatPass, CombatState, LethalAssignment};
pub use mana::{
    build_default_payment, build_default_payment_detail, build_payment_from_detail,
    payment_errors, ManaPaymentError, ManaPool, Payment, PaymentDetail, PaymentResolution,
};
pub use stack::{ResolutionContext, StackItem, StackKind, StackPayload, TargetRef};
pub use state::{GameSnapshot, PlayerSnapshot, SnapshotError, Step, TurnState};
pub use zones::{GameObjectSnapshot, ObjectId, PlayerId, Zone};
