//! Target selection for the ability being prepared and freshness of legality
//! verdicts for it and for everything already on the stack.

pub mod fingerprint;
pub mod hints;
pub mod legality;
pub mod tracker;

pub use fingerprint::Fingerprint;
pub use hints::{TargetHints, TargetingMode};
pub use legality::{
    HttpLegalityClient, LegalityChecker, LegalityContext, LegalityError, LegalityResult,
    LegalityStatus,
};
pub use tracker::{
    CycleAnswers, PendingCycles, SelectionCheck, StackCheck, StackLegality, TargetLegalityTracker,
};
