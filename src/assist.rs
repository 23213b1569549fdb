//! Per-snapshot orchestration feeding the UI action panel.
//!
//! Each new snapshot runs conflict detection, then payment defaults for the
//! pending action, then target hints and both legality cycles, in that order.
//! The legality round trip runs detached from the assistant, so a newer
//! snapshot can be begun while an older one is still waiting on the engine.

use crate::card::{AbilityGraph, ManaCost};
use crate::game::mana::{
    build_default_payment, build_default_payment_detail, build_payment_from_detail,
    payment_errors, ManaPaymentError, ManaPool, Payment, PaymentDetail,
};
use crate::game::state::GameSnapshot;
use crate::game::zones::{ObjectId, PlayerId};
use crate::replacement::{detect_conflicts, ConflictEntry};
use crate::targeting::{
    CycleAnswers, LegalityChecker, LegalityStatus, PendingCycles, TargetHints,
    TargetLegalityTracker,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// The spell or ability the player is preparing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub controller_id: PlayerId,
    pub source_id: ObjectId,
    #[serde(default)]
    pub graph: AbilityGraph,
    #[serde(default)]
    pub cost: Option<ManaCost>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentPanel {
    /// Suggested payment for simple costs; empty for costs with choice symbols
    pub default_payment: Payment,
    /// Choices in effect: the player's own, else the defaults
    pub detail: PaymentDetail,
    /// Payment resolved from `detail`
    pub payment: Payment,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectCandidate {
    pub id: ObjectId,
    pub name: String,
    pub status: LegalityStatus,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerCandidate {
    pub id: PlayerId,
    pub status: LegalityStatus,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEntryStatus {
    pub position: usize,
    pub status: LegalityStatus,
    pub issues: Vec<String>,
}

/// Everything the action panel renders for one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelState {
    pub conflicts: Vec<ConflictEntry>,
    pub payment: Option<PaymentPanel>,
    pub hints: TargetHints,
    pub objects: Vec<ObjectCandidate>,
    pub players: Vec<PlayerCandidate>,
    pub stack: Vec<StackEntryStatus>,
    pub submittable: bool,
}

/// Holds the tracker, the legality checker, and the player's payment choices
/// between snapshots.
pub struct ActionAssistant<C: LegalityChecker> {
    checker: Arc<C>,
    tracker: TargetLegalityTracker,
    snapshot: Option<Arc<GameSnapshot>>,
    generation: u64,
    detail: Option<PaymentDetail>,
    action_source: Option<ObjectId>,
}

/// A panel whose legality requests are planned but not yet answered
pub struct PendingPanel<C: LegalityChecker> {
    checker: Arc<C>,
    generation: u64,
    snapshot: Arc<GameSnapshot>,
    conflicts: Vec<ConflictEntry>,
    payment: Option<PaymentPanel>,
    cycles: PendingCycles,
}

impl<C: LegalityChecker> PendingPanel<C> {
    pub fn snapshot(&self) -> &Arc<GameSnapshot> {
        &self.snapshot
    }

    pub fn cycles(&self) -> &PendingCycles {
        &self.cycles
    }

    /// Send the planned requests, if any
    pub async fn resolve(self) -> ResolvedPanel {
        let answers = self.cycles.send(self.checker.as_ref()).await;
        ResolvedPanel {
            generation: self.generation,
            snapshot: self.snapshot,
            conflicts: self.conflicts,
            payment: self.payment,
            answers,
        }
    }
}

/// Engine answers for a [`PendingPanel`], ready for [`ActionAssistant::commit`]
#[derive(Debug)]
pub struct ResolvedPanel {
    generation: u64,
    snapshot: Arc<GameSnapshot>,
    conflicts: Vec<ConflictEntry>,
    payment: Option<PaymentPanel>,
    answers: CycleAnswers,
}

impl ResolvedPanel {
    pub fn snapshot(&self) -> &Arc<GameSnapshot> {
        &self.snapshot
    }
}

fn pool_of(snapshot: &GameSnapshot, player: &PlayerId) -> ManaPool {
    snapshot
        .player(player)
        .map(|p| p.mana_pool)
        .unwrap_or_default()
}

impl<C: LegalityChecker> ActionAssistant<C> {
    pub fn new(checker: C) -> Self {
        Self::shared(Arc::new(checker))
    }

    pub fn shared(checker: Arc<C>) -> Self {
        ActionAssistant {
            checker,
            tracker: TargetLegalityTracker::new(),
            snapshot: None,
            generation: 0,
            detail: None,
            action_source: None,
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<GameSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn tracker(&self) -> &TargetLegalityTracker {
        &self.tracker
    }

    /// Selection changes go through the tracker
    pub fn tracker_mut(&mut self) -> &mut TargetLegalityTracker {
        &mut self.tracker
    }

    /// Keep the player's hybrid/two-brid/phyrexian choices until cleared
    pub fn set_payment_detail(&mut self, detail: PaymentDetail) {
        self.detail = Some(detail);
    }

    pub fn clear_payment_detail(&mut self) {
        self.detail = None;
    }

    /// Validate a payment typed in by hand against the current snapshot's pool
    pub fn check_manual_payment(
        &self,
        action: &PendingAction,
        payment: &Payment,
    ) -> Vec<ManaPaymentError> {
        let Some(cost) = &action.cost else {
            return Vec::new();
        };
        let pool = self
            .snapshot
            .as_deref()
            .map(|s| pool_of(s, &action.controller_id))
            .unwrap_or_default();
        payment_errors(cost, payment, &pool)
    }

    fn payment_panel(&self, snapshot: &GameSnapshot, action: &PendingAction) -> Option<PaymentPanel> {
        let cost = action.cost.as_ref()?;
        let pool = pool_of(snapshot, &action.controller_id);
        let detail = self
            .detail
            .clone()
            .unwrap_or_else(|| build_default_payment_detail(cost, &pool));
        let resolution = build_payment_from_detail(cost, &pool, &detail);

        Some(PaymentPanel {
            default_payment: build_default_payment(cost, &pool),
            errors: resolution.messages(),
            payment: resolution.payment,
            detail,
        })
    }

    /// Start a panel for a new snapshot. `action` is the ability being
    /// prepared, if any. Conflicts, payment, hints and pruning happen here;
    /// the legality requests are planned and left to [`PendingPanel::resolve`],
    /// which doesn't borrow the assistant.
    pub fn begin_snapshot(
        &mut self,
        snapshot: Arc<GameSnapshot>,
        action: Option<&PendingAction>,
    ) -> PendingPanel<C> {
        let source = action.map(|a| a.source_id.clone());
        if source != self.action_source {
            debug!(?source, "pending action changed");
            self.detail = None;
            self.tracker.clear_selection();
            self.action_source = source;
        }
        self.snapshot = Some(Arc::clone(&snapshot));
        self.generation += 1;

        let conflicts = detect_conflicts(&snapshot);
        let payment = action.and_then(|a| self.payment_panel(&snapshot, a));

        let hints = action
            .map(|a| TargetHints::derive(&a.graph))
            .unwrap_or_default();
        self.tracker.apply_hints(hints, &snapshot);
        let cycles = self
            .tracker
            .plan_cycles(&snapshot, action.map(|a| (&a.controller_id, &a.source_id)));

        PendingPanel {
            checker: Arc::clone(&self.checker),
            generation: self.generation,
            snapshot,
            conflicts,
            payment,
            cycles,
        }
    }

    /// Commit answers for a panel begun earlier. Answers are always handed to
    /// the tracker, which drops stale ones; `None` when a newer snapshot has
    /// been begun since.
    pub fn commit(&mut self, resolved: ResolvedPanel) -> Option<PanelState> {
        self.tracker.commit_cycles(resolved.answers);
        if resolved.generation != self.generation {
            debug!(
                generation = resolved.generation,
                latest = self.generation,
                "panel superseded by a newer snapshot"
            );
            return None;
        }
        Some(self.finish(&resolved.snapshot, resolved.conflicts, resolved.payment))
    }

    /// Begin, resolve and commit in one call. Holds the assistant for the
    /// whole round trip.
    pub async fn on_snapshot(
        &mut self,
        snapshot: Arc<GameSnapshot>,
        action: Option<&PendingAction>,
    ) -> PanelState {
        let resolved = self.begin_snapshot(snapshot, action).resolve().await;
        self.tracker.commit_cycles(resolved.answers);
        self.finish(&resolved.snapshot, resolved.conflicts, resolved.payment)
    }

    fn finish(
        &self,
        snapshot: &GameSnapshot,
        conflicts: Vec<ConflictEntry>,
        payment: Option<PaymentPanel>,
    ) -> PanelState {
        let panel = self.panel(snapshot, conflicts, payment);
        info!(
            conflicts = panel.conflicts.len(),
            candidates = panel.objects.len() + panel.players.len(),
            submittable = panel.submittable,
            "panel updated"
        );
        panel
    }

    fn panel(
        &self,
        snapshot: &GameSnapshot,
        conflicts: Vec<ConflictEntry>,
        payment: Option<PaymentPanel>,
    ) -> PanelState {
        let tracker = &self.tracker;
        let hints = tracker.hints().clone();

        let objects = hints
            .candidate_objects(snapshot)
            .into_iter()
            .map(|o| ObjectCandidate {
                id: o.id.clone(),
                name: o.display_name().to_string(),
                status: tracker.object_status(&o.id),
                selected: tracker.selected_objects().contains(&o.id),
            })
            .collect();
        let players = hints
            .candidate_players(snapshot)
            .into_iter()
            .map(|p| PlayerCandidate {
                id: p.id.clone(),
                status: tracker.player_status(&p.id),
                selected: tracker.selected_players().contains(&p.id),
            })
            .collect();
        let stack = (0..snapshot.stack.len())
            .map(|position| StackEntryStatus {
                position,
                status: tracker.stack_status(position),
                issues: tracker
                    .stack_result(position)
                    .map(|r| r.issues.clone())
                    .unwrap_or_default(),
            })
            .collect();

        PanelState {
            conflicts,
            payment,
            hints,
            objects,
            players,
            stack,
            submittable: tracker.selection_is_submittable(),
        }
    }
}
