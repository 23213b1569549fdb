//! Keeps target legality fresh across snapshots.
//!
//! Two cycles run against each snapshot: re-validating the targets of stack
//! items, and validating every candidate for the ability being prepared. Each
//! cycle is split into a `plan_*` step, which derives the request and records
//! the fingerprint of its input, and a `commit_*` step, which accepts the
//! engine's answer only if that fingerprint is still the latest one derived.
//! Requests are never cancelled; stale answers are dropped at commit.

use crate::card::{Keyword, ObjectType};
use crate::game::stack::{ResolutionContext, StackItem, StackKind, TargetRef};
use crate::game::state::GameSnapshot;
use crate::game::zones::{GameObjectSnapshot, ObjectId, PlayerId, Zone};
use crate::targeting::fingerprint::Fingerprint;
use crate::targeting::hints::{TargetHints, TargetingMode};
use crate::targeting::legality::{
    LegalityChecker, LegalityContext, LegalityError, LegalityResult, LegalityStatus,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Last committed verdict for a stack item's recorded targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackLegality {
    pub fingerprint: Fingerprint,
    pub status: LegalityStatus,
    pub issues: Vec<String>,
}

/// Batched re-validation request for stack items whose inputs changed
#[derive(Debug, Clone, PartialEq)]
pub struct StackCheck {
    entries: Vec<(usize, Fingerprint)>,
    contexts: Vec<LegalityContext>,
}

impl StackCheck {
    pub fn contexts(&self) -> &[LegalityContext] {
        &self.contexts
    }

    /// Stack positions being checked, in request order
    pub fn positions(&self) -> Vec<usize> {
        self.entries.iter().map(|(i, _)| *i).collect()
    }
}

/// One legality question per candidate object, then per candidate player
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCheck {
    fingerprint: Fingerprint,
    objects: Vec<ObjectId>,
    players: Vec<PlayerId>,
    contexts: Vec<LegalityContext>,
}

impl SelectionCheck {
    pub fn contexts(&self) -> &[LegalityContext] {
        &self.contexts
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

/// Fields of an object that bear on whether it is still a legal target
#[derive(Serialize)]
struct ObjectSlice<'a> {
    id: &'a ObjectId,
    zone: Zone,
    controller_id: Option<&'a PlayerId>,
    types: &'a [ObjectType],
    keywords: &'a [Keyword],
    power: Option<i32>,
    toughness: Option<i32>,
    damage: u32,
}

impl<'a> From<&'a GameObjectSnapshot> for ObjectSlice<'a> {
    fn from(o: &'a GameObjectSnapshot) -> Self {
        ObjectSlice {
            id: &o.id,
            zone: o.zone,
            controller_id: o.controller_id.as_ref(),
            types: &o.types,
            keywords: &o.keywords,
            power: o.power,
            toughness: o.toughness,
            damage: o.damage,
        }
    }
}

#[derive(Serialize)]
struct StackSlice<'a> {
    position: usize,
    depth: usize,
    kind: StackKind,
    source: Option<&'a ObjectId>,
    context: &'a ResolutionContext,
    referenced: Vec<Option<ObjectSlice<'a>>>,
}

#[derive(Serialize)]
struct SelectionSlice<'a> {
    objects: BTreeSet<&'a ObjectId>,
    players: BTreeSet<&'a PlayerId>,
    source: &'a ObjectId,
    mode: TargetingMode,
}

fn stack_fingerprint(snapshot: &GameSnapshot, position: usize, item: &StackItem) -> Option<Fingerprint> {
    let context = item.payload.context.as_ref()?;
    let source = item.source_id();
    let referenced = source
        .into_iter()
        .chain(context.target_objects())
        .map(|id| snapshot.object(id).map(ObjectSlice::from))
        .collect();

    Some(Fingerprint::of(&StackSlice {
        position,
        depth: snapshot.stack.len(),
        kind: item.kind,
        source,
        context,
        referenced,
    }))
}

/// The context as the engine expects it, filling ids the stored context omits
fn stack_request(snapshot: &GameSnapshot, item: &StackItem) -> LegalityContext {
    let mut context = item.payload.context.clone().unwrap_or_default();
    if context.source_id.is_none() {
        context.source_id = item.source_id().cloned();
    }
    if context.controller_id.is_none() {
        context.controller_id = item
            .source_id()
            .and_then(|id| snapshot.object(id))
            .and_then(|o| o.controller_id.clone());
    }
    context
}

/// Treat an answer that doesn't cover every submitted context as a failure
fn expect_len(
    outcome: Result<Vec<LegalityResult>, LegalityError>,
    expected: usize,
) -> Result<Vec<LegalityResult>, LegalityError> {
    let results = outcome?;
    if results.len() != expected {
        return Err(LegalityError::LengthMismatch {
            expected,
            actual: results.len(),
        });
    }
    Ok(results)
}

/// Requests planned against one snapshot. Owns its contexts, so the round
/// trip holds no borrow of the tracker and newer snapshots can be planned
/// while it is in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingCycles {
    stack: Option<StackCheck>,
    selection: Option<SelectionCheck>,
}

/// Engine answers for a [`PendingCycles`], ready for [`TargetLegalityTracker::commit_cycles`]
#[derive(Debug)]
pub struct CycleAnswers {
    stack: Option<(StackCheck, Result<Vec<LegalityResult>, LegalityError>)>,
    selection: Option<(SelectionCheck, Result<Vec<LegalityResult>, LegalityError>)>,
}

impl PendingCycles {
    pub fn is_empty(&self) -> bool {
        self.stack.is_none() && self.selection.is_none()
    }

    pub fn stack(&self) -> Option<&StackCheck> {
        self.stack.as_ref()
    }

    pub fn selection(&self) -> Option<&SelectionCheck> {
        self.selection.as_ref()
    }

    /// Send both requests concurrently
    pub async fn send<C: LegalityChecker + ?Sized>(self, checker: &C) -> CycleAnswers {
        let (stack_outcome, selection_outcome) = {
            let stack_answer = async {
                match &self.stack {
                    Some(check) => Some(checker.check(check.contexts()).await),
                    None => None,
                }
            };
            let selection_answer = async {
                match &self.selection {
                    Some(check) => Some(checker.check(check.contexts()).await),
                    None => None,
                }
            };
            tokio::join!(stack_answer, selection_answer)
        };

        CycleAnswers {
            stack: self.stack.zip(stack_outcome),
            selection: self.selection.zip(selection_outcome),
        }
    }
}

/// Selection state and legality caches for the action panel
#[derive(Debug, Clone, Default)]
pub struct TargetLegalityTracker {
    hints: TargetHints,
    selected_objects: BTreeSet<ObjectId>,
    selected_players: BTreeSet<PlayerId>,

    stack_results: BTreeMap<usize, StackLegality>,
    latest_stack: BTreeMap<usize, Fingerprint>,

    selection_checked: Option<Fingerprint>,
    latest_selection: Option<Fingerprint>,
    object_legality: BTreeMap<ObjectId, LegalityStatus>,
    player_legality: BTreeMap<PlayerId, LegalityStatus>,
}

impl TargetLegalityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hints(&self) -> &TargetHints {
        &self.hints
    }

    /// Install new hints, dropping selected objects they no longer admit and
    /// clearing selected players when players can no longer be targeted.
    pub fn apply_hints(&mut self, hints: TargetHints, snapshot: &GameSnapshot) {
        let before = self.selected_objects.len();
        self.selected_objects.retain(|id| {
            snapshot
                .object(id)
                .is_some_and(|o| hints.admits_object(o, snapshot))
        });
        if !hints.allow_players {
            self.selected_players.clear();
        }
        if self.selected_objects.len() != before {
            debug!(
                dropped = before - self.selected_objects.len(),
                "pruned selected objects"
            );
        }
        self.hints = hints;
    }

    /// Select an object; refused when the current hints don't admit it
    pub fn select_object(&mut self, id: &ObjectId, snapshot: &GameSnapshot) -> bool {
        let admitted = snapshot
            .object(id)
            .is_some_and(|o| self.hints.admits_object(o, snapshot));
        if admitted {
            self.selected_objects.insert(id.clone());
        }
        admitted
    }

    pub fn select_player(&mut self, id: &PlayerId) -> bool {
        if self.hints.allow_players {
            self.selected_players.insert(id.clone());
        }
        self.hints.allow_players
    }

    pub fn deselect_object(&mut self, id: &ObjectId) {
        self.selected_objects.remove(id);
    }

    pub fn deselect_player(&mut self, id: &PlayerId) {
        self.selected_players.remove(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_objects.clear();
        self.selected_players.clear();
    }

    pub fn selected_objects(&self) -> &BTreeSet<ObjectId> {
        &self.selected_objects
    }

    pub fn selected_players(&self) -> &BTreeSet<PlayerId> {
        &self.selected_players
    }

    pub fn selected_targets(&self) -> Vec<TargetRef> {
        self.selected_objects
            .iter()
            .cloned()
            .map(TargetRef::Object)
            .chain(self.selected_players.iter().cloned().map(TargetRef::Player))
            .collect()
    }

    pub fn object_status(&self, id: &ObjectId) -> LegalityStatus {
        self.object_legality.get(id).copied().unwrap_or_default()
    }

    pub fn player_status(&self, id: &PlayerId) -> LegalityStatus {
        self.player_legality.get(id).copied().unwrap_or_default()
    }

    pub fn stack_status(&self, position: usize) -> LegalityStatus {
        self.stack_results
            .get(&position)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    pub fn stack_result(&self, position: usize) -> Option<&StackLegality> {
        self.stack_results.get(&position)
    }

    /// An action may only be submitted once every chosen target is known Legal
    pub fn selection_is_submittable(&self) -> bool {
        let any = !self.selected_objects.is_empty() || !self.selected_players.is_empty();
        any && self
            .selected_objects
            .iter()
            .all(|id| self.object_status(id) == LegalityStatus::Legal)
            && self
                .selected_players
                .iter()
                .all(|id| self.player_status(id) == LegalityStatus::Legal)
    }

    /// Fingerprint every stack item with a resolution context, prune cached
    /// verdicts whose fingerprint is gone, and request the ones that changed.
    pub fn plan_stack_check(&mut self, snapshot: &GameSnapshot) -> Option<StackCheck> {
        self.latest_stack = snapshot
            .stack
            .iter()
            .enumerate()
            .filter_map(|(i, item)| stack_fingerprint(snapshot, i, item).map(|fp| (i, fp)))
            .collect();

        let latest = &self.latest_stack;
        self.stack_results
            .retain(|i, result| latest.get(i) == Some(&result.fingerprint));

        let entries: Vec<(usize, Fingerprint)> = self
            .latest_stack
            .iter()
            .filter(|(i, _)| !self.stack_results.contains_key(*i))
            .map(|(i, fp)| (*i, *fp))
            .collect();
        if entries.is_empty() {
            return None;
        }

        let contexts = entries
            .iter()
            .map(|(i, _)| stack_request(snapshot, &snapshot.stack[*i]))
            .collect();
        debug!(items = entries.len(), "stack targets need re-validation");
        Some(StackCheck { entries, contexts })
    }

    pub fn commit_stack_check(
        &mut self,
        check: StackCheck,
        outcome: Result<Vec<LegalityResult>, LegalityError>,
    ) {
        match expect_len(outcome, check.entries.len()) {
            Ok(results) => {
                for ((position, fingerprint), result) in check.entries.into_iter().zip(results) {
                    if self.latest_stack.get(&position) != Some(&fingerprint) {
                        debug!(position, "discarding stale stack verdict");
                        continue;
                    }
                    self.stack_results.insert(
                        position,
                        StackLegality {
                            fingerprint,
                            status: LegalityStatus::from(&result),
                            issues: result.issues,
                        },
                    );
                }
            }
            Err(err) => {
                warn!(error = %err, "stack legality check failed");
                for (position, fingerprint) in check.entries {
                    if self.latest_stack.get(&position) == Some(&fingerprint) {
                        self.stack_results.remove(&position);
                    }
                }
            }
        }
    }

    /// Build one context per candidate object and player for the ability being
    /// prepared. `None` when the candidates, source, and mode match the last
    /// successful check.
    pub fn plan_selection_check(
        &mut self,
        snapshot: &GameSnapshot,
        controller_id: &PlayerId,
        source_id: &ObjectId,
    ) -> Option<SelectionCheck> {
        let objects: Vec<ObjectId> = self
            .hints
            .candidate_objects(snapshot)
            .into_iter()
            .map(|o| o.id.clone())
            .collect();
        let players: Vec<PlayerId> = self
            .hints
            .candidate_players(snapshot)
            .into_iter()
            .map(|p| p.id.clone())
            .collect();

        let fingerprint = Fingerprint::of(&SelectionSlice {
            objects: objects.iter().collect(),
            players: players.iter().collect(),
            source: source_id,
            mode: self.hints.mode(),
        });
        self.latest_selection = Some(fingerprint);
        if self.selection_checked == Some(fingerprint) {
            return None;
        }
        if objects.is_empty() && players.is_empty() {
            self.object_legality.clear();
            self.player_legality.clear();
            self.selection_checked = Some(fingerprint);
            return None;
        }

        let request = |target: TargetRef| LegalityContext {
            controller_id: Some(controller_id.clone()),
            source_id: Some(source_id.clone()),
            targets: vec![target],
        };
        let contexts = objects
            .iter()
            .cloned()
            .map(TargetRef::Object)
            .chain(players.iter().cloned().map(TargetRef::Player))
            .map(request)
            .collect();

        debug!(
            objects = objects.len(),
            players = players.len(),
            fingerprint = %fingerprint,
            "checking selection candidates"
        );
        Some(SelectionCheck {
            fingerprint,
            objects,
            players,
            contexts,
        })
    }

    pub fn commit_selection_check(
        &mut self,
        check: SelectionCheck,
        outcome: Result<Vec<LegalityResult>, LegalityError>,
    ) {
        if self.latest_selection != Some(check.fingerprint) {
            debug!(fingerprint = %check.fingerprint, "discarding stale selection verdict");
            return;
        }

        match expect_len(outcome, check.contexts.len()) {
            Ok(results) => {
                let mut results = results.iter();
                self.object_legality = check
                    .objects
                    .into_iter()
                    .zip(results.by_ref())
                    .map(|(id, r)| (id, LegalityStatus::from(r)))
                    .collect();
                self.player_legality = check
                    .players
                    .into_iter()
                    .zip(results)
                    .map(|(id, r)| (id, LegalityStatus::from(r)))
                    .collect();
                self.selection_checked = Some(check.fingerprint);
            }
            Err(err) => {
                warn!(error = %err, "selection legality check failed");
                self.object_legality.clear();
                self.player_legality.clear();
                self.selection_checked = None;
            }
        }
    }

    /// Forget selection verdicts, e.g. when no ability is being prepared
    pub fn reset_selection_checks(&mut self) {
        self.object_legality.clear();
        self.player_legality.clear();
        self.selection_checked = None;
        self.latest_selection = None;
    }

    /// Plan both cycles for a snapshot. `selection` names the controller and
    /// source of the ability being prepared; `None` forgets selection verdicts.
    pub fn plan_cycles(
        &mut self,
        snapshot: &GameSnapshot,
        selection: Option<(&PlayerId, &ObjectId)>,
    ) -> PendingCycles {
        let stack = self.plan_stack_check(snapshot);
        let selection = match selection {
            Some((controller, source)) => self.plan_selection_check(snapshot, controller, source),
            None => {
                self.reset_selection_checks();
                None
            }
        };
        PendingCycles { stack, selection }
    }

    /// Commit answers from [`PendingCycles::send`]; stale ones are dropped
    pub fn commit_cycles(&mut self, answers: CycleAnswers) {
        if let Some((check, outcome)) = answers.stack {
            self.commit_stack_check(check, outcome);
        }
        if let Some((check, outcome)) = answers.selection {
            self.commit_selection_check(check, outcome);
        }
    }

    /// Plan, send, and commit in one call. Holds the tracker for the whole
    /// round trip; use `plan_cycles`, `PendingCycles::send` and `commit_cycles`
    /// to keep planning while a request is in flight.
    pub async fn run_cycles<C: LegalityChecker + ?Sized>(
        &mut self,
        snapshot: &GameSnapshot,
        selection: Option<(&PlayerId, &ObjectId)>,
        checker: &C,
    ) {
        let pending = self.plan_cycles(snapshot, selection);
        if pending.is_empty() {
            return;
        }
        let answers = pending.send(checker).await;
        self.commit_cycles(answers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::AbilityGraph;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every context with `legal` unless the target id is listed as illegal
    struct ScriptedChecker {
        illegal: Vec<String>,
        fail: bool,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedChecker {
        fn new(illegal: &[&str]) -> Self {
            ScriptedChecker {
                illegal: illegal.iter().map(|s| s.to_string()).collect(),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            ScriptedChecker {
                fail: true,
                ..Self::new(&[])
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LegalityChecker for ScriptedChecker {
        async fn check(
            &self,
            contexts: &[LegalityContext],
        ) -> Result<Vec<LegalityResult>, LegalityError> {
            self.calls.lock().unwrap().push(contexts.len());
            if self.fail {
                return Err(LegalityError::Status(503));
            }
            Ok(contexts
                .iter()
                .map(|c| {
                    let illegal = c.targets.iter().any(|t| {
                        let id = match t {
                            TargetRef::Object(id) => &id.0,
                            TargetRef::Player(id) => &id.0,
                        };
                        self.illegal.contains(id)
                    });
                    LegalityResult {
                        legal: !illegal,
                        issues: if illegal { vec!["hexproof".to_string()] } else { vec![] },
                    }
                })
                .collect())
        }
    }

    fn snapshot(bear_damage: u32) -> GameSnapshot {
        serde_json::from_value(json!({
            "players": [{"id": "p1"}, {"id": "p2"}],
            "objects": [
                {"id": "bear", "zone": "battlefield", "types": ["creature"], "controller_id": "p2",
                 "toughness": 2, "damage": bear_damage},
                {"id": "wall", "zone": "battlefield", "types": ["creature"], "controller_id": "p2"},
                {"id": "ring", "zone": "battlefield", "types": ["artifact"], "controller_id": "p1"},
                {"id": "shock", "zone": "stack", "types": ["instant"], "controller_id": "p1"}
            ],
            "stack": [{
                "kind": "spell",
                "payload": {
                    "source_object_id": "shock",
                    "context": {"targets": [{"kind": "object", "id": "bear"}]}
                }
            }]
        }))
        .unwrap()
    }

    fn hints(targets: &[&str]) -> TargetHints {
        let nodes: Vec<_> = targets
            .iter()
            .map(|t| json!({"kind": "EFFECT", "id": "e", "effect": "damage", "target": t}))
            .collect();
        let graph: AbilityGraph = serde_json::from_value(json!({"nodes": nodes})).unwrap();
        TargetHints::derive(&graph)
    }

    fn p(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    fn o(id: &str) -> ObjectId {
        ObjectId::from(id)
    }

    #[test]
    fn test_stack_check_only_sends_changed_items() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);

        let check = tracker.plan_stack_check(&s).expect("first check");
        assert_eq!(check.positions(), vec![0]);
        let context = &check.contexts()[0];
        assert_eq!(context.source_id, Some(o("shock")));
        assert_eq!(context.controller_id, Some(p("p1")));
        tracker.commit_stack_check(check, Ok(vec![LegalityResult { legal: true, issues: vec![] }]));
        assert_eq!(tracker.stack_status(0), LegalityStatus::Legal);

        // Same snapshot again: nothing to ask
        assert!(tracker.plan_stack_check(&s).is_none());
        assert_eq!(tracker.stack_status(0), LegalityStatus::Legal);

        // Damage on the target changes its slice
        let check = tracker.plan_stack_check(&snapshot(1)).expect("recheck");
        assert_eq!(check.positions(), vec![0]);
        assert_eq!(tracker.stack_status(0), LegalityStatus::Unknown);
    }

    #[test]
    fn test_stale_stack_verdict_discarded() {
        let mut tracker = TargetLegalityTracker::new();
        let check = tracker.plan_stack_check(&snapshot(0)).unwrap();
        // A newer snapshot arrives before the answer
        let _newer = tracker.plan_stack_check(&snapshot(1));
        tracker.commit_stack_check(check, Ok(vec![LegalityResult { legal: true, issues: vec![] }]));
        assert_eq!(tracker.stack_status(0), LegalityStatus::Unknown);
    }

    #[test]
    fn test_stack_entries_pruned_when_item_leaves() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        let check = tracker.plan_stack_check(&s).unwrap();
        tracker.commit_stack_check(check, Ok(vec![LegalityResult { legal: false, issues: vec!["gone".into()] }]));
        assert_eq!(tracker.stack_status(0), LegalityStatus::Illegal);
        assert_eq!(tracker.stack_result(0).unwrap().issues, vec!["gone"]);

        let mut resolved = s.clone();
        resolved.stack.clear();
        assert!(tracker.plan_stack_check(&resolved).is_none());
        assert!(tracker.stack_result(0).is_none());
    }

    #[test]
    fn test_failed_stack_check_leaves_unknown() {
        let mut tracker = TargetLegalityTracker::new();
        let check = tracker.plan_stack_check(&snapshot(0)).unwrap();
        tracker.commit_stack_check(check, Err(LegalityError::Status(500)));
        assert_eq!(tracker.stack_status(0), LegalityStatus::Unknown);
        // No recorded fingerprint, so the next cycle asks again
        assert!(tracker.plan_stack_check(&snapshot(0)).is_some());
    }

    #[test]
    fn test_selection_check_skipped_when_unchanged() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);

        let check = tracker.plan_selection_check(&s, &p("p1"), &o("shock")).unwrap();
        assert_eq!(check.contexts().len(), 2);
        tracker.commit_selection_check(
            check,
            Ok(vec![
                LegalityResult { legal: true, issues: vec![] },
                LegalityResult { legal: false, issues: vec![] },
            ]),
        );
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Legal);
        assert_eq!(tracker.object_status(&o("wall")), LegalityStatus::Illegal);
        assert_eq!(tracker.object_status(&o("ring")), LegalityStatus::Unknown);

        // Damage doesn't change the candidate set, so no round trip
        assert!(tracker.plan_selection_check(&snapshot(1), &p("p1"), &o("shock")).is_none());
        // A different source does
        assert!(tracker.plan_selection_check(&s, &p("p1"), &o("ring")).is_some());
    }

    #[test]
    fn test_stale_selection_verdict_discarded() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);
        let old = tracker.plan_selection_check(&s, &p("p1"), &o("shock")).unwrap();

        tracker.apply_hints(hints(&["any"]), &s);
        let _newer = tracker.plan_selection_check(&s, &p("p1"), &o("shock")).unwrap();

        tracker.commit_selection_check(
            old,
            Ok(vec![
                LegalityResult { legal: true, issues: vec![] },
                LegalityResult { legal: true, issues: vec![] },
            ]),
        );
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Unknown);
    }

    #[test]
    fn test_failed_selection_check_resets_to_unknown() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["any"]), &s);
        let check = tracker.plan_selection_check(&s, &p("p1"), &o("shock")).unwrap();
        let legal = vec![LegalityResult { legal: true, issues: vec![] }; check.contexts().len()];
        tracker.commit_selection_check(check, Ok(legal));
        assert_eq!(tracker.player_status(&p("p2")), LegalityStatus::Legal);

        let mut moved = s.clone();
        moved.objects.retain(|obj| obj.id != o("wall"));
        let check = tracker.plan_selection_check(&moved, &p("p1"), &o("shock")).unwrap();
        tracker.commit_selection_check(check, Err(LegalityError::Status(502)));
        assert_eq!(tracker.player_status(&p("p2")), LegalityStatus::Unknown);
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Unknown);
        // Failure isn't remembered as a successful check
        assert!(tracker.plan_selection_check(&moved, &p("p1"), &o("shock")).is_some());
    }

    #[test]
    fn test_narrowed_hints_prune_selection() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["any"]), &s);
        assert!(tracker.select_object(&o("bear"), &s));
        assert!(tracker.select_object(&o("ring"), &s));
        assert!(tracker.select_player(&p("p2")));

        tracker.apply_hints(hints(&["creature"]), &s);
        let selected: Vec<_> = tracker.selected_objects().iter().cloned().collect();
        assert_eq!(selected, vec![o("bear")]);
        assert!(tracker.selected_players().is_empty());
        for id in tracker.selected_objects() {
            let object = s.object(id).unwrap();
            assert!(object.types.iter().any(|t| tracker.hints().object_types.contains(t)));
        }

        assert!(!tracker.select_object(&o("ring"), &s));
        assert!(!tracker.select_player(&p("p1")));
    }

    #[test]
    fn test_submittable_requires_definitive_legal() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);
        assert!(!tracker.selection_is_submittable());

        tracker.select_object(&o("bear"), &s);
        assert!(!tracker.selection_is_submittable(), "Unknown is not enough");

        let check = tracker.plan_selection_check(&s, &p("p1"), &o("shock")).unwrap();
        tracker.commit_selection_check(
            check,
            Ok(vec![
                LegalityResult { legal: true, issues: vec![] },
                LegalityResult { legal: true, issues: vec![] },
            ]),
        );
        assert!(tracker.selection_is_submittable());
        assert_eq!(tracker.selected_targets(), vec![TargetRef::Object(o("bear"))]);
    }

    #[tokio::test]
    async fn test_run_cycles_batches_both_requests() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);
        let checker = ScriptedChecker::new(&["wall"]);

        tracker.run_cycles(&s, Some((&p("p1"), &o("shock"))), &checker).await;

        let mut calls = checker.calls();
        calls.sort();
        assert_eq!(calls, vec![1, 2]);
        assert_eq!(tracker.stack_status(0), LegalityStatus::Legal);
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Legal);
        assert_eq!(tracker.object_status(&o("wall")), LegalityStatus::Illegal);

        // Nothing changed: no further round trips
        tracker.run_cycles(&s, Some((&p("p1"), &o("shock"))), &checker).await;
        assert_eq!(checker.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_run_cycles_failure_collapses_to_unknown() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);

        tracker.run_cycles(&s, Some((&p("p1"), &o("shock"))), &ScriptedChecker::failing()).await;
        assert_eq!(tracker.stack_status(0), LegalityStatus::Unknown);
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Unknown);
    }

    #[tokio::test]
    async fn test_run_cycles_without_action_clears_selection_verdicts() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);
        let checker = ScriptedChecker::new(&[]);
        tracker.run_cycles(&s, Some((&p("p1"), &o("shock"))), &checker).await;
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Legal);

        tracker.run_cycles(&s, None, &checker).await;
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Unknown);
    }

    #[test]
    fn test_short_answer_counts_as_failure() {
        let mut tracker = TargetLegalityTracker::new();
        let s = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &s);

        let check = tracker.plan_selection_check(&s, &p("p1"), &o("shock")).unwrap();
        assert_eq!(check.contexts().len(), 2);
        tracker.commit_selection_check(check, Ok(vec![LegalityResult { legal: true, issues: vec![] }]));
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Unknown);
        assert!(tracker.plan_selection_check(&s, &p("p1"), &o("shock")).is_some());

        let check = tracker.plan_stack_check(&s).unwrap();
        tracker.commit_stack_check(check, Ok(Vec::new()));
        assert_eq!(tracker.stack_status(0), LegalityStatus::Unknown);
        assert!(tracker.plan_stack_check(&s).is_some());
    }

    #[tokio::test]
    async fn test_newer_snapshot_planned_while_answer_in_flight() {
        let mut tracker = TargetLegalityTracker::new();
        let first = snapshot(0);
        tracker.apply_hints(hints(&["creature"]), &first);
        let (controller, source) = (p("p1"), o("shock"));
        let selection = Some((&controller, &source));

        let slow = tracker.plan_cycles(&first, selection);
        let slow_checker = ScriptedChecker::new(&["bear"]);
        let in_flight = slow.send(&slow_checker);

        // The tracker is free while the first round trip is pending
        let mut second = snapshot(1);
        second.objects.retain(|obj| obj.id != o("wall"));
        let fresh = tracker.plan_cycles(&second, selection);
        assert!(fresh.stack().is_some() && fresh.selection().is_some());

        let fresh_answers = fresh.send(&ScriptedChecker::new(&[])).await;
        tracker.commit_cycles(fresh_answers);
        let late_answers = in_flight.await;
        tracker.commit_cycles(late_answers);

        assert_eq!(tracker.stack_status(0), LegalityStatus::Legal);
        assert_eq!(tracker.object_status(&o("bear")), LegalityStatus::Legal);
        assert_eq!(tracker.object_status(&o("wall")), LegalityStatus::Unknown);
    }
}
