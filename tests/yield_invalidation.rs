//! Yield and Invalidation Tests
//!
//! Signals that flow downward through a stage tree:
//! - prepare/recover reach every stage, in order
//! - invalidations are forwarded exactly once per call
//! - a yield with no invalidation changes nothing
//! - scans step over records removed while yielded

use std::rc::Rc;

use querystage::executor::{
    CollectionScan, PlanStage, ProjectionStage, QueuedDataStage, StageState, StageType,
};
use querystage::projection::{FnTransform, ProjectionSpec};
use querystage::storage::{Document, InMemoryRecordStore, InvalidationType, RecordLocation};
use querystage::working_set::{SharedWorkingSet, WorkingSet, WorkingSetCommon, WorkingSetMember};
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn loc(offset: u64) -> RecordLocation {
    RecordLocation::new(1, offset)
}

fn populated_store(n: u64) -> Rc<InMemoryRecordStore> {
    let store = InMemoryRecordStore::new();
    for i in 1..=n {
        store.insert(loc(i), doc(json!({"_id": i, "v": i * 10, "extra": true})));
    }
    Rc::new(store)
}

fn projected_scan(store: Rc<InMemoryRecordStore>, ws: &SharedWorkingSet) -> ProjectionStage {
    let scan = CollectionScan::new(store, ws.clone());
    let spec = ProjectionSpec::parse(&json!({"v": 1})).unwrap();
    ProjectionStage::new(spec, None, ws.clone(), Box::new(scan))
}

/// Pulls every document, freeing members, optionally yielding between works
fn drain(stage: &mut dyn PlanStage, ws: &SharedWorkingSet, yield_each_work: bool) -> Vec<Document> {
    let mut out = Vec::new();
    loop {
        if yield_each_work {
            stage.prepare_to_yield();
            stage.recover_from_yield();
        }
        match stage.work() {
            StageState::Advanced(id) => {
                let member = ws.borrow_mut().take(id).unwrap();
                out.push(member.document().cloned().unwrap());
            }
            StageState::IsEof => return out,
            StageState::NeedTime | StageState::NeedFetch(_) => {}
            StageState::Failure(id) => panic!("unexpected failure {:?}", id),
        }
    }
}

// =============================================================================
// Propagation Tests
// =============================================================================

/// Yields reach the leaf through the projection stage.
#[test]
fn test_yield_reaches_every_stage() {
    let ws = WorkingSet::shared();
    let mut stage = projected_scan(populated_store(2), &ws);

    stage.prepare_to_yield();
    stage.recover_from_yield();
    stage.prepare_to_yield();
    stage.recover_from_yield();

    let stats = stage.stats();
    for node in [StageType::Projection, StageType::CollectionScan] {
        let common = &stats.find(node).unwrap().common;
        assert_eq!(common.yields, 2, "{}", node);
        assert_eq!(common.unyields, 2, "{}", node);
    }
}

/// Every invalidate call is forwarded exactly once, whatever came before.
#[test]
fn test_invalidate_forwarded_once_per_call() {
    let ws = WorkingSet::shared();
    let mut child = QueuedDataStage::new(ws.clone());
    child.push_state(StageState::IsEof);
    let transform = FnTransform::new("noop", |_: &mut WorkingSetMember| Ok(()));
    let mut stage =
        ProjectionStage::with_transform(Box::new(transform), ws.clone(), Box::new(child));

    stage.invalidate(&loc(1), InvalidationType::Deletion);
    assert_eq!(stage.work(), StageState::IsEof);
    stage.invalidate(&loc(2), InvalidationType::Mutation);
    stage.invalidate(&loc(2), InvalidationType::Mutation);

    let stats = stage.stats();
    assert_eq!(stats.common.invalidates, 3);
    assert_eq!(stats.children[0].common.invalidates, 3);
}

/// Invalidations arrive at the leaf in the order they were sent.
#[test]
fn test_invalidation_order_preserved() {
    let ws = WorkingSet::shared();
    let mut leaf = QueuedDataStage::new(ws);
    let sent = [
        (loc(3), InvalidationType::Move),
        (loc(1), InvalidationType::Deletion),
        (loc(2), InvalidationType::Mutation),
    ];

    for (location, kind) in &sent {
        leaf.invalidate(location, *kind);
    }
    assert_eq!(leaf.invalidations(), &sent);
}

// =============================================================================
// Yield Transparency Tests
// =============================================================================

/// A yield with no invalidation in between leaves results unchanged.
#[test]
fn test_empty_yield_is_transparent() {
    let store = populated_store(4);

    let ws = WorkingSet::shared();
    let mut plain = projected_scan(store.clone(), &ws);
    let expected = drain(&mut plain, &ws, false);

    let ws = WorkingSet::shared();
    let mut yielding = projected_scan(store, &ws);
    let actual = drain(&mut yielding, &ws, true);

    assert_eq!(expected.len(), 4);
    assert_eq!(actual, expected);
    assert_eq!(expected[0], doc(json!({"_id": 1, "v": 10})));
}

// =============================================================================
// Invalidation During Yield Tests
// =============================================================================

/// A record deleted while yielded is skipped once the scan is told.
#[test]
fn test_deleted_record_skipped_after_yield() {
    let store = populated_store(3);
    let ws = WorkingSet::shared();
    let mut stage = projected_scan(store.clone(), &ws);

    let first = match stage.work() {
        StageState::Advanced(id) => ws.borrow_mut().take(id).unwrap(),
        other => panic!("expected ADVANCED, got {}", other),
    };
    assert_eq!(first.document().unwrap()["_id"], json!(1));

    stage.prepare_to_yield();
    store.remove(loc(2));
    stage.invalidate(&loc(2), InvalidationType::Deletion);
    stage.recover_from_yield();

    let rest = drain(&mut stage, &ws, false);
    assert_eq!(rest, vec![doc(json!({"_id": 3, "v": 30}))]);
}

/// A record moved while yielded is not read from its old location.
#[test]
fn test_moved_record_followed_after_yield() {
    let store = populated_store(3);
    let ws = WorkingSet::shared();
    let mut stage = projected_scan(store.clone(), &ws);

    assert!(stage.work().is_advanced());
    stage.prepare_to_yield();
    store.relocate(loc(2), loc(9));
    stage.invalidate(&loc(2), InvalidationType::Move);
    stage.recover_from_yield();

    let ids: Vec<Value> = drain(&mut stage, &ws, false)
        .into_iter()
        .map(|d| d["_id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(3), json!(2)]);
}

/// Members still pointing at an invalidated location keep an owned copy.
#[test]
fn test_working_set_detaches_invalidated_members() {
    let store = populated_store(1);
    let ws = WorkingSet::shared();
    let mut scan = CollectionScan::new(store.clone(), ws.clone());

    let id = match scan.work() {
        StageState::Advanced(id) => id,
        other => panic!("expected ADVANCED, got {}", other),
    };
    assert!(ws.borrow().get(id).unwrap().has_location());

    scan.prepare_to_yield();
    let touched = WorkingSetCommon::fetch_and_invalidate_location(&mut ws.borrow_mut(), loc(1));
    scan.invalidate(&loc(1), InvalidationType::Deletion);
    store.remove(loc(1));
    scan.recover_from_yield();

    assert_eq!(touched, 1);
    let ws = ws.borrow();
    let member = ws.get(id).unwrap();
    assert!(!member.has_location());
    assert_eq!(member.document().unwrap()["_id"], json!(1));
}
