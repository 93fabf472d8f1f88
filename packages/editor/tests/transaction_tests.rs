//! Transaction lifecycle and update propagation
//!
//! This tests:
//! - Commit, notification and flush ordering
//! - Full rollback when a transformation fails mid-way
//! - Rejection of edits that would create ownership cycles
//! - Rescue when an observer rejects a commit
//! - External changes and replay
//! - Volatile node-state refreshes

use std::cell::RefCell;
use std::rc::Rc;

use vellum_editor::{
    set_cursor, ChangeInfo, DocumentChange, DocumentUpdate, EditorError, EditorObserver,
    EditorSession, NodeSelectionMode, ObserverError, Selection, SelectionDescriptor,
};
use vellum_model::{DocumentGraph, ModelError, Node, Path, Schema};

fn sample_graph() -> DocumentGraph {
    let mut schema = Schema::new();
    schema
        .define_text("paragraph", "content")
        .define_list("list", "items")
        .define_list("container", "nodes");
    let mut graph = DocumentGraph::new(schema);
    graph
        .create(
            Node::new("body", "container")
                .with_property("nodes", vec!["p1".to_string(), "l1".to_string()]),
        )
        .unwrap();
    graph
        .create(Node::new("p1", "paragraph").with_property("content", "p1:abcdef"))
        .unwrap();
    graph
        .create(
            Node::new("l1", "list")
                .with_property("items", vec!["l1-1".to_string(), "l1-2".to_string()]),
        )
        .unwrap();
    graph
        .create(Node::new("l1-1", "paragraph").with_property("content", "abcdef"))
        .unwrap();
    graph
        .create(Node::new("l1-2", "paragraph").with_property("content", "0123456"))
        .unwrap();
    graph
}

#[derive(Default)]
struct EventLog {
    events: Vec<String>,
    last_update_ids: Vec<String>,
    last_update_had_change: bool,
}

struct Recorder {
    log: Rc<RefCell<EventLog>>,
    reject: bool,
}

impl Recorder {
    fn attach(session: &mut EditorSession, reject: bool) -> Rc<RefCell<EventLog>> {
        let log = Rc::new(RefCell::new(EventLog::default()));
        session.add_observer(Box::new(Recorder {
            log: Rc::clone(&log),
            reject,
        }));
        log
    }
}

impl EditorObserver for Recorder {
    fn on_change(
        &mut self,
        change: &DocumentChange,
        _info: &ChangeInfo,
    ) -> Result<(), ObserverError> {
        self.log
            .borrow_mut()
            .events
            .push(format!("change:{}", change.ops.len()));
        if self.reject {
            return Err(ObserverError("rejected by test".to_string()));
        }
        Ok(())
    }

    fn on_document_update(&mut self, update: &DocumentUpdate) {
        let mut log = self.log.borrow_mut();
        log.events.push("document".to_string());
        log.last_update_ids = update.updated.iter().cloned().collect();
        log.last_update_had_change = update.change.is_some();
    }

    fn on_selection_update(&mut self, _selection: &Selection) {
        self.log.borrow_mut().events.push("selection".to_string());
    }

    fn on_rescue(&mut self) {
        self.log.borrow_mut().events.push("rescue".to_string());
    }
}

fn content() -> Path {
    Path::property("p1", "content")
}

#[test]
fn test_commit_notifies_change_then_document_then_selection() {
    let mut session = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut session, false);

    session
        .transaction(|tx| {
            tx.set(&content(), "rewritten")?;
            tx.set_selection(Selection::cursor(content(), 9));
            Ok(())
        })
        .unwrap();

    let log = log.borrow();
    assert_eq!(log.events, ["change:1", "document", "selection"]);
    assert_eq!(log.last_update_ids, ["p1"]);
    assert!(log.last_update_had_change);
}

#[test]
fn test_failed_transformation_reverts_every_operation() {
    let graph = sample_graph();
    let snapshot = graph.clone();
    let mut session = EditorSession::new(graph);
    session.set_selection(Selection::cursor(content(), 2));
    let selection_before = session.selection().clone();

    let result = session.transaction(|tx| {
        tx.set(&content(), "halfway")?;
        tx.create(Node::new("p2", "paragraph").with_property("content", "new"))?;
        tx.append(&Path::property("body", "nodes"), "p2")?;
        Err("no anchor for p2".into())
    });

    assert!(matches!(result, Err(EditorError::Aborted(_))));
    assert_eq!(session.graph(), &snapshot, "all three operations must be rolled back");
    assert_eq!(session.selection(), &selection_before);
    assert!(!session.can_undo());
    assert!(!session.has_unsaved_changes());
}

#[test]
fn test_failing_transaction_restores_a_deleted_node() {
    let graph = sample_graph();
    let snapshot = graph.clone();
    let mut session = EditorSession::new(graph);
    session.set_selection(Selection::cursor(content(), 3));
    let selection_before = session.selection().clone();

    let result = session.transaction(|tx| {
        tx.remove_from_collection(&Path::property("body", "nodes"), "p1")?;
        tx.delete("p1")?;
        Err("nowhere to reattach the text".into())
    });

    assert!(matches!(result, Err(EditorError::Aborted(_))));
    assert!(session.graph().contains("p1"));
    assert_eq!(
        session.graph(),
        &snapshot,
        "removal and deletion must both be rolled back"
    );
    assert_eq!(session.selection(), &selection_before);
    assert!(session.changes().is_empty());
    assert!(!session.has_unsaved_changes());
}

#[test]
fn test_cycle_creating_insert_is_rejected() {
    let graph = sample_graph();
    let snapshot = graph.clone();
    let mut session = EditorSession::new(graph);

    let result = session.transaction(|tx| tx.insert_at(&Path::property("l1", "items"), 0, "l1"));

    assert!(matches!(
        result,
        Err(EditorError::Model(ModelError::CycleDetected { .. }))
    ));
    assert_eq!(session.graph(), &snapshot);

    // the list still descends to its first entry afterwards
    let cursor = set_cursor(
        session.graph(),
        "l1",
        &Path::property("body", "nodes"),
        NodeSelectionMode::Before,
    )
    .unwrap();
    assert_eq!(
        cursor,
        Selection::Property {
            path: Path::property("l1-1", "content"),
            start_offset: 0,
            end_offset: 0,
            reverse: false,
            container_path: Some(Path::property("body", "nodes")),
            surface_id: None,
        }
    );
}

#[test]
fn test_failing_operation_inside_transformation_aborts_cleanly() {
    let graph = sample_graph();
    let snapshot = graph.clone();
    let mut session = EditorSession::new(graph);

    let result = session.transaction(|tx| {
        tx.set(&content(), "halfway")?;
        // unknown node makes this operation fail after one already applied
        tx.set(&Path::property("ghost", "content"), "x")
    });

    assert!(result.is_err());
    assert_eq!(session.graph(), &snapshot);
}

#[test]
fn test_rejected_commit_is_rescued() {
    let graph = sample_graph();
    let snapshot = graph.clone();
    let mut session = EditorSession::new(graph);
    session.set_selection(Selection::cursor(content(), 2));
    let selection_before = session.selection().clone();
    let log = Recorder::attach(&mut session, true);

    let result = session.transaction(|tx| {
        tx.set(&content(), "rewritten")?;
        tx.set_selection(Selection::cursor(content(), 9));
        Ok(())
    });

    assert!(matches!(result, Err(EditorError::CommitFailure(_))));
    assert_eq!(session.graph(), &snapshot);
    assert_eq!(session.selection(), &selection_before);
    assert!(!session.can_undo());
    assert!(!session.has_unsaved_changes());
    assert_eq!(log.borrow().events, ["change:1", "rescue"]);
}

#[test]
fn test_empty_transaction_only_moves_the_selection() {
    let mut session = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut session, false);

    let result = session
        .transaction(|tx| {
            tx.set_selection(Selection::cursor(content(), 3));
            Ok(())
        })
        .unwrap();

    assert!(result.is_none());
    assert!(session.changes().is_empty());
    assert!(!session.has_unsaved_changes());
    assert_eq!(log.borrow().events, ["selection"]);
}

#[test]
fn test_set_selection_from_descriptor_normalizes() {
    let mut session = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut session, false);

    let descriptor = SelectionDescriptor::Property {
        path: content(),
        start_offset: 5,
        end_offset: Some(3),
        reverse: None,
        container_path: None,
        surface_id: None,
    };
    let selection = session.set_selection_from(&descriptor).unwrap();

    match selection {
        Selection::Property {
            start_offset,
            end_offset,
            reverse,
            ..
        } => {
            assert_eq!((start_offset, end_offset), (3, 5));
            assert!(reverse);
        }
        other => panic!("expected property selection, got {:?}", other),
    }
    assert_eq!(log.borrow().events, ["selection"]);
}

#[test]
fn test_apply_change_goes_through_commit_and_history() {
    let mut producer = EditorSession::new(sample_graph());
    let change = producer
        .transaction(|tx| tx.set(&content(), "from elsewhere"))
        .unwrap()
        .unwrap();

    let mut consumer = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut consumer, false);
    consumer
        .apply_change(change, ChangeInfo::default())
        .unwrap();

    assert_eq!(consumer.graph().text(&content()).unwrap(), "from elsewhere");
    assert!(consumer.can_undo());
    assert_eq!(log.borrow().events, ["change:1", "document"]);
}

#[test]
fn test_apply_change_replay_restores_selection_and_skips_history() {
    let mut producer = EditorSession::new(sample_graph());
    let change = producer
        .transaction(|tx| {
            tx.set(&content(), "replayed")?;
            tx.set_selection(Selection::cursor(content(), 8));
            Ok(())
        })
        .unwrap()
        .unwrap();

    let mut consumer = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut consumer, false);
    consumer
        .apply_change(change.clone(), ChangeInfo::for_replay())
        .unwrap();

    assert_eq!(consumer.graph().text(&content()).unwrap(), "replayed");
    assert!(!consumer.can_undo(), "replayed changes are not undoable");
    assert_eq!(consumer.selection(), &change.after);
    assert_eq!(log.borrow().events, ["change:1", "document", "selection"]);
}

#[test]
fn test_rejected_external_change_is_rolled_back() {
    let mut producer = EditorSession::new(sample_graph());
    let change = producer
        .transaction(|tx| tx.set(&content(), "vetoed"))
        .unwrap()
        .unwrap();

    let graph = sample_graph();
    let snapshot = graph.clone();
    let mut consumer = EditorSession::new(graph);
    let log = Recorder::attach(&mut consumer, true);

    let result = consumer.apply_change(change, ChangeInfo::default());
    assert!(matches!(result, Err(EditorError::CommitFailure(_))));
    assert_eq!(consumer.graph(), &snapshot);
    assert!(!consumer.can_undo());
    assert_eq!(log.borrow().events, ["change:1", "rescue"]);
}

#[test]
fn test_silent_node_state_refresh_merges_into_next_update() {
    let mut session = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut session, false);

    session.update_node_states(["l1".to_string()], true);
    assert!(log.borrow().events.is_empty(), "silent refresh must not notify");

    session
        .transaction(|tx| tx.set(&content(), "rewritten"))
        .unwrap();

    let log = log.borrow();
    assert_eq!(log.events, ["change:1", "document"]);
    // the pending refresh rides along with the committed change
    assert_eq!(log.last_update_ids, ["l1", "p1"]);
}

#[test]
fn test_loud_node_state_refresh_notifies_immediately() {
    let mut session = EditorSession::new(sample_graph());
    let log = Recorder::attach(&mut session, false);

    session.update_node_states(["l1".to_string(), "ghost".to_string()], false);

    let log = log.borrow();
    assert_eq!(log.events, ["document"]);
    assert_eq!(log.last_update_ids, ["l1"], "unknown nodes are skipped");
    assert!(!log.last_update_had_change);
}

#[test]
fn test_removed_observer_is_not_notified() {
    let mut session = EditorSession::new(sample_graph());
    let log = Rc::new(RefCell::new(EventLog::default()));
    let id = session.add_observer(Box::new(Recorder {
        log: Rc::clone(&log),
        reject: false,
    }));

    assert!(session.remove_observer(id));
    assert!(!session.remove_observer(id));

    session
        .transaction(|tx| tx.set(&content(), "unheard"))
        .unwrap();
    assert!(log.borrow().events.is_empty());
}
