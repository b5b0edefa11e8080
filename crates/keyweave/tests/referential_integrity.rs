mod common;

use common::{Author, Post, author_handles, post_authors};
use keyweave::{
    ErrorClass, EventReport, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
    prelude::*, with_metrics_sink,
};
use std::{cell::RefCell, rc::Rc};

fn handle(value: &str) -> String {
    value.to_string()
}

#[test]
fn parent_lifecycle_with_linked_child() {
    let authors = author_handles();
    let posts = post_authors(&authors);

    let row1 = Author::new(1, "A1");
    authors.add(&row1).unwrap();

    let child = Post::new(100, Some("A1"));
    posts.add(&child).unwrap();
    assert_eq!(posts.get_children(&row1), vec![100]);

    let err = authors.remove(&row1).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Constraint);
    assert_eq!(err.index(), "post.author");
    assert_eq!(authors.find(&handle("A1")), Some(1));

    posts.remove(&child).unwrap();
    assert!(posts.is_empty());
    assert!(posts.get_children(&row1).is_empty());

    authors.remove(&row1).unwrap();
    assert!(authors.is_empty());
}

#[test]
fn child_cannot_reference_missing_parent() {
    let authors = author_handles();
    let posts = post_authors(&authors);

    let err = posts.add(&Post::new(100, Some("ghost"))).unwrap_err();

    assert_eq!(err.class(), ErrorClass::NotFound);
    assert!(posts.is_empty());
    assert!(!posts.has_parent(&Post::new(100, Some("ghost"))));
}

#[test]
fn retired_parent_is_not_a_valid_target() {
    let authors = author_handles();
    let posts = post_authors(&authors);

    let mut retired = Author::new(1, "A1");
    retired.retired = true;
    authors.add(&retired).unwrap();

    assert!(authors.is_empty());
    posts.add(&Post::new(100, Some("A1"))).unwrap_err();
}

#[test]
fn referenced_parent_keeps_its_key() {
    let authors = author_handles();
    let posts = post_authors(&authors);
    let row = Author::new(1, "A1");
    authors.add(&row).unwrap();
    posts.add(&Post::new(100, Some("A1"))).unwrap();

    let renamed = row.with_handle("A2");
    let err = authors.update(RowChange::new(&row, &renamed)).unwrap_err();

    assert!(matches!(err, IndexError::ConstraintViolation { .. }));
    assert_eq!(authors.find(&handle("A1")), Some(1));
    assert_eq!(authors.find(&handle("A2")), None);
}

#[test]
fn child_moves_follow_versioned_snapshots() {
    let authors = author_handles();
    let posts = post_authors(&authors);
    let first = Author::new(1, "A1");
    let second = Author::new(2, "B2");
    authors.add(&first).unwrap();
    authors.add(&second).unwrap();

    let post = Post::new(100, Some("A1"));
    posts.add(&post).unwrap();
    let moved = post.moved_to(Some("B2"));
    posts.update(RowChange::from_versioned(&moved)).unwrap();

    assert!(posts.get_children(&first).is_empty());
    assert_eq!(posts.get_children(&second), vec![100]);

    // The first author is free again.
    authors.remove(&first).unwrap();
    assert_eq!(
        moved.get_version(RecordVersion::Original).author.as_deref(),
        Some("A1")
    );
}

#[test]
fn dropping_foreign_index_releases_constraint() {
    let authors = author_handles();
    let posts = post_authors(&authors);
    let row = Author::new(1, "A1");
    authors.add(&row).unwrap();
    posts.add(&Post::new(100, Some("A1"))).unwrap();

    authors.remove(&row).unwrap_err();
    drop(posts);

    authors.remove(&row).unwrap();
}

///
/// CollectingSink
///

#[derive(Default)]
struct CollectingSink {
    events: RefCell<Vec<String>>,
}

impl MetricsSink for CollectingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        self.events.borrow_mut().push(format!("{event:?}"));
    }
}

#[test]
fn scoped_sink_sees_constraint_checks() {
    let sink = Rc::new(CollectingSink::default());
    let authors = author_handles();
    let posts = post_authors(&authors);
    let row = Author::new(1, "A1");

    with_metrics_sink(sink.clone(), || {
        authors.add(&row).unwrap();
        posts.add(&Post::new(100, Some("A1"))).unwrap();
        authors.remove(&row).unwrap_err();
    });

    let events = sink.events.borrow();
    assert_eq!(events.len(), 3);
    assert!(events[0].starts_with("UniqueInsert"));
    assert!(events[1].starts_with("ForeignLink"));
    assert!(events[2].contains("blocked: true"));
}

#[test]
fn report_round_trips_through_json() {
    metrics_reset_all();
    let authors = author_handles();
    authors.add(&Author::new(1, "A1")).unwrap();
    authors.add(&Author::new(2, "A1")).unwrap_err();

    let report = metrics_report();
    let json = serde_json::to_string(&report).unwrap();
    let decoded: EventReport = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded, report);
    let counters = decoded.index("author.handle").unwrap();
    assert_eq!(counters.inserts, 1);
    assert_eq!(counters.duplicate_rejections, 1);
}
