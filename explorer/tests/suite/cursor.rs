use explorer_test_support::FakeSpace;
use explorer_test_support::branch;
use explorer_test_support::leaf;
use explorer_test_support::render;
use explorer_test_support::test_explorer;
use mettakg_explorer::ExplorerEvent;
use pretty_assertions::assert_eq;

const PATTERN: &str = "$x";

fn space() -> FakeSpace {
    FakeSpace::new()
        .level(&[], vec![branch("(a)", &[1]), branch("(b)", &[2])])
        .level(&[1], vec![leaf("(a x)"), leaf("(a y)")])
        .level(&[2], vec![leaf("(b z)")])
}

#[tokio::test]
async fn cursor_is_clamped_to_visible_rows() {
    let test = test_explorer(space());
    test.explorer.load_roots(PATTERN).await.unwrap();

    assert_eq!(test.explorer.set_cursor(10).await, 1);
    assert_eq!(test.explorer.move_cursor(-5).await, 0);
    assert_eq!(test.explorer.move_cursor(1).await, 1);
    assert_eq!(test.explorer.cursor().await, 1);
}

#[tokio::test]
async fn cursor_moves_are_announced() {
    let mut test = test_explorer(space());
    test.explorer.load_roots(PATTERN).await.unwrap();
    test.drain_events();

    test.explorer.set_cursor(1).await;
    test.explorer.move_cursor(-1).await;

    let events = test.drain_events();
    assert_eq!(events.len(), 2);
    assert!(
        events
            .iter()
            .all(|event| matches!(event, ExplorerEvent::Changed { .. }))
    );
}

#[tokio::test]
async fn cursor_follows_rows_that_disappear() {
    let test = test_explorer(space());
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();
    test.explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(test.explorer.set_cursor(3).await, 3);

    test.explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(test.explorer.cursor().await, 1);

    test.explorer.expand_all().await;
    test.explorer.set_cursor(3).await;
    test.explorer.collapse_to_root().await;
    assert_eq!(test.explorer.cursor().await, 1);

    test.explorer.set_scope("/other").await;
    assert_eq!(test.explorer.cursor().await, 0);
}

#[tokio::test]
async fn cursor_on_empty_tree_stays_at_zero() {
    let test = test_explorer(FakeSpace::new());
    test.explorer.load_roots(PATTERN).await.unwrap();

    assert_eq!(test.explorer.set_cursor(3).await, 0);
    assert_eq!(test.explorer.move_cursor(2).await, 0);
}

#[tokio::test]
async fn expand_all_reopens_cached_levels_only() {
    let test = test_explorer(space());
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();
    test.explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();

    test.explorer.collapse_to_root().await;
    assert_eq!(render(&test.explorer.flatten().await), vec!["(a)", "(b)"]);

    let calls = test.space.call_count();
    test.explorer.expand_all().await;
    assert_eq!(
        render(&test.explorer.flatten().await),
        vec!["(a)", "  (a x)", "  (a y)", "(b)"]
    );
    assert_eq!(test.space.call_count(), calls);
}
