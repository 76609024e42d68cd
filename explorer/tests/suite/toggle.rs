use explorer_test_support::FakeSpace;
use explorer_test_support::branch;
use explorer_test_support::leaf;
use explorer_test_support::render;
use explorer_test_support::test_explorer;
use mettakg_explorer::ExploreEntry;
use mettakg_explorer::ExploreError;
use mettakg_explorer::ExplorerEvent;
use mettakg_explorer::ToggleOutcome;
use pretty_assertions::assert_eq;

const PATTERN: &str = "$x";

fn two_roots() -> FakeSpace {
    FakeSpace::new()
        .level(&[], vec![branch("(a)", &[1]), leaf("(b)")])
        .level(&[1], vec![leaf("(a x)"), leaf("(a y)")])
}

#[tokio::test]
async fn expand_then_collapse_restores_expanded_set() {
    let mut test = test_explorer(two_roots());
    test.explorer.load_roots(PATTERN).await.unwrap();
    let before = test.explorer.snapshot().await.cache.expanded().clone();
    let row = test.explorer.flatten().await[0].clone();

    let outcome = test
        .explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Expanded { children: 2 });
    assert_eq!(
        render(&test.explorer.flatten().await),
        vec!["(a)", "  (a x)", "  (a y)", "(b)"]
    );

    let outcome = test
        .explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Collapsed);

    let snapshot = test.explorer.snapshot().await;
    assert_eq!(snapshot.cache.expanded(), &before);
    assert_eq!(snapshot.cache.children_of(&row.path).map(<[_]>::len), Some(2));
    assert_eq!(render(&test.explorer.flatten().await), vec!["(a)", "(b)"]);
    test.drain_events();
}

#[tokio::test]
async fn reexpanding_uses_cached_children() {
    let test = test_explorer(two_roots());
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();

    for _ in 0..3 {
        test.explorer
            .toggle(&row.path, &row.node, PATTERN)
            .await
            .unwrap();
    }
    assert_eq!(test.space.calls_for(&[1]), 1);
    assert_eq!(test.explorer.flatten().await.len(), 4);
}

#[tokio::test]
async fn terminal_node_is_selected_not_expanded() {
    let mut test = test_explorer(two_roots());
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[1].clone();
    test.drain_events();

    let outcome = test
        .explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::LeafSelected);
    assert_eq!(
        test.drain_events(),
        vec![ExplorerEvent::LeafSelected(row.node.clone())]
    );
    assert_eq!(test.space.calls_for(&[0xFF]), 0);
}

#[tokio::test]
async fn echo_child_is_pulled_up() {
    let space = FakeSpace::new()
        .level(&[], vec![branch("R", &[10])])
        .level(&[10], vec![branch("R", &[11])])
        .level(
            &[11],
            vec![ExploreEntry::new("X", Vec::new()), ExploreEntry::new("Y", Vec::new())],
        );
    let test = test_explorer(space);
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();

    test.explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();

    let snapshot = test.explorer.snapshot().await;
    let children: Vec<&str> = snapshot
        .cache
        .children_of(&row.path)
        .unwrap()
        .iter()
        .map(|node| node.expr.as_str())
        .collect();
    assert_eq!(children, vec!["X", "Y"]);
}

#[tokio::test]
async fn node_that_is_its_own_child_is_listed_once() {
    let space = FakeSpace::new()
        .level(&[], vec![branch("A", &[5])])
        .level(&[5], vec![branch("A", &[5])]);
    let test = test_explorer(space);
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();

    test.explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();

    let rows = test.explorer.flatten().await;
    assert_eq!(render(&rows), vec!["A"]);
    assert_eq!(rows[0].depth, 0);
}

#[tokio::test]
async fn missing_credential_leaves_node_collapsed_and_retryable() {
    let space = two_roots().fail(&[1], ExploreError::MissingCredential);
    let mut test = test_explorer(space);
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();
    test.drain_events();

    let err = test
        .explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap_err();
    assert_eq!(err, ExploreError::MissingCredential);

    let notices = test.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Token not set");
    let snapshot = test.explorer.snapshot().await;
    assert!(!snapshot.cache.is_expanded(&row.path));
    assert!(!snapshot.cache.has_children(&row.path));

    test.space.heal(&[1]);
    let outcome = test
        .explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Expanded { children: 2 });
}

#[tokio::test]
async fn empty_level_is_cached_and_marked_expanded() {
    let space = FakeSpace::new().level(&[], vec![branch("(lonely)", &[3])]);
    let test = test_explorer(space);
    test.explorer.load_roots(PATTERN).await.unwrap();
    let row = test.explorer.flatten().await[0].clone();

    let outcome = test
        .explorer
        .toggle(&row.path, &row.node, PATTERN)
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::Expanded { children: 0 });
    let snapshot = test.explorer.snapshot().await;
    assert!(snapshot.cache.is_expanded(&row.path));
    assert_eq!(snapshot.cache.children_of(&row.path), Some(&[][..]));
}

#[tokio::test]
async fn calls_carry_scope_and_pattern() {
    let test = test_explorer(two_roots());
    test.explorer.load_roots("(a $x)").await.unwrap();
    let row = test.explorer.flatten().await[0].clone();
    test.explorer
        .toggle(&row.path, &row.node, "(a $x)")
        .await
        .unwrap();

    for call in test.space.calls() {
        assert_eq!(call.scope, "/");
        assert_eq!(call.pattern, "(a $x)");
    }
    assert_eq!(test.space.call_count(), 2);
}
