use super::{PatternError, Router};
use crate::filter::{Capability, Filter};

fn get_router(patterns: &[&str]) -> Router {
    let mut router = Router::new();
    for pattern in patterns {
        router.get(pattern, |_, _| true);
    }
    router
}

#[test]
fn test_literal_pattern_matches_only_itself() {
    let router = get_router(&["/about/team"]);
    assert_eq!(router.match_path(&["about", "team"]).len(), 1);
    assert!(router.match_path(&["about"]).is_empty());
    assert!(router.match_path(&["about", "teams"]).is_empty());
    assert!(router.match_path(&["about", "team", "x"]).is_empty());
}

#[test]
fn test_pattern_case_is_normalized() {
    let router = get_router(&["/About/Team"]);
    assert_eq!(router.match_path(&["about", "team"]).len(), 1);
}

#[test]
fn test_regex_constrained_named_capture() {
    let router = get_router(&[r"/users/:id(\d+)"]);
    assert!(router.match_path(&["users", "abc"]).is_empty());
    let routes = router.match_path(&["users", "42"]);
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].capture("id"), Some("42"));
}

#[test]
fn test_matching_is_idempotent() {
    let router = get_router(&["/a/:x", "/a/*", "/a/?:y", r"/a/(\w+)"]);
    let path = ["a", "b"];
    let first: Vec<Vec<(&str, &str)>> = router
        .match_path(&path)
        .iter()
        .map(|r| r.captures.to_vec())
        .collect();
    let second: Vec<Vec<(&str, &str)>> = router
        .match_path(&path)
        .iter()
        .map(|r| r.captures.to_vec())
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_lenient_registration_degrades_constraint() {
    let mut router = Router::new();
    router.get("/users/:id()", |_, _| true);
    let routes = router.match_path(&["users", "anything"]);
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].capture("id"), Some("anything"));
}

#[test]
fn test_strict_registration_leaves_tree_untouched() {
    let mut router = Router::new();
    let err = router
        .try_register(Capability::Get, "/users/:id([)", |_, _| true)
        .unwrap_err();
    assert!(matches!(err, PatternError::InvalidRegex { .. }));
    assert_eq!(router.route_count(), 0);
    assert!(router.root().children().is_empty());

    router
        .try_register(Capability::Get, r"/users/:id(\d+)", |_, _| true)
        .unwrap();
    assert_eq!(router.route_count(), 1);
}

#[test]
fn test_patterns_are_listed_in_registration_order() {
    let mut router = Router::new();
    router
        .post("/b", |_, _| true)
        .filter(
            "/a",
            Filter::single(Capability::Get, |_, _| true).with(Capability::Head, |_, _| true),
        )
        .any("/c/*", |_, _| true);

    let listed: Vec<(&str, Vec<Capability>)> = router
        .patterns()
        .iter()
        .map(|r| (r.pattern.as_str(), r.capabilities.clone()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("/b", vec![Capability::Post]),
            ("/a", vec![Capability::Head, Capability::Get]),
            ("/c/*", vec![Capability::Any]),
        ]
    );
}

#[test]
fn test_render_tree_shows_interleaved_siblings() {
    let router = get_router(&["/a", "/b", "/a"]);
    assert_eq!(router.render_tree(), "/a  [Get]\n/b  [Get]\n/a  [Get]\n");
}
