mod common;

use common::{dispatch, write_table};
use http::{Method, StatusCode};
use segroute::dispatcher::DispatchOutcome;
use segroute::filter::Capability;
use segroute::route_table::RouteTable;

const TABLE: &str = r#"
[not_found]
status = 404
body = "nothing here"
content_type = "text/plain"

[[route]]
method = "GET"
pattern = "/users/:id(\\d+)"
body = "user {id}"

[[route]]
method = "post"
pattern = "/users"
status = 201
body = "created"

[[route]]
method = "ANY"
pattern = "/api/*"
status = 503
json = { error = "unavailable", path = "{_1}/{_2}" }

[[route]]
method = "GET"
pattern = "/log/:what"
over = false
body = "seen {what};"

[[route]]
method = "GET"
pattern = "/log/:thing"
body = "handled {thing}"
"#;

#[test]
fn test_load_from_file() {
    let file = write_table(TABLE);
    let table = RouteTable::from_path(file.path()).unwrap();
    assert_eq!(table.routes.len(), 5);
    assert_eq!(table.routes[1].capability().unwrap(), Capability::Post);
    assert_eq!(table.routes[1].status, 201);
    assert!(!table.routes[3].over);
    assert_eq!(table.not_found.as_ref().unwrap().body.as_deref(), Some("nothing here"));
}

#[test]
fn test_built_router_preserves_file_order() {
    let router = RouteTable::from_toml_str(TABLE).unwrap().build_router(false).unwrap();
    let patterns: Vec<&str> = router.patterns().iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(
        patterns,
        vec!["/users/:id(\\d+)", "/users", "/api/*", "/log/:what", "/log/:thing"]
    );
}

#[test]
fn test_placeholders_and_status() {
    let router = RouteTable::from_toml_str(TABLE).unwrap().build_router(true).unwrap();

    let (out, _) = dispatch(router.clone(), Method::GET, "/users/42");
    assert_eq!(out.status(), StatusCode::OK);
    assert_eq!(out.body_str(), "user 42");

    let (out, _) = dispatch(router, Method::POST, "/users");
    assert_eq!(out.status(), StatusCode::CREATED);
    assert_eq!(out.body_str(), "created");
}

#[test]
fn test_json_body_and_content_type() {
    let router = RouteTable::from_toml_str(TABLE).unwrap().build_router(false).unwrap();
    let (out, outcome) = dispatch(router, Method::DELETE, "/api/v1/items");
    assert!(outcome.is_completed());
    assert_eq!(out.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(out.header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(out.body()).unwrap();
    assert_eq!(body["error"], "unavailable");
    assert_eq!(body["path"], "v1/items");
}

#[test]
fn test_over_false_continues_to_next_route() {
    let router = RouteTable::from_toml_str(TABLE).unwrap().build_router(false).unwrap();
    let (out, outcome) = dispatch(router, Method::GET, "/log/x");
    assert_eq!(outcome, DispatchOutcome::Completed { route: 1 });
    assert_eq!(out.body_str(), "seen x;handled x");
}

#[test]
fn test_custom_not_found() {
    let router = RouteTable::from_toml_str(TABLE).unwrap().build_router(false).unwrap();
    let (out, outcome) = dispatch(router, Method::GET, "/users/abc");
    assert_eq!(outcome, DispatchOutcome::NotFound);
    assert_eq!(out.status(), StatusCode::NOT_FOUND);
    assert_eq!(out.body_str(), "nothing here");
    assert_eq!(out.header("Content-Type"), Some("text/plain"));
}

#[test]
fn test_not_found_body_defaults_to_reason_phrase() {
    let router = RouteTable::from_toml_str("[not_found]\nstatus = 410\n")
        .unwrap()
        .build_router(false)
        .unwrap();
    let (out, _) = dispatch(router, Method::GET, "/x");
    assert_eq!(out.status(), StatusCode::GONE);
    assert_eq!(out.body_str(), "Gone");
}

#[test]
fn test_strict_build_rejects_bad_constraint() {
    let text = r#"
[[route]]
method = "GET"
pattern = "/a/:id(["
"#;
    let table = RouteTable::from_toml_str(text).unwrap();
    let err = table.build_router(true).unwrap_err();
    assert!(format!("{err:#}").contains("route #1"));

    let router = table.build_router(false).unwrap();
    assert_eq!(router.route_count(), 1);
}

#[test]
fn test_empty_table_serves_only_not_found() {
    let router = RouteTable::from_toml_str("").unwrap().build_router(true).unwrap();
    assert_eq!(router.route_count(), 0);
    let (out, outcome) = dispatch(router, Method::GET, "/");
    assert_eq!(outcome, DispatchOutcome::NotFound);
    assert_eq!(out.body_str(), "Not Found");
}

#[test]
fn test_invalid_toml_reports_file() {
    let file = write_table("[[route]\nmethod = ");
    let err = RouteTable::from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("invalid route table"));
}
