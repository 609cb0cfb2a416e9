//! Integration tests for the route table and path rewriting together.

use axum::http::Method;
use pelo_proxy::config::model::{Config, RewriteRule, Route};
use pelo_proxy::proxy::routing::RouteTable;

fn upstream_path(table: &RouteTable, path: &str) -> Option<String> {
    let bare = path.split('?').next().unwrap_or(path);
    table
        .match_route(&Method::GET, bare)
        .map(|route| route.upstream_path(path))
}

#[test]
fn default_table_rewrites_like_the_browser_expects() {
    let table = RouteTable::from_config(&Config::default()).unwrap();

    assert_eq!(upstream_path(&table, "/api/workouts").as_deref(), Some("/workouts"));
    assert_eq!(upstream_path(&table, "/api").as_deref(), Some(""));
    assert_eq!(
        upstream_path(&table, "/api/me?joins=x").as_deref(),
        Some("/me?joins=x")
    );
    assert_eq!(upstream_path(&table, "/auth").as_deref(), Some("/auth/"));
    assert_eq!(upstream_path(&table, "/auth/login").as_deref(), Some("/auth/login"));
    assert_eq!(upstream_path(&table, "/health"), None);
}

#[test]
fn every_method_is_routed() {
    let table = RouteTable::from_config(&Config::default()).unwrap();
    for method in [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
        Method::HEAD,
    ] {
        assert!(table.match_route(&method, "/api/x").is_some(), "{method}");
    }
}

#[test]
fn preserve_routes_forward_verbatim() {
    let mut config = Config::default();
    config.routes.push(Route::new("/stats", RewriteRule::Preserve));
    let table = RouteTable::from_config(&config).unwrap();

    assert_eq!(table.routes().len(), 3);
    assert_eq!(
        upstream_path(&table, "/stats/summary?x=1").as_deref(),
        Some("/stats/summary?x=1")
    );
}

#[test]
fn concurrent_lookups_share_the_table() {
    let table = std::sync::Arc::new(RouteTable::from_config(&Config::default()).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let table = std::sync::Arc::clone(&table);
            std::thread::spawn(move || {
                let path = format!("/api/item/{i}");
                table
                    .match_route(&Method::GET, &path)
                    .map(|r| r.upstream_path(&path))
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(format!("/item/{i}")));
    }
}
