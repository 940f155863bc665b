use http::StatusCode;
use pylon::{Context, Cookie, Engine};

use crate::helpers::spawn;

#[tokio::test]
async fn test_exact_route_over_http() {
    let mut engine = Engine::new();
    engine.get("/ping", |ctx: &mut Context| {
        ctx.string(StatusCode::OK, "pong")
    });
    let base = spawn(engine).await;

    let res = reqwest::get(format!("{base}/ping")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(res.text().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_not_found_names_the_path() {
    let base = spawn(Engine::new()).await;

    let res = reqwest::get(format!("{base}/no/such/page")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "404 NOT FOUND: /no/such/page\n");
}

#[tokio::test]
async fn test_table_matches_literally() {
    let mut engine = Engine::new();
    engine.get("/items", |ctx: &mut Context| {
        ctx.string(StatusCode::OK, "list")
    });
    let base = spawn(engine).await;

    // trailing slash and longer paths are different keys
    let res = reqwest::get(format!("{base}/items/")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    let res = reqwest::get(format!("{base}/items/7")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_nested_group_routes() {
    let mut engine = Engine::new();
    {
        let mut v2 = engine.group("/api").group("/v2");
        v2.get("/status", |ctx: &mut Context| {
            ctx.json(StatusCode::OK, &serde_json::json!({ "ok": true }));
        });
    }
    let base = spawn(engine).await;

    let res = reqwest::get(format!("{base}/api/v2/status")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));

    let res = reqwest::get(format!("{base}/v2/status")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_query_string_accessor() {
    let mut engine = Engine::new();
    engine.get("/greet", |ctx: &mut Context| {
        let name = ctx.query("name").unwrap_or_else(|| "stranger".into());
        ctx.string(StatusCode::OK, format!("hello {name}"));
    });
    let base = spawn(engine).await;

    let res = reqwest::get(format!("{base}/greet?name=robin")).await.unwrap();
    assert_eq!(res.text().await.unwrap(), "hello robin");

    let res = reqwest::get(format!("{base}/greet")).await.unwrap();
    assert_eq!(res.text().await.unwrap(), "hello stranger");
}

#[tokio::test]
async fn test_redirect_and_cookie() {
    let mut engine = Engine::new();
    engine.get("/old", |ctx: &mut Context| {
        ctx.set_cookie(&Cookie::new("seen", "1").path("/"));
        ctx.redirect(StatusCode::MOVED_PERMANENTLY, "/new");
    });
    let base = spawn(engine).await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let res = client.get(format!("{base}/old")).send().await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()["location"].to_str().unwrap(), "/new");
    assert_eq!(
        res.headers()["set-cookie"].to_str().unwrap(),
        "seen=1; Path=/"
    );
}

#[tokio::test]
async fn test_html_rendering_with_templates() {
    let mut templates = pylon::PlaceholderTemplates::new();
    templates.add("welcome", "<p>Welcome, {{user}}</p>");

    let mut engine = Engine::new();
    engine.set_templates(templates);
    engine.get("/welcome", |ctx: &mut Context| {
        ctx.render_html(
            StatusCode::OK,
            "welcome",
            &serde_json::json!({ "user": "sam" }),
        );
    });
    let base = spawn(engine).await;

    let res = reqwest::get(format!("{base}/welcome")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(res.text().await.unwrap(), "<p>Welcome, sam</p>");
}
