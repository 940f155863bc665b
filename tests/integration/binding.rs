use http::StatusCode;
use pylon::bind::{FieldKind, FieldSpec, Schema};
use pylon::{Context, Engine, Error, Validate};
use serde::{Deserialize, Serialize};

use crate::helpers::spawn;

#[derive(Debug, Serialize, Deserialize)]
struct CreateUser {
    username: String,
    age: i64,
}

impl Validate for CreateUser {
    fn validate(&self) -> pylon::Result<()> {
        if self.username.is_empty() {
            return Err(Error::Validation("username must not be empty".into()));
        }
        if !(0..=150).contains(&self.age) {
            return Err(Error::Validation("age out of range".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    page: Option<u64>,
    #[serde(default)]
    exact: bool,
}

impl Schema for SearchParams {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("q", FieldKind::Str),
            FieldSpec::new("page", FieldKind::U64),
            FieldSpec::new("exact", FieldKind::Bool),
        ];
        FIELDS
    }
}

fn search_engine() -> Engine {
    let mut engine = Engine::new();
    engine.get("/search", |ctx: &mut Context| {
        match ctx.bind_query::<SearchParams>() {
            Ok(params) => ctx.json(StatusCode::OK, &params),
            Err(err) => ctx.error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        }
    });
    engine.post("/search", |ctx: &mut Context| {
        match ctx.bind_form::<SearchParams>() {
            Ok(params) => ctx.json(StatusCode::OK, &params),
            Err(err) => ctx.error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        }
    });
    engine
}

#[tokio::test]
async fn test_bind_json_with_validation() {
    let mut engine = Engine::new();
    engine.post("/users", |ctx: &mut Context| {
        match ctx.bind_json_validated::<CreateUser>() {
            Ok(user) => ctx.json(StatusCode::CREATED, &user),
            Err(err) => ctx.error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        }
    });
    let base = spawn(engine).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/users"))
        .json(&serde_json::json!({ "username": "kit", "age": 29 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let res = client
        .post(format!("{base}/users"))
        .json(&serde_json::json!({ "username": "", "age": 29 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("username"));

    let res = client
        .post(format!("{base}/users"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bind_query() {
    let base = spawn(search_engine()).await;

    let res = reqwest::get(format!("{base}/search?q=rust&page=3&exact=true"))
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["q"], "rust");
    assert_eq!(body["page"], 3);
    assert_eq!(body["exact"], true);

    // required field missing
    let res = reqwest::get(format!("{base}/search?page=3")).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    // bad coercion
    let res = reqwest::get(format!("{base}/search?q=rust&page=soon"))
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bind_query_is_case_insensitive() {
    let base = spawn(search_engine()).await;

    let res = reqwest::get(format!("{base}/search?Q=rust&PAGE=2"))
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["q"], "rust");
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_bind_form_merges_body_and_query() {
    let base = spawn(search_engine()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/search?q=from-query"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("q=from-body&page=5")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    // query values override body values for the same key
    assert_eq!(body["q"], "from-query");
    assert_eq!(body["page"], 5);
}

#[tokio::test]
async fn test_post_form_accessor() {
    let mut engine = Engine::new();
    engine.post("/login", |ctx: &mut Context| {
        let user = ctx.post_form("username").unwrap_or_default();
        ctx.string(StatusCode::OK, format!("hi {user}"));
    });
    let base = spawn(engine).await;

    let res = reqwest::Client::new()
        .post(format!("{base}/login"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("username=morgan&password=1234")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "hi morgan");
}
