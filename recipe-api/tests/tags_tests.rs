//! Tag endpoint tests
//!
//! Run with: `cargo test -p recipe-api --test tags_tests -- --ignored`

mod common;

use axum::http::{Method, StatusCode};
use common::{create_user_with_token, TestContext};
use serde_json::json;

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_tag_crud() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request(Method::POST, "/v1/tags", Some(json!({"name": "  Vegan "})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Vegan");
    let id = body["id"].as_i64().unwrap();
    let uri = format!("/v1/tags/{}", id);

    let (status, body) = ctx.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "name": "Vegan"}));

    let (status, body) = ctx
        .request(Method::PUT, &uri, Some(json!({"name": "Dessert"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Dessert");

    let (status, body) = ctx.request(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Dessert");

    let (status, _) = ctx.request(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_tags_listed_by_name_descending() {
    let ctx = TestContext::new().await.unwrap();

    for name in ["Breakfast", "Vegan", "Dinner"] {
        ctx.request(Method::POST, "/v1/tags", Some(json!({"name": name})))
            .await;
    }

    let (status, body) = ctx.request(Method::GET, "/v1/tags", None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Vegan", "Dinner", "Breakfast"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_tags_limited_to_user() {
    let ctx = TestContext::new().await.unwrap();
    let (other, other_token) = create_user_with_token(&ctx.db).await.unwrap();

    let (_, foreign) = ctx
        .request_with_token(&other_token, Method::POST, "/v1/tags", Some(json!({"name": "Fruity"})))
        .await;
    ctx.request(Method::POST, "/v1/tags", Some(json!({"name": "Comfort Food"})))
        .await;

    let (status, body) = ctx.request(Method::GET, "/v1/tags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Comfort Food");

    let uri = format!("/v1/tags/{}", foreign["id"]);
    let (status, _) = ctx.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request(Method::PATCH, &uri, Some(json!({"name": "Mine now"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.request(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    recipe_shared::models::user::User::delete(&ctx.db, other.id)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_blank_tag_name_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request(Method::POST, "/v1/tags", Some(json!({"name": "   "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");

    let (status, _) = ctx.request(Method::POST, "/v1/tags", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}
