//! Recipe endpoint tests: CRUD, filtering, update semantics and images
//!
//! Run with: `cargo test -p recipe-api --test recipes_tests -- --ignored`

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{create_user_with_token, sample_image, TestContext};
use image::ImageFormat;
use serde_json::{json, Value};

async fn create_recipe(ctx: &TestContext, payload: Value) -> Value {
    let (status, body) = ctx.request(Method::POST, "/v1/recipes", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

fn sample_recipe(title: &str) -> Value {
    json!({"title": title, "time_minutes": 22, "price": "5.25"})
}

async fn create_named(ctx: &TestContext, uri: &str, name: &str) -> i64 {
    let (status, body) = ctx.request(Method::POST, uri, Some(json!({"name": name}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_create_recipe_with_links() {
    let ctx = TestContext::new().await.unwrap();
    let vegan = create_named(&ctx, "/v1/tags", "Vegan").await;
    let kale = create_named(&ctx, "/v1/ingredients", "Kale").await;

    let body = create_recipe(
        &ctx,
        json!({
            "title": "Kale salad",
            "time_minutes": 10,
            "price": "5.00",
            "link": "https://example.com/kale.pdf",
            "tags": [vegan],
            "ingredients": [kale]
        }),
    )
    .await;

    assert_eq!(body["title"], "Kale salad");
    assert_eq!(body["price"], "5.00");
    assert_eq!(body["link"], "https://example.com/kale.pdf");
    assert_eq!(body["tags"], json!([vegan]));
    assert_eq!(body["ingredients"], json!([kale]));
    assert!(body.get("image").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_recipe_detail_nests_links() {
    let ctx = TestContext::new().await.unwrap();
    let vegan = create_named(&ctx, "/v1/tags", "Vegan").await;
    let kale = create_named(&ctx, "/v1/ingredients", "Kale").await;

    let created = create_recipe(
        &ctx,
        json!({"title": "Kale salad", "time_minutes": 10, "price": "5.00", "tags": [vegan], "ingredients": [kale]}),
    )
    .await;

    let uri = format!("/v1/recipes/{}", created["id"]);
    let (status, body) = ctx.request(Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!([{"id": vegan, "name": "Vegan"}]));
    assert_eq!(body["ingredients"], json!([{"id": kale, "name": "Kale"}]));
    assert_eq!(body["image"], Value::Null);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_recipes_listed_newest_first() {
    let ctx = TestContext::new().await.unwrap();
    let first = create_recipe(&ctx, sample_recipe("First")).await;
    let second = create_recipe(&ctx, sample_recipe("Second")).await;

    let (status, body) = ctx.request(Method::GET, "/v1/recipes", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&body),
        vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]
    );

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_recipes_limited_to_user() {
    let ctx = TestContext::new().await.unwrap();
    let (other, other_token) = create_user_with_token(&ctx.db).await.unwrap();

    let (_, foreign) = ctx
        .request_with_token(&other_token, Method::POST, "/v1/recipes", Some(sample_recipe("Theirs")))
        .await;
    let mine = create_recipe(&ctx, sample_recipe("Mine")).await;

    let (_, body) = ctx.request(Method::GET, "/v1/recipes", None).await;
    assert_eq!(ids(&body), vec![mine["id"].as_i64().unwrap()]);

    let uri = format!("/v1/recipes/{}", foreign["id"]);
    for method in [Method::GET, Method::DELETE] {
        let (status, _) = ctx.request(method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, _) = ctx
        .request(Method::PATCH, &uri, Some(json!({"title": "Stolen"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    recipe_shared::models::user::User::delete(&ctx.db, other.id)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_foreign_tag_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let (other, other_token) = create_user_with_token(&ctx.db).await.unwrap();

    let (_, foreign) = ctx
        .request_with_token(&other_token, Method::POST, "/v1/tags", Some(json!({"name": "Theirs"})))
        .await;
    let foreign_id = foreign["id"].as_i64().unwrap();

    let mut payload = sample_recipe("Sneaky");
    payload["tags"] = json!([foreign_id]);
    let (status, body) = ctx.request(Method::POST, "/v1/recipes", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "tags");
    assert_eq!(
        body["details"][0]["message"],
        format!("Invalid pk \"{}\" - object does not exist.", foreign_id)
    );

    let (_, body) = ctx.request(Method::GET, "/v1/recipes", None).await;
    assert_eq!(body, json!([]));

    recipe_shared::models::user::User::delete(&ctx.db, other.id)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_invalid_price_rejected() {
    let ctx = TestContext::new().await.unwrap();

    for price in ["5.255", "1000.00"] {
        let mut payload = sample_recipe("Pricey");
        payload["price"] = json!(price);
        let (status, body) = ctx.request(Method::POST, "/v1/recipes", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", price);
        assert_eq!(body["details"][0]["field"], "price");
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_filter_by_tags() {
    let ctx = TestContext::new().await.unwrap();
    let vegan = create_named(&ctx, "/v1/tags", "Vegan").await;
    let veggie = create_named(&ctx, "/v1/tags", "Vegetarian").await;

    let mut payload = sample_recipe("Thai curry");
    payload["tags"] = json!([vegan]);
    let r1 = create_recipe(&ctx, payload).await;

    let mut payload = sample_recipe("Aubergine tahini");
    payload["tags"] = json!([veggie]);
    let r2 = create_recipe(&ctx, payload).await;

    create_recipe(&ctx, sample_recipe("Fish and chips")).await;

    let uri = format!("/v1/recipes?tags={},{}", vegan, veggie);
    let (status, body) = ctx.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&body),
        vec![r2["id"].as_i64().unwrap(), r1["id"].as_i64().unwrap()]
    );

    let (_, body) = ctx
        .request(Method::GET, &format!("/v1/recipes?tags={}", vegan), None)
        .await;
    assert_eq!(ids(&body), vec![r1["id"].as_i64().unwrap()]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_filter_by_tags_and_ingredients() {
    let ctx = TestContext::new().await.unwrap();
    let vegan = create_named(&ctx, "/v1/tags", "Vegan").await;
    let salt = create_named(&ctx, "/v1/ingredients", "Salt").await;
    let egg = create_named(&ctx, "/v1/ingredients", "Eggs").await;

    let both = create_recipe(
        &ctx,
        json!({"title": "Salted greens", "time_minutes": 5, "price": "2.00", "tags": [vegan], "ingredients": [salt, egg]}),
    )
    .await;
    create_recipe(
        &ctx,
        json!({"title": "Plain greens", "time_minutes": 5, "price": "2.00", "tags": [vegan]}),
    )
    .await;
    create_recipe(
        &ctx,
        json!({"title": "Omelette", "time_minutes": 5, "price": "2.00", "ingredients": [egg]}),
    )
    .await;

    let uri = format!("/v1/recipes?tags={}&ingredients={},{}", vegan, salt, egg);
    let (status, body) = ctx.request(Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    // Matching both ingredients must not duplicate the row
    assert_eq!(ids(&body), vec![both["id"].as_i64().unwrap()]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_filter_rejects_non_integer_ids() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .request(Method::GET, "/v1/recipes?ingredients=1,abc", None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "ingredients");

    let (status, _) = ctx.request(Method::GET, "/v1/recipes?tags=", None).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_partial_update_replaces_tags() {
    let ctx = TestContext::new().await.unwrap();
    let vegan = create_named(&ctx, "/v1/tags", "Vegan").await;
    let curry = create_named(&ctx, "/v1/tags", "Curry").await;
    let salt = create_named(&ctx, "/v1/ingredients", "Salt").await;

    let created = create_recipe(
        &ctx,
        json!({"title": "Curry", "time_minutes": 30, "price": "8.00", "tags": [vegan], "ingredients": [salt]}),
    )
    .await;
    let uri = format!("/v1/recipes/{}", created["id"]);

    let (status, body) = ctx
        .request(Method::PATCH, &uri, Some(json!({"title": "Chicken tikka", "tags": [curry]})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Chicken tikka");
    assert_eq!(body["tags"], json!([curry]));
    assert_eq!(body["ingredients"], json!([salt]));
    assert_eq!(body["price"], "8.00");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_full_update_clears_omitted_tags() {
    let ctx = TestContext::new().await.unwrap();
    let vegan = create_named(&ctx, "/v1/tags", "Vegan").await;

    let created = create_recipe(
        &ctx,
        json!({"title": "Spaghetti", "time_minutes": 25, "price": "7.00", "tags": [vegan]}),
    )
    .await;
    let uri = format!("/v1/recipes/{}", created["id"]);

    let (status, body) = ctx
        .request(
            Method::PUT,
            &uri,
            Some(json!({"title": "Spaghetti carbonara", "time_minutes": 25, "price": "5.00"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Spaghetti carbonara");
    assert_eq!(body["price"], "5.00");
    assert_eq!(body["tags"], json!([]));

    let (status, _) = ctx
        .request(Method::PUT, &uri, Some(json!({"title": "No time or price"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_delete_recipe() {
    let ctx = TestContext::new().await.unwrap();
    let created = create_recipe(&ctx, sample_recipe("Short lived")).await;
    let uri = format!("/v1/recipes/{}", created["id"]);

    let (status, _) = ctx.request(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_upload_image_to_recipe() {
    let ctx = TestContext::new().await.unwrap();
    let created = create_recipe(&ctx, sample_recipe("Photogenic")).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = ctx
        .upload(
            &format!("/v1/recipes/{}/upload-image", id),
            "image",
            "photo.jpg",
            &sample_image(ImageFormat::Jpeg),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["id"], id);
    let url = body["image"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/uploads/recipe/"));
    assert!(url.ends_with(".jpg"));

    let relative = url.trim_start_matches("/media/");
    assert!(ctx.media_root().join(relative).exists());

    let (_, detail) = ctx
        .request(Method::GET, &format!("/v1/recipes/{}", id), None)
        .await;
    assert_eq!(detail["image"], url.as_str());

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = ctx
        .request(Method::DELETE, &format!("/v1/recipes/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!ctx.media_root().join(relative).exists());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_replacing_image_removes_previous_file() {
    let ctx = TestContext::new().await.unwrap();
    let created = create_recipe(&ctx, sample_recipe("Twice")).await;
    let uri = format!("/v1/recipes/{}/upload-image", created["id"]);

    let (_, first) = ctx
        .upload(&uri, "image", "one.png", &sample_image(ImageFormat::Png))
        .await;
    let (status, second) = ctx
        .upload(&uri, "image", "two.png", &sample_image(ImageFormat::Png))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first["image"], second["image"]);

    let old = first["image"].as_str().unwrap().trim_start_matches("/media/");
    let new = second["image"].as_str().unwrap().trim_start_matches("/media/");
    assert!(!ctx.media_root().join(old).exists());
    assert!(ctx.media_root().join(new).exists());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_upload_invalid_image() {
    let ctx = TestContext::new().await.unwrap();
    let created = create_recipe(&ctx, sample_recipe("Blurry")).await;
    let uri = format!("/v1/recipes/{}/upload-image", created["id"]);

    let (status, body) = ctx.upload(&uri, "image", "notimage.jpg", b"notimage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "image");

    let (status, body) = ctx
        .upload(&uri, "photo", "photo.png", &sample_image(ImageFormat::Png))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["message"], "No file was submitted.");

    let (_, detail) = ctx
        .request(Method::GET, &format!("/v1/recipes/{}", created["id"]), None)
        .await;
    assert_eq!(detail["image"], Value::Null);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_upload_to_foreign_recipe_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let (other, other_token) = create_user_with_token(&ctx.db).await.unwrap();

    let (_, foreign) = ctx
        .request_with_token(&other_token, Method::POST, "/v1/recipes", Some(sample_recipe("Theirs")))
        .await;

    let (status, _) = ctx
        .upload(
            &format!("/v1/recipes/{}/upload-image", foreign["id"]),
            "image",
            "photo.png",
            &sample_image(ImageFormat::Png),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    recipe_shared::models::user::User::delete(&ctx.db, other.id)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}
