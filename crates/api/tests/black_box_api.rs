use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use subhub_infra::config::{AppConfig, StoreBackend};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod) over the in-memory store, on an ephemeral port.
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            store: StoreBackend::InMemory,
        };
        let app = subhub_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn expect_error(res: reqwest::Response, status: StatusCode, message: &str) {
    assert_eq!(res.status(), status);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"].as_str().unwrap(), message, "{body}");
}

#[tokio::test]
async fn health_reports_healthy() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "subhub-api");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn product_lifecycle_over_http() {
    let srv = TestServer::spawn().await;
    let id = Uuid::now_v7();

    let res = srv
        .post(
            "/products",
            json!({
                "id": id,
                "monthly_fee_in_euros": "9.99",
                "name": "Basic",
                "status": "draft",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"].as_str().unwrap(), id.to_string());
    assert_eq!(body["monthly_fee_in_euros"], "9.99");

    let res = srv
        .put(
            &format!("/products/{id}"),
            json!({"monthly_fee_in_euros": "9.99", "name": "Basic", "status": "published"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "published");

    let res = srv
        .put(
            &format!("/products/{id}"),
            json!({"monthly_fee_in_euros": "9.99", "name": "Premium", "status": "published"}),
        )
        .await;
    expect_error(
        res,
        StatusCode::CONFLICT,
        "Cannot modify non-status attributes of a published product",
    )
    .await;

    let res = srv
        .put(
            &format!("/products/{id}"),
            json!({"monthly_fee_in_euros": "9.99", "name": "Basic", "status": "draft"}),
        )
        .await;
    expect_error(
        res,
        StatusCode::CONFLICT,
        "Cannot change status from published to draft",
    )
    .await;

    let res = srv.delete(&format!("/products/{id}")).await;
    expect_error(res, StatusCode::CONFLICT, "Product status is published").await;

    let res = srv.get("/products/by-name/Basic").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "published");
}

#[tokio::test]
async fn product_conflicts_and_bad_input() {
    let srv = TestServer::spawn().await;
    let id = Uuid::now_v7();
    let body = json!({
        "id": id,
        "monthly_fee_in_euros": "5.00",
        "name": "Basic",
        "status": "draft",
    });

    assert_eq!(srv.post("/products", body.clone()).await.status(), StatusCode::CREATED);
    expect_error(
        srv.post("/products", body).await,
        StatusCode::CONFLICT,
        "ID already exists",
    )
    .await;

    let res = srv
        .post(
            "/products",
            json!({
                "id": Uuid::now_v7(),
                "monthly_fee_in_euros": "5.00",
                "name": "Basic",
                "status": "draft",
            }),
        )
        .await;
    expect_error(res, StatusCode::CONFLICT, "Name already exists").await;

    let res = srv
        .post(
            "/products",
            json!({
                "id": Uuid::now_v7(),
                "monthly_fee_in_euros": "-1",
                "name": "Negative",
                "status": "draft",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = srv
        .post(
            "/products",
            json!({
                "id": Uuid::now_v7(),
                "monthly_fee_in_euros": "100000000.00",
                "name": "Huge",
                "status": "draft",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = srv
        .post(
            "/products",
            json!({
                "id": Uuid::now_v7(),
                "monthly_fee_in_euros": "5.00",
                "name": "Archived",
                "status": "archived",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("archived"));

    let res = srv
        .put(&format!("/products/{id}"), json!({"name": "Basic"}))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = srv
        .client
        .post(srv.url("/products"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = srv.get("/products/not-a-uuid").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let res = srv.get(&format!("/products/{}", Uuid::now_v7())).await;
    expect_error(res, StatusCode::NOT_FOUND, "Product does not exist").await;

    let res = srv.delete(&format!("/products/{id}")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get("/products").await;
    let body: Value = res.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn subscriptions_follow_product_eligibility() {
    let srv = TestServer::spawn().await;
    let user_id = Uuid::now_v7();
    let product_id = Uuid::now_v7();
    let subscription_id = Uuid::now_v7();

    let res = srv
        .post("/users", json!({"id": user_id, "email": "alice@example.com"}))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv
        .post(
            "/products",
            json!({
                "id": product_id,
                "monthly_fee_in_euros": "19.00",
                "name": "Pro",
                "status": "published",
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv
        .post(
            "/subscriptions",
            json!({
                "id": Uuid::now_v7(),
                "is_active": true,
                "user_id": Uuid::now_v7(),
                "product_id": Uuid::now_v7(),
            }),
        )
        .await;
    expect_error(res, StatusCode::NOT_FOUND, "Product does not exist").await;

    let res = srv
        .post(
            "/subscriptions",
            json!({
                "id": Uuid::now_v7(),
                "is_active": true,
                "user_id": Uuid::now_v7(),
                "product_id": product_id,
            }),
        )
        .await;
    expect_error(res, StatusCode::NOT_FOUND, "User does not exist").await;

    let res = srv
        .post(
            "/subscriptions",
            json!({
                "id": subscription_id,
                "is_active": true,
                "user_id": user_id,
                "product_id": product_id,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["product"]["name"], "Pro");

    let res = srv
        .post(
            "/subscriptions",
            json!({
                "id": subscription_id,
                "is_active": false,
                "user_id": user_id,
                "product_id": product_id,
            }),
        )
        .await;
    expect_error(res, StatusCode::CONFLICT, "ID already exists").await;

    let res = srv.get(&format!("/users/{user_id}")).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["subscriptions"].as_array().unwrap().len(), 1);

    let res = srv
        .put(
            &format!("/products/{product_id}"),
            json!({"monthly_fee_in_euros": "19.00", "name": "Pro", "status": "deprecated"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .put(
            &format!("/subscriptions/{subscription_id}"),
            json!({"is_active": false, "user_id": user_id, "product_id": product_id}),
        )
        .await;
    expect_error(res, StatusCode::CONFLICT, "Product is in deprecated status").await;

    let res = srv.get(&format!("/subscriptions/{subscription_id}")).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["is_active"], true);
    assert_eq!(body["product"]["status"], "deprecated");
}

#[tokio::test]
async fn deleting_a_user_removes_its_subscriptions() {
    let srv = TestServer::spawn().await;
    let user_id = Uuid::now_v7();
    let product_id = Uuid::now_v7();

    srv.post("/users", json!({"id": user_id, "email": "bob@example.com"}))
        .await;
    srv.post(
        "/products",
        json!({
            "id": product_id,
            "monthly_fee_in_euros": "3.50",
            "name": "Lite",
            "status": "published",
        }),
    )
    .await;
    let res = srv
        .post(
            "/subscriptions",
            json!({
                "id": Uuid::now_v7(),
                "is_active": true,
                "user_id": user_id,
                "product_id": product_id,
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    expect_error(
        srv.post("/users", json!({"id": Uuid::now_v7(), "email": "bob@example.com"}))
            .await,
        StatusCode::CONFLICT,
        "Email already exists",
    )
    .await;

    let res = srv.get("/users/by-email/bob@example.com").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.delete(&format!("/users/{user_id}")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get("/subscriptions").await;
    let body: Value = res.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());

    let res = srv.get(&format!("/users/{user_id}")).await;
    expect_error(res, StatusCode::NOT_FOUND, "User does not exist").await;
}
