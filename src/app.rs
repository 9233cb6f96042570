use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgApplicationRepository, PgUserRepository, QueryDeadlines};
use crate::handlers::{self, protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{ApplicationService, UserService};

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub applications: ApplicationService,
    pub users: UserService,
    pub jwt: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the postgres-backed stores onto one pool.
    pub fn new(database: &DatabaseManager, config: AppConfig) -> Self {
        let deadlines = QueryDeadlines::from_config(&config.database);
        let jwt = JwtKeys::from_config(&config.security);

        let applications = PgApplicationRepository::new(database.pool(), deadlines);
        let users = PgUserRepository::new(database.pool(), deadlines);

        Self {
            applications: ApplicationService::new(Arc::new(applications)),
            users: UserService::new(Arc::new(users), jwt.clone()),
            jwt,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(public::health_get))
        .route("/auth/register", post(public::auth::register_post))
        .route("/auth/login", post(public::auth::login_post));

    let protected_routes = Router::new()
        .route("/auth/verify", get(protected::auth::verify_get))
        .route("/users/me", get(protected::auth::me_get))
        .route(
            "/applications",
            get(protected::applications::records_get).post(protected::applications::records_post),
        )
        .route("/applications/options", get(protected::applications::options_get))
        .route("/applications/batch/delete", delete(protected::applications::batch_delete))
        .route("/applications/batch/status", put(protected::applications::batch_status_put))
        .route(
            "/applications/:id",
            put(protected::applications::record_put).delete(protected::applications::record_delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.config.server.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` allows any origin; otherwise only the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn send(router: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn acme() -> Value {
        json!({ "companyName": "Acme", "positionTitle": "Engineer" })
    }

    #[tokio::test]
    async fn health_is_public() {
        let ctx = TestContext::new();
        let (status, body) = send(&ctx.router(), "GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"]["database"], "ok");
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let ctx = TestContext::new();
        let (status, body) = send(&ctx.router(), "GET", "/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let ctx = TestContext::new();
        let router = ctx.router();

        let (status, body) = send(&router, "GET", "/api/v1/applications", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = send(&router, "GET", "/api/v1/applications", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let foreign = JwtKeys::new("another-secret", 1).issue(Uuid::new_v4(), "x@y.z").unwrap();
        let (status, _) = send(&router, "GET", "/api/v1/auth/verify", Some(&foreign), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_verify_and_profile() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let register = json!({
            "email": "grace@example.com",
            "firstName": "Grace",
            "lastName": "Hopper",
            "password": "cobol-rules"
        });

        let (status, body) = send(&router, "POST", "/api/v1/auth/register", None, Some(register.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created");
        assert!(body["data"].get("passwordHash").is_none());

        let mut shouty = register.clone();
        shouty["email"] = json!("GRACE@EXAMPLE.COM");
        let (status, body) = send(&router, "POST", "/api/v1/auth/register", None, Some(shouty)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already exists");

        let bad_login = json!({ "email": "grace@example.com", "password": "fortran-rules" });
        let (status, _) = send(&router, "POST", "/api/v1/auth/login", None, Some(bad_login)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let login = json!({ "email": "grace@example.com", "password": "cobol-rules" });
        let (status, body) = send(&router, "POST", "/api/v1/auth/login", None, Some(login)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login success");
        let token = body["data"].as_str().unwrap().to_string();

        let (status, verify) = send(&router, "GET", "/api/v1/auth/verify", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, me) = send(&router, "GET", "/api/v1/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["data"]["firstName"], "Grace");
        assert_eq!(me["data"]["id"], verify["data"]);
    }

    #[tokio::test]
    async fn invalid_create_body_lists_field_errors() {
        let ctx = TestContext::new();
        let token = ctx.token_for(Uuid::new_v4());
        let body = json!({ "companyName": "A", "jobUrl": "nope" });

        let (status, body) = send(&ctx.router(), "POST", "/api/v1/applications", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["error"].as_array().unwrap().iter().map(|e| e["field"].as_str().unwrap()).collect();
        assert_eq!(fields, vec!["companyName", "positionTitle", "jobUrl"]);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let ctx = TestContext::new();
        let token = ctx.token_for(Uuid::new_v4());
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/applications")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = ctx.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn record_lifecycle_over_http() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let token = ctx.token_for(Uuid::new_v4());

        let (status, created) = send(&router, "POST", "/api/v1/applications", Some(&token), Some(acme())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, list) = send(&router, "GET", "/api/v1/applications", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["data"]["dataCount"], 1);
        assert_eq!(list["data"]["data"][0]["status"], "Wishlist");

        let uri = format!("/api/v1/applications/{}", id);
        let (status, _) = send(&router, "PUT", &uri, Some(&token), Some(json!({ "status": "Applied" }))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, filtered) = send(&router, "GET", "/api/v1/applications?status=Applied", Some(&token), None).await;
        assert_eq!(filtered["data"]["data"][0]["id"], id);
        assert_eq!(filtered["data"]["data"][0]["companyName"], "Acme");

        let (status, _) = send(&router, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, empty) = send(&router, "GET", "/api/v1/applications", Some(&token), None).await;
        assert_eq!(empty["data"]["dataCount"], 0);

        let (status, body) = send(&router, "PUT", &uri, Some(&token), Some(json!({ "status": "Offer" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Application not found");
    }

    #[tokio::test]
    async fn other_users_records_are_not_found() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let owner = ctx.token_for(Uuid::new_v4());
        let intruder = ctx.token_for(Uuid::new_v4());

        let (_, created) = send(&router, "POST", "/api/v1/applications", Some(&owner), Some(acme())).await;
        let uri = format!("/api/v1/applications/{}", created["data"]["id"].as_str().unwrap());

        let (status, _) = send(&router, "DELETE", &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, list) = send(&router, "GET", "/api/v1/applications", Some(&intruder), None).await;
        assert_eq!(list["data"]["dataCount"], 0);
    }

    #[tokio::test]
    async fn non_uuid_ids_are_bad_requests() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let token = ctx.token_for(Uuid::new_v4());

        let (status, _) = send(&router, "DELETE", "/api/v1/applications/42", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json!({ "applicationIds": ["not-a-uuid"] });
        let (status, _) = send(&router, "DELETE", "/api/v1/applications/batch/delete", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn batch_endpoints() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let token = ctx.token_for(Uuid::new_v4());

        let (status, body) = send(
            &router,
            "DELETE",
            "/api/v1/applications/batch/delete",
            Some(&token),
            Some(json!({ "applicationIds": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No application IDs provided");

        let mut ids = vec![];
        for _ in 0..2 {
            let (_, created) = send(&router, "POST", "/api/v1/applications", Some(&token), Some(acme())).await;
            ids.push(created["data"]["id"].clone());
        }

        let (status, _) = send(
            &router,
            "PUT",
            "/api/v1/applications/batch/status",
            Some(&token),
            Some(json!({ "applicationIds": ids, "status": "Rejected" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, rejected) = send(&router, "GET", "/api/v1/applications?status=Rejected", Some(&token), None).await;
        assert_eq!(rejected["data"]["dataCount"], 2);

        let (status, _) = send(
            &router,
            "DELETE",
            "/api/v1/applications/batch/delete",
            Some(&token),
            Some(json!({ "applicationIds": [ids[0], Uuid::new_v4()] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, remaining) = send(&router, "GET", "/api/v1/applications", Some(&token), None).await;
        assert_eq!(remaining["data"]["dataCount"], 1);

        let (status, body) = send(
            &router,
            "DELETE",
            "/api/v1/applications/batch/delete",
            Some(&token),
            Some(json!({ "applicationIds": [Uuid::new_v4()] })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No applications found to delete");
    }

    #[tokio::test]
    async fn list_limit_is_capped_and_validated() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let token = ctx.token_for(Uuid::new_v4());
        for _ in 0..3 {
            send(&router, "POST", "/api/v1/applications", Some(&token), Some(acme())).await;
        }

        let (_, page) = send(&router, "GET", "/api/v1/applications?limit=2&offset=0", Some(&token), None).await;
        assert_eq!(page["data"]["dataCount"], 2);

        let (status, _) = send(&router, "GET", "/api/v1/applications?limit=-1", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, "GET", "/api/v1/applications?limit=abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn options_lookup() {
        let ctx = TestContext::new();
        let router = ctx.router();
        let token = ctx.token_for(Uuid::new_v4());

        let (status, body) = send(&router, "GET", "/api/v1/applications/options?statusOption=true", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["statusOption"][0], "Wishlist");

        let (_, body) = send(&router, "GET", "/api/v1/applications/options", Some(&token), None).await;
        assert!(body["data"].get("statusOption").is_none());
    }

    async fn preflight_allow_origin(origins: &[&str], origin: &str) -> Option<String> {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        let router: Router = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(&origins));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn cors_wildcard_allows_any_origin() {
        let allowed = preflight_allow_origin(&["*"], "https://anywhere.test").await;
        assert_eq!(allowed.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn cors_list_echoes_only_listed_origins() {
        let origins = ["https://app.example.com", "bad\norigin"];
        let allowed = preflight_allow_origin(&origins, "https://app.example.com").await;
        assert_eq!(allowed.as_deref(), Some("https://app.example.com"));

        assert_eq!(preflight_allow_origin(&origins, "https://evil.test").await, None);
    }
}
