mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Json, Router,
};
use common::{body_json, engine, engine_with, token_for, Directory, Unresponsive, AUNT, LODGER, MOM};
use journal_service::authz::{ownership_gate, AuthorizationEngine, FamilyContext};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

async fn echo_context(context: Option<Extension<FamilyContext>>) -> Json<serde_json::Value> {
    Json(match context {
        Some(Extension(context)) => json!({
            "accountId": context.account_id,
            "familyId": context.family_id.0,
            "resource": context.resource.kind.as_str(),
            "resourceId": context.resource.id,
        }),
        None => json!({ "context": null }),
    })
}

/// Family-scoped route shapes with handlers that only echo what the gate
/// attached.
fn app(engine: Arc<AuthorizationEngine>) -> Router {
    Router::new()
        .route("/kids", post(echo_context))
        .route("/kids/:kidId", get(echo_context).delete(echo_context))
        .route("/kids/:kidId/drawing-boxes", post(echo_context))
        .route("/drawing-boxes/:drawingBoxId", get(echo_context))
        .route("/drawings/:drawingId", get(echo_context).put(echo_context))
        .route(
            "/drawings/:drawingId/drawing-boxes/:drawingBoxId",
            put(echo_context),
        )
        .route("/family-overview", get(echo_context))
        .route_layer(from_fn_with_state(engine, ownership_gate))
}

fn request(method: Method, uri: &str, email: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = email {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(email)));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn same_family_is_allowed_and_context_is_attached() {
    let response = app(engine())
        .oneshot(request(Method::GET, "/drawings/30", Some(MOM)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accountId"], 1);
    assert_eq!(body["familyId"], 1);
    assert_eq!(body["resource"], "drawing");
    assert_eq!(body["resourceId"], 30);
}

#[tokio::test]
async fn other_family_is_forbidden_for_every_kind() {
    let app = app(engine());
    for uri in ["/drawings/30", "/drawing-boxes/20", "/kids/10"] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, uri, Some(AUNT)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let response = app(engine())
        .oneshot(request(Method::GET, "/drawings/999", Some(MOM)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_or_bad_credentials_are_unauthorized() {
    let app = app(engine());

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/kids/10", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/kids/10")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid signature, but no account behind it.
    let response = app
        .oneshot(request(Method::GET, "/kids/10", Some("stranger@example.test")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn legacy_token_header_is_accepted() {
    let response = app(engine())
        .oneshot(
            Request::builder()
                .uri("/kids/11")
                .header("accessToken", token_for(AUNT))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn creation_requests_bypass_the_gate() {
    let app = app(engine());

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/kids", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "context": null }));

    // Even under another family's kid: the creation handler owns that check.
    let response = app
        .oneshot(request(Method::POST, "/kids/10/drawing-boxes", Some(AUNT)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn drawing_id_takes_precedence_over_drawing_box_id() {
    let app = app(engine());

    // Drawing 30 is family 1's, box 21 is family 2's: only the drawing counts.
    let response = app
        .clone()
        .oneshot(request(Method::PUT, "/drawings/30/drawing-boxes/21", Some(MOM)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["resource"], "drawing");
    assert_eq!(body["resourceId"], 30);

    let response = app
        .oneshot(request(Method::PUT, "/drawings/30/drawing-boxes/21", Some(AUNT)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_numeric_identifier_is_a_bad_request() {
    let response = app(engine())
        .oneshot(request(Method::GET, "/drawings/abc", Some(MOM)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn route_without_resource_identifier_is_a_bad_request() {
    let response = app(engine())
        .oneshot(request(Method::GET, "/family-overview", Some(MOM)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn account_without_family_is_forbidden() {
    let response = app(engine())
        .oneshot(request(Method::DELETE, "/kids/10", Some(LODGER)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unresponsive_ownership_store_fails_closed() {
    let directory = Arc::new(Directory::two_families());
    let engine = engine_with(directory, Arc::new(Unresponsive), Duration::from_millis(50));

    let response = app(engine)
        .oneshot(request(Method::GET, "/drawings/30", Some(MOM)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn denial_body_uses_the_error_envelope() {
    let response = app(engine())
        .oneshot(request(Method::GET, "/kids/10", Some(AUNT)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Resource belongs to another family");
}
