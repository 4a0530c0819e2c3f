mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    MockBackend, TEST_TENANT_ID, claims_for, get, request, send, sign, test_router, test_state,
    token_for,
};
use reqwest::StatusCode as BackendStatus;
use serde_json::json;
use tenant_portal::{auth::UserType, create_router};
use uuid::Uuid;

// --- Login ---

#[tokio::test]
async fn test_login_without_provider_returns_hint() {
    let router = test_router(Arc::new(MockBackend::default()));

    let response = send(router, get("/login", None)).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["loginPath"], "/login");
}

#[tokio::test]
async fn test_login_redirects_to_configured_provider() {
    let mut state = test_state(Arc::new(MockBackend::default()));
    state.config.login_url = Some("https://id.example.com/authorize".to_string());

    let response = send(create_router(state), get("/login", None)).await;

    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("https://id.example.com/authorize"));
}

// --- Dashboard ---

#[tokio::test]
async fn test_dashboard_summary_hides_access_token() {
    let router = test_router(Arc::new(MockBackend::default()));
    let token = token_for(UserType::TenantUser);

    let response = send(router, get("/dashboard", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["username"], "jdoe");
    assert_eq!(body["userType"], "tenant_user");
    assert_eq!(body["tenantId"], TEST_TENANT_ID.to_string());
    assert_eq!(body["profile"]["email"], "jdoe@example.com");
    assert!(!String::from_utf8(response.body).unwrap().contains("backend-access-token"));
}

#[tokio::test]
async fn test_patients_are_fetched_with_session_token() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let token = token_for(UserType::TenantOwner);

    let response = send(router.clone(), get("/dashboard/patients?page=1&limit=5", Some(&token))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["meta"]["total"], 0);

    let patient_id = Uuid::from_u128(9);
    let response = send(
        router,
        get(&format!("/dashboard/patients/{patient_id}"), Some(&token)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["firstName"], "Ana");

    assert_eq!(
        backend.calls(),
        vec![
            "list_patients backend-access-token",
            "get_patient backend-access-token"
        ]
    );
}

#[tokio::test]
async fn test_session_without_access_token_is_unauthorized() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let mut claims = claims_for(Some(UserType::TenantUser));
    claims.access_token = None;

    let response = send(router, get("/dashboard/patients", Some(&sign(&claims)))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(backend.calls().is_empty());
}

// --- Tenants ---

#[tokio::test]
async fn test_list_tenants_returns_page() {
    let router = test_router(Arc::new(MockBackend::default()));
    let token = token_for(UserType::SystemAdmin);

    let response = send(router, get("/tenants?page=2&limit=25&status=active", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["page"], 2);
    assert_eq!(body["meta"]["limit"], 25);
    assert_eq!(body["meta"]["totalPages"], 1);
}

#[tokio::test]
async fn test_create_tenant_returns_201() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let token = token_for(UserType::SystemAdmin);

    let response = send(
        router,
        request("POST", "/tenants", Some(&token), Some(json!({ "name": "Nueva Clinica" }))),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["name"], "Nueva Clinica");
    assert_eq!(backend.calls(), vec!["create_tenant backend-access-token"]);
}

#[tokio::test]
async fn test_create_tenant_rejects_blank_name() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let token = token_for(UserType::SystemAdmin);

    let response = send(
        router,
        request("POST", "/tenants", Some(&token), Some(json!({ "name": "   " }))),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_tenant_lifecycle_operations() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let token = token_for(UserType::SystemAdmin);
    let id = Uuid::from_u128(5);

    let response = send(router.clone(), get(&format!("/tenants/{id}"), Some(&token))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], id.to_string());

    let response = send(
        router.clone(),
        request(
            "PATCH",
            &format!("/tenants/{id}"),
            Some(&token),
            Some(json!({ "name": "Renamed" })),
        ),
    )
    .await;
    assert_eq!(response.json()["name"], "Renamed");

    let response = send(
        router.clone(),
        request(
            "PATCH",
            &format!("/tenants/{id}/status"),
            Some(&token),
            Some(json!({ "status": "suspended" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "suspended");

    let response = send(
        router,
        request("DELETE", &format!("/tenants/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    assert_eq!(
        backend.calls(),
        vec![
            "get_tenant backend-access-token",
            "update_tenant backend-access-token",
            "update_tenant_status backend-access-token",
            "delete_tenant backend-access-token",
        ]
    );
}

#[tokio::test]
async fn test_memberships_listing_and_assignment() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let token = token_for(UserType::SystemAdmin);
    let tenant_id = Uuid::from_u128(5);
    let membership_id = Uuid::from_u128(100);

    let response = send(router.clone(), get("/tenants/memberships", Some(&token))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()[0]["name"], "Pro");

    let response = send(
        router,
        request(
            "POST",
            &format!("/tenants/{tenant_id}/membership"),
            Some(&token),
            Some(json!({ "membershipId": membership_id })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["tenantId"], tenant_id.to_string());
    assert_eq!(body["membershipId"], membership_id.to_string());
}

#[tokio::test]
async fn test_membership_with_inverted_dates_is_rejected() {
    let backend = Arc::new(MockBackend::default());
    let router = test_router(backend.clone());
    let token = token_for(UserType::SystemAdmin);

    let response = send(
        router,
        request(
            "POST",
            &format!("/tenants/{}/membership", Uuid::from_u128(5)),
            Some(&token),
            Some(json!({
                "membershipId": Uuid::from_u128(100),
                "startsAt": "2026-02-01T00:00:00Z",
                "endsAt": "2026-01-01T00:00:00Z"
            })),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(backend.calls().is_empty());
}

// --- Settings ---

#[tokio::test]
async fn test_settings_use_session_tenant() {
    let router = test_router(Arc::new(MockBackend::default()));
    let token = token_for(UserType::TenantOwner);

    let response = send(router.clone(), get("/settings", Some(&token))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], TEST_TENANT_ID.to_string());

    let response = send(
        router,
        request("PATCH", "/settings", Some(&token), Some(json!({ "phone": "+54 11 5555" }))),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], TEST_TENANT_ID.to_string());
}

#[tokio::test]
async fn test_settings_without_tenant_is_bad_request() {
    let router = test_router(Arc::new(MockBackend::default()));
    let mut claims = claims_for(Some(UserType::TenantOwner));
    claims.tenant_id = None;

    let response = send(router, get("/settings", Some(&sign(&claims)))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// --- Backend Failures ---

#[tokio::test]
async fn test_backend_client_errors_pass_through() {
    let router = test_router(Arc::new(MockBackend::failing(BackendStatus::NOT_FOUND)));
    let token = token_for(UserType::SystemAdmin);

    let response = send(router, get(&format!("/tenants/{}", Uuid::from_u128(3)), Some(&token))).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 404);
    assert_eq!(body["message"], "mock failure for get_tenant");
}

#[tokio::test]
async fn test_backend_outage_becomes_bad_gateway() {
    let router = test_router(Arc::new(MockBackend::failing(
        BackendStatus::SERVICE_UNAVAILABLE,
    )));
    let token = token_for(UserType::SystemAdmin);

    let response = send(router, get("/tenants", Some(&token))).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.json()["message"], "Backend service unavailable");
}

#[tokio::test]
async fn test_backend_refusal_becomes_unprocessable_entity() {
    let router = test_router(Arc::new(MockBackend::rejecting("slug already taken")));
    let token = token_for(UserType::SystemAdmin);

    let response = send(
        router,
        request("POST", "/tenants", Some(&token), Some(json!({ "name": "Clinica Norte" }))),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 422);
    assert_eq!(body["message"], "slug already taken");
}
