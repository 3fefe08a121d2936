mod helpers;

use helpers::{api_path, bearer, setup_test_app, TestApp, PASSWORD};
use serde_json::{json, Value};

const INVITEE: &str = "ivy@installers.com";

async fn invite(app: &TestApp, token: &str) -> Value {
    let response = app
        .client()
        .post(&api_path("/invitations"))
        .add_header("Authorization", bearer(token))
        .json(&json!({
            "email": INVITEE,
            "name": "Ivy",
            "role": "installer",
            "companyName": "Ivy Installs"
        }))
        .await;
    assert_eq!(response.status_code(), 201, "{}", response.text());
    response.json()
}

#[tokio::test]
async fn test_invite_lookup_accept() {
    let app = setup_test_app();
    let admin = app.admin_token().await;
    let founder = app.founder(&admin, "dora@d1.com", "D1").await;
    let founder_token = app.sign_in("dora@d1.com", PASSWORD).await;

    let created = invite(&app, &founder_token).await;
    assert_eq!(created["invitation"]["status"], "pending");
    assert_eq!(created["invitation"]["inviterCompany"], "D1");
    assert!(created["invitation"].get("token").is_none());
    assert_eq!(created["warnings"], json!([]));

    let token = app.outbox.token_for(INVITEE);
    let response = app
        .client()
        .get(&api_path("/invitations/lookup"))
        .add_query_param("token", &token)
        .await;
    assert_eq!(response.status_code(), 200);
    let preview: Value = response.json();
    assert_eq!(preview["email"], INVITEE);
    assert_eq!(preview["status"], "pending");
    assert!(preview.get("token").is_none());

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&json!({ "token": token, "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 201);
    let accepted: Value = response.json();
    assert_eq!(accepted["account"]["role"], "installer");
    assert_eq!(accepted["account"]["distributorId"], founder["distributorId"]);

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&json!({ "token": token, "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVITATION_ALREADY_USED");

    app.sign_in(INVITEE, PASSWORD).await;
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let app = setup_test_app();
    let response = app
        .client()
        .get(&api_path("/invitations/lookup"))
        .add_query_param("token", "deadbeef")
        .await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVITATION_NOT_FOUND");

    let response = app.client().get(&api_path("/invitations/lookup")).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_admin_cannot_invite() {
    let app = setup_test_app();
    let admin = app.admin_token().await;
    let response = app
        .client()
        .post(&api_path("/invitations"))
        .add_header("Authorization", bearer(&admin))
        .json(&json!({ "email": INVITEE, "name": "Ivy", "role": "user" }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_issuing_requires_a_session() {
    let app = setup_test_app();
    let response = app
        .client()
        .post(&api_path("/invitations"))
        .json(&json!({ "email": INVITEE, "name": "Ivy", "role": "user" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_revoked_invitation_cannot_be_accepted() {
    let app = setup_test_app();
    let admin = app.admin_token().await;
    app.founder(&admin, "dora@d1.com", "D1").await;
    let founder_token = app.sign_in("dora@d1.com", PASSWORD).await;
    let created = invite(&app, &founder_token).await;
    let token = app.outbox.token_for(INVITEE);
    let id = created["invitation"]["id"].as_str().unwrap().to_string();

    let response = app
        .client()
        .get(&api_path("/invitations"))
        .add_header("Authorization", bearer(&founder_token))
        .await;
    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 1);

    let response = app
        .client()
        .delete(&api_path(&format!("/invitations/{}", id)))
        .add_header("Authorization", bearer(&founder_token))
        .await;
    assert_eq!(response.status_code(), 204);

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&json!({ "token": token, "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_resend_keeps_the_link() {
    let app = setup_test_app();
    let admin = app.admin_token().await;
    app.founder(&admin, "dora@d1.com", "D1").await;
    let founder_token = app.sign_in("dora@d1.com", PASSWORD).await;
    let created = invite(&app, &founder_token).await;
    let token = app.outbox.token_for(INVITEE);

    let response = app
        .client()
        .post(&api_path(&format!(
            "/invitations/{}/resend",
            created["invitation"]["id"].as_str().unwrap()
        )))
        .add_header("Authorization", bearer(&founder_token))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(app.outbox.token_for(INVITEE), token);
}
