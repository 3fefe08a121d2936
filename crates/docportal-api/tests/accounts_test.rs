mod helpers;

use helpers::{api_path, bearer, setup_test_app, TestApp, PASSWORD};
use serde_json::{json, Value};

fn installer_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": PASSWORD,
        "displayName": "Ian Installer",
        "role": "installer",
        "companyName": "Ian's Installs"
    })
}

/// Admin token, plus a founder of "D1" with its own session.
async fn org_setup(app: &TestApp) -> (String, Value, String) {
    let admin = app.admin_token().await;
    let founder = app.founder(&admin, "dora@d1.com", "D1").await;
    let founder_token = app.sign_in("dora@d1.com", PASSWORD).await;
    (admin, founder, founder_token)
}

#[tokio::test]
async fn test_founder_provisions_and_lists_installer() {
    let app = setup_test_app();
    let (_, founder, founder_token) = org_setup(&app).await;

    let installer = app
        .create_account(&founder_token, installer_body("ian@x.com"))
        .await;
    assert_eq!(installer["role"], "installer");
    assert_eq!(installer["distributorId"], founder["distributorId"]);
    assert_eq!(installer["createdBy"], founder["id"]);

    let response = app
        .client()
        .get(&api_path("/accounts"))
        .add_header("Authorization", bearer(&founder_token))
        .await;
    assert_eq!(response.status_code(), 200);
    let listed: Vec<Value> = response.json();
    assert!(listed.iter().any(|a| a["id"] == installer["id"]));
}

#[tokio::test]
async fn test_installer_cannot_provision_accounts() {
    let app = setup_test_app();
    let (_, _, founder_token) = org_setup(&app).await;
    app.create_account(&founder_token, installer_body("ian@x.com"))
        .await;
    let installer_token = app.sign_in("ian@x.com", PASSWORD).await;

    let response = app
        .client()
        .post(&api_path("/accounts"))
        .add_header("Authorization", bearer(&installer_token))
        .json(&installer_body("other@x.com"))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["code"], "AUTHORIZATION_ERROR");
    assert_eq!(body["kind"], "authorization");
    assert_eq!(
        body["error"],
        "You do not have permission to perform this operation"
    );
}

#[tokio::test]
async fn test_other_organization_is_out_of_reach() {
    let app = setup_test_app();
    let (admin, _, founder_token) = org_setup(&app).await;
    let installer = app
        .create_account(&founder_token, installer_body("ian@x.com"))
        .await;
    app.founder(&admin, "eve@d2.com", "D2").await;
    let rival_token = app.sign_in("eve@d2.com", PASSWORD).await;

    let path = api_path(&format!("/accounts/{}", installer["id"].as_str().unwrap()));
    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", bearer(&rival_token))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", bearer(&founder_token))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_duplicate_email_is_a_conflict() {
    let app = setup_test_app();
    let (_, _, founder_token) = org_setup(&app).await;
    app.create_account(&founder_token, installer_body("ian@x.com"))
        .await;

    let response = app
        .client()
        .post(&api_path("/accounts"))
        .add_header("Authorization", bearer(&founder_token))
        .json(&installer_body("IAN@x.com"))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_delete_endpoint_requires_matching_admin_user_id() {
    let app = setup_test_app();
    let (admin, founder, founder_token) = org_setup(&app).await;
    let installer = app
        .create_account(&founder_token, installer_body("ian@x.com"))
        .await;
    let delete_path = api_path("/accounts/delete");

    let response = app
        .client()
        .post(&delete_path)
        .add_header("Authorization", bearer(&founder_token))
        .json(&json!({ "userId": installer["id"] }))
        .await;
    assert_eq!(response.status_code(), 400);

    // adminUserId naming someone other than the caller.
    let response = app
        .client()
        .post(&delete_path)
        .add_header("Authorization", bearer(&admin))
        .json(&json!({ "userId": installer["id"], "adminUserId": founder["id"] }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .client()
        .post(&delete_path)
        .add_header("Authorization", bearer(&founder_token))
        .json(&json!({ "userId": installer["id"], "adminUserId": founder["id"] }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["deletedUserId"], installer["id"]);
    assert_eq!(body["warnings"], json!([]));

    let response = app
        .client()
        .get(&api_path(&format!("/accounts/{}", installer["id"].as_str().unwrap())))
        .add_header("Authorization", bearer(&founder_token))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_deleted_account_session_stops_working() {
    let app = setup_test_app();
    let (_, founder, founder_token) = org_setup(&app).await;
    let installer = app
        .create_account(&founder_token, installer_body("ian@x.com"))
        .await;
    let installer_token = app.sign_in("ian@x.com", PASSWORD).await;

    app.client()
        .post(&api_path("/accounts/delete"))
        .add_header("Authorization", bearer(&founder_token))
        .json(&json!({ "userId": installer["id"], "adminUserId": founder["id"] }))
        .await;

    let response = app
        .client()
        .get(&api_path("/me"))
        .add_header("Authorization", bearer(&installer_token))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_last_team_admin_cannot_step_down() {
    let app = setup_test_app();
    let (_, founder, founder_token) = org_setup(&app).await;

    let response = app
        .client()
        .put(&api_path(&format!(
            "/accounts/{}/team-admin",
            founder["id"].as_str().unwrap()
        )))
        .add_header("Authorization", bearer(&founder_token))
        .json(&json!({ "isAdmin": false }))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["code"], "LAST_ADMIN");
}

#[tokio::test]
async fn test_role_change_returns_outcome() {
    let app = setup_test_app();
    let (_, _, founder_token) = org_setup(&app).await;
    let installer = app
        .create_account(&founder_token, installer_body("ian@x.com"))
        .await;

    let response = app
        .client()
        .patch(&api_path(&format!("/accounts/{}", installer["id"].as_str().unwrap())))
        .add_header("Authorization", bearer(&founder_token))
        .json(&json!({ "role": "user" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["account"]["role"], "user");
    assert!(body["warnings"].is_array());

    let response = app
        .client()
        .patch(&api_path(&format!("/accounts/{}", installer["id"].as_str().unwrap())))
        .add_header("Authorization", bearer(&founder_token))
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_distributor_listing_is_scoped() {
    let app = setup_test_app();
    let (admin, founder, founder_token) = org_setup(&app).await;
    app.founder(&admin, "eve@d2.com", "D2").await;

    let response = app
        .client()
        .get(&api_path("/distributors"))
        .add_header("Authorization", bearer(&admin))
        .await;
    let all: Vec<Value> = response.json();
    assert_eq!(all.len(), 2);

    let response = app
        .client()
        .get(&api_path("/distributors"))
        .add_header("Authorization", bearer(&founder_token))
        .await;
    let own: Vec<Value> = response.json();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["id"], founder["distributorId"]);
    assert_eq!(own[0]["companyName"], "D1");
}
