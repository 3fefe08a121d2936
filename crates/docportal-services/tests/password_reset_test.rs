mod helpers;

use docportal_core::models::Role;
use docportal_core::{Actor, AppError};
use docportal_services::TemplateKind;
use helpers::{setup, TestPortal, PASSWORD};

const NEW_PASSWORD: &str = "Fresh-passw0rd";

fn token_from_outbox(portal: &TestPortal, email: &str) -> String {
    let sent = portal.outbox.last_to(email).unwrap();
    assert_eq!(sent.kind, TemplateKind::PasswordReset);
    let link = &sent.vars["link"];
    link.split("token=").nth(1).unwrap().to_string()
}

#[tokio::test]
async fn test_reset_flow_sets_new_password_once() {
    let portal = setup();
    let admin = portal.admin().await;
    let founder = portal.founder(&admin, "dora@d1.com", "D1").await;
    let old_session = portal
        .services
        .accounts
        .sign_in("dora@d1.com", PASSWORD)
        .await
        .unwrap()
        .session;

    portal
        .services
        .password_resets
        .request_password_reset("Dora@D1.com")
        .await
        .unwrap();
    let token = token_from_outbox(&portal, "dora@d1.com");
    let sent = portal.outbox.last_to("dora@d1.com").unwrap();
    assert_eq!(sent.vars["expires_in_minutes"], "60");
    assert_eq!(sent.vars["name"], founder.display_name);

    // Session timestamps have second granularity.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    portal
        .services
        .password_resets
        .complete_password_reset(&token, NEW_PASSWORD)
        .await
        .unwrap();

    assert!(matches!(
        portal.services.accounts.sign_in("dora@d1.com", PASSWORD).await,
        Err(AppError::Unauthorized(_))
    ));
    portal
        .services
        .accounts
        .sign_in("dora@d1.com", NEW_PASSWORD)
        .await
        .unwrap();
    assert!(portal
        .services
        .accounts
        .authenticate(&old_session.token)
        .await
        .is_err());

    let err = portal
        .services
        .password_resets
        .complete_password_reset(&token, "Another-passw0rd")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOrExpiredToken));
}

#[tokio::test]
async fn test_unknown_email_is_success_shaped() {
    let portal = setup();
    portal.admin().await;
    portal
        .services
        .password_resets
        .request_password_reset("nobody@nowhere.com")
        .await
        .unwrap();
    assert!(portal.outbox.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_email_is_rejected() {
    let portal = setup();
    assert!(matches!(
        portal
            .services
            .password_resets
            .request_password_reset("not-an-email")
            .await,
        Err(AppError::InvalidEmail(_))
    ));
}

#[tokio::test]
async fn test_delivery_failure_still_reports_success() {
    let portal = setup();
    portal.admin().await;
    portal.outbox.set_failing(true);
    portal
        .services
        .password_resets
        .request_password_reset("root@portal.test")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_tampered_or_garbage_tokens_are_rejected() {
    let portal = setup();
    portal.admin().await;
    portal
        .services
        .password_resets
        .request_password_reset("root@portal.test")
        .await
        .unwrap();
    let token = token_from_outbox(&portal, "root@portal.test");
    let (id, _secret) = token.split_once('.').unwrap();

    for bad in [
        "garbage".to_string(),
        format!("{}.{}", id, "0".repeat(64)),
        format!("{}.{}", uuid::Uuid::new_v4(), "0".repeat(64)),
    ] {
        let err = portal
            .services
            .password_resets
            .complete_password_reset(&bad, NEW_PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredToken), "{bad}");
    }

    // The genuine token is still usable after failed attempts.
    portal
        .services
        .password_resets
        .complete_password_reset(&token, NEW_PASSWORD)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_weak_new_password_is_rejected_before_consuming_token() {
    let portal = setup();
    portal.admin().await;
    portal
        .services
        .password_resets
        .request_password_reset("root@portal.test")
        .await
        .unwrap();
    let token = token_from_outbox(&portal, "root@portal.test");

    assert!(matches!(
        portal
            .services
            .password_resets
            .complete_password_reset(&token, "short")
            .await,
        Err(AppError::WeakPassword(_))
    ));
    portal
        .services
        .password_resets
        .complete_password_reset(&token, NEW_PASSWORD)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_deleting_account_drops_outstanding_resets() {
    let portal = setup();
    let admin = portal.admin().await;
    let founder = portal.founder(&admin, "dora@d1.com", "D1").await;
    let installer = portal.create(&founder, "ian@x.com", Role::Installer).await;
    portal
        .services
        .password_resets
        .request_password_reset("ian@x.com")
        .await
        .unwrap();
    let token = token_from_outbox(&portal, "ian@x.com");

    portal
        .services
        .accounts
        .delete_account(&Actor::from_account(&founder), installer.id)
        .await
        .unwrap();
    assert!(matches!(
        portal
            .services
            .password_resets
            .complete_password_reset(&token, NEW_PASSWORD)
            .await,
        Err(AppError::InvalidOrExpiredToken)
    ));
}
