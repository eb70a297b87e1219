//! End-to-end onboarding scenarios: provision, claim, approve, login.

mod common;

use portal_service::services::{AccessClaim, ServiceError};
use uuid::Uuid;

fn unique_email() -> String {
    format!("investor-{}@example.com", Uuid::new_v4())
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn provision_claim_approve_login_happy_path() {
    let state = common::test_state().await;

    // Provision: client accounts start pending with an unconsumed token.
    let issued = state
        .admin
        .provision("client", Some("Jordan Vale".to_string()), None)
        .await
        .expect("provisioning failed");
    assert_eq!(issued.account.status, "pending");
    assert!(!issued.account.token_consumed);
    assert!(issued.access_token.len() > issued.access_key.len());

    // Claim with the one-time token: status stays pending, identity lands.
    let email = unique_email();
    state
        .onboarding
        .request_access(
            AccessClaim {
                access_id: issued.access_id.clone(),
                access_key: issued.access_key.clone(),
                access_token: issued.access_token.clone(),
                full_name: "Jordan Vale".to_string(),
                email: email.clone(),
            },
            "198.51.100.10",
        )
        .await
        .expect("claim failed");

    let account = state
        .db
        .find_account_by_access_id(&issued.access_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.status_code, "pending");
    assert!(account.token_consumed);
    assert_eq!(account.email.as_deref(), Some(email.as_str()));
    assert_eq!(account.full_name.as_deref(), Some("Jordan Vale"));

    // Pending accounts cannot authenticate.
    let err = state
        .auth
        .authenticate(&issued.access_id, &issued.access_key, false, "198.51.100.10")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    // Approve, then login succeeds with a non-admin session.
    state
        .onboarding
        .approve(account.account_id)
        .await
        .expect("approval failed");

    let grant = state
        .auth
        .authenticate(&issued.access_id, &issued.access_key, false, "198.51.100.10")
        .await
        .expect("login failed");
    assert_eq!(grant.role, "client");
    let claims = state.sessions.validate(&grant.session_token).unwrap();
    assert_eq!(claims.sub, account.account_id.to_string());
    assert!(!claims.is_admin());

    // The same credentials cannot open an administrator session.
    let err = state
        .auth
        .authenticate(&issued.access_id, &issued.access_key, true, "198.51.100.10")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn claiming_twice_fails_with_token_already_used() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();

    let claim = AccessClaim {
        access_id: issued.access_id.clone(),
        access_key: issued.access_key.clone(),
        access_token: issued.access_token.clone(),
        full_name: "First Claimant".to_string(),
        email: unique_email(),
    };

    state
        .onboarding
        .request_access(claim.clone(), "198.51.100.20")
        .await
        .unwrap();

    let second = AccessClaim {
        email: unique_email(),
        ..claim
    };
    let err = state
        .onboarding
        .request_access(second, "198.51.100.20")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::TokenAlreadyUsed));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn wrong_credentials_are_indistinguishable() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();

    // Unknown identifier and wrong key produce the same opaque error.
    let unknown = state
        .onboarding
        .request_access(
            AccessClaim {
                access_id: "IP-ZZZZ9999".to_string(),
                access_key: issued.access_key.clone(),
                access_token: issued.access_token.clone(),
                full_name: "Nobody".to_string(),
                email: unique_email(),
            },
            "198.51.100.30",
        )
        .await
        .unwrap_err();
    let wrong_key = state
        .onboarding
        .request_access(
            AccessClaim {
                access_id: issued.access_id.clone(),
                access_key: "0000000000000000".to_string(),
                access_token: issued.access_token.clone(),
                full_name: "Nobody".to_string(),
                email: unique_email(),
            },
            "198.51.100.30",
        )
        .await
        .unwrap_err();

    assert!(matches!(unknown, ServiceError::InvalidCredentials));
    assert!(matches!(wrong_key, ServiceError::InvalidCredentials));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn concurrent_claims_consume_the_token_exactly_once() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let onboarding = state.onboarding.clone();
        let claim = AccessClaim {
            access_id: issued.access_id.clone(),
            access_key: issued.access_key.clone(),
            access_token: issued.access_token.clone(),
            full_name: format!("Claimant {}", i),
            email: unique_email(),
        };
        // Distinct addresses so the throttle does not serialize the race.
        let ip = format!("203.0.113.{}", i + 1);
        handles.push(tokio::spawn(async move {
            onboarding.request_access(claim, &ip).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            Err(ServiceError::TokenAlreadyUsed) | Err(ServiceError::InvalidCredentials) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn status_check_requires_proof_of_key_possession() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();

    let status = state
        .onboarding
        .check_status(&issued.access_id, &issued.access_key, "198.51.100.40")
        .await
        .unwrap();
    assert_eq!(status, "pending");

    let err = state
        .onboarding
        .check_status(&issued.access_id, "0000000000000000", "198.51.100.40")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn rejected_accounts_can_be_reactivated() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();
    let account_id = issued.account.account_id;

    let rejected = state.onboarding.reject(account_id).await.unwrap();
    assert_eq!(rejected.status, "rejected");

    let reactivated = state.onboarding.approve(account_id).await.unwrap();
    assert_eq!(reactivated.status, "active");

    // Approving an active account is a no-op.
    let again = state.onboarding.approve(account_id).await.unwrap();
    assert_eq!(again.status, "active");

    // Active accounts cannot be rejected.
    let err = state.onboarding.reject(account_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn standing_invites_are_consumable_once() {
    let state = common::test_state().await;

    let email = unique_email();
    let (invite, token) = state
        .admin
        .issue_invite(email.clone(), "client", None, Some(24))
        .await
        .unwrap();
    assert_eq!(invite.status, "sent");

    let issued = state
        .admin
        .accept_invite(&token, Some("Invited Investor".to_string()))
        .await
        .unwrap();
    assert_eq!(issued.account.email.as_deref(), Some(email.as_str()));
    assert_eq!(issued.account.status, "pending");

    // The invite is spent; the same token buys nothing further.
    let err = state.admin.accept_invite(&token, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    // A revoked invite cannot be accepted.
    let (revocable, token2) = state
        .admin
        .issue_invite(unique_email(), "client", None, None)
        .await
        .unwrap();
    state.admin.revoke_invite(revocable.invite_id).await.unwrap();
    let err = state.admin.accept_invite(&token2, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    // An unknown token is simply not found.
    let err = state.admin.accept_invite("no-such-token", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::InviteNotFound));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn non_client_roles_are_active_immediately() {
    let state = common::test_state().await;

    let issued = state
        .admin
        .provision("agent", Some("Field Agent".to_string()), None)
        .await
        .unwrap();
    assert_eq!(issued.account.status, "active");

    let grant = state
        .auth
        .authenticate(&issued.access_id, &issued.access_key, false, "198.51.100.50")
        .await
        .expect("agent login failed");
    assert_eq!(grant.role, "client");
}
