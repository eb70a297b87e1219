//! Login throttling across the identifier, address, and pair dimensions.

mod common;

use portal_service::services::{AccessClaim, ServiceError};
use uuid::Uuid;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn seventh_attempt_is_rejected_even_with_the_correct_key() {
    let state = common::test_state().await;

    let issued = state.admin.provision("agent", None, None).await.unwrap();

    // Six failed attempts exhaust the identifier window.
    for _ in 0..6 {
        let err = state
            .auth
            .authenticate(&issued.access_id, "0000000000000000", false, "192.0.2.10")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    // The correct key no longer helps.
    let err = state
        .auth
        .authenticate(&issued.access_id, &issued.access_key, false, "192.0.2.10")
        .await
        .unwrap_err();
    match err {
        ServiceError::RateLimited { retry_after_secs } => assert!(retry_after_secs > 0),
        other => panic!("expected rate limiting, got {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn successful_login_clears_identifier_but_not_address_counters() {
    let state = common::test_state().await;

    let issued = state.admin.provision("agent", None, None).await.unwrap();
    let ip = "192.0.2.20";

    for _ in 0..3 {
        let _ = state
            .auth
            .authenticate(&issued.access_id, "0000000000000000", false, ip)
            .await;
    }

    state
        .auth
        .authenticate(&issued.access_id, &issued.access_key, false, ip)
        .await
        .expect("login failed");

    // Identifier and pair counters were cleared by the success...
    let id_key = format!("login:id:{}", issued.access_id);
    let pair_key = format!("login:pair:{}:{}", issued.access_id, ip);
    let ip_key = format!("login:ip:{}", ip);
    let window = common::test_config().rate_limit.login.to_window();

    for key in [&id_key, &pair_key] {
        let decision = state.limiter.consume(key, &window);
        assert!(decision.allowed, "{} should start a fresh window", key);
        state.limiter.reset(key);
    }

    // ...but the address kept its history: 3 failures + 1 success + the
    // probes above leave it partway through the window rather than fresh.
    let mut remaining = 0;
    while state.limiter.consume(&ip_key, &window).allowed {
        remaining += 1;
        assert!(remaining < 10, "address counter was unexpectedly fresh");
    }
    assert!(remaining < 6);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn enlistment_attempts_are_throttled_per_identifier_and_address() {
    let state = common::test_state().await;

    let issued = state.admin.provision("client", None, None).await.unwrap();

    // Exhaust the enlist window with bad tokens.
    for _ in 0..5 {
        let err = state
            .onboarding
            .request_access(
                AccessClaim {
                    access_id: issued.access_id.clone(),
                    access_key: issued.access_key.clone(),
                    access_token: "ffffffffffffffff".to_string(),
                    full_name: "Prober".to_string(),
                    email: format!("prober-{}@example.com", Uuid::new_v4()),
                },
                "192.0.2.30",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    let err = state
        .onboarding
        .request_access(
            AccessClaim {
                access_id: issued.access_id.clone(),
                access_key: issued.access_key.clone(),
                access_token: issued.access_token.clone(),
                full_name: "Prober".to_string(),
                email: format!("prober-{}@example.com", Uuid::new_v4()),
            },
            "192.0.2.30",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::RateLimited { .. }));

    // A different address is not collaterally blocked.
    state
        .onboarding
        .request_access(
            AccessClaim {
                access_id: issued.access_id.clone(),
                access_key: issued.access_key.clone(),
                access_token: issued.access_token.clone(),
                full_name: "Legitimate Holder".to_string(),
                email: format!("holder-{}@example.com", Uuid::new_v4()),
            },
            "192.0.2.31",
        )
        .await
        .expect("claim from a fresh address should pass");
}
