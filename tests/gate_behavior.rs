//! Behavior-driven tests for the access gate.
//!
//! These tests verify HOW the gate admits, limits, and rejects requests:
//! authentication, tier authorization, quota accounting, and dispatch.

use tickgate_core::{GateError, Tier};
use tickgate_tests::{fixture_today, gate_with_keys, identity, request, yesterday, Arc};

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn when_api_key_is_unknown_then_request_is_unauthenticated() {
    // Given: A gate with registered keys
    let fixture = gate_with_keys();

    // When: A request carries a key nobody registered
    let error = fixture
        .gate
        .handle_at(&request("no-such-key", "sma", "AAPL"), fixture_today())
        .await
        .expect_err("must be rejected");

    // Then: The failure is terminal with the 401 mapping
    assert!(matches!(error, GateError::Unauthenticated));
    assert_eq!(error.status_code(), 401);
    assert_eq!(error.code(), "gate.unauthenticated");
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn when_free_key_requests_sma_then_series_covers_ninety_days() {
    // Given: A free-tier key over the 400-day fixture dataset
    let fixture = gate_with_keys();

    // When: The caller asks for a default SMA
    let response = fixture
        .gate
        .handle_at(&request("key-free", "sma", "aapl"), fixture_today())
        .await
        .expect("request admitted");

    // Then: The symbol is normalized and the slice is the 90-day window,
    // endpoints inclusive
    assert_eq!(response.symbol.as_str(), "AAPL");
    assert_eq!(response.data.len(), 91);
    // 20-period warm-up stays in the output as absent values
    assert_eq!(response.data[18].value, None);
    assert!(response.data[19].value.is_some());
}

#[tokio::test]
async fn when_free_key_requests_rsi_then_forbidden_without_consuming_quota() {
    // Given: A free-tier key, which may only use sma and ema
    let fixture = gate_with_keys();

    // When: The caller asks for RSI
    let error = fixture
        .gate
        .handle_at(&request("key-free", "rsi", "AAPL"), fixture_today())
        .await
        .expect_err("must be rejected");

    // Then: 403, and the denial did not cost a request
    assert!(matches!(
        error,
        GateError::Forbidden {
            tier: Tier::Free,
            ..
        }
    ));
    assert_eq!(error.status_code(), 403);
    let stored = fixture.store.get("id-free").expect("identity present");
    assert_eq!(stored.requests_made, 0);
}

#[tokio::test]
async fn when_indicator_name_is_unregistered_then_forbidden_names_the_tier() {
    // Given: A premium key, which is allowed every registered indicator
    let fixture = gate_with_keys();

    // When: The caller asks for an indicator that does not exist
    let error = fixture
        .gate
        .handle_at(&request("key-premium", "VWAP", "AAPL"), fixture_today())
        .await
        .expect_err("must be rejected");

    // Then: Unknown names are indistinguishable from disallowed ones
    match error {
        GateError::Forbidden { tier, indicator } => {
            assert_eq!(tier, Tier::Premium);
            assert_eq!(indicator, "vwap");
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn when_premium_requests_bollinger_then_full_history_is_served() {
    // Given: A premium key whose window reaches back to the dataset epoch
    let fixture = gate_with_keys();

    // When: The caller asks for the bollinger middle band
    let response = fixture
        .gate
        .handle_at(&request("key-premium", "bollinger", "MSFT"), fixture_today())
        .await
        .expect("request admitted");

    // Then: All 400 fixture candles fall inside the window
    assert_eq!(response.data.len(), 400);
}

// =============================================================================
// Quota accounting
// =============================================================================

#[tokio::test]
async fn when_last_daily_slot_is_used_then_next_request_is_quota_exceeded() {
    // Given: A free identity with 49 of 50 requests already spent today
    let fixture = gate_with_keys();
    fixture
        .store
        .insert(identity("id-free", "key-free", Tier::Free, 49));

    // When: Two more requests arrive
    let first = fixture
        .gate
        .handle_at(&request("key-free", "sma", "AAPL"), fixture_today())
        .await;
    let second = fixture
        .gate
        .handle_at(&request("key-free", "sma", "AAPL"), fixture_today())
        .await;

    // Then: The 50th is admitted, the 51st is refused, and the counter
    // stays pinned at the limit
    assert!(first.is_ok());
    let error = second.expect_err("limit reached");
    assert!(matches!(error, GateError::QuotaExceeded { limit: 50 }));
    assert_eq!(error.status_code(), 429);
    let stored = fixture.store.get("id-free").expect("identity present");
    assert_eq!(stored.requests_made, 50);
}

#[tokio::test]
async fn when_calendar_day_advances_then_quota_resets_lazily() {
    // Given: A free identity that exhausted yesterday's quota
    let fixture = gate_with_keys();
    let mut stale = identity("id-free", "key-free", Tier::Free, 50);
    stale.last_request_date = yesterday();
    fixture.store.insert(stale);

    // When: The first request of the new day arrives
    let response = fixture
        .gate
        .handle_at(&request("key-free", "ema", "AAPL"), fixture_today())
        .await;

    // Then: It is admitted and the counter restarted at one
    assert!(response.is_ok());
    let stored = fixture.store.get("id-free").expect("identity present");
    assert_eq!(stored.requests_made, 1);
    assert_eq!(stored.last_request_date, fixture_today());
}

#[tokio::test]
async fn when_symbol_is_unknown_then_not_found_still_costs_a_request() {
    // Given: A free key and a symbol absent from the dataset
    let fixture = gate_with_keys();

    // When: The caller asks for it
    let error = fixture
        .gate
        .handle_at(&request("key-free", "sma", "ZZZZ"), fixture_today())
        .await
        .expect_err("must be rejected");

    // Then: 404, and the quota was consumed before dispatch
    assert!(matches!(error, GateError::NotFound { .. }));
    assert_eq!(error.status_code(), 404);
    let stored = fixture.store.get("id-free").expect("identity present");
    assert_eq!(stored.requests_made, 1);
}

#[tokio::test]
async fn when_premium_asks_for_an_unknown_symbol_then_not_found() {
    // Given: A premium key and a symbol absent from the dataset
    let fixture = gate_with_keys();

    // When: The caller asks for a bollinger band on it
    let error = fixture
        .gate
        .handle_at(&request("key-premium", "bollinger", "ZZZZ"), fixture_today())
        .await
        .expect_err("must be rejected");

    // Then: 404; the unlimited tier's counter never moves
    assert!(matches!(error, GateError::NotFound { .. }));
    let stored = fixture.store.get("id-premium").expect("identity present");
    assert_eq!(stored.requests_made, 0);
}

#[tokio::test]
async fn when_params_are_malformed_then_rejected_before_quota() {
    // Given: A pro key and a fractional period
    let fixture = gate_with_keys();
    let mut bad = request("key-pro", "rsi", "AAPL");
    bad.params.insert(String::from("period"), 2.5);

    // When: The request is handled
    let error = fixture
        .gate
        .handle_at(&bad, fixture_today())
        .await
        .expect_err("must be rejected");

    // Then: 400, and no request was consumed
    assert!(matches!(error, GateError::InvalidRequest(_)));
    assert_eq!(error.status_code(), 400);
    let stored = fixture.store.get("id-pro").expect("identity present");
    assert_eq!(stored.requests_made, 0);
}

#[tokio::test]
async fn when_two_requests_race_the_last_slot_then_exactly_one_is_admitted() {
    // Given: A free identity with exactly one slot left
    let fixture = gate_with_keys();
    fixture
        .store
        .insert(identity("id-free", "key-free", Tier::Free, 49));

    // When: Two requests race for it
    let gate_a = Arc::clone(&fixture.gate);
    let gate_b = Arc::clone(&fixture.gate);
    let task_a = tokio::spawn(async move {
        gate_a
            .handle_at(&request("key-free", "sma", "AAPL"), fixture_today())
            .await
    });
    let task_b = tokio::spawn(async move {
        gate_b
            .handle_at(&request("key-free", "sma", "AAPL"), fixture_today())
            .await
    });
    let results = [
        task_a.await.expect("task a completes"),
        task_b.await.expect("task b completes"),
    ];

    // Then: One admission, one refusal; the counter never exceeds the limit
    let admitted = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(admitted, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(GateError::QuotaExceeded { limit: 50 })
    )));
    let stored = fixture.store.get("id-free").expect("identity present");
    assert_eq!(stored.requests_made, 50);
}

#[tokio::test]
async fn when_premium_key_is_used_heavily_then_no_quota_applies() {
    // Given: A premium key
    let fixture = gate_with_keys();

    // When: Many requests arrive on the same day
    for _ in 0..60 {
        fixture
            .gate
            .handle_at(&request("key-premium", "macd", "AAPL"), fixture_today())
            .await
            .expect("always admitted");
    }

    // Then: The stored counter never moved
    let stored = fixture.store.get("id-premium").expect("identity present");
    assert_eq!(stored.requests_made, 0);
}

// =============================================================================
// Parameter overrides
// =============================================================================

#[tokio::test]
async fn when_pro_overrides_macd_spans_then_they_are_honored() {
    // Given: A pro key and short custom spans
    let fixture = gate_with_keys();
    let mut custom = request("key-pro", "macd", "AAPL");
    custom.params.insert(String::from("fast"), 3.0);
    custom.params.insert(String::from("slow"), 5.0);

    // When: The request is handled
    let response = fixture
        .gate
        .handle_at(&custom, fixture_today())
        .await
        .expect("request admitted");

    // Then: The warm-up tracks the custom slow span, not the default 26
    assert_eq!(response.data[3].value, None);
    assert!(response.data[4].value.is_some());
}
