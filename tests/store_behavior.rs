//! Behavior-driven tests for the DuckDB-backed identity store, including one
//! full journey over a real parquet dataset.

use std::path::Path;

use tickgate_core::identity::{IdentityStore, QuotaDecision};
use tickgate_core::tier::{policy_for, Tier};
use tickgate_core::{AccessGate, GateError, MarketDataCache};
use tickgate_store::{DuckDbIdentityStore, ParquetDataset, StoreConfig};
use tickgate_tests::{fixture_today, request, yesterday, Arc, FixtureDataset};

fn open_store(dir: &Path) -> DuckDbIdentityStore {
    DuckDbIdentityStore::open(StoreConfig {
        tickgate_home: dir.to_path_buf(),
        db_path: dir.join("identities.duckdb"),
        max_pool_size: 2,
    })
    .expect("store open")
}

// =============================================================================
// Durable quota state
// =============================================================================

#[tokio::test]
async fn when_the_process_restarts_then_spent_quota_survives() {
    // Given: A store that admitted five requests today
    let temp = tempfile::tempdir().expect("tempdir");
    let identity_id;
    {
        let store = open_store(temp.path());
        let registered = store
            .insert_identity("key-free", Tier::Free)
            .expect("insert identity");
        identity_id = registered.id;
        for _ in 0..5 {
            store
                .check_and_consume(identity_id.as_str(), policy_for(Tier::Free), fixture_today())
                .await
                .expect("admitted");
        }
    }

    // When: The database is reopened
    let reopened = open_store(temp.path());

    // Then: The counter picks up where it left off
    let decision = reopened
        .check_and_consume(identity_id.as_str(), policy_for(Tier::Free), fixture_today())
        .await
        .expect("admitted");
    assert_eq!(decision, QuotaDecision::Allowed { used: 6 });
}

#[tokio::test]
async fn when_a_new_day_starts_then_the_stored_counter_resets() {
    // Given: A store whose identity spent quota yesterday
    let temp = tempfile::tempdir().expect("tempdir");
    let store = open_store(temp.path());
    let registered = store
        .insert_identity("key-free", Tier::Free)
        .expect("insert identity");
    for _ in 0..10 {
        store
            .check_and_consume(registered.id.as_str(), policy_for(Tier::Free), yesterday())
            .await
            .expect("admitted");
    }

    // When: The first request of the next day arrives
    let decision = store
        .check_and_consume(registered.id.as_str(), policy_for(Tier::Free), fixture_today())
        .await
        .expect("admitted");

    // Then: The day rolled over and counting restarted
    assert_eq!(decision, QuotaDecision::Allowed { used: 1 });
    let resolved = store
        .resolve("key-free")
        .await
        .expect("resolve ok")
        .expect("identity present");
    assert_eq!(resolved.requests_made, 1);
    assert_eq!(resolved.last_request_date, fixture_today());
}

#[tokio::test]
async fn when_concurrent_consumers_race_then_the_count_is_exact() {
    // Given: A pro identity and a burst of concurrent requests
    let temp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(open_store(temp.path()));
    let registered = store
        .insert_identity("key-pro", Tier::Pro)
        .expect("insert identity");

    // When: Twenty tasks consume at once
    let mut tasks = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        let identity_id = registered.id.clone();
        tasks.push(tokio::spawn(async move {
            store
                .check_and_consume(identity_id.as_str(), policy_for(Tier::Pro), fixture_today())
                .await
        }));
    }
    for task in tasks {
        task.await.expect("task completes").expect("admitted");
    }

    // Then: Every admission was counted exactly once
    let resolved = store
        .resolve("key-pro")
        .await
        .expect("resolve ok")
        .expect("identity present");
    assert_eq!(resolved.requests_made, 20);
}

// =============================================================================
// Full journey: parquet dataset + durable store + gate
// =============================================================================

fn write_fixture_parquet(path: &Path) {
    let rows = tickgate_core::dataset::DatasetSource::load_all(&FixtureDataset).expect("fixture");
    let connection = duckdb::Connection::open_in_memory().expect("staging connection");
    connection
        .execute_batch(
            "CREATE TABLE staging (symbol VARCHAR, date DATE, open DOUBLE, high DOUBLE, \
             low DOUBLE, close DOUBLE, volume BIGINT)",
        )
        .expect("create staging");

    let mut inserts = String::new();
    for row in rows {
        inserts.push_str(&format!(
            "INSERT INTO staging VALUES ('{}', DATE '{}', {}, {}, {}, {}, {});\n",
            row.symbol.as_str(),
            row.candle.date.format_iso(),
            row.candle.open,
            row.candle.high,
            row.candle.low,
            row.candle.close,
            row.candle.volume.map_or(String::from("NULL"), |v| v.to_string()),
        ));
    }
    connection.execute_batch(inserts.as_str()).expect("seed staging");
    connection
        .execute_batch(
            format!(
                "COPY staging TO '{}' (FORMAT PARQUET)",
                path.to_string_lossy().replace('\'', "''")
            )
            .as_str(),
        )
        .expect("write parquet");
}

#[tokio::test]
async fn when_the_whole_stack_runs_then_a_registered_key_gets_a_series() {
    // Given: A parquet dataset on disk and a freshly registered free key
    let temp = tempfile::tempdir().expect("tempdir");
    let parquet = temp.path().join("dataset.parquet");
    write_fixture_parquet(parquet.as_path());

    let store = open_store(temp.path());
    store
        .insert_identity("journey-key", Tier::Free)
        .expect("insert identity");

    let cache = MarketDataCache::new(Arc::new(ParquetDataset::new(parquet)));
    let gate = AccessGate::new(Arc::new(store), cache);

    // When: The key requests an SMA, then an indicator above its tier
    let response = gate
        .handle_at(&request("journey-key", "sma", "aapl"), fixture_today())
        .await
        .expect("request admitted");
    let denied = gate
        .handle_at(&request("journey-key", "macd", "AAPL"), fixture_today())
        .await
        .expect_err("macd is not a free-tier indicator");

    // Then: The admitted request produced the windowed series and the denial
    // carries the caller's tier
    assert_eq!(response.symbol.as_str(), "AAPL");
    assert_eq!(response.data.len(), 91);
    assert!(matches!(
        denied,
        GateError::Forbidden {
            tier: Tier::Free,
            ..
        }
    ));
}
