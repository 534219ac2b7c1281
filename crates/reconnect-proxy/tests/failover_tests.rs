//! Failover scenarios: operations hitting `AutoReconnect` through the proxy

mod common;

use anyhow::Result;
use pretty_assertions::assert_eq;
use reconnect_core::{Connection, DriverError};
use rstest::rstest;
use serde_json::json;

use common::{Fixture, capture, failover, secs};

/// An operation failing twice during an election succeeds on the third try
#[test]
fn test_find_one_recovers_after_election() -> Result<()> {
    let fixture = Fixture::new();
    let users = fixture.proxy.database("app")?.collection("users")?;
    users.insert(json!({ "_id": 1, "ok": 1 }))?;
    fixture.plan.fail_times("find_one", 2, failover());

    let (found, logs) = capture(|| users.find_one(&json!({})));

    assert_eq!(found?, Some(json!({ "_id": 1, "ok": 1 })));
    assert_eq!(fixture.plan.calls("find_one"), 3);
    assert_eq!(fixture.sleeper.delays(), secs(&[1, 2]));

    let warnings = logs.warnings();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].message, "AutoReconnecting, try 0");
    assert_eq!(warnings[1].message, "AutoReconnecting, try 1");
    assert_eq!(warnings[0].fields["operation"], "find_one");
    assert_eq!(warnings[1].fields["delay_ms"], "2000");
    Ok(())
}

#[rstest]
#[case::first_try(0, &[])]
#[case::one_failure(1, &[1])]
#[case::two_failures(2, &[1, 2])]
#[case::three_failures(3, &[1, 2, 4])]
#[case::final_attempt(4, &[1, 2, 4, 8])]
fn test_recovers_within_five_attempts(
    #[case] failures: u32,
    #[case] expected_delays: &[u64],
) -> Result<()> {
    let fixture = Fixture::new();
    let users = fixture.proxy.database("app")?.collection("users")?;
    fixture.plan.fail_times("count", failures, failover());

    let (count, logs) = capture(|| users.count());

    assert_eq!(count?, 0);
    assert_eq!(fixture.plan.calls("count"), failures + 1);
    assert_eq!(fixture.sleeper.delays(), secs(expected_delays));
    assert_eq!(logs.warnings().len(), expected_delays.len());
    Ok(())
}

#[test]
fn test_persistent_failover_gives_up() -> Result<()> {
    let fixture = Fixture::new();
    let users = fixture.proxy.database("app")?.collection("users")?;
    fixture.plan.fail_always("find", failover());

    let (result, logs) = capture(|| users.find(&json!({ "name": "ada" })));

    assert_eq!(result.unwrap_err(), failover());
    assert_eq!(fixture.plan.calls("find"), 5);
    assert_eq!(fixture.sleeper.delays(), secs(&[1, 2, 4, 8]));
    assert_eq!(fixture.sleeper.total().as_secs(), 15);

    // The final attempt is not announced
    let tries: Vec<String> = logs.warnings().into_iter().map(|w| w.message).collect();
    assert_eq!(
        tries,
        vec![
            "AutoReconnecting, try 0",
            "AutoReconnecting, try 1",
            "AutoReconnecting, try 2",
            "AutoReconnecting, try 3",
        ]
    );
    Ok(())
}

#[rstest]
#[case::connection_failure(DriverError::ConnectionFailure("refused".into()))]
#[case::operation_failure(DriverError::OperationFailure("bad query".into()))]
#[case::duplicate_key(DriverError::DuplicateKey("_id: 1".into()))]
#[case::authentication(DriverError::Authentication("bad credentials".into()))]
fn test_other_errors_propagate_immediately(#[case] error: DriverError) -> Result<()> {
    let fixture = Fixture::new();
    let users = fixture.proxy.database("app")?.collection("users")?;
    fixture.plan.fail_times("insert", 1, error.clone());

    let (result, logs) = capture(|| users.insert(json!({ "name": "ada" })));

    assert_eq!(result.unwrap_err(), error);
    assert_eq!(fixture.plan.calls("insert"), 1);
    assert!(fixture.sleeper.delays().is_empty());
    assert!(logs.warnings().is_empty());
    Ok(())
}

#[test]
fn test_error_after_partial_retries_propagates() -> Result<()> {
    let fixture = Fixture::new();
    let users = fixture.proxy.database("app")?.collection("users")?;
    fixture.plan.fail_times("remove", 1, failover());
    fixture
        .plan
        .fail_times("remove", 1, DriverError::OperationFailure("not primary".into()));

    let err = users.remove(&json!({})).unwrap_err();

    assert_eq!(err, DriverError::OperationFailure("not primary".into()));
    assert_eq!(fixture.plan.calls("remove"), 2);
    assert_eq!(fixture.sleeper.delays(), secs(&[1]));
    Ok(())
}

#[test]
fn test_connection_level_operations_retry() -> Result<()> {
    let fixture = Fixture::new();
    fixture.plan.fail_times("drop_database", 2, failover());

    let (result, logs) = capture(|| fixture.proxy.drop_database("app"));

    result?;
    assert_eq!(fixture.plan.calls("drop_database"), 3);
    let warnings = logs.warnings();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].fields["operation"], "drop_database");
    assert_eq!(warnings[0].target, "reconnect_proxy::retry::policy");
    Ok(())
}

#[test]
fn test_writes_land_once_after_retry() -> Result<()> {
    let fixture = Fixture::new();
    let users = fixture.proxy.database("app")?.collection("users")?;
    fixture.plan.fail_times("update", 3, failover());

    let updated = users.update(
        &json!({ "name": "ada" }),
        &json!({ "$set": { "admin": true } }),
        true,
    )?;

    assert_eq!(updated, 1);
    assert_eq!(
        users.find(&json!({ "name": "ada" }))?,
        vec![json!({ "_id": 1, "name": "ada", "admin": true })]
    );
    Ok(())
}

#[test]
fn test_closed_connection_is_not_retried() -> Result<()> {
    let fixture = Fixture::new();
    fixture.proxy.close()?;

    let err = fixture.proxy.server_info().unwrap_err();

    assert!(matches!(err, DriverError::ConnectionFailure(_)));
    assert_eq!(fixture.plan.calls("server_info"), 1);
    assert!(fixture.sleeper.delays().is_empty());
    Ok(())
}
