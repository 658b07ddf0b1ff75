//! Integration tests for the fake transport's observable guarantees.
//!
//! WHY: Client retry and backoff tests are only as trustworthy as the
//! transport they run against. These pin down the attempt sequence, header
//! policy and slow-mode pacing through the public API.
//!
//! WHAT: Scripts of various shapes replayed through `ConnectionFactory`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use foundation_harness::script::{EXPECT_FAILURE, EXPECT_INSUFFICIENT_STORAGE};
use foundation_harness::{
    AttemptArgs, ConnectionFactory, FakeConnection, HarnessError, Outcome, ScriptConfig,
};
use foundation_storage::{HttpConnection, HttpResponse, TransportError};

/// WHY: A script of N statuses must allow exactly N attempts
/// WHAT: Every scripted attempt opens; the next one reports exhaustion
#[test]
fn test_script_of_n_allows_exactly_n_attempts() {
    let statuses = [200, 201, 404, 500, 503];
    let factory = ConnectionFactory::new(statuses, ScriptConfig::new());

    for expected in statuses {
        let conn = factory.connect(&AttemptArgs::new()).expect("scripted attempt");
        assert_eq!(i32::from(conn.status()), expected);
        assert!(!conn.is_closed());
    }

    assert!(matches!(
        factory.connect(&AttemptArgs::new()),
        Err(HarnessError::ScriptExhausted { scripted: 5 })
    ));
    // exhaustion is sticky, the script never wraps around
    assert!(matches!(
        factory.connect(&AttemptArgs::new()),
        Err(HarnessError::ScriptExhausted { .. })
    ));
}

/// WHY: Connect-level failures must look like socket errors, not statuses
/// WHAT: A `-2` script fails the produced callable with a transport error
#[test]
fn test_negative_status_fails_before_any_connection() {
    let factory = ConnectionFactory::new([EXPECT_FAILURE, 200], ScriptConfig::new());
    let connect = factory.as_fn();

    assert!(matches!(
        connect(&AttemptArgs::new()),
        Err(HarnessError::Transport(TransportError::ConnectFailed(_)))
    ));

    // the failed attempt still consumed its outcome
    let conn = connect(&AttemptArgs::new()).expect("second attempt");
    assert_eq!(conn.status(), 200);
}

/// WHY: The expect phase is where servers reject uploads early
/// WHAT: -2 errors, -3 answers 507, anything else answers 100, the
/// attempt's own connection is left untouched in every case
#[test]
fn test_expect_handshake_outcomes() {
    let config = Arc::new(ScriptConfig::new().body("abc"));

    let mut failing = FakeConnection::new(Outcome::new(EXPECT_FAILURE), Arc::clone(&config));
    let before = failing.get_headers();
    assert!(failing.get_expect().is_err());
    assert_eq!(failing.raw_status(), EXPECT_FAILURE);
    assert_eq!(failing.get_headers(), before);

    let mut full = FakeConnection::new(
        Outcome::new(EXPECT_INSUFFICIENT_STORAGE),
        Arc::clone(&config),
    );
    let before = full.get_headers();
    assert_eq!(full.get_expect().expect("answer").status(), 507);
    assert_eq!(full.get_headers(), before);

    let mut accepted = FakeConnection::new(Outcome::new(202).with_body("abc"), config);
    let before = accepted.get_headers();
    assert_eq!(accepted.get_expect().expect("answer").status(), 100);
    assert_eq!(accepted.status(), 202);
    assert_eq!(accepted.get_headers(), before);
}

/// WHY: Slow mode must trickle exactly four reads and four sends
/// WHAT: Five reads yield four single spaces then the body; five sends
/// delay four times then complete immediately
#[test]
#[ntest::timeout(10000)]
fn test_slow_mode_pacing() {
    let delay = Duration::from_millis(25);
    let factory = ConnectionFactory::new(
        [200],
        ScriptConfig::new().body("payload").slow().slow_delay(delay),
    );
    let mut conn = factory.connect(&AttemptArgs::new()).expect("attempt");

    let reads: Vec<String> = (0..5)
        .map(|_| String::from_utf8(conn.read(Some(64)).expect("read")).expect("utf8"))
        .collect();
    assert_eq!(reads, vec![" ", " ", " ", " ", "payload"]);

    let mut timings = Vec::new();
    for _ in 0..5 {
        let started = Instant::now();
        conn.send(b"chunk").expect("send");
        timings.push(started.elapsed());
    }
    assert!(timings[..4].iter().all(|elapsed| *elapsed >= delay));
    assert!(timings[4] < delay);
}

/// WHY: Configured headers must beat the baseline
/// WHAT: An override for `content-type` replaces the fixed value
#[test]
fn test_header_override_precedence() {
    let factory = ConnectionFactory::new(
        [200],
        ScriptConfig::new().header("Content-Type", "application/json"),
    );
    let conn = factory.connect(&AttemptArgs::new()).expect("attempt");

    assert_eq!(
        conn.get_header("content-type").as_deref(),
        Some("application/json")
    );
    let content_types = conn
        .get_headers()
        .into_iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .count();
    assert_eq!(content_types, 1);
}

/// WHY: The inverted container flag is easy to get backwards
/// WHAT: `false` adds `x-container-timestamp`, `true` leaves it out
#[test]
fn test_missing_container_flag_per_attempt() {
    let factory = ConnectionFactory::new(
        [200, 200, 200],
        ScriptConfig::new().missing_container(vec![false, true]),
    );

    let present = factory.connect(&AttemptArgs::new()).expect("first");
    let missing = factory.connect(&AttemptArgs::new()).expect("second");
    let defaulted = factory.connect(&AttemptArgs::new()).expect("third");

    assert_eq!(present.get_header("x-container-timestamp").as_deref(), Some("1"));
    assert_eq!(missing.get_header("x-container-timestamp"), None);
    assert_eq!(defaulted.get_header("x-container-timestamp").as_deref(), Some("1"));
}

/// WHY: The documented end-to-end scenario
/// WHAT: etags/timestamps follow the script, then exhaustion
#[test]
fn test_two_attempt_scenario_end_to_end() {
    let factory = ConnectionFactory::new(
        [200, 200],
        ScriptConfig::new().etags(["a", "b"]).timestamps(["1", "2"]),
    );

    for (etag, timestamp) in [("a", "1"), ("b", "2")] {
        let mut conn = factory.connect(&AttemptArgs::new()).expect("attempt");
        let response = conn.get_response().expect("response");
        assert_eq!(response.get_header("etag").as_deref(), Some(etag));
        assert_eq!(response.get_header("x-timestamp").as_deref(), Some(timestamp));
        conn.close();
        assert!(conn.is_closed());
    }

    assert!(matches!(
        factory.connect(&AttemptArgs::new()),
        Err(HarnessError::ScriptExhausted { .. })
    ));
}
