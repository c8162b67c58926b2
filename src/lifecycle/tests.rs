use std::time::Duration;

use mockall::Sequence;

use super::*;
use crate::diag::Severity;
use crate::poll::ManualClock;
use crate::probe::{MockProber, MockProberFactory, ProbeResult, Prober};

const URI: &str = "https://host/api/v1/foo";
const PATH: &str = "/api/v1/foo";
const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn spec() -> AwaiterSpec {
    AwaiterSpec::new(URI, "abc")
        .with_cacert(PEM)
        .with_timeout("2s")
        .with_poll("500ms")
}

/// Factory handing out the given prober, checking what it was built for
fn factory_for(prober: MockProber) -> Arc<MockProberFactory> {
    let prober: Arc<dyn Prober> = Arc::new(prober);
    let mut factory = MockProberFactory::new();
    factory.expect_build().returning(move |conn| {
        assert_eq!(conn.uri.as_str(), URI);
        assert_eq!(&*conn.token, "abc");
        Ok(prober.clone())
    });
    Arc::new(factory)
}

/// Factory that must never be asked for a prober
fn unused_factory() -> Arc<MockProberFactory> {
    let mut factory = MockProberFactory::new();
    factory.expect_build().never();
    Arc::new(factory)
}

fn awaiter(factory: Arc<MockProberFactory>, clock: &Arc<ManualClock>) -> ResourceAwaiter {
    ResourceAwaiter::new()
        .with_factory(factory)
        .with_clock(clock.clone())
}

fn responding(status: u16, body: &'static str) -> MockProber {
    let mut prober = MockProber::new();
    prober
        .expect_probe()
        .times(1)
        .returning(move || Ok(ProbeResult::new(status, body)));
    prober
}

// ========================================================================
// Create
// ========================================================================

/// Story: a provisioning step waits for a secret that appears on the 4th poll
#[tokio::test]
async fn story_create_waits_until_resource_appears() {
    let clock = Arc::new(ManualClock::new());
    let mut prober = MockProber::new();
    let mut seq = Sequence::new();
    for status in [404u16, 404, 404, 200] {
        prober
            .expect_probe()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || Ok(ProbeResult::new(status, "{}")));
    }

    let mut identity = ResourceIdentity::absent();
    let diags = awaiter(factory_for(prober), &clock)
        .create(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    assert_eq!(identity.as_str(), PATH);
    let elapsed = clock.elapsed();
    assert!(elapsed >= Duration::from_secs(1) && elapsed <= Duration::from_secs(2));
}

#[tokio::test]
async fn create_times_out_when_resource_never_appears() {
    let clock = Arc::new(ManualClock::new());
    let mut prober = MockProber::new();
    prober
        .expect_probe()
        .returning(|| Ok(ProbeResult::new(404, "")));

    let mut identity = ResourceIdentity::absent();
    let diags = awaiter(factory_for(prober), &clock)
        .create(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.summary, "Timeout reached");
    assert!(diag.detail.contains(PATH));
    assert!(!identity.is_present());

    let elapsed = clock.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed <= Duration::from_millis(2500));
}

#[tokio::test]
async fn create_fails_immediately_on_server_error() {
    let clock = Arc::new(ManualClock::new());
    let prober = responding(500, r#"{"message":"boom"}"#);

    let mut identity = ResourceIdentity::absent();
    let diags = awaiter(factory_for(prober), &clock)
        .create(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.summary, "boom");
    assert_eq!(diag.detail, r#"{"message":"boom"}"#);
    assert!(!identity.is_present());
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn create_with_both_ca_sources_never_touches_network() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::absent();

    let diags = awaiter(unused_factory(), &clock)
        .create(
            &spec().with_cacert_path("/etc/ca.crt"),
            &mut identity,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags.has_error());
    assert!(diags.iter().next().unwrap().summary.contains("cacert"));
}

#[tokio::test]
async fn create_with_no_ca_source_never_touches_network() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::absent();

    let diags = awaiter(unused_factory(), &clock)
        .create(
            &AwaiterSpec::new(URI, "abc"),
            &mut identity,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags.has_error());
}

#[tokio::test]
async fn create_with_bad_duration_never_touches_network() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::absent();

    let diags = awaiter(unused_factory(), &clock)
        .create(
            &spec().with_timeout("forever"),
            &mut identity,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags.iter().next().unwrap().summary.contains("timeout"));
}

#[tokio::test]
async fn create_reports_client_construction_failure() {
    let clock = Arc::new(ManualClock::new());
    let mut factory = MockProberFactory::new();
    factory
        .expect_build()
        .times(1)
        .returning(|_| Err(Error::transport("invalid CA certificate")));

    let mut identity = ResourceIdentity::absent();
    let diags = awaiter(Arc::new(factory), &clock)
        .create(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags.iter().next().unwrap().summary.contains("invalid CA"));
}

#[tokio::test]
async fn create_warns_when_poll_is_not_shorter_than_timeout() {
    let clock = Arc::new(ManualClock::new());
    let prober = responding(200, "{}");

    let mut identity = ResourceIdentity::absent();
    let diags = awaiter(factory_for(prober), &clock)
        .create(
            &spec().with_timeout("1s").with_poll("1s"),
            &mut identity,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(diags.len(), 1);
    assert!(!diags.has_error());
    assert_eq!(diags.iter().next().unwrap().severity, Severity::Warning);
    assert_eq!(identity.as_str(), PATH);
}

#[tokio::test]
async fn create_reports_cancellation() {
    let clock = Arc::new(ManualClock::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut prober = MockProber::new();
    prober.expect_probe().never();

    let mut identity = ResourceIdentity::absent();
    let diags = awaiter(factory_for(prober), &clock)
        .create(&spec(), &mut identity, &cancel)
        .await;

    assert_eq!(diags.len(), 1);
    assert_eq!(diags.iter().next().unwrap().summary, "operation cancelled");
    assert!(!identity.is_present());
}

// ========================================================================
// Read / Update
// ========================================================================

#[tokio::test]
async fn read_sets_identity_on_ok() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::absent();

    let diags = awaiter(factory_for(responding(200, "{}")), &clock)
        .read(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert!(diags.is_empty());
    assert_eq!(identity.as_str(), PATH);
}

/// Story: someone deleted the secret out from under us
#[tokio::test]
async fn story_read_clears_identity_when_resource_is_gone() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::new(PATH);

    let diags = awaiter(factory_for(responding(404, "")), &clock)
        .read(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert!(diags.is_empty());
    assert!(!identity.is_present());
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn read_failure_keeps_identity() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::new(PATH);

    let diags = awaiter(
        factory_for(responding(403, r#"{"message":"forbidden"}"#)),
        &clock,
    )
    .read(&spec(), &mut identity, &CancellationToken::new())
    .await;

    assert_eq!(diags.len(), 1);
    assert_eq!(diags.iter().next().unwrap().summary, "forbidden");
    assert_eq!(identity.as_str(), PATH);
}

#[tokio::test]
async fn read_parse_failure_keeps_identity() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::new(PATH);

    let diags = awaiter(factory_for(responding(500, "oops")), &clock)
        .read(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert_eq!(diags.len(), 1);
    assert!(diags.has_error());
    assert_eq!(identity.as_str(), PATH);
}

#[tokio::test]
async fn read_ignores_timing_fields() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::absent();

    let diags = awaiter(factory_for(responding(200, "{}")), &clock)
        .read(
            &spec().with_timeout("not-a-duration").with_poll("0"),
            &mut identity,
            &CancellationToken::new(),
        )
        .await;

    assert!(diags.is_empty());
    assert_eq!(identity.as_str(), PATH);
}

#[tokio::test]
async fn read_transport_failure_keeps_identity() {
    let clock = Arc::new(ManualClock::new());
    let mut prober = MockProber::new();
    prober
        .expect_probe()
        .times(1)
        .returning(|| Err(Error::transport("connection refused")));

    let mut identity = ResourceIdentity::new(PATH);
    let diags = awaiter(factory_for(prober), &clock)
        .read(&spec(), &mut identity, &CancellationToken::new())
        .await;

    assert_eq!(diags.len(), 1);
    assert_eq!(identity.as_str(), PATH);
}

#[tokio::test]
async fn update_is_a_single_probe_read() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::new(PATH);

    let diags = awaiter(factory_for(responding(404, "")), &clock)
        .update(
            &spec().with_timeout("10m").with_poll("5s"),
            &mut identity,
            &CancellationToken::new(),
        )
        .await;

    assert!(diags.is_empty());
    assert!(!identity.is_present());
    assert!(clock.sleeps().is_empty());
}

// ========================================================================
// Delete
// ========================================================================

#[test]
fn delete_clears_identity_without_network() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::new(PATH);

    let diags = awaiter(unused_factory(), &clock).delete(&mut identity);

    assert!(diags.is_empty());
    assert!(!identity.is_present());
}

#[test]
fn delete_of_absent_identity_succeeds() {
    let clock = Arc::new(ManualClock::new());
    let mut identity = ResourceIdentity::absent();

    assert!(awaiter(unused_factory(), &clock)
        .delete(&mut identity)
        .is_empty());
}

// ========================================================================
// Concurrency
// ========================================================================

#[tokio::test]
async fn independent_instances_do_not_share_state() {
    let clock = Arc::new(ManualClock::new());
    let mut factory = MockProberFactory::new();
    factory.expect_build().returning(|conn| {
        let status = if conn.path() == "/api/v1/ready" { 200 } else { 500 };
        let mut prober = MockProber::new();
        prober
            .expect_probe()
            .returning(move || Ok(ProbeResult::new(status, r#"{"message":"nope"}"#)));
        Ok(Arc::new(prober) as Arc<dyn Prober>)
    });
    let awaiter = awaiter(Arc::new(factory), &clock);

    let ready = AwaiterSpec::new("https://host/api/v1/ready", "abc").with_cacert(PEM);
    let broken = AwaiterSpec::new("https://host/api/v1/broken", "abc").with_cacert(PEM);
    let mut ready_id = ResourceIdentity::absent();
    let mut broken_id = ResourceIdentity::absent();
    let cancel = CancellationToken::new();

    let (ready_diags, broken_diags) = tokio::join!(
        awaiter.create(&ready, &mut ready_id, &cancel),
        awaiter.create(&broken, &mut broken_id, &cancel),
    );

    assert!(ready_diags.is_empty());
    assert_eq!(ready_id.as_str(), "/api/v1/ready");
    assert!(broken_diags.has_error());
    assert!(!broken_id.is_present());
}
