//! End-to-end rotation behavior of `HostClient` against a scripted requester.

mod support;

use multihost_transport::catalog::{HostCatalog, HostConfig};
use multihost_transport::{CallType, CancelHandle, Error, RequestDescriptor, TransportConfig};
use std::time::Duration;
use support::{client_with, write_catalog, Reply, ScriptedRequester};

fn write_config() -> TransportConfig {
    TransportConfig::default().with_write_timeout(Duration::from_millis(1000))
}

#[tokio::test]
async fn test_hard_failures_rotate_through_catalog() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Refused);
    requester.always("h2.example.net", Reply::Refused);
    let client = client_with(write_catalog(), write_config(), requester.clone());

    let (resp, stats) = client
        .execute_with_stats(RequestDescriptor::write("/1/indexes/products/batch"))
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(stats.attempts, 3);
    assert_eq!(
        requester.hosts_called(),
        vec!["h1.example.net", "h2.example.net", "h3.example.net"]
    );
    let hosts = client.hosts();
    assert!(!hosts[0].is_up);
    assert!(!hosts[1].is_up);
    assert!(hosts[2].is_up);
    assert_eq!(hosts[2].retry_count, 0);

    // Down hosts stay out of rotation for the next call.
    client
        .execute(RequestDescriptor::write("/1/indexes/products/batch"))
        .await
        .unwrap();
    assert_eq!(requester.hosts_called().last().unwrap(), "h3.example.net");
    assert_eq!(requester.calls().len(), 4);
}

#[tokio::test]
async fn test_timed_out_host_yields_to_next_host() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Timeout);
    let client = client_with(write_catalog(), write_config(), requester.clone());

    let (_, stats) = client
        .execute_with_stats(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap();

    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.host.as_deref(), Some("https://h2.example.net/"));
    assert_eq!(
        requester.hosts_called(),
        vec!["h1.example.net", "h2.example.net"]
    );

    // Still up, but its next deadline is escalated.
    let h1 = &client.hosts()[0];
    assert!(h1.is_up);
    assert_eq!(h1.retry_count, 1);
}

#[tokio::test]
async fn test_single_host_is_retried_with_escalated_deadline() {
    let requester = ScriptedRequester::new();
    requester.then("solo.example.net", Reply::Timeout);
    let catalog = HostCatalog::new(vec![HostConfig::new("https://solo.example.net")]).unwrap();
    let client = client_with(catalog, write_config(), requester.clone());

    let (_, stats) = client
        .execute_with_stats(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap();

    let calls = requester.calls();
    assert_eq!(stats.attempts, 2);
    assert_eq!(calls[0].host, "solo.example.net");
    assert_eq!(calls[1].host, "solo.example.net");
    assert_eq!(calls[0].timeout, Duration::from_millis(1000));
    assert_eq!(calls[1].timeout, Duration::from_millis(2000));

    // The success reset the host.
    let solo = &client.hosts()[0];
    assert!(solo.is_up);
    assert_eq!(solo.retry_count, 0);
}

#[tokio::test]
async fn test_descriptor_timeout_is_escalated_too() {
    let requester = ScriptedRequester::new();
    requester.then("h3.example.net", Reply::Timeout);
    requester.then("h3.example.net", Reply::Timeout);
    let client = client_with(write_catalog(), write_config(), requester.clone());

    client
        .execute(RequestDescriptor::read("/1/keys").timeout(Duration::from_millis(200)))
        .await
        .unwrap();

    let timeouts: Vec<Duration> = requester.calls().iter().map(|c| c.timeout).collect();
    assert_eq!(
        timeouts,
        vec![
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(600)
        ]
    );
}

#[tokio::test]
async fn test_application_error_is_returned_untouched() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Status(404, "{\"message\":\"Index does not exist\"}"));
    let client = client_with(write_catalog(), write_config(), requester.clone());

    let err = client
        .execute(RequestDescriptor::write("/1/indexes/missing"))
        .await
        .unwrap_err();

    match err {
        Error::Remote {
            status,
            ref host,
            ref message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(host, "https://h1.example.net/");
            assert!(message.contains("Index does not exist"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(requester.calls().len(), 1);
    let h1 = &client.hosts()[0];
    assert!(h1.is_up);
    assert_eq!(h1.retry_count, 0);
}

#[tokio::test]
async fn test_server_errors_follow_status_policy() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Status(503, "unavailable"));

    let literal = client_with(write_catalog(), write_config(), requester.clone());
    let err = literal
        .execute(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(literal.hosts()[0].is_up);

    let rotating = client_with(
        write_catalog(),
        write_config().with_retry_on_server_error(true),
        requester.clone(),
    );
    let (_, stats) = rotating
        .execute_with_stats(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap();
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.host.as_deref(), Some("https://h2.example.net/"));
    assert!(!rotating.hosts()[0].is_up);
}

#[tokio::test]
async fn test_no_eligible_host_never_calls_requester() {
    let requester = ScriptedRequester::new();
    let catalog = HostCatalog::new(vec![
        HostConfig::new("https://r1.example.net").with_scope(CallType::Read)
    ])
    .unwrap();
    let client = client_with(catalog, write_config(), requester.clone());

    let err = client
        .execute(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::NoReachableHosts {
            call_type: CallType::Write,
            attempts: 0
        }
    ));
    assert!(requester.calls().is_empty());
}

#[tokio::test]
async fn test_all_hosts_down_ends_with_no_reachable_hosts() {
    let requester = ScriptedRequester::new();
    for host in ["h1.example.net", "h2.example.net", "h3.example.net"] {
        requester.always(host, Reply::Refused);
    }
    let client = client_with(write_catalog(), write_config(), requester.clone());

    let err = client
        .execute(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoReachableHosts { attempts: 3, .. }));

    let err = client
        .execute(RequestDescriptor::read("/1/objects"))
        .await
        .unwrap_err();
    assert!(err.is_no_reachable_hosts());
    assert_eq!(requester.calls().len(), 3);
}

#[tokio::test]
async fn test_attempt_budget_stops_endless_timeouts() {
    let requester = ScriptedRequester::new();
    for host in ["h1.example.net", "h2.example.net", "h3.example.net"] {
        requester.always(host, Reply::Timeout);
    }
    let client = client_with(
        write_catalog(),
        write_config().with_max_attempts(5),
        requester.clone(),
    );

    let err = client
        .execute(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AttemptsExhausted { attempts: 5, .. }));

    // One full pass at the base deadline, then a second pass with escalated deadlines.
    let calls: Vec<(String, u128)> = requester
        .calls()
        .into_iter()
        .map(|c| (c.host, c.timeout.as_millis()))
        .collect();
    assert_eq!(
        calls,
        vec![
            ("h1.example.net".to_string(), 1000),
            ("h2.example.net".to_string(), 1000),
            ("h3.example.net".to_string(), 1000),
            ("h1.example.net".to_string(), 2000),
            ("h2.example.net".to_string(), 2000),
        ]
    );
    let hosts = client.hosts();
    assert!(hosts.iter().all(|h| h.is_up));
    assert_eq!(
        hosts.iter().map(|h| h.retry_count).collect::<Vec<_>>(),
        vec![2, 2, 1]
    );
}

#[tokio::test]
async fn test_hard_failure_mid_pass_keeps_rotating() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Timeout);
    requester.always("h2.example.net", Reply::Refused);
    requester.always("h3.example.net", Reply::Timeout);
    let client = client_with(
        write_catalog(),
        write_config().with_max_attempts(4),
        requester.clone(),
    );

    let err = client
        .execute(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AttemptsExhausted { attempts: 4, .. }));
    assert_eq!(
        requester.hosts_called(),
        vec!["h1.example.net", "h2.example.net", "h3.example.net", "h1.example.net"]
    );
    assert!(!client.hosts()[1].is_up);
}

#[tokio::test]
async fn test_cancellation_leaves_health_untouched() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Hang);
    let client = client_with(write_catalog(), write_config(), requester.clone());
    let cancel = CancelHandle::new();

    let task = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .execute_cancellable(RequestDescriptor::write("/1/objects"), &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    let err = task.await.unwrap().unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(requester.calls().len(), 1);
    let h1 = &client.hosts()[0];
    assert!(h1.is_up);
    assert_eq!(h1.retry_count, 0);
}

#[tokio::test]
async fn test_expired_down_host_is_retried() {
    let requester = ScriptedRequester::new();
    requester.then("h1.example.net", Reply::Refused);
    let client = client_with(
        write_catalog(),
        write_config().with_host_expiration(Duration::from_millis(50)),
        requester.clone(),
    );

    client
        .execute(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap();
    assert!(!client.hosts()[0].is_up);

    tokio::time::sleep(Duration::from_millis(80)).await;
    let (_, stats) = client
        .execute_with_stats(RequestDescriptor::write("/1/objects"))
        .await
        .unwrap();

    assert_eq!(stats.host.as_deref(), Some("https://h1.example.net/"));
    assert_eq!(stats.attempts, 1);
    assert!(client.hosts()[0].is_up);
}

#[tokio::test]
async fn test_max_inflight_limits_concurrent_calls() {
    let requester = ScriptedRequester::new();
    requester.always("h1.example.net", Reply::Hang);
    let client = multihost_transport::HostClient::builder()
        .hosts(write_catalog())
        .config(write_config())
        .requester(requester.clone())
        .max_inflight(1)
        .build()
        .unwrap();

    let cancel = CancelHandle::new();
    let first = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .execute_cancellable(RequestDescriptor::write("/a"), &cancel)
                .await
        })
    };
    let second = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .execute_cancellable(RequestDescriptor::write("/b"), &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(requester.calls().len(), 1);

    cancel.cancel();
    assert!(first.await.unwrap().unwrap_err().is_cancelled());
    assert!(second.await.unwrap().unwrap_err().is_cancelled());
}
