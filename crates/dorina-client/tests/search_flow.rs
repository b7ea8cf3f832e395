//! End-to-end flow tests against the scripted transport: submit, poll,
//! paginate, supersede.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use dorina_client::test_utils::ScriptedTransport;
use dorina_client::{
    ClientConfig, PollingSession, ResultPage, SearchClient, SearchSelection, SessionError,
    PENDING_STATE,
};

fn init_test_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

fn fast_config() -> ClientConfig {
    ClientConfig {
        retry_after: Duration::from_millis(1),
        ..ClientConfig::default()
    }
}

fn page(lines: &[&str], more: bool, next_offset: Option<u64>) -> ResultPage {
    ResultPage {
        state: Some("done".into()),
        results: lines.iter().map(|l| l.to_string()).collect(),
        more_results: more,
        total_results: lines.len() as u64,
        next_offset,
    }
}

fn selection(set_b: &[&str]) -> SearchSelection {
    SearchSelection {
        set_a: vec!["fake_rbp".into(), "fake_mirna".into()],
        assembly: "hg19".into(),
        set_b: set_b.iter().map(|s| s.to_string()).collect(),
        uuid: Some("fake-uuid".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn two_pending_rounds_then_exactly_one_result_fetch() {
    init_test_logging();
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_submit("fake-uuid", PENDING_STATE);
    transport.push_status(PENDING_STATE);
    transport.push_status(PENDING_STATE);
    transport.push_status("done");
    transport.push_page(page(
        &["chr1\tdoRiNA2\tgene\t1\t1000\t.\t+\t.\tID=gene01.01\tchr1\t250\t260\tPARCLIP#scifi*scifi_cds\t6\t+"],
        false,
        None,
    ));

    let client = SearchClient::new(transport.clone(), fast_config());
    let status = client
        .run_search(&selection(&[]), false)
        .await
        .expect("search");
    assert_eq!(status.state, "done");

    // Exactly two delayed re-checks after the initial one, and the result
    // fetch happens strictly after the terminal status response.
    assert_eq!(
        transport.calls(),
        vec![
            "submit",
            "status/fake-uuid",
            "status/fake-uuid",
            "status/fake-uuid",
            "result/fake-uuid"
        ]
    );

    let results = client.results();
    assert_eq!(results.records().len(), 1);
    let rec = &results.records()[0];
    assert_eq!(rec.data_source(), "PARCLIP");
    assert_eq!(rec.track(), "scifi");
    assert_eq!(rec.site(), "scifi_cds");
    assert_eq!(rec.gene(), "gene01.01");
    assert_eq!(rec.feature_location(), "chr1:250-260");
}

#[tokio::test]
async fn set_b_block_is_all_or_nothing_on_the_wire() {
    init_test_logging();
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_submit("uuid-a", "done");
    transport.push_status("done");
    transport.push_page(page(&[], false, None));
    transport.push_submit("uuid-b", "done");
    transport.push_status("done");
    transport.push_page(page(&[], false, None));

    let client = SearchClient::new(transport.clone(), fast_config());
    client
        .run_search(&selection(&[]), false)
        .await
        .expect("search without set b");
    client
        .run_search(&selection(&["fake_mirna"]), false)
        .await
        .expect("search with set b");

    let submissions = transport.submissions();
    let without = serde_json::to_value(&submissions[0]).unwrap();
    let with = serde_json::to_value(&submissions[1]).unwrap();
    for key in ["set_b", "match_b", "region_b", "combinatorial_op"] {
        assert!(
            !without.as_object().unwrap().contains_key(key),
            "unexpected {key}"
        );
        assert!(
            with.as_object().unwrap().contains_key(key),
            "missing {key}"
        );
    }
}

#[tokio::test]
async fn pagination_accumulates_across_load_more() {
    init_test_logging();
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_submit("fake-uuid", PENDING_STATE);
    transport.push_status("done");
    transport.push_page(page(
        &["chr1\t\t\t1\t100\t.\t+\t.\tID=g1"],
        true,
        Some(23),
    ));
    transport.push_page(page(
        &["chr2\t\t\t5\t50\t.\t-\t.\tID=g2"],
        true,
        Some(42),
    ));
    transport.push_page(page(&["chr3\t\t\t7\t70\t.\t+\t.\tID=g3"], false, Some(61)));

    let client = SearchClient::new(transport.clone(), fast_config());
    client
        .run_search(&selection(&[]), false)
        .await
        .expect("search");
    assert_eq!(client.results().offset(), 23);

    client.load_more().await.expect("second page");
    assert_eq!(client.results().offset(), 42);

    client.load_more().await.expect("third page");
    // Final page: the stale next_offset must be ignored.
    assert_eq!(client.results().offset(), 42);
    assert!(!client.results().more_results());

    assert_eq!(client.results().records().len(), 3);
    assert!(transport
        .calls()
        .iter()
        .any(|c| c == "result/fake-uuid/23"));
    assert!(transport
        .calls()
        .iter()
        .any(|c| c == "result/fake-uuid/42"));
}

#[tokio::test]
async fn superseded_session_never_writes_shared_state() {
    init_test_logging();
    let transport = Arc::new(ScriptedTransport::new());
    // Search A: submits, sees one pending answer, then parks in a long
    // retry delay during which search B takes over.
    transport.push_submit("uuid-a", PENDING_STATE);
    transport.push_status(PENDING_STATE);
    // Search B: terminal at once.
    transport.push_submit("uuid-b", PENDING_STATE);
    transport.push_status("done");
    transport.push_page(page(&["chr2\t\t\t5\t50\t.\t-\t.\tID=from_b"], false, None));

    let config = ClientConfig {
        retry_after: Duration::from_secs(60),
        ..ClientConfig::default()
    };
    let client = Arc::new(SearchClient::new(transport.clone(), config));

    let slow = {
        let client = client.clone();
        tokio::spawn(async move { client.run_search(&selection(&[]), false).await })
    };
    // Let search A consume its submit + first status and start sleeping.
    tokio::time::sleep(Duration::from_millis(100)).await;

    client
        .run_search(&selection(&[]), false)
        .await
        .expect("search b");

    let err = slow.await.expect("join").expect_err("a must fail");
    let session_err = err.downcast_ref::<SessionError>().expect("session error");
    assert!(matches!(session_err, SessionError::Superseded));

    // Only B's page made it into the shared state.
    let results = client.results();
    assert_eq!(results.records().len(), 1);
    assert_eq!(results.records()[0].gene(), "from_b");
    assert_eq!(results.uuid(), "uuid-b");
}

#[tokio::test]
async fn retry_ceiling_fails_an_always_pending_job() {
    init_test_logging();
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..3 {
        transport.push_status(PENDING_STATE);
    }
    let config = ClientConfig {
        retry_after: Duration::from_millis(1),
        max_status_checks: Some(3),
        ..ClientConfig::default()
    };
    let (mut session, _handle) = PollingSession::new(transport.clone(), "fake-uuid", &config);
    match session.wait_until_terminal().await {
        Err(SessionError::RetriesExhausted(3)) => {}
        other => panic!("expected RetriesExhausted, got {:?}", other.map(|s| s.state)),
    }
    assert_eq!(transport.calls().len(), 3);
}
