//! End-to-end monitor tests.
//!
//! A mocked web page and a mocked oracle endpoint stand in for the browser
//! tab and the relevance judge; session state lives in a real SQLite file.

use std::sync::Arc;

use focusguard_core::storage::Database;
use focusguard_core::{
    ChannelSink, Delivery, HttpOracle, Monitor, MonitorSettings, Notice, OracleError,
    StateStore, TickOutcome, WebPageSource,
};
use mockito::Matcher;
use url::Url;

const ARTICLE: &str = r#"<html><body>
    <h1>Ten Celebrity Breakups</h1>
    <p>You will not believe number seven.</p>
</body></html>"#;

struct Rig {
    server: mockito::ServerGuard,
    store: Arc<Database>,
    _dir: tempfile::TempDir,
}

async fn rig() -> Rig {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/article")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(ARTICLE)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Database::open_at(&dir.path().join("focusguard.db")).unwrap());
    store
        .set_active_target(&format!("{}/article", server.url()))
        .unwrap();

    Rig {
        server,
        store,
        _dir: dir,
    }
}

fn build_monitor(rig: &Rig) -> (Monitor, tokio::sync::mpsc::UnboundedReceiver<Notice>) {
    let endpoint = Url::parse(&format!("{}/api/analyze-focus", rig.server.url())).unwrap();
    let settings = MonitorSettings::default();
    let oracle = HttpOracle::new(endpoint, settings.oracle_timeout).unwrap();
    let source = WebPageSource::from_store(rig.store.clone()).unwrap();
    let (sink, rx) = ChannelSink::new();
    let monitor = Monitor::new(
        settings,
        Arc::new(oracle),
        Arc::new(source),
        rig.store.clone(),
        Arc::new(sink),
    );
    (monitor, rx)
}

#[tokio::test]
async fn drifting_page_raises_one_warning() {
    let mut rig = rig().await;
    let judge = rig
        .server
        .mock("POST", "/api/analyze-focus")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "goal": "Researching Neural Networks",
            "content": "Ten Celebrity Breakups\nYou will not believe number seven.",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"isOnTrack":false,"relevanceScore":20,"reason":"unrelated"}"#)
        .expect(1)
        .create_async()
        .await;

    let (monitor, mut rx) = build_monitor(&rig);
    monitor.start_session("Researching Neural Networks").unwrap();

    let outcome = monitor.check_now().await;
    assert!(matches!(
        outcome,
        TickOutcome::Drift {
            delivery: Delivery::Shown,
            ..
        }
    ));
    judge.assert_async().await;

    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.result().relevance_score, 20);
    assert_eq!(notice.result().reason, "unrelated");
    assert_eq!(
        serde_json::to_value(&notice).unwrap()["type"],
        "SHOW_WARNING"
    );
}

#[tokio::test]
async fn aligned_page_stays_quiet() {
    let mut rig = rig().await;
    rig.server
        .mock("POST", "/api/analyze-focus")
        .with_status(200)
        .with_body(r#"{"isOnTrack":true,"relevanceScore":95,"reason":"aligned"}"#)
        .create_async()
        .await;

    let (monitor, mut rx) = build_monitor(&rig);
    monitor.start_session("Celebrity culture essay").unwrap();
    assert!(matches!(
        monitor.check_now().await,
        TickOutcome::OnTrack { .. }
    ));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn oracle_500_is_a_silent_failure() {
    let mut rig = rig().await;
    rig.server
        .mock("POST", "/api/analyze-focus")
        .with_status(500)
        .with_body(r#"{"message":"Failed to analyze focus"}"#)
        .create_async()
        .await;

    let (monitor, mut rx) = build_monitor(&rig);
    monitor.start_session("Goal").unwrap();
    assert_eq!(
        monitor.check_now().await,
        TickOutcome::OracleFailed {
            error: OracleError::Rejected {
                status: 500,
                message: "Failed to analyze focus".into(),
            }
        }
    );
    assert!(rx.try_recv().is_err());
    assert!(monitor.status().active);
}

#[tokio::test]
async fn session_survives_restart_via_database() {
    let rig = rig().await;
    {
        let (monitor, _rx) = build_monitor(&rig);
        monitor.start_session("X").unwrap();
        monitor.shutdown();
    }

    let (monitor, _rx) = build_monitor(&rig);
    let status = monitor.restore();
    assert!(status.active);
    assert_eq!(status.goal.as_deref(), Some("X"));

    monitor.end_session().unwrap();
    let (monitor, _rx) = build_monitor(&rig);
    assert!(!monitor.restore().active);
}
