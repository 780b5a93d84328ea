//! End-to-end poll cycle tests.
//!
//! Both the homework API and the Telegram Bot API are replaced by wiremock
//! servers, so these tests exercise the real HTTP client, validator,
//! interpreter and notifier together.

use hwbot_watcher::{Config, Credentials, CycleOutcome, CyclePhase, PollState, Poller, WatcherError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOMEWORK_PATH: &str = "/api/user_api/homework_statuses/";
const SEND_PATH: &str = "/bot123:abc/sendMessage";
const CHAT_ID: &str = "424242";

/// Mock homework API and mock Bot API for one test.
struct Harness {
    homework_api: MockServer,
    telegram_api: MockServer,
}

impl Harness {
    async fn start() -> Self {
        Self {
            homework_api: MockServer::start().await,
            telegram_api: MockServer::start().await,
        }
    }

    fn config(&self) -> Config {
        Config {
            endpoint: format!("{}{HOMEWORK_PATH}", self.homework_api.uri()),
            telegram_api_url: self.telegram_api.uri(),
            request_timeout_secs: 5,
            ..Config::default()
        }
    }

    fn poller(&self, cursor: i64) -> Poller<hwbot_watcher::PracticumClient, hwbot_watcher::TelegramNotifier> {
        let credentials = Credentials {
            practicum_token: "practicum-secret".to_string(),
            telegram_token: "123:abc".to_string(),
            telegram_chat_id: CHAT_ID.to_string(),
        };
        Poller::connect(&self.config(), &credentials)
            .expect("poller should build")
            .with_state(PollState::new(cursor))
    }

    async fn accept_messages(&self) {
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
            .mount(&self.telegram_api)
            .await;
    }

    async fn sent_texts(&self) -> Vec<String> {
        self.telegram_api
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice::<serde_json::Value>(&request.body).ok())
            .filter_map(|body| body["text"].as_str().map(str::to_string))
            .collect()
    }

    async fn polled_cursors(&self) -> Vec<String> {
        self.homework_api
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "from_date")
                    .map(|(_, value)| value.into_owned())
            })
            .collect()
    }
}

/// A status change produces exactly one message with the documented text.
#[tokio::test]
async fn test_reviewing_status_is_forwarded() {
    let harness = Harness::start().await;

    Mock::given(method("GET"))
        .and(path(HOMEWORK_PATH))
        .and(header("Authorization", "OAuth practicum-secret"))
        .and(query_param("from_date", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"status": "reviewing", "homework_name": "hw1"}],
            "current_date": 1000
        })))
        .expect(1)
        .mount(&harness.homework_api)
        .await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(body_json(json!({
            "chat_id": CHAT_ID,
            "text": "Изменился статус проверки работы \"hw1\". Работа взята на проверку ревьюером."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .expect(1)
        .mount(&harness.telegram_api)
        .await;

    let mut poller = harness.poller(500);
    let outcome = poller.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Notified { .. }), "got {outcome:?}");
    assert_eq!(poller.state().cursor, 1000);
}

/// The same payload twice results in a single message.
#[tokio::test]
async fn test_repeated_payload_is_not_sent_twice() {
    let harness = Harness::start().await;
    harness.accept_messages().await;

    Mock::given(method("GET"))
        .and(path(HOMEWORK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"status": "reviewing", "homework_name": "hw1"}],
            "current_date": 1000
        })))
        .expect(2)
        .mount(&harness.homework_api)
        .await;

    let mut poller = harness.poller(500);
    poller.run_cycle().await;
    let second = poller.run_cycle().await;

    assert!(matches!(second, CycleOutcome::Duplicate), "got {second:?}");
    assert_eq!(harness.sent_texts().await.len(), 1);
    assert_eq!(poller.state().cursor, 1000);
    assert_eq!(harness.polled_cursors().await, vec!["500", "1000"]);
}

/// A server error is logged only: no message, no cursor movement.
#[tokio::test]
async fn test_server_error_sends_nothing() {
    let harness = Harness::start().await;
    harness.accept_messages().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.homework_api)
        .await;

    let mut poller = harness.poller(500);
    let outcome = poller.run_cycle().await;

    assert!(
        matches!(
            outcome,
            CycleOutcome::Failed {
                phase: CyclePhase::Fetching,
                error: WatcherError::UpstreamStatus { status: 500 },
                ..
            }
        ),
        "got {outcome:?}"
    );
    assert!(harness.sent_texts().await.is_empty());
    assert_eq!(poller.state().cursor, 500);
}

/// An empty window is not an error worth a message.
#[tokio::test]
async fn test_empty_window_is_silent() {
    let harness = Harness::start().await;
    harness.accept_messages().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"homeworks": [], "current_date": 2000})),
        )
        .mount(&harness.homework_api)
        .await;

    let mut poller = harness.poller(500);
    let outcome = poller.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::NoHomeworks), "got {outcome:?}");
    assert!(harness.sent_texts().await.is_empty());
    assert_eq!(poller.state().cursor, 500);
}

/// An unknown status is reported to the chat as a failure alert, once.
#[tokio::test]
async fn test_unknown_status_alert_is_not_repeated() {
    let harness = Harness::start().await;
    harness.accept_messages().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"status": "graded", "homework_name": "hw1"}],
            "current_date": 1000
        })))
        .mount(&harness.homework_api)
        .await;

    let mut poller = harness.poller(500);
    poller.run_cycle().await;
    poller.run_cycle().await;

    let sent = harness.sent_texts().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Сбой в работе программы: "));
    assert!(sent[0].contains("graded"));
}

/// A broken chat transport never stops the loop and the change is retried.
#[tokio::test]
async fn test_chat_outage_is_survived() {
    let harness = Harness::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "homeworks": [{"status": "approved", "homework_name": "hw1"}],
            "current_date": 1000
        })))
        .mount(&harness.homework_api)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .up_to_n_times(1)
        .mount(&harness.telegram_api)
        .await;
    harness.accept_messages().await;

    let mut poller = harness.poller(500);
    let first = poller.run_cycle().await;
    let second = poller.run_cycle().await;

    assert!(matches!(first, CycleOutcome::DeliveryFailed { .. }), "got {first:?}");
    assert!(matches!(second, CycleOutcome::Notified { .. }), "got {second:?}");
    assert_eq!(harness.polled_cursors().await, vec!["500", "500"]);
    assert_eq!(poller.state().cursor, 1000);
}
