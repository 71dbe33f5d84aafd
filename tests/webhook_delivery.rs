use loghook::alerts::{DispatchOutcome, Dispatcher, HttpWebhook};
use loghook::config::Settings;
use loghook::events::{LogEntry, LogLine};
use loghook::Config;
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn dispatcher(url: String, settings: Settings) -> Dispatcher {
    let config = Config::from_settings(Settings {
        files: vec!["/var/log/app.log".to_string()],
        url: Some(url),
        ..settings
    })
    .expect("valid settings");
    let sink = HttpWebhook::new(Duration::from_secs(5)).expect("http client");
    Dispatcher::new(Arc::new(config), Arc::new(sink))
}

fn entry(lines: &[&str]) -> LogEntry {
    LogEntry::from_lines(
        Arc::from("/var/log/app.log"),
        lines.iter().map(|l| LogLine::new(*l)).collect(),
    )
    .expect("non-empty entry")
}

#[tokio::test]
async fn posts_attachment_payload_as_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hooks/abc")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "username": "logbot",
            "attachments": [{
                "fallback": "New log entry in /var/log/app.log. \nERROR boom\n[...]  at main\n",
                "color": "#FF0000",
                "pretext": ":warning: New log entry in /var/log/app.log",
                "text": "  ERROR boom\n    at main",
            }]
        })))
        .with_status(200)
        .create_async()
        .await;

    let dispatcher = dispatcher(
        format!("{}/hooks/abc", server.url()),
        Settings {
            username: "logbot".to_string(),
            ..Settings::default()
        },
    );

    let outcome = dispatcher.dispatch(entry(&["ERROR boom", "  at main"])).await;

    assert_eq!(outcome, DispatchOutcome::Delivered { attempts: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn posts_plain_text_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hooks/abc")
        .match_body(Matcher::Json(json!({
            "username": "",
            "text": ":warning: New log entry in /var/log/app.log\n```log\nERROR boom\n```",
        })))
        .with_status(200)
        .create_async()
        .await;

    let dispatcher = dispatcher(
        format!("{}/hooks/abc", server.url()),
        Settings {
            no_attach: true,
            syntax: "log".to_string(),
            ..Settings::default()
        },
    );

    let outcome = dispatcher.dispatch(entry(&["ERROR boom"])).await;

    assert_eq!(outcome, DispatchOutcome::Delivered { attempts: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hooks/abc")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher(format!("{}/hooks/abc", server.url()), Settings::default());

    let outcome = dispatcher.dispatch(entry(&["ERROR boom"])).await;

    assert_eq!(outcome, DispatchOutcome::Delivered { attempts: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn excluded_entry_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dispatcher = dispatcher(
        format!("{}/hooks/abc", server.url()),
        Settings {
            exclude: vec!["^DEBUG".to_string()],
            ..Settings::default()
        },
    );

    let outcome = dispatcher.dispatch(entry(&["ERROR a", "DEBUG noise"])).await;

    assert_eq!(outcome, DispatchOutcome::Excluded);
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_webhook_drops_entry() {
    let dispatcher = dispatcher("http://127.0.0.1:9/hooks/abc".to_string(), Settings::default());

    let outcome = dispatcher.dispatch(entry(&["ERROR boom"])).await;

    assert_eq!(outcome, DispatchOutcome::Dropped);
}
