// ABOUTME: End-to-end tests of the statusfeed binary against a mock status API.
// ABOUTME: Checks JSON and RSS output on stdout and that failures still exit cleanly with an empty feed.

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;

fn mock_timeline(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/status/user_timeline/alice");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"{"items":[{"status":{"id":"1","text":"hello <world>","create_time":"2024-01-02 15:04:05",
                    "author":{"name":"Alice"}}}]}"#,
            );
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/status/1");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"text":"hello <world>, in full"}"#);
    });
}

fn statusfeed(server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("statusfeed").unwrap();
    cmd.args(["--base-url", &server.url("/api/status"), "--page-delay-ms", "0"]);
    cmd
}

#[test]
fn prints_json_feed() {
    let server = MockServer::start();
    mock_timeline(&server);

    let output = statusfeed(&server)
        .args(["alice", "--compact"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let feed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(feed["title"], "Alice's statuses");
    assert_eq!(feed["items"].as_array().unwrap().len(), 1);
    let item = &feed["items"][0];
    assert_eq!(item["pubDate"], "Tue, 02 Jan 2024 07:04:05 GMT");
    assert!(item["description"]
        .as_str()
        .unwrap()
        .contains("hello &lt;world&gt;, in full"));
}

#[test]
fn prints_rss_feed() {
    let server = MockServer::start();
    mock_timeline(&server);

    statusfeed(&server)
        .args(["alice", "--format", "rss", "--options", "showAuthorInTitle=0"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("<rss version=\"2.0\">"))
        .stdout(predicate::str::contains("<title>hello &lt;world&gt;, in full</title>"));
}

#[test]
fn upstream_failure_still_exits_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/status/user_timeline/bob");
        then.status(500);
    });

    statusfeed(&server)
        .args(["bob", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""items":[]"#));
}

#[test]
fn unknown_format_is_rejected() {
    Command::cargo_bin("statusfeed")
        .unwrap()
        .args(["alice", "--format", "atom"])
        .assert()
        .failure();
}
