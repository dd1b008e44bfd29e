//! Integration tests for the `lc` binary.
//!
//! Every test runs with a scrubbed environment and a temporary home so user
//! configuration and workflow variables on the host cannot leak in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for running lc inside `dir`.
fn lc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lc").unwrap();
    cmd.env_clear()
        .env("HOME", dir.join("home"))
        .env("XDG_CONFIG_HOME", dir.join("home/.config"))
        .arg("--cwd")
        .arg(dir);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

mod basics {
    use super::*;

    #[test]
    fn version_flag_works() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("lc"));
    }

    #[test]
    fn no_command_prints_help_outside_actions() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage"));
    }

    #[test]
    fn no_command_in_actions_handles_the_event() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .env("GITHUB_ACTIONS", "true")
            .assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_EVENT_PATH"))
            .stdout(predicate::str::starts_with("::error::"));
    }
}

mod local {
    use super::*;

    #[test]
    fn add_prints_code_and_writes_tree() {
        let temp = TempDir::new().unwrap();

        lc(temp.path())
            .args(["add", "https://example.com/docs?b=2&a=1"])
            .assert()
            .success()
            .stdout("0/0/0\n");
        lc(temp.path())
            .args(["add", "https://EXAMPLE.com/docs/?a=1&b=2#top"])
            .assert()
            .success()
            .stdout("0/0/0\n");
        lc(temp.path())
            .args(["add", "https://example.com/other"])
            .assert()
            .success()
            .stdout("0/1/1\n");

        assert!(temp.path().join("data/0/0/0/record.json").is_file());
        assert!(temp.path().join("data/domains-counter.json").is_file());
    }

    #[test]
    fn add_records_submitter_and_issue() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["add", "https://example.com", "--by", "alice", "--issue", "12"])
            .assert()
            .success();

        let record: Value = serde_json::from_str(
            &fs::read_to_string(temp.path().join("data/0/0/0/record.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(record["by"], "alice");
        assert_eq!(record["issue"], 12);
        assert_eq!(record["canonical"], "https://example.com/");
    }

    #[test]
    fn root_flag_moves_the_tree() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["--root", "links", "add", "https://example.com"])
            .assert()
            .success();
        assert!(temp.path().join("links/0/0/0/record.json").is_file());
        assert!(!temp.path().join("data").exists());
    }

    #[test]
    fn project_config_sets_alphabet_and_submitter() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".linkcode")).unwrap();
        fs::write(
            temp.path().join(".linkcode/config.toml"),
            "alphabet = \"ab\"\nsubmitter = \"bot\"\n\n[storage]\nroot = \"store\"\n",
        )
        .unwrap();

        for (i, expected) in ["a/a/a", "b/a/a", "ba/a/a"].iter().enumerate() {
            lc(temp.path())
                .args(["add", &format!("https://site{}.com", i)])
                .assert()
                .success()
                .stdout(format!("{}\n", expected));
        }

        let record: Value = serde_json::from_str(
            &fs::read_to_string(temp.path().join("store/ba/a/a/record.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(record["by"], "bot");
    }

    #[test]
    fn invalid_project_config_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".linkcode")).unwrap();
        fs::write(temp.path().join(".linkcode/config.toml"), "alphabet = \"aa\"\n").unwrap();

        lc(temp.path())
            .args(["add", "https://example.com"])
            .assert()
            .failure()
            .stderr(predicate::str::starts_with("error:"));
    }

    #[test]
    fn resolve_prints_json() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["add", "https://example.com/a?x=1"])
            .assert()
            .success();
        lc(temp.path())
            .args(["add", "https://example.com/a?x=2"])
            .assert()
            .success();

        let record: Value =
            serde_json::from_str(&stdout_of(lc(temp.path()).args(["resolve", "0/0/1"]))).unwrap();
        assert_eq!(record["kind"], "record");
        assert_eq!(record["code"], "0/0/1");
        assert_eq!(record["record"]["canonical"], "https://example.com/a?x=2");

        let queries: Value =
            serde_json::from_str(&stdout_of(lc(temp.path()).args(["resolve", "0/0"]))).unwrap();
        assert_eq!(queries["kind"], "queries");
        assert_eq!(queries["queries"].as_array().unwrap().len(), 2);

        let domain: Value =
            serde_json::from_str(&stdout_of(lc(temp.path()).args(["resolve", "0"]))).unwrap();
        assert_eq!(domain["kind"], "domain");
        assert_eq!(domain["counter"], json!({ "nextPath": 1, "nextQuery": 2 }));
    }

    #[test]
    fn resolve_unknown_code_is_null_record() {
        let temp = TempDir::new().unwrap();
        let out: Value =
            serde_json::from_str(&stdout_of(lc(temp.path()).args(["resolve", "5/5/5"]))).unwrap();
        assert!(out["record"].is_null());
    }

    #[test]
    fn malformed_code_fails() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["resolve", "0/1/2/3"])
            .assert()
            .code(1)
            .stderr(predicate::str::starts_with("error:"))
            .stderr(predicate::str::contains("0/1/2/3"));
    }

    #[test]
    fn local_urls_are_rejected() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["add", "http://localhost:3000/admin"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("localhost"));
        assert!(!temp.path().join("data").exists());
    }

    #[test]
    fn list_shows_domains_in_order() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No domains yet."));

        for host in ["zeta.com", "alpha.com"] {
            lc(temp.path())
                .args(["add", &format!("https://{}/", host)])
                .assert()
                .success();
        }

        let listing = stdout_of(lc(temp.path()).arg("list"));
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0  https://zeta.com  "));
        assert!(lines[1].starts_with("1  https://alpha.com  "));
    }

    #[test]
    fn quiet_list_prints_nothing_when_empty() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["list", "-q"])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn debug_goes_to_stderr() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["--debug", "add", "https://example.com"])
            .assert()
            .success()
            .stdout("0/0/0\n")
            .stderr(predicate::str::contains("[debug] canonical URL: https://example.com/"));
    }
}

mod detect {
    use super::*;

    #[test]
    fn default_candidates() {
        let temp = TempDir::new().unwrap();
        let out = stdout_of(lc(temp.path()).args(["detect", "FF"]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "#0 \"0123456789\": rejected, symbol 'F' not in alphabet",
                "#1 base 16: accepted, decimal 255",
                "#2 base 36: accepted, decimal 555",
                "#3 base 62: accepted, decimal 945",
            ]
        );
    }

    #[test]
    fn explicit_candidates_include_invalid_ones() {
        let temp = TempDir::new().unwrap();
        lc(temp.path())
            .args(["detect", "101", "--candidate", "01", "--candidate", "00"])
            .assert()
            .success()
            .stdout(predicate::str::contains("#0 base 2: accepted, decimal 5"))
            .stdout(predicate::str::contains(
                "#1 \"00\": rejected, symbol '0' appears more than once",
            ));
    }

    #[test]
    fn single_symbol_candidate_is_accepted_without_decimal() {
        let temp = TempDir::new().unwrap();
        let out = stdout_of(lc(temp.path()).args([
            "detect",
            "000",
            "--candidate",
            "0",
            "--candidate",
            "0123456789",
        ]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, ["#0 base 1: accepted", "#1 base 10: accepted, decimal 0"]);
    }
}

mod event {
    use super::*;

    fn write_payload(dir: &Path, body: &str) -> std::path::PathBuf {
        let payload = dir.join("event.json");
        fs::write(
            &payload,
            json!({ "action": "opened", "issue": { "number": 7, "body": body } }).to_string(),
        )
        .unwrap();
        payload
    }

    fn event_cmd(dir: &Path, payload: &Path) -> Command {
        let mut cmd = lc(dir);
        cmd.env("GITHUB_EVENT_PATH", payload)
            .env("GITHUB_REPOSITORY", "octocat/links")
            .env("GITHUB_ACTOR", "hubot")
            .arg("event");
        cmd
    }

    #[test]
    fn issue_without_url_succeeds() {
        let temp = TempDir::new().unwrap();
        let payload = write_payload(temp.path(), "just a question");
        event_cmd(temp.path(), &payload)
            .env("GITHUB_TOKEN", "t0ken")
            .assert()
            .success()
            .stdout(predicate::str::contains("No URL found in issue #7"));
    }

    #[test]
    fn token_is_required() {
        let temp = TempDir::new().unwrap();
        let payload = write_payload(temp.path(), "https://example.com");
        event_cmd(temp.path(), &payload)
            .assert()
            .failure()
            .stderr(predicate::str::contains("no GitHub token"));
    }

    #[test]
    fn missing_repository_is_reported() {
        let temp = TempDir::new().unwrap();
        let payload = write_payload(temp.path(), "https://example.com");
        lc(temp.path())
            .env("GITHUB_EVENT_PATH", &payload)
            .env("GITHUB_ACTOR", "hubot")
            .env("GITHUB_TOKEN", "t0ken")
            .arg("event")
            .assert()
            .failure()
            .stderr(predicate::str::contains("GITHUB_REPOSITORY"));
    }

    #[tokio::test]
    async fn issue_with_url_is_shortened_and_answered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/links/branches/live"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "commit": { "sha": "head" } })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/repos/octocat/links/contents/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/repos/octocat/links/contents/"))
            .and(body_partial_json(json!({ "branch": "live" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "content": { "sha": "s" } })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/octocat/links/contents/0/0/0/record.json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "content": { "sha": "s" } })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/links/issues/7/comments"))
            .and(body_partial_json(json!({
                "body": "Shortened: code `0/0/0` - created by @hubot"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".linkcode")).unwrap();
        fs::write(
            temp.path().join(".linkcode/config.toml"),
            format!("[github]\napi_base = \"{}\"\n", server.uri()),
        )
        .unwrap();
        let payload = write_payload(temp.path(), "Please shorten https://example.com/page");

        event_cmd(temp.path(), &payload)
            .env("GITHUB_TOKEN", "t0ken")
            .assert()
            .success()
            .stdout(predicate::str::contains("to 0/0/0"));

        // Nothing is written to the local tree
        assert!(!temp.path().join("data").exists());
    }
}
