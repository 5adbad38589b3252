//! Unit tests for CLI commands

use std::io::Write;

use clap::Parser;

use super::commands::DispatchArgs;
use crate::cli::{compile_command, dispatch_command, match_command, Cli, Commands};
use crate::client::HttpMethod;
use crate::pattern::{RegexOptions, RoutePattern};

#[test]
fn test_compile_command_parses_flags() {
    let cli = Cli::try_parse_from([
        "pathmock",
        "compile",
        "/users/:id",
        "--strict",
        "--no-end",
        "--ends-with",
        "?",
    ])
    .unwrap();
    match cli.command {
        Commands::Compile {
            template,
            strict,
            sensitive,
            no_end,
            ends_with,
        } => {
            assert_eq!(template, "/users/:id");
            assert!(strict);
            assert!(!sensitive);
            assert!(no_end);
            assert_eq!(ends_with, vec!["?"]);
        }
        _ => panic!("Expected Compile command"),
    }
}

#[test]
fn test_dispatch_command_parses_method() {
    let cli = Cli::try_parse_from([
        "pathmock",
        "dispatch",
        "--fixtures",
        "routes.yaml",
        "get",
        "/items/7",
    ])
    .unwrap();
    match cli.command {
        Commands::Dispatch { method, url, .. } => {
            assert_eq!(method, HttpMethod::Get);
            assert_eq!(url, "/items/7");
        }
        _ => panic!("Expected Dispatch command"),
    }
}

#[test]
fn test_dispatch_command_rejects_unknown_method() {
    assert!(Cli::try_parse_from(["pathmock", "dispatch", "-f", "r.yaml", "PATCH", "/"]).is_err());
}

#[test]
fn test_compile_command_output() {
    let rendered = compile_command("/users/:id", &RegexOptions::default()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["regex"], "(?i)^/users/([^/]+?)(?:/)?$");
    assert_eq!(json["keys"][0]["name"], "id");
    assert_eq!(json["keys"][0]["prefix"], "/");
}

#[test]
fn test_match_command_output() {
    let pattern = RoutePattern::new("/users/:id").exact(true);
    let rendered = match_command("/users/42", &pattern).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["params"]["id"], "42");
    assert!(match_command("/posts/42", &pattern).unwrap().is_none());
}

#[tokio::test]
async fn test_dispatch_command_against_fixtures() {
    let mut fixtures = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        fixtures,
        "- path: /items/:id\n  method: GET\n  json: {{ id: 7 }}\n- path: /items/:id\n  method: DELETE\n  status: 409\n  body: locked\n"
    )
    .unwrap();

    let (rendered, ok) = dispatch_command(DispatchArgs {
        fixtures: fixtures.path(),
        config: None,
        method: HttpMethod::Get,
        url: "/items/7",
        payload: None,
        no_latency: true,
    })
    .await
    .unwrap();
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["response"]["payload"]["id"], 7);
    let request_id = json["request_id"].as_str().unwrap();
    assert!(request_id.parse::<crate::ids::RequestId>().is_ok());

    let (rendered, ok) = dispatch_command(DispatchArgs {
        fixtures: fixtures.path(),
        config: None,
        method: HttpMethod::Delete,
        url: "/items/7",
        payload: None,
        no_latency: true,
    })
    .await
    .unwrap();
    assert!(!ok);
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(json["kind"], "business");
    assert_eq!(json["response"]["status"], 409);
    assert_eq!(json["response"]["payload"], "locked");
}
