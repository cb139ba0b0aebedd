//! Unit tests for CLI commands

use crate::cli::{run_cli, Cli, Commands};
use clap::Parser;
use std::io::Write;

#[test]
fn test_resolve_command_parses() {
    let cli = Cli::try_parse_from([
        "radixroute",
        "resolve",
        "--table",
        "routes.yaml",
        "--method",
        "post",
        "/user/42",
    ])
    .unwrap();

    match cli.command {
        Commands::Resolve {
            table,
            method,
            path,
            request_id,
        } => {
            assert_eq!(table.to_string_lossy(), "routes.yaml");
            assert_eq!(method, "post");
            assert_eq!(path, "/user/42");
            assert!(request_id.is_none());
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_resolve_defaults_to_get() {
    let cli = Cli::try_parse_from(["radixroute", "resolve", "-t", "r.yaml", "/"]).unwrap();
    match cli.command {
        Commands::Resolve { method, .. } => assert_eq!(method, "GET"),
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_all_commands_parse() {
    for args in [
        vec!["radixroute", "routes", "--table", "r.yaml"],
        vec!["radixroute", "tree", "--table", "r.yaml"],
        vec!["radixroute", "resolve", "--table", "r.yaml", "/x"],
    ] {
        assert!(Cli::try_parse_from(args.clone()).is_ok(), "failed to parse {args:?}");
    }
}

#[tokio::test]
async fn test_run_commands_against_table_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "routes:\n  - {{ method: GET, path: /hello, body: hi }}").unwrap();
    let table = file.path().to_string_lossy().into_owned();

    for command in ["routes", "tree"] {
        let cli = Cli::try_parse_from(["radixroute", command, "--table", &table]).unwrap();
        run_cli(cli).await.unwrap();
    }
    let cli = Cli::try_parse_from(["radixroute", "resolve", "--table", &table, "/hello"]).unwrap();
    run_cli(cli).await.unwrap();
}

#[tokio::test]
async fn test_missing_table_is_an_error() {
    let cli = Cli::try_parse_from(["radixroute", "routes", "--table", "/no/such/file.yaml"]).unwrap();
    assert!(run_cli(cli).await.is_err());
}
