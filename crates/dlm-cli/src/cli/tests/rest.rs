//! Tests for history and config.

use super::{parse, parse_cli};
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_history() {
    match parse(&["dlm", "history"]) {
        CliCommand::History { limit } => assert!(limit.is_none()),
        _ => panic!("expected History"),
    }
}

#[test]
fn cli_parse_history_limit() {
    match parse(&["dlm", "history", "--limit", "20"]) {
        CliCommand::History { limit } => assert_eq!(limit, Some(20)),
        _ => panic!("expected History with --limit"),
    }
}

#[test]
fn cli_parse_config() {
    let cli = parse_cli(&["dlm", "--config", "my.toml", "config"]);
    assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    assert!(matches!(cli.command, CliCommand::Config));
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["dlm"]).is_err());
}
