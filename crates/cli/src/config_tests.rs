// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> Config {
    let mut full = vec!["wmonkey"];
    full.extend_from_slice(args);
    Config::try_parse_from(full).expect("parses")
}

#[test]
fn defaults_are_applied() {
    let config = parse(&["--user-app", "/bin/app", "--script", "a.js"]);
    assert_eq!(config.encoding, "utf-8");
    assert_eq!(config.log_format, "text");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.wait_before_exit_ms, 300);
    assert!(config.port.is_none());
    assert!(!config.exit_on_script_error);
}

#[test]
fn scripts_may_be_repeated() {
    let config = parse(&["--user-app", "/bin/app", "--script", "a.js", "--script", "b.js"]);
    assert_eq!(config.scripts, vec![PathBuf::from("a.js"), PathBuf::from("b.js")]);
}

#[test]
fn trailing_args_are_forwarded_to_the_target() {
    let config = parse(&["--user-app", "/bin/app", "--script", "a.js", "--", "--verbose", "-x"]);
    assert_eq!(config.user_app_args, vec!["--verbose", "-x"]);
}

#[test]
fn missing_user_app_is_a_parse_error() {
    assert!(Config::try_parse_from(["wmonkey", "--script", "a.js"]).is_err());
}

#[test]
fn missing_script_is_a_parse_error() {
    assert!(Config::try_parse_from(["wmonkey", "--user-app", "/bin/app"]).is_err());
}

#[test]
fn validate_rejects_unsupported_encoding() {
    let mut config = parse(&["--user-app", "/bin/app", "--script", "a.js"]);
    config.encoding = "latin1".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn validate_accepts_a_well_formed_config() {
    let config = parse(&["--user-app", "/bin/app", "--script", "a.js"]);
    assert!(config.validate().is_ok());
}
