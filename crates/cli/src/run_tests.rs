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
fn init_tracing_does_not_panic_when_called_repeatedly() {
    let config = parse(&["--user-app", "/bin/true", "--script", "a.js"]);
    init_tracing(&config);
    init_tracing(&config);
}

#[tokio::test]
async fn run_fails_fast_on_a_missing_script_file_without_spawning_the_target() {
    let config = parse(&["--user-app", "/definitely/not/a/real/binary", "--script", "/no/such/script.js"]);
    let result = run(config).await;
    assert!(result.is_err());
}
