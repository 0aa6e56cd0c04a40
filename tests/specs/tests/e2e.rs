// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `wmonkey` controller
//! binary, wired to the compiled fixture target, and drive it purely
//! through its stdin/stdout JSON line protocol.

use std::time::Duration;

use wmonkey_specs::{write_script, WmonkeyProcess};

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn a_simple_script_runs_to_completion() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let script = write_script(dir.path(), "a.js", "Test.log(\"hi\");\nTest.quit();\n")?;

    let mut wmonkey = WmonkeyProcess::start(script)?;
    wmonkey.read_until(10, |v| v == &serde_json::json!("script end"))?;

    let status = wmonkey.wait_exit(TIMEOUT).await?;
    assert!(status.success());
    Ok(())
}

#[tokio::test]
async fn a_failing_script_reports_app_errors_before_script_end() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let script = write_script(dir.path(), "a.js", "Test.fail(\"boom\");\n")?;

    let mut wmonkey = WmonkeyProcess::start(script)?;
    let error_line = wmonkey.read_until(10, |v| v.get("app errors").is_some())?;
    let app_errors = error_line["app errors"].as_str().expect("app errors is a string");
    assert!(app_errors.contains("boom"), "expected the formatted report to contain the message: {app_errors}");
    assert!(app_errors.contains("line 1"), "expected the formatted report to name the failing line: {app_errors}");
    // The fixture's `Test.fail` aborts the fragment before any `Test.quit`
    // could run, so the target process stays up; it is reaped on drop.
    wmonkey.read_until(10, |v| v == &serde_json::json!("script end"))?;

    Ok(())
}

#[tokio::test]
async fn exit_on_script_error_terminates_the_session() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let script = write_script(dir.path(), "a.js", "Test.fail(\"boom\");\n")?;

    let mut wmonkey = WmonkeyProcess::build().script(&script).exit_on_script_error().spawn()?;
    wmonkey.read_until(10, |v| v.get("app errors").is_some())?;

    let status = wmonkey.wait_exit(TIMEOUT).await?;
    assert!(!status.success());
    Ok(())
}

#[tokio::test]
async fn run_script_over_stdin_is_enqueued_and_dispatched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // One script to keep the target alive while we push a second one in.
    let script = write_script(dir.path(), "a.js", "Test.wait(50);\n")?;

    let mut wmonkey = WmonkeyProcess::start(&script)?;
    wmonkey.send_run_script("b.js", "Test.log(\"from stdin\");\nTest.quit();\n")?;

    let mut script_ends = 0;
    for _ in 0..20 {
        let value = wmonkey.read_value()?;
        if value == serde_json::json!("script end") {
            script_ends += 1;
            if script_ends == 2 {
                break;
            }
        }
    }
    assert_eq!(script_ends, 2);

    wmonkey.wait_exit(TIMEOUT).await?;
    Ok(())
}
