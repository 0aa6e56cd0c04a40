// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn report_string_includes_backtrace_line_and_message() {
    let fault = ScriptFault {
        backtrace: vec!["at <script>:2".to_string()],
        failing_line: Some(2),
        offending_source: Some("Test.fail();".to_string()),
        message: "boom".to_string(),
    };
    assert_eq!(fault.to_report_string(), "at <script>:2\nat line 2: Test.fail();\nboom");
}

#[test]
fn report_string_handles_missing_line_and_source() {
    let fault = ScriptFault {
        backtrace: Vec::new(),
        failing_line: None,
        offending_source: None,
        message: "boom".to_string(),
    };
    assert_eq!(fault.to_report_string(), "boom");
}
