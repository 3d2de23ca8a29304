//! The `run --json` command against a mock gateway: stdout must hold only the result.

use std::process::Command;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[test]
fn test_run_json_output_is_pure_json() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/session/connect");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/peers/resolve");
        then.status(200).json_body(json!({"id": 777, "username": "clinic_bot"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/session/me");
        then.status(200).json_body(json!({"id": 42}));
    });
    let confirmation = server.mock(|when, then| {
        when.method(POST).path("/v1/peers/42/messages");
        then.status(200).json_body(json!({"id": 1}));
    });

    let dir = tempfile::tempdir().unwrap();
    let steps = dir.path().join("steps.yaml");
    std::fs::write(&steps, "steps: []\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_slot-booker"))
        .current_dir(dir.path())
        .args(["run", "--json", "--steps"])
        .arg(&steps)
        .env("API_ID", "12345")
        .env("API_HASH", "0123456789abcdef")
        .env("PHONE_NUMBER", "+79990001122")
        .env("TARGET_BOT", "@clinic_bot")
        .env("GATEWAY_URL", server.base_url())
        .env("LOG_LEVEL", "debug")
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT")
        .env_remove("TG_PASSWORD")
        .env_remove("STEP_DELAY")
        .env_remove("MAX_ATTEMPTS")
        .env_remove("RESTART_DELAY")
        .env_remove("STEPS_FILE")
        .env_remove("GATEWAY_TIMEOUT")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    confirmation.assert();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let result: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["attempts"], json!(1));
    assert_eq!(result["notified"], json!(true));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("scenario loaded"));
    assert!(!stderr.contains('\u{1b}'));
}
