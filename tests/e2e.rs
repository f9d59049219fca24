use std::path::Path;
use std::process::Command;

const HEADER: &str = "order_number,id,status,payment_status,items,total";

fn run_cli(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_order-stream"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn replay(fixture: &str) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    run_cli(&["replay", &path])
}

#[test]
fn replay_valid_stream() {
    let (stdout, stderr, success) = replay("valid.sse");

    assert!(success);
    assert!(stderr.is_empty(), "unexpected stderr: {stderr}");

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], HEADER);
    // most recent first, cancelled o3 gone, o1 updated in place
    assert_eq!(lines[1], "2,o2,RECEIVED,PENDING,5,15.50");
    assert_eq!(lines[2], "1,o1,CONFIRMED,PAID,1,42.00");
    assert_eq!(lines.len(), 3);
}

#[test]
fn malformed_frames_warn_but_do_not_block() {
    let (stdout, stderr, success) = replay("with_errors.sse");

    assert!(success);
    assert!(stderr.contains("frame 3: malformed event"));
    assert!(stderr.contains("frame 4: ORDER_UPDATED payload"));
    // unknown types and absent ids are not warnings
    assert!(!stderr.contains("STORE_PAUSED"));
    assert!(!stderr.contains("o9"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, [HEADER, "1,o1,READY,PENDING,4,20.00"]);
}

#[test]
fn new_then_cancel_leaves_empty_board() {
    let (stdout, _, success) = replay("new_then_cancel.sse");

    assert!(success);
    assert_eq!(stdout.trim_end(), HEADER);
}

#[test]
fn replay_missing_file_fails() {
    let (stdout, stderr, success) = replay("nope.sse");

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to read"));
}

#[test]
fn session_set_show_clear() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_str().unwrap();
    let session_file = Path::new(data_dir).join("store-customer.json");

    let (stdout, _, success) = run_cli(&["--data-dir", data_dir, "session", "show"]);
    assert!(success);
    assert_eq!(stdout.trim(), "no session");

    let (_, _, success) = run_cli(&[
        "--data-dir", data_dir, "session", "set", "--id", "c1", "--phone", "5511900001111",
        "--name", "João",
    ]);
    assert!(success);
    assert!(session_file.exists());

    let (stdout, _, success) = run_cli(&["--data-dir", data_dir, "session", "show"]);
    assert!(success);
    assert!(stdout.contains("\"id\": \"c1\""));
    assert!(stdout.contains("João"));

    let (_, _, success) = run_cli(&["--data-dir", data_dir, "session", "clear"]);
    assert!(success);
    assert!(!session_file.exists());
}

#[test]
fn session_with_corrupt_file_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("store-customer.json"), "{not json").unwrap();
    let data_dir = dir.path().to_str().unwrap();

    let (stdout, stderr, success) = run_cli(&["--data-dir", data_dir, "session", "show"]);
    assert!(success);
    assert_eq!(stdout.trim(), "no session");
    assert!(stderr.contains("corrupt session ignored"));
}
