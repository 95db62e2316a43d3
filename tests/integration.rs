//! Binary tests for commands that need no model weights.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn bot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("support-bot");
    path
}

/// Write a config pointing at `faq.txt` inside a fresh temp dir.
fn setup_test_env(faq: Option<&str>, required: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    if let Some(text) = faq {
        fs::write(root.join("faq.txt"), text).unwrap();
    }

    let config_content = format!(
        r#"[document]
path = "{}/faq.txt"
required = {}

[retrieval]
similarity_threshold = 0.5
"#,
        root.display(),
        required
    );

    let config_path = root.join("bot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_bot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = bot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run support-bot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_sections_lists_paragraphs() {
    let (_tmp, config_path) = setup_test_env(
        Some("\n\nRefunds take 5 days.\n\nShipping takes a week.\n\n"),
        false,
    );

    let (stdout, stderr, success) = run_bot(&config_path, &["sections"]);
    assert!(success, "sections failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("(2 sections)"));
    assert!(stdout.contains("--- section 0 ---\nRefunds take 5 days."));
    assert!(stdout.contains("--- section 1 ---\nShipping takes a week."));
}

#[test]
fn test_sections_json() {
    let (_tmp, config_path) = setup_test_env(Some("a\n\n\n\nb"), false);

    let (stdout, stderr, success) = run_bot(&config_path, &["sections", "--json"]);
    assert!(success, "sections failed: stderr={}", stderr);

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["status"], "loaded");
    let texts: Vec<&str> = parsed["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["a", "", "b"]);
}

#[test]
fn test_missing_document_is_an_empty_corpus() {
    let (_tmp, config_path) = setup_test_env(None, false);

    let (stdout, stderr, success) = run_bot(&config_path, &["sections"]);
    assert!(success, "sections failed: stderr={}", stderr);
    assert!(stdout.contains("(missing, empty corpus)"));
    assert!(stderr.contains("document not found"));
}

#[test]
fn test_missing_required_document_fails() {
    let (_tmp, config_path) = setup_test_env(None, true);

    let (_, stderr, success) = run_bot(&config_path, &["sections"]);
    assert!(!success);
    assert!(stderr.contains("document.required"));
}

#[test]
fn test_document_flag_overrides_config() {
    let (tmp, config_path) = setup_test_env(Some("from config"), false);
    let other = tmp.path().join("other.txt");
    fs::write(&other, "from flag\n\nsecond").unwrap();

    let (stdout, _, success) = run_bot(
        &config_path,
        &["--document", other.to_str().unwrap(), "sections"],
    );
    assert!(success);
    assert!(stdout.contains("(2 sections)"));
    assert!(stdout.contains("from flag"));
    assert!(!stdout.contains("from config"));
}

#[test]
fn test_invalid_threshold_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bot.toml");
    fs::write(&config_path, "[retrieval]\nsimilarity_threshold = 2.0\n").unwrap();

    let (_, stderr, success) = run_bot(&config_path, &["sections"]);
    assert!(!success);
    assert!(stderr.contains("similarity_threshold"));
}
