//! End-to-end checks of the `sprout` binary.

use std::path::Path;
use std::process::{Command, Output};

fn sprout(config: &Path, notebook: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sprout"))
        .arg("--config")
        .arg(config)
        .arg("--notebook")
        .arg(notebook)
        .args(args)
        .env_remove("SPROUT_PROXY_KEY")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("OPENROUTER_API_KEY")
        .env("RUST_LOG", "off")
        .output()
        .expect("run sprout")
}

fn corrupt_setup(dir: &tempfile::TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();
    let notebook = dir.path().join("notebook.json");
    std::fs::write(&notebook, "{not json").unwrap();
    (config, notebook)
}

#[test]
fn generate_without_save_ignores_notebook() {
    let dir = tempfile::tempdir().unwrap();
    let (config, notebook) = corrupt_setup(&dir);

    let output = sprout(&config, &notebook, &["generate", "-i", "lentils"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Fails on the missing tiers, not on the notebook.
    assert!(!output.status.success());
    assert!(stderr.contains("NoProvider"), "stderr: {stderr}");
    assert!(!stderr.contains("unreadable"), "stderr: {stderr}");
}

#[test]
fn notebook_commands_report_corrupt_notebook() {
    let dir = tempfile::tempdir().unwrap();
    let (config, notebook) = corrupt_setup(&dir);

    let output = sprout(&config, &notebook, &["list"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("unreadable"), "stderr: {stderr}");
}
