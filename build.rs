// Build script for the server binary.
// Captures the Git commit hash and build timestamp so the healthcheck
// endpoint and startup banner can report exactly what is running.

use std::process::Command;

fn main() {
    let commit_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let build_date = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit_hash);
    println!("cargo:rustc-env=BUILD_DATE={}", build_date);

    let git_head = std::path::Path::new(".git/HEAD");
    if git_head.exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
    }
}
