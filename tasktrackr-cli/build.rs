use std::process::Command;

fn git_short_sha(repo_root: &str) -> Option<String> {
    let out = Command::new("git")
        .args(["-C", repo_root, "rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let sha = git_short_sha(&format!("{manifest_dir}/..")).unwrap_or_else(|| "unknown".to_string());

    // Shown by `tasktrackr --version`.
    println!("cargo:rustc-env=TASKTRACKR_BUILD_SHA={sha}");
}
