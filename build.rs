use std::process::Command;

/// Runs a git command and returns its trimmed stdout, or an empty string when
/// git is unavailable (e.g. building from a source tarball).
fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let hash = git(&["rev-parse", "--short", "HEAD"]);
    let commit_date = git(&["log", "-1", "--format=%cd", "--date=format:%Y-%m-%d"]);

    let version = env!("CARGO_PKG_VERSION");
    let is_dirty = !git(&["status", "--porcelain"]).is_empty();
    let tagged = git(&["tag", "--points-at", "HEAD"])
        .lines()
        .any(|tag| tag == format!("v{}", version) || tag == version);

    // Source builds without git count as releases: there is no hash to show.
    let is_release = hash.is_empty() || (tagged && !is_dirty);

    println!("cargo:rustc-env=WRITEDOWN_GIT_HASH={}", hash);
    println!("cargo:rustc-env=WRITEDOWN_COMMIT_DATE={}", commit_date);
    println!("cargo:rustc-env=WRITEDOWN_IS_RELEASE={}", is_release);
}
