//! Environment probes that decide whether integration suites can run.

use std::path::Path;
use std::process::Command;

/// Environment variable naming an existing Postgres server for tests.
pub const DATABASE_URL_ENV: &str = "RPS_TEST_DATABASE_URL";

/// Externally supplied Postgres URL, if any.
#[must_use]
pub fn external_database_url() -> Option<String> {
    std::env::var(DATABASE_URL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Returns `true` if a Docker daemon looks reachable.
#[must_use]
pub fn docker_available() -> bool {
    docker_reachable(std::env::var("DOCKER_HOST").ok().as_deref())
}

fn docker_reachable(host: Option<&str>) -> bool {
    match host {
        Some(host) => host
            .strip_prefix("unix://")
            .is_none_or(|socket| Path::new(socket).exists()),
        None => {
            Path::new("/var/run/docker.sock").exists()
                || Command::new("docker")
                    .arg("info")
                    .output()
                    .is_ok_and(|output| output.status.success())
        }
    }
}

/// Print a uniform skip notice for a suite that cannot find a database.
pub fn skip(suite: &str, reason: &impl std::fmt::Display) {
    eprintln!("skipping {suite}: {reason}");
}
