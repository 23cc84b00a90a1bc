//! Disposable Postgres databases for integration tests.
//!
//! [`start_postgres`] prefers an external server named by
//! `RPS_TEST_DATABASE_URL` and otherwise spawns a throwaway cluster from local
//! `initdb`/`postgres` binaries. Either way each call gets its own freshly
//! created database, dropped again when the handle goes out of scope.

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow, bail};
use postgres::NoTls;
use url::Url;

use crate::fixtures;

/// Handle to a database created for one test.
pub struct TestDatabase {
    url: String,
    admin_url: String,
    database: String,
    cluster: Option<LocalCluster>,
}

impl TestDatabase {
    /// Connection string for `sqlx` or any other client.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let _ = run_admin(
            &self.admin_url,
            format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.database),
        );
        if let Some(cluster) = &mut self.cluster {
            cluster.stop();
        }
    }
}

struct LocalCluster {
    process: Child,
    data_dir: PathBuf,
}

impl LocalCluster {
    fn stop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
        let _ = fs::remove_dir_all(&self.data_dir);
    }
}

/// Create an isolated database for a test.
///
/// # Errors
///
/// Returns an error when no external server is configured and local Postgres
/// binaries are missing or fail to start. Callers usually skip on error.
pub fn start_postgres() -> Result<TestDatabase> {
    if let Some(base) = fixtures::external_database_url() {
        return create_database(&base, None);
    }
    let (base, cluster) = spawn_local_cluster()?;
    create_database(&base, Some(cluster))
}

fn create_database(base: &str, cluster: Option<LocalCluster>) -> Result<TestDatabase> {
    let parsed = Url::parse(base).context("invalid postgres connection url")?;
    let database = unique_name();
    let mut admin = parsed.clone();
    admin.set_path("/postgres");
    let admin_url = admin.to_string();

    run_admin(&admin_url, format!("CREATE DATABASE \"{database}\""))
        .or_else(|_| run_admin(base, format!("CREATE DATABASE \"{database}\"")))
        .context("failed to create test database")?;

    let mut url = parsed;
    url.set_path(&format!("/{database}"));
    Ok(TestDatabase {
        url: url.to_string(),
        admin_url,
        database,
        cluster,
    })
}

fn spawn_local_cluster() -> Result<(String, LocalCluster)> {
    let initdb = locate("initdb")?;
    let server = locate("postgres")?;
    let pg_isready = locate("pg_isready")?;

    let data_dir = std::env::temp_dir().join(unique_name());
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let data_arg = data_dir
        .to_str()
        .context("data dir contains non-utf8 characters")?
        .to_string();

    let status = Command::new(initdb)
        .args(["-D", &data_arg, "--username=postgres", "--auth=trust"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("failed to run initdb")?;
    if !status.success() {
        bail!("initdb exited with {status}");
    }

    let port = free_port()?.to_string();
    let process = Command::new(server)
        .args(["-D", &data_arg, "-p", &port, "-h", "127.0.0.1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to start postgres")?;
    let mut cluster = LocalCluster { process, data_dir };

    if let Err(err) = wait_until_ready(&pg_isready, &port) {
        cluster.stop();
        return Err(err);
    }
    Ok((
        format!("postgres://postgres@127.0.0.1:{port}/postgres"),
        cluster,
    ))
}

fn locate(binary: &str) -> Result<PathBuf> {
    let from_path = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();
    let fallbacks = ["/usr/lib/postgresql/16/bin", "/usr/local/bin", "/opt/homebrew/bin"];
    from_path
        .into_iter()
        .chain(fallbacks.iter().map(PathBuf::from))
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.exists())
        .ok_or_else(|| anyhow!("{binary} binary is required for Postgres tests"))
}

fn free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("failed to reserve port")?;
    Ok(listener
        .local_addr()
        .context("failed to read listener address")?
        .port())
}

fn wait_until_ready(pg_isready: &Path, port: &str) -> Result<()> {
    for _ in 0..50 {
        let ready = Command::new(pg_isready)
            .args(["-h", "127.0.0.1", "-p", port, "-U", "postgres"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success());
        if ready {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(200));
    }
    bail!("postgres did not become ready on port {port}")
}

// The synchronous client spins up its own runtime, so keep it off any
// async test runtime thread.
fn run_admin(url: &str, statement: String) -> Result<()> {
    let url = url.to_string();
    thread::spawn(move || -> Result<()> {
        let mut client = postgres::Config::from_str(&url)?.connect(NoTls)?;
        client.batch_execute(&statement)?;
        Ok(())
    })
    .join()
    .map_err(|_| anyhow!("admin connection thread panicked"))?
}

fn unique_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("rps_test_{}_{nanos}", std::process::id())
}
