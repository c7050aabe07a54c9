use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/tripshare-api");
        cmd.env("TRIPSHARE_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL and SECRET_KEY
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready on any non-404 response; 503 means up but database-less
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// True when a database is configured. Data-driven tests skip without one.
pub fn db_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Unique id block so concurrent test binaries never collide on seeded rows.
#[allow(dead_code)]
pub fn unique_id_base() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    1_000 + (nanos % 1_000_000_000) as i64
}

/// Fresh connection per call. Each `#[tokio::test]` runs on its own
/// runtime; a pool shared through the library singleton stays bound to
/// the first test's runtime and hangs every later test once that
/// runtime is dropped.
#[allow(dead_code)]
async fn db_conn() -> Result<sqlx::PgConnection> {
    use sqlx::Connection;
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    Ok(sqlx::PgConnection::connect(&url).await?)
}

#[allow(dead_code)]
pub async fn seed_user(id: i64, username: &str) -> Result<()> {
    let mut conn = db_conn().await?;
    sqlx::query(
        "INSERT INTO users (id, username, password_hash, email, bio) VALUES ($1, $2, 'x', $3, 'bio')",
    )
    .bind(id)
    .bind(username)
    .bind(format!("{}@example.com", username))
    .execute(&mut conn)
    .await?;
    Ok(())
}

#[allow(dead_code)]
pub async fn seed_trip(id: i64, user_id: i64) -> Result<()> {
    let mut conn = db_conn().await?;
    sqlx::query(
        "INSERT INTO trips (id, user_id, waypoint_names, start_point, end_point) VALUES ($1, $2, 'a,b', 'a', 'b')",
    )
    .bind(id)
    .bind(user_id)
    .execute(&mut conn)
    .await?;
    Ok(())
}

/// Remove everything a test seeded or created for the given users.
#[allow(dead_code)]
pub async fn cleanup_users(user_ids: &[i64]) -> Result<()> {
    let mut conn = db_conn().await?;
    for &id in user_ids {
        sqlx::query("DELETE FROM messages WHERE to_user_id = $1 OR from_user_id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        sqlx::query("DELETE FROM likes WHERE user_id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 OR followee_id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        sqlx::query("DELETE FROM likes WHERE trip_id IN (SELECT id FROM trips WHERE user_id = $1)")
            .bind(id)
            .execute(&mut conn)
            .await?;
        sqlx::query("DELETE FROM trips WHERE user_id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}
