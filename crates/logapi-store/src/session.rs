//! Mode-scoped database sessions.
//!
//! A [`SessionFactory`] owns one connection pool per database mode, opened
//! lazily on first use from credentials resolved through Secrets Manager
//! (or from a fixed URL for local runs). A [`Session`] is one pooled
//! connection checked out for a single unit of work.

use std::time::Duration;

use logapi_secrets::credentials::{ConnectionCredentials, DbMode};
use logapi_secrets::resolver::ConnectionResolver;
use sqlx::any::AnyPoolOptions;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyConnection, AnyPool, ConnectOptions, Connection, Transaction};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{PersistenceContext, StoreError};

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// `None` keeps idle connections open indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl PoolSettings {
    /// One long-lived connection. Required for in-memory SQLite, where every
    /// new connection would see an empty database.
    pub fn single_connection() -> Self {
        Self {
            max_connections: 1,
            idle_timeout: None,
        }
    }
}

enum Target {
    Resolved(ConnectionResolver),
    /// One URL serves both modes.
    Url(String),
}

pub struct SessionFactory {
    target: Target,
    settings: PoolSettings,
    read: OnceCell<AnyPool>,
    write: OnceCell<AnyPool>,
}

impl SessionFactory {
    /// Sessions against the databases named by the stage's secrets.
    pub fn new(resolver: ConnectionResolver, settings: PoolSettings) -> Self {
        Self::with_target(Target::Resolved(resolver), settings)
    }

    /// Sessions against a fixed database URL, for both modes.
    pub fn from_url(url: impl Into<String>, settings: PoolSettings) -> Self {
        Self::with_target(Target::Url(url.into()), settings)
    }

    fn with_target(target: Target, settings: PoolSettings) -> Self {
        sqlx::any::install_default_drivers();
        Self {
            target,
            settings,
            read: OnceCell::new(),
            write: OnceCell::new(),
        }
    }

    /// The pool for `mode`, connecting on first use.
    pub async fn pool(&self, mode: DbMode) -> Result<&AnyPool, StoreError> {
        let cell = match (&self.target, mode) {
            (Target::Url(_), _) | (Target::Resolved(_), DbMode::Read) => &self.read,
            (Target::Resolved(_), DbMode::Write) => &self.write,
        };
        cell.get_or_try_init(|| self.connect(mode)).await
    }

    /// Check out a session. The caller must hand it back through
    /// [`Session::release`], [`Session::invalidate`] or [`Session::finish`].
    pub async fn session(&self, mode: DbMode) -> Result<Session, StoreError> {
        let conn = self
            .pool(mode)
            .await?
            .acquire()
            .await
            .during("acquire session")?;
        debug!(mode = %mode, "session opened");
        Ok(Session { conn, mode })
    }

    async fn connect(&self, mode: DbMode) -> Result<AnyPool, StoreError> {
        let url = match &self.target {
            Target::Url(url) => url.clone(),
            Target::Resolved(resolver) => {
                debug!(stage = resolver.stage(), mode = %mode, "resolving database credentials");
                connection_url(&resolver.resolve(mode).await?)
            }
        };

        let pool = AnyPoolOptions::new()
            .max_connections(self.settings.max_connections)
            .idle_timeout(self.settings.idle_timeout)
            .max_lifetime(self.settings.idle_timeout.map(|t| t * 3))
            .connect(&url)
            .await
            .during("connect")?;

        info!(
            mode = %mode,
            max_connections = self.settings.max_connections,
            "database pool opened"
        );
        Ok(pool)
    }
}

/// MySQL URL for resolved credentials, with every part escaped.
pub fn connection_url(credentials: &ConnectionCredentials) -> String {
    let mut options = MySqlConnectOptions::new()
        .host(&credentials.host)
        .username(&credentials.username)
        .password(&credentials.password)
        .database(&credentials.database);
    if let Some(port) = credentials.port {
        options = options.port(port);
    }
    options.to_url_lossy().to_string()
}

/// One pooled connection checked out for a unit of work.
pub struct Session {
    conn: PoolConnection<Any>,
    mode: DbMode,
}

impl Session {
    pub fn mode(&self) -> DbMode {
        self.mode
    }

    pub fn connection(&mut self) -> &mut AnyConnection {
        &mut *self.conn
    }

    pub async fn begin(&mut self) -> Result<Transaction<'_, Any>, StoreError> {
        self.connection().begin().await.during("begin transaction")
    }

    /// Return the connection to the pool.
    pub fn release(self) {
        debug!(mode = %self.mode, "session released");
    }

    /// Close the connection instead of returning it to the pool.
    pub async fn invalidate(self) {
        let mode = self.mode;
        match self.conn.close().await {
            Ok(()) => debug!(mode = %mode, "session invalidated"),
            Err(e) => warn!(mode = %mode, error = %e, "failed to close invalidated session"),
        }
    }

    /// Hand the session back after an operation, on every exit path.
    ///
    /// A connection fault closes the connection. Any other outcome,
    /// including a rolled-back failure, returns the healthy connection to
    /// the pool rather than closing it.
    pub async fn finish<T>(self, result: &Result<T, StoreError>) {
        match result {
            Err(e) if e.is_connection_fault() => self.invalidate().await,
            _ => self.release(),
        }
    }
}

/// Whether the connection talks to SQLite rather than MySQL.
pub(crate) fn is_sqlite(conn: &AnyConnection) -> bool {
    conn.backend_name().to_ascii_lowercase().contains("sqlite")
}

/// Roll back a failed transaction, logging integrity violations.
pub(crate) async fn abort(tx: Transaction<'_, Any>, err: &StoreError) {
    if let StoreError::IntegrityViolation { operation, message } = err {
        warn!(operation, error = %message, "integrity violation, rolling back");
    }
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_url_escapes_credentials() {
        let credentials: ConnectionCredentials = serde_json::from_str(
            r#"{"username":"app","password":"p@ss/word","host":"db.internal","port":3307,"bd_name":"logs"}"#,
        )
        .unwrap();
        let url = connection_url(&credentials);
        assert!(url.starts_with("mysql://app:"));
        assert!(url.contains("@db.internal:3307/logs"));
        assert!(!url.contains("p@ss/word"));
    }

    #[tokio::test]
    async fn url_target_shares_one_pool_across_modes() {
        let factory = SessionFactory::from_url("sqlite::memory:", PoolSettings::single_connection());
        let read = factory.pool(DbMode::Read).await.unwrap() as *const AnyPool;
        let write = factory.pool(DbMode::Write).await.unwrap() as *const AnyPool;
        assert_eq!(read, write);
    }

    #[tokio::test]
    async fn released_session_is_reusable() {
        let factory = SessionFactory::from_url("sqlite::memory:", PoolSettings::single_connection());
        let session = factory.session(DbMode::Write).await.unwrap();
        assert_eq!(session.mode(), DbMode::Write);
        session.release();

        // Single-connection pool: this would wait forever if the first
        // session had not been returned.
        let mut session = factory.session(DbMode::Read).await.unwrap();
        sqlx::query("SELECT 1")
            .execute(session.connection())
            .await
            .unwrap();
        session.release();
    }
}
