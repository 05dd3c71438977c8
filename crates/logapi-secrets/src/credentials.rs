use std::fmt;

use serde::Deserialize;

/// Database role a session is opened for. Each role has its own secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbMode {
    Read,
    Write,
}

impl DbMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "dbr",
            Self::Write => "dbw",
        }
    }
}

impl fmt::Display for DbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret name for a mode: `<stage>/<mode>-fcc`.
pub fn secret_name(stage: &str, mode: DbMode) -> String {
    format!("{stage}/{mode}-fcc")
}

/// Connection credentials as stored in the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionCredentials {
    pub username: String,
    pub password: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(rename = "bd_name", alias = "dbname", alias = "database")]
    pub database: String,
}

// Manual impl so the password never reaches a log line.
impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}
