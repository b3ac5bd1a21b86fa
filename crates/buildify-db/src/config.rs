/// Environment variables consulted for the connection URL, in priority order.
pub const DATABASE_URL_VARS: [&str; 2] = ["BUILDIFY_DATABASE_URL", "DATABASE_URL"];

/// Database configuration.
///
/// There is no compiled-in fallback URL: the server refuses to start
/// without an explicit connection string.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// Build a config from an explicit URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The URL with any password replaced, safe for log lines.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.database_url.split_once("://") else {
            return self.database_url.clone();
        };
        let Some((credentials, host)) = rest.split_once('@') else {
            return self.database_url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
            None => self.database_url.clone(),
        }
    }
}
