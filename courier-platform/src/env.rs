//! Environment selection and credential configuration.

use std::env;
use std::str::FromStr;

use crate::error::{PlatformError, Result};

/// Server environment the platform endpoints resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Live servers.
    #[default]
    Production,
    /// Integration sandbox.
    Sandbox,
}

impl FromStr for Environment {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(PlatformError::Config(format!("unknown environment: {other}"))),
        }
    }
}

/// One integration's credential tuple. Client-side and server-side
/// credentials are independent instances of this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Application identifier.
    pub app_id: String,
    /// OAuth consumer key.
    pub consumer_key: String,
    /// OAuth consumer secret.
    pub consumer_secret: String,
}

impl Credentials {
    /// Create a credential tuple.
    pub fn new(
        app_id: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }
}

/// Platform configuration consumed from the embedding application.
///
/// Nothing here is persisted: credentials and endpoints live in memory only
/// and are re-initialized on process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Selected environment.
    pub environment: Environment,
    /// Root domain the environment endpoints resolve against.
    pub domain: String,
    /// Client-side credentials.
    pub client: Credentials,
    /// Server-side credentials.
    pub server: Credentials,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            domain: "courier.example.com".to_string(),
            client: Credentials::default(),
            server: Credentials::default(),
        }
    }
}

impl PlatformConfig {
    /// Base endpoint for the given application in the selected environment.
    pub fn base_url(&self, app_id: &str) -> String {
        match self.environment {
            Environment::Production => format!("https://app.{}/1/{}", self.domain, app_id),
            Environment::Sandbox => format!("http://app-sandbox.{}/1/{}", self.domain, app_id),
        }
    }

    /// Base endpoint for the client-side application.
    pub fn client_base_url(&self) -> String {
        self.base_url(&self.client.app_id)
    }

    /// Base endpoint for the server-side application.
    pub fn server_base_url(&self) -> String {
        self.base_url(&self.server.app_id)
    }

    /// Load configuration from `COURIER_*` environment variables, honoring a
    /// `.env` file when present.
    ///
    /// Required: `COURIER_CLIENT_APP_ID`, `COURIER_CLIENT_CONSUMER_KEY`,
    /// `COURIER_CLIENT_CONSUMER_SECRET` and the `COURIER_SERVER_*`
    /// equivalents. Optional: `COURIER_ENVIRONMENT` (default `production`)
    /// and `COURIER_DOMAIN`.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; real environment variables win.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let environment = match lookup("COURIER_ENVIRONMENT") {
            Some(value) => value.parse()?,
            None => defaults.environment,
        };
        let domain = lookup("COURIER_DOMAIN").unwrap_or(defaults.domain);

        let required = |key: &str| {
            lookup(key).ok_or_else(|| PlatformError::Config(format!("missing variable: {key}")))
        };

        Ok(Self {
            environment,
            domain,
            client: Credentials {
                app_id: required("COURIER_CLIENT_APP_ID")?,
                consumer_key: required("COURIER_CLIENT_CONSUMER_KEY")?,
                consumer_secret: required("COURIER_CLIENT_CONSUMER_SECRET")?,
            },
            server: Credentials {
                app_id: required("COURIER_SERVER_APP_ID")?,
                consumer_key: required("COURIER_SERVER_CONSUMER_KEY")?,
                consumer_secret: required("COURIER_SERVER_CONSUMER_SECRET")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("COURIER_ENVIRONMENT", "sandbox"),
            ("COURIER_DOMAIN", "example.net"),
            ("COURIER_CLIENT_APP_ID", "app-c"),
            ("COURIER_CLIENT_CONSUMER_KEY", "ck"),
            ("COURIER_CLIENT_CONSUMER_SECRET", "cs"),
            ("COURIER_SERVER_APP_ID", "app-s"),
            ("COURIER_SERVER_CONSUMER_KEY", "sk"),
            ("COURIER_SERVER_CONSUMER_SECRET", "ss"),
        ])
    }

    #[test]
    fn base_url_per_environment() {
        let mut config = PlatformConfig {
            domain: "example.net".to_string(),
            ..PlatformConfig::default()
        };

        assert_eq!(config.base_url("app1"), "https://app.example.net/1/app1");

        config.environment = Environment::Sandbox;
        assert_eq!(config.base_url("app1"), "http://app-sandbox.example.net/1/app1");
    }

    #[test]
    fn environment_parsing() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert!(matches!(
            "staging".parse::<Environment>(),
            Err(PlatformError::Config(_))
        ));
    }

    #[test]
    fn lookup_loads_both_credential_tuples() {
        let vars = full_env();
        let config = PlatformConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("config");

        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.client, Credentials::new("app-c", "ck", "cs"));
        assert_eq!(config.server, Credentials::new("app-s", "sk", "ss"));
        assert_eq!(config.client_base_url(), "http://app-sandbox.example.net/1/app-c");
    }

    #[test]
    fn missing_variable_is_a_config_error() {
        let mut vars = full_env();
        vars.remove("COURIER_SERVER_CONSUMER_SECRET");

        let result = PlatformConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert!(matches!(result, Err(PlatformError::Config(message)) if message.contains("COURIER_SERVER_CONSUMER_SECRET")));
    }

    #[test]
    fn environment_and_domain_have_defaults() {
        let mut vars = full_env();
        vars.remove("COURIER_ENVIRONMENT");
        vars.remove("COURIER_DOMAIN");

        let config = PlatformConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("config");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.domain, "courier.example.com");
    }
}
