use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub fetcher: FetcherConfig,
    pub refresh: RefreshConfig,
    pub api: ApiConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the adverse-event data source (openFDA FAERS).
    pub base_url: String,
    /// How many daily buckets one refresh fetch asks for.
    pub fetch_window_days: u32,
    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Comma-separated subject list refreshed by default.
    pub subjects: Vec<String>,
    /// Shared secret expected in the x-cron-secret header. None = endpoint disabled.
    pub cron_secret: Option<String>,
    /// How many buckets the per-subject refresh preview reads back.
    pub preview_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Fallback trends window (days) when no explicit start date is given.
    pub default_window_days: i64,
    /// Default and max for the "recent buckets" read path.
    pub recent_limit_default: i64,
    pub recent_limit_max: i64,
    /// Contraindication search pagination.
    pub default_page_size: i64,
    pub max_page_size: i64,
    /// Interaction lookup result cap.
    pub interaction_cap_default: i64,
    pub interaction_cap_max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Shared secret expected in the x-admin-token header. None = endpoints disabled.
    pub token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Fetcher overrides
        if let Ok(v) = env::var("FAERS_API_URL") {
            self.fetcher.base_url = v;
        }
        if let Ok(v) = env::var("FETCH_WINDOW_DAYS") {
            self.fetcher.fetch_window_days = v.parse().unwrap_or(self.fetcher.fetch_window_days);
        }
        if let Ok(v) = env::var("FETCH_TIMEOUT_SECS") {
            self.fetcher.request_timeout_secs = v.parse().unwrap_or(self.fetcher.request_timeout_secs);
        }

        // Refresh overrides
        if let Ok(v) = env::var("REFRESH_SUBJECTS") {
            let subjects: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !subjects.is_empty() {
                self.refresh.subjects = subjects;
            }
        }
        if let Ok(v) = env::var("CRON_SECRET") {
            if !v.is_empty() {
                self.refresh.cron_secret = Some(v);
            }
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_WINDOW_DAYS") {
            self.api.default_window_days = v.parse().unwrap_or(self.api.default_window_days);
        }
        if let Ok(v) = env::var("API_RECENT_LIMIT") {
            self.api.recent_limit_default = v.parse().unwrap_or(self.api.recent_limit_default);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Admin overrides
        if let Ok(v) = env::var("ADMIN_TOKEN") {
            if !v.is_empty() {
                self.admin.token = Some(v);
            }
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 5,
                connection_timeout: 30,
            },
            fetcher: FetcherConfig {
                base_url: "https://api.fda.gov/drug/event.json".to_string(),
                fetch_window_days: 14,
                request_timeout_secs: 10,
            },
            refresh: RefreshConfig {
                subjects: vec!["PHENELZINE".to_string()],
                cron_secret: None,
                preview_limit: 5,
            },
            api: ApiConfig {
                default_window_days: 180,
                recent_limit_default: 12,
                recent_limit_max: 100,
                default_page_size: 20,
                max_page_size: 100,
                interaction_cap_default: 500,
                interaction_cap_max: 5000,
            },
            admin: AdminConfig { token: None },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 10,
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 5,
            },
            ..Self::development()
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.fetcher.fetch_window_days, 14);
        assert_eq!(config.api.default_window_days, 180);
        assert_eq!(config.api.max_page_size, 100);
        assert_eq!(config.api.interaction_cap_default, 500);
        assert_eq!(config.refresh.subjects, vec!["PHENELZINE".to_string()]);
        assert!(config.refresh.cron_secret.is_none());
    }

    #[test]
    fn production_widens_pool() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.connection_timeout, 5);
    }
}
