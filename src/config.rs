use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::supabase::SupabaseConfig;

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://taskboard.db?mode=rwc";

#[derive(Clone, Debug)]
pub enum BackendConfig {
    Supabase(SupabaseConfig),
    Local { database_url: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Public base URL, used to build the magic-link target.
    pub site_url: String,
    pub bind_addr: SocketAddr,
    pub backend: BackendConfig,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let site_url = non_empty("SITE_URL")
            .or_else(|| non_empty("NEXT_PUBLIC_SITE_URL"))
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let backend = match non_empty("SUPABASE_URL") {
            Some(url) => {
                let anon_key = non_empty("SUPABASE_ANON_KEY").ok_or_else(|| {
                    AppError::Config("SUPABASE_ANON_KEY is not set".to_string())
                })?;
                BackendConfig::Supabase(SupabaseConfig::new(url, anon_key))
            }
            None => BackendConfig::Local {
                database_url: non_empty("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
        };

        let cookie_secure = non_empty("COOKIE_SECURE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            bind_addr,
            backend,
            cookie_secure,
        })
    }

    pub fn email_redirect_to(&self) -> String {
        format!("{}/auth/confirm", self.site_url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            backend: BackendConfig::Local {
                database_url: DEFAULT_DATABASE_URL.to_string(),
            },
            cookie_secure: false,
        }
    }
}
