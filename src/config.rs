use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::supabase::SupabaseConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub session_refresh_secs: u64,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let supabase = SupabaseConfig::new_from_env()?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://opsclad.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let session_refresh_secs = match env::var("SESSION_REFRESH_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| AppError::Config(format!("SESSION_REFRESH_SECS is invalid: {}", v)))?,
            Err(_) => 60,
        };

        Ok(Self {
            supabase,
            database_url,
            bind_addr,
            session_refresh_secs,
        })
    }
}
