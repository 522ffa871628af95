//! Server configuration
//!
//! Read once at startup from the environment (after `.env` is loaded).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use content::ContentConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
const DEFAULT_UPLOAD_BASE_URL: &str = "/uploads";

/// Credentials for the admin account created at startup
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

pub struct ApiConfig {
    /// `None` runs the in-memory demo mirror
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    /// Local image storage; uploads are disabled when unset
    pub upload_dir: Option<PathBuf>,
    pub upload_base_url: String,
    pub admin_seed: Option<AdminSeed>,
    pub auth: AuthConfig,
    pub content: ContentConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = non_empty("DATABASE_URL");

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let frontend_origins = non_empty("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let admin_seed = match (non_empty("ADMIN_EMAIL"), non_empty("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        let (auth, content) = if cfg!(debug_assertions) {
            (AuthConfig::development(), ContentConfig::development())
        } else {
            let config = AuthConfig {
                session_secret: session_secret()?,
                password_pepper: non_empty("PASSWORD_PEPPER").map(String::into_bytes),
                ..AuthConfig::default()
            };
            (config, ContentConfig::default())
        };

        Ok(Self {
            database_url,
            bind_addr,
            frontend_origins,
            upload_dir: non_empty("UPLOAD_DIR").map(PathBuf::from),
            upload_base_url: non_empty("PUBLIC_UPLOAD_BASE_URL")
                .unwrap_or_else(|| DEFAULT_UPLOAD_BASE_URL.to_string()),
            admin_seed,
            auth,
            content,
        })
    }

    pub fn is_demo(&self) -> bool {
        self.database_url.is_none()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `SESSION_SECRET`: 32 bytes, base64
fn session_secret() -> anyhow::Result<[u8; 32]> {
    let encoded =
        non_empty("SESSION_SECRET").context("SESSION_SECRET must be set in production")?;
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .context("SESSION_SECRET must be base64")?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("SESSION_SECRET must decode to 32 bytes, got {}", b.len()))
}
