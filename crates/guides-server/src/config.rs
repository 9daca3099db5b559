use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

const DEFAULT_LOCALE: &str = "en";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SITE_URL: &str = "https://offgrid.example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Stdio,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub content_root: PathBuf,
    pub locale: String,
    pub bind_addr: SocketAddr,
    pub transport: Transport,
    pub site_url: String,
    pub redis_url: Option<String>,
    /// Session token to email.
    pub sessions: HashMap<String, String>,
    pub admins: Vec<String>,
    pub users: Vec<String>,
}

impl Config {
    /// Required:
    /// - `GUIDES_CONTENT_ROOT` (directory holding one subdirectory per locale)
    ///
    /// Optional:
    /// - `GUIDES_LOCALE` (default: "en")
    /// - `GUIDES_BIND_ADDR` (default: "127.0.0.1:3000")
    /// - `GUIDES_TRANSPORT`: "http" or "stdio" (default: "http")
    /// - `GUIDES_SITE_URL` (default: "https://offgrid.example.com")
    /// - `REDIS_URL`
    /// - `GUIDES_SESSIONS`: "token=email,token=email"
    /// - `GUIDES_ADMINS`, `GUIDES_USERS`: comma-separated emails
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let content_root = var("GUIDES_CONTENT_ROOT").map(PathBuf::from).ok_or_else(|| {
            AppError::Config("GUIDES_CONTENT_ROOT environment variable is required".to_string())
        })?;
        if !content_root.is_dir() {
            return Err(AppError::Config(format!(
                "content root not found: {}",
                content_root.display()
            )));
        }

        let bind_raw = var("GUIDES_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e| AppError::Config(format!("invalid GUIDES_BIND_ADDR {bind_raw:?}: {e}")))?;

        let transport = match var("GUIDES_TRANSPORT").as_deref().map(str::trim) {
            None | Some("") | Some("http") => Transport::Http,
            Some("stdio") => Transport::Stdio,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "invalid GUIDES_TRANSPORT {other:?}: expected \"http\" or \"stdio\""
                )))
            }
        };

        let sessions = var("GUIDES_SESSIONS")
            .map(|raw| parse_sessions(&raw))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            content_root,
            locale: var("GUIDES_LOCALE")
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            bind_addr,
            transport,
            site_url: var("GUIDES_SITE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            redis_url: var("REDIS_URL").filter(|u| !u.trim().is_empty()),
            sessions,
            admins: split_list(var("GUIDES_ADMINS")),
            users: split_list(var("GUIDES_USERS")),
        })
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|r| {
        r.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_sessions(raw: &str) -> Result<HashMap<String, String>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (token, email) = pair
                .split_once('=')
                .map(|(t, e)| (t.trim(), e.trim()))
                .filter(|(t, e)| !t.is_empty() && !e.is_empty())
                .ok_or_else(|| {
                    AppError::Config(format!("invalid GUIDES_SESSIONS entry {pair:?}: expected token=email"))
                })?;
            Ok((token.to_string(), email.to_string()))
        })
        .collect()
}
