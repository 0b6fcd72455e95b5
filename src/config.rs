use crate::store::{AnyStore, FileStore, SupabaseStore};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

const PLACEHOLDER_URL: &str = "YOUR_SUPABASE_URL";
const PLACEHOLDER_KEY: &str = "YOUR_SUPABASE_ANON_KEY";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Supabase credentials missing or invalid: {0}")]
    Credentials(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Supabase { url: String, anon_key: String },
    File { path: PathBuf, unique_dates: bool },
}

impl Backend {
    pub fn into_store(self) -> AnyStore {
        match self {
            Backend::Supabase { url, anon_key } => AnyStore::Supabase(SupabaseStore::new(url, anon_key)),
            Backend::File { path, unique_dates } => AnyStore::File(FileStore::new(path, unique_dates)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// `Err` keeps the server up with the run form disabled.
    pub backend: Result<Backend, ConfigError>,
    pub status_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or(&lookup, "PORT", 8080u16);
        let status_ttl = Duration::from_millis(parse_or(&lookup, "RUN_LOG_STATUS_TTL_MS", 3000u64));

        Self {
            port,
            backend: backend(&lookup),
            status_ttl,
        }
    }
}

fn backend(lookup: &impl Fn(&str) -> Option<String>) -> Result<Backend, ConfigError> {
    let url = lookup("RUN_LOG_SUPABASE_URL");
    let anon_key = lookup("RUN_LOG_SUPABASE_ANON_KEY");

    match (url, anon_key) {
        (None, None) => {
            let path = lookup("RUN_LOG_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/runs.json"));
            let unique_dates = parse_or(lookup, "RUN_LOG_UNIQUE_DATES", false);
            info!("no remote store configured, using {}", path.display());
            Ok(Backend::File { path, unique_dates })
        }
        (Some(url), Some(anon_key)) => {
            let url = url.trim().to_string();
            let anon_key = anon_key.trim().to_string();
            if url.is_empty() || url == PLACEHOLDER_URL {
                return Err(ConfigError::Credentials("RUN_LOG_SUPABASE_URL is not set to a project URL".into()));
            }
            if anon_key.is_empty() || anon_key == PLACEHOLDER_KEY {
                return Err(ConfigError::Credentials("RUN_LOG_SUPABASE_ANON_KEY is not set to an anon key".into()));
            }
            Ok(Backend::Supabase { url, anon_key })
        }
        (Some(_), None) => Err(ConfigError::Credentials("RUN_LOG_SUPABASE_ANON_KEY is missing".into())),
        (None, Some(_)) => Err(ConfigError::Credentials("RUN_LOG_SUPABASE_URL is missing".into())),
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|err| {
            warn!("invalid {key} value '{raw}': {err}, using default {default}");
            default
        }),
        None => default,
    }
}
