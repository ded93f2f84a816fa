use std::str::FromStr;
use std::time::Duration;

use lumen_core::layout::DEFAULT_COLUMN_COUNT;
use lumen_core::lightbox::DEFAULT_PREFETCH_THRESHOLD;
use lumen_core::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use lumen_core::upload::DEFAULT_UPLOAD_CONCURRENCY;

use crate::error::SessionError;

/// Session engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local server; override them
/// via environment variables (a `.env` file works through `dotenvy`).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Image service origin (default: `http://localhost:3000`).
    pub base_url: String,
    /// Images per search page (default: `40`).
    pub page_size: u32,
    /// Quiet interval before a typed search term is committed (default: `250ms`).
    pub search_debounce: Duration,
    /// Upload worker-pool width (default: `16`).
    pub upload_concurrency: usize,
    /// Per-request timeout (default: `30s`).
    pub request_timeout: Duration,
    /// Lightbox distance from the loaded end that fetches the next page (default: `10`).
    pub prefetch_threshold: usize,
    /// Masonry column count (default: `3`).
    pub column_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(250),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            request_timeout: Duration::from_secs(30),
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            column_count: DEFAULT_COLUMN_COUNT,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `LUMEN_BASE_URL`             | `http://localhost:3000` |
    /// | `LUMEN_PAGE_SIZE`            | `40`                    |
    /// | `LUMEN_SEARCH_DEBOUNCE_MS`   | `250`                   |
    /// | `LUMEN_UPLOAD_CONCURRENCY`   | `16`                    |
    /// | `LUMEN_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `LUMEN_PREFETCH_THRESHOLD`   | `10`                    |
    /// | `LUMEN_COLUMN_COUNT`         | `3`                     |
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("LUMEN_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SessionError::Config(format!(
                "LUMEN_BASE_URL must start with http:// or https://, got: '{base_url}'"
            )));
        }

        let page_size: u32 = parse(&lookup, "LUMEN_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(SessionError::Config(format!(
                "LUMEN_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let debounce_ms: u64 = parse(
            &lookup,
            "LUMEN_SEARCH_DEBOUNCE_MS",
            defaults.search_debounce.as_millis() as u64,
        )?;

        let upload_concurrency: usize =
            parse(&lookup, "LUMEN_UPLOAD_CONCURRENCY", defaults.upload_concurrency)?;
        if upload_concurrency == 0 {
            return Err(SessionError::Config(
                "LUMEN_UPLOAD_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let timeout_secs: u64 = parse(
            &lookup,
            "LUMEN_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;

        let prefetch_threshold: usize =
            parse(&lookup, "LUMEN_PREFETCH_THRESHOLD", defaults.prefetch_threshold)?;

        let column_count: usize = parse(&lookup, "LUMEN_COLUMN_COUNT", defaults.column_count)?;
        if column_count == 0 {
            return Err(SessionError::Config(
                "LUMEN_COLUMN_COUNT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            page_size,
            search_debounce: Duration::from_millis(debounce_ms),
            upload_concurrency,
            request_timeout: Duration::from_secs(timeout_secs),
            prefetch_threshold,
            column_count,
        })
    }
}

fn parse<T, F>(lookup: &F, name: &str, default: T) -> Result<T, SessionError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            SessionError::Config(format!("{name} must be a valid number, got: '{raw}'"))
        }),
        None => Ok(default),
    }
}
