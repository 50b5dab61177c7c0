use std::fmt;

use anyhow::Context;

/// Placeholder value shipped in sample env files; never a real key.
const SENTINEL_KEY: &str = "DUMMY";

/// Credential for the vision backend. Only constructed from a non-empty,
/// non-sentinel value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for absent, blank or sentinel values.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let value = raw?.trim();
        if value.is_empty() || value == SENTINEL_KEY {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(v) => v.trim().parse::<u16>().context("PORT must be a port number")?,
            None => 5000,
        };
        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(20 * 1024 * 1024);

        let gemini = GeminiConfig {
            api_key: ApiKey::parse(lookup("GEMINI_API_KEY").as_deref()),
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".into()),
            base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".into()),
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            upload_dir: lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".into()),
            max_upload_bytes,
            gemini,
        })
    }
}
