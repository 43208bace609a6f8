use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    /// Model used for blog post generation
    pub generation_model: String,
    /// Timeout applied to every generation request
    pub generation_timeout: Duration,
    /// Interval between automation ticks
    pub automation_interval: Duration,
    /// Bearer token required by the admin endpoints
    pub admin_api_token: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let interval_minutes: u64 = env::var("BLOG_AUTOMATION_INTERVAL_MINUTES")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("BLOG_AUTOMATION_INTERVAL_MINUTES must be a whole number of minutes")?;
        if interval_minutes == 0 {
            bail!("BLOG_AUTOMATION_INTERVAL_MINUTES must be at least 1");
        }

        let timeout_secs: u64 = env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .context("GENERATION_TIMEOUT_SECS must be a valid number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_base_url: env::var("OPENAI_BASE_URL").ok().filter(|s| !s.is_empty()),
            generation_model: env::var("BLOG_GENERATION_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            generation_timeout: Duration::from_secs(timeout_secs),
            automation_interval: Duration::from_secs(interval_minutes * 60),
            admin_api_token: env::var("ADMIN_API_TOKEN").context("ADMIN_API_TOKEN must be set")?,
            allowed_origins: parse_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = parse_origins(" https://a.example ,,https://b.example ");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
        assert!(parse_origins("").is_empty());
    }
}
