const DEFAULT_API_HOST: &str = "social-media-video-downloader.p.rapidapi.com";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEV_ORIGINS: [&str; 2] = ["http://127.0.0.1:3000", "http://localhost:3000"];

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` keeps the server up but makes every resolution fail with a
    /// configuration error.
    pub api_key: Option<String>,
    pub api_host: String,
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name).and_then(|value| non_empty(&value).map(ToString::to_string))
        };

        let api_key = read("RAPID_API_KEY");
        let api_host = read("RAPID_API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let bind_addr = read("APP_ADDR")
            .or_else(|| {
                read("PORT")
                    .and_then(|value| value.parse::<u16>().ok())
                    .map(|port| format!("0.0.0.0:{port}"))
            })
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let allowed_origins = read("ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| DEV_ORIGINS.iter().map(ToString::to_string).collect());

        Self {
            api_key,
            api_host,
            bind_addr,
            allowed_origins,
        }
    }
}

/// Loads `.env.local` then `.env` from the working directory and returns the
/// files that were found. Variables already set are never overwritten.
pub fn load_env_files() -> Vec<&'static str> {
    [".env.local", ".env"]
        .into_iter()
        .filter(|file| dotenvy::from_filename(file).is_ok())
        .collect()
}

pub fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_host, DEFAULT_API_HOST);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(
            config.allowed_origins,
            vec!["http://127.0.0.1:3000", "http://localhost:3000"]
        );
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = config_from(&[("RAPID_API_KEY", "   ")]);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn reads_provider_settings() {
        let config = config_from(&[
            ("RAPID_API_KEY", " secret "),
            ("RAPID_API_HOST", "other.p.rapidapi.com"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api_host, "other.p.rapidapi.com");
    }

    #[test]
    fn app_addr_wins_over_port() {
        let config = config_from(&[("APP_ADDR", "127.0.0.1:9000"), ("PORT", "8080")]);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");

        let config = config_from(&[("PORT", "8080")]);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        let config = config_from(&[("PORT", "not-a-port")]);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn splits_allowed_origins() {
        let config = config_from(&[(
            "ALLOWED_ORIGINS",
            "https://mediafetch.app, https://www.mediafetch.app,,",
        )]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://mediafetch.app", "https://www.mediafetch.app"]
        );
    }
}
