//! Server settings, read once from the environment at startup

use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Cloudinary account used for signed uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub cloudinary: Option<CloudinaryCredentials>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing credentials only disable the
    /// feature that needs them; the server still starts.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = var("GEMINI_API_KEY");
        if gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set, /chat will answer with errors");
        }

        let cloudinary = match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => {
                warn!("Cloudinary credentials incomplete, /upload will answer with errors");
                None
            }
        };

        Self {
            port: try_load("PORT", var("PORT"), DEFAULT_PORT),
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            cloudinary,
        }
    }
}

fn try_load<T: FromStr + Display>(key: &str, raw: Option<String>, default: T) -> T
where
    T::Err: Display,
{
    let Some(raw) = raw else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert!(config.gemini_api_key.is_none());
        assert!(config.cloudinary.is_none());
    }

    #[test]
    fn test_bad_port_falls_back() {
        assert_eq!(config(&[("PORT", "eighty")]).port, 5000);
        assert_eq!(config(&[("PORT", " 8080 ")]).port, 8080);
    }

    #[test]
    fn test_cloudinary_needs_all_three() {
        let partial = config(&[("CLOUDINARY_CLOUD_NAME", "campus"), ("CLOUDINARY_API_KEY", "k")]);
        assert!(partial.cloudinary.is_none());

        let full = config(&[
            ("CLOUDINARY_CLOUD_NAME", "campus"),
            ("CLOUDINARY_API_KEY", "k"),
            ("CLOUDINARY_API_SECRET", "s"),
            ("GEMINI_API_KEY", "g"),
        ]);
        assert_eq!(full.cloudinary.unwrap().cloud_name, "campus");
        assert_eq!(full.gemini_api_key.as_deref(), Some("g"));
    }
}
