//! Server settings
//!
//! Read once at startup from the process environment, with `.env` loaded
//! first. Every value has a default except the credentials, which may also
//! arrive per run from the page.

use dotenvy::dotenv;

use crate::domain::models::{CredentialLayer, MAX_IMAGE_SIZE};
use crate::domain::services::classifier::{DEFAULT_CLASSIFIER_MODEL, DEFAULT_MAX_NEW_TOKENS};
use crate::domain::services::copywriter::DEFAULT_COPYWRITER_MODEL;
use crate::domain::services::imgur::DEFAULT_IMGUR_API_BASE;
use crate::domain::services::replicate::DEFAULT_REPLICATE_API_BASE;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    /// Environment credential layer; `Debug` redacts the values
    pub credentials: CredentialLayer,
    pub imgur_api_base: String,
    pub replicate_api_base: String,
    pub classifier_model: String,
    pub copywriter_model: String,
    pub classifier_max_tokens: u32,
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let credentials = CredentialLayer {
            replicate_token: var("REPLICATE_KEY").or_else(|| var("REPLICATE_API_TOKEN")),
            imgur_client_id: var("IMGUR_CLIENT_ID"),
            imgur_client_secret: var("IMGUR_CLIENT_SECRET"),
        };

        let imgur_api_base = var("IMGUR_API_BASE").unwrap_or_else(|| DEFAULT_IMGUR_API_BASE.into());
        let replicate_api_base =
            var("REPLICATE_API_BASE").unwrap_or_else(|| DEFAULT_REPLICATE_API_BASE.into());

        let classifier_model =
            var("CLASSIFIER_MODEL").unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.into());
        let copywriter_model =
            var("COPYWRITER_MODEL").unwrap_or_else(|| DEFAULT_COPYWRITER_MODEL.into());

        let classifier_max_tokens = var("CLASSIFIER_MAX_TOKENS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_NEW_TOKENS);

        let max_upload_bytes = var("MAX_UPLOAD_BYTES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(MAX_IMAGE_SIZE);

        Self {
            port,
            credentials,
            imgur_api_base,
            replicate_api_base,
            classifier_model,
            copywriter_model,
            classifier_max_tokens,
            max_upload_bytes,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 3001);
        assert_eq!(settings.imgur_api_base, "https://api.imgur.com/3");
        assert_eq!(settings.replicate_api_base, "https://api.replicate.com/v1");
        assert_eq!(settings.classifier_model, DEFAULT_CLASSIFIER_MODEL);
        assert_eq!(settings.copywriter_model, DEFAULT_COPYWRITER_MODEL);
        assert_eq!(settings.classifier_max_tokens, 512);
        assert_eq!(settings.max_upload_bytes, 10 * 1024 * 1024);
        assert!(settings.credentials.is_empty());
    }

    #[test]
    fn test_overrides_and_credentials() {
        let settings = settings(&[
            ("PORT", "8080"),
            ("REPLICATE_KEY", "r8_env"),
            ("IMGUR_CLIENT_ID", "id"),
            ("IMGUR_CLIENT_SECRET", "secret"),
            ("CLASSIFIER_MAX_TOKENS", "64"),
            ("MAX_UPLOAD_BYTES", "2048"),
        ]);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.classifier_max_tokens, 64);
        assert_eq!(settings.max_upload_bytes, 2048);
        assert_eq!(settings.credentials.replicate_token.as_deref(), Some("r8_env"));
        assert!(settings.credentials.status().is_complete());
    }

    #[test]
    fn test_replicate_token_alias() {
        let settings = settings(&[("REPLICATE_API_TOKEN", "r8_alias")]);
        assert_eq!(settings.credentials.replicate_token.as_deref(), Some("r8_alias"));

        let both = settings_with_both();
        assert_eq!(both.credentials.replicate_token.as_deref(), Some("r8_primary"));
    }

    fn settings_with_both() -> Settings {
        settings(&[("REPLICATE_KEY", "r8_primary"), ("REPLICATE_API_TOKEN", "r8_alias")])
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let settings = settings(&[("PORT", "http"), ("CLASSIFIER_MAX_TOKENS", "-1")]);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.classifier_max_tokens, DEFAULT_MAX_NEW_TOKENS);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let settings = settings(&[("REPLICATE_KEY", "r8_very_secret")]);
        assert!(!format!("{:?}", settings).contains("r8_very_secret"));
    }
}
