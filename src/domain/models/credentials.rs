//! Credential layers
//!
//! The environment layer is loaded once by the server; the session layer is
//! whatever the user submitted from the side panel and travels with each run.
//! Non-blank session values take priority.

use serde::{Deserialize, Serialize};

use crate::shared::errors::{AppError, Result};

pub const INFERENCE_TOKEN_LABEL: &str = "Replicate API token";
pub const HOSTING_CLIENT_ID_LABEL: &str = "Imgur Client ID";
pub const HOSTING_CLIENT_SECRET_LABEL: &str = "Imgur Client Secret";

/// One layer of optional credential values
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialLayer {
    #[serde(default)]
    pub replicate_token: Option<String>,
    #[serde(default)]
    pub imgur_client_id: Option<String>,
    #[serde(default)]
    pub imgur_client_secret: Option<String>,
}

impl CredentialLayer {
    /// Build a layer from raw text inputs; blank inputs are dropped
    pub fn from_inputs(replicate_token: &str, imgur_client_id: &str, imgur_client_secret: &str) -> Self {
        Self {
            replicate_token: non_blank(Some(replicate_token)),
            imgur_client_id: non_blank(Some(imgur_client_id)),
            imgur_client_secret: non_blank(Some(imgur_client_secret)),
        }
    }

    /// Same layer with blank values removed
    pub fn normalized(&self) -> Self {
        Self {
            replicate_token: non_blank(self.replicate_token.as_deref()),
            imgur_client_id: non_blank(self.imgur_client_id.as_deref()),
            imgur_client_secret: non_blank(self.imgur_client_secret.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized() == CredentialLayer::default()
    }

    /// Presence flags, safe to show in the page
    pub fn status(&self) -> CredentialStatus {
        let layer = self.normalized();
        CredentialStatus {
            inference_token: layer.replicate_token.is_some(),
            hosting_client_id: layer.imgur_client_id.is_some(),
            hosting_client_secret: layer.imgur_client_secret.is_some(),
        }
    }
}

impl std::fmt::Debug for CredentialLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("CredentialLayer")
            .field("replicate_token", &redacted(status.inference_token))
            .field("imgur_client_id", &redacted(status.hosting_client_id))
            .field("imgur_client_secret", &redacted(status.hosting_client_secret))
            .finish()
    }
}

/// Which credentials a layer provides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub inference_token: bool,
    pub hosting_client_id: bool,
    pub hosting_client_secret: bool,
}

impl CredentialStatus {
    pub fn is_complete(&self) -> bool {
        self.inference_token && self.hosting_client_id && self.hosting_client_secret
    }
}

#[derive(Clone, PartialEq)]
pub struct HostingCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for HostingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostingCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Fully resolved credentials for one run
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub inference_token: String,
    pub hosting: HostingCredentials,
}

impl Credentials {
    /// Merge `session` over `environment`; fails on the first missing value
    pub fn resolve(environment: &CredentialLayer, session: &CredentialLayer) -> Result<Self> {
        let environment = environment.normalized();
        let session = session.normalized();

        let inference_token = session
            .replicate_token
            .or(environment.replicate_token)
            .ok_or(AppError::MissingCredential(INFERENCE_TOKEN_LABEL))?;
        let client_id = session
            .imgur_client_id
            .or(environment.imgur_client_id)
            .ok_or(AppError::MissingCredential(HOSTING_CLIENT_ID_LABEL))?;
        let client_secret = session
            .imgur_client_secret
            .or(environment.imgur_client_secret)
            .ok_or(AppError::MissingCredential(HOSTING_CLIENT_SECRET_LABEL))?;

        Ok(Self {
            inference_token,
            hosting: HostingCredentials {
                client_id,
                client_secret,
            },
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("inference_token", &"***")
            .field("hosting", &self.hosting)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn redacted(present: bool) -> &'static str {
    if present { "***" } else { "<unset>" }
}
