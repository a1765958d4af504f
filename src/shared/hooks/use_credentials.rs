use dioxus::prelude::*;

use crate::domain::models::{CredentialLayer, CredentialStatus};

/// Session credentials entered in the side panel.
///
/// Lives only in this signal for as long as the tab is open; it is sent with
/// each run and never stored anywhere else.
#[derive(Clone, Copy, PartialEq)]
pub struct CredentialsState {
    pub overrides: Signal<CredentialLayer>,
    /// What the server environment already provides, once known
    pub server_status: Signal<Option<CredentialStatus>>,
}

impl CredentialsState {
    /// Replace the overrides with what the panel holds; blanks mean "use the server's"
    pub fn submit(&mut self, replicate_token: &str, imgur_client_id: &str, imgur_client_secret: &str) {
        self.overrides
            .set(CredentialLayer::from_inputs(replicate_token, imgur_client_id, imgur_client_secret));
    }

    /// Credentials available to the next run from either layer
    pub fn effective_status(&self) -> CredentialStatus {
        let session = self.overrides.read().status();
        let server = self.server_status.read().as_ref().copied().unwrap_or_default();
        CredentialStatus {
            inference_token: session.inference_token || server.inference_token,
            hosting_client_id: session.hosting_client_id || server.hosting_client_id,
            hosting_client_secret: session.hosting_client_secret || server.hosting_client_secret,
        }
    }
}

pub fn use_credentials() -> CredentialsState {
    let overrides = use_signal(CredentialLayer::default);
    let mut server_status = use_signal(|| None::<CredentialStatus>);

    use_effect(move || {
        spawn(async move {
            match fetch_credential_status().await {
                Ok(status) => server_status.set(Some(status)),
                Err(e) => tracing::warn!("Could not load credential status: {}", e),
            }
        });
    });

    CredentialsState {
        overrides,
        server_status,
    }
}

/// GET /api/credentials/status
#[cfg(target_arch = "wasm32")]
pub async fn fetch_credential_status() -> Result<CredentialStatus, String> {
    use gloo_net::http::Request;

    let response = Request::get("/api/credentials/status")
        .send()
        .await
        .map_err(|e| format!("Network request failed: {}", e))?;

    if !response.ok() {
        return Err(format!("Server error: {}", response.status()));
    }

    response
        .json::<CredentialStatus>()
        .await
        .map_err(|e| format!("Invalid credential status: {}", e))
}

/// Server-side stub
#[cfg(not(target_arch = "wasm32"))]
pub async fn fetch_credential_status() -> Result<CredentialStatus, String> {
    Err("Credential status is fetched by the browser".to_string())
}
