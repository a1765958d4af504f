//! "API Key Configuration" side panel
//!
//! Values typed here stay in the tab's signal and are attached to each run.
//! The server's own environment credentials are shown as presence flags only.

use dioxus::prelude::*;

use crate::app::components::{Button, ButtonVariant};
use crate::domain::models::credentials::{
    HOSTING_CLIENT_ID_LABEL, HOSTING_CLIENT_SECRET_LABEL, INFERENCE_TOKEN_LABEL,
};
use crate::shared::hooks::CredentialsState;

#[component]
pub fn CredentialsPanel() -> Element {
    let mut credentials = use_context::<CredentialsState>();

    let mut replicate_token = use_signal(String::new);
    let mut imgur_client_id = use_signal(String::new);
    let mut imgur_client_secret = use_signal(String::new);
    let mut saved = use_signal(|| false);

    let session = credentials.overrides.read().status();
    let server = credentials.server_status.read().as_ref().copied();
    let effective = credentials.effective_status();

    let submit = move |_: MouseEvent| {
        credentials.submit(
            &replicate_token.read(),
            &imgur_client_id.read(),
            &imgur_client_secret.read(),
        );
        saved.set(true);
    };

    rsx! {
        aside { class: "c-credentials",
            h2 { class: "c-credentials__title", "API Key Configuration" }

            CredentialInput {
                label: format!("Enter {}:", INFERENCE_TOKEN_LABEL),
                id: "replicate-token",
                secret: true,
                value: replicate_token(),
                on_change: move |v| { replicate_token.set(v); saved.set(false); },
            }
            CredentialSource {
                in_session: session.inference_token,
                on_server: server.map(|s| s.inference_token),
            }

            CredentialInput {
                label: format!("Enter {}:", HOSTING_CLIENT_ID_LABEL),
                id: "imgur-client-id",
                secret: false,
                value: imgur_client_id(),
                on_change: move |v| { imgur_client_id.set(v); saved.set(false); },
            }
            CredentialSource {
                in_session: session.hosting_client_id,
                on_server: server.map(|s| s.hosting_client_id),
            }

            CredentialInput {
                label: format!("Enter {}:", HOSTING_CLIENT_SECRET_LABEL),
                id: "imgur-client-secret",
                secret: true,
                value: imgur_client_secret(),
                on_change: move |v| { imgur_client_secret.set(v); saved.set(false); },
            }
            CredentialSource {
                in_session: session.hosting_client_secret,
                on_server: server.map(|s| s.hosting_client_secret),
            }

            Button { variant: ButtonVariant::Secondary, onclick: submit, "Submit" }

            if saved() {
                p { class: "c-credentials__note", "Saved for this browser tab." }
            }
            if !effective.is_complete() {
                p { class: "c-credentials__note c-credentials__note--warning",
                    "Some credentials are missing; runs will fail until they are provided."
                }
            }
        }
    }
}

#[component]
fn CredentialInput(
    label: String,
    id: String,
    secret: bool,
    value: String,
    on_change: EventHandler<String>,
) -> Element {
    rsx! {
        label { class: "c-credentials__label", r#for: "{id}", "{label}" }
        input {
            class: "c-credentials__input",
            id: "{id}",
            r#type: if secret { "password" } else { "text" },
            autocomplete: "off",
            value: "{value}",
            oninput: move |evt| on_change.call(evt.value()),
        }
    }
}

/// Where the value for one credential will come from
#[component]
fn CredentialSource(in_session: bool, on_server: Option<bool>) -> Element {
    let (class, text) = match (in_session, on_server) {
        (true, _) => ("c-credentials__source--session", "Using the value submitted in this tab"),
        (false, Some(true)) => ("c-credentials__source--server", "Provided by the server"),
        (false, Some(false)) => ("c-credentials__source--missing", "Not configured"),
        (false, None) => ("c-credentials__source--unknown", "Checking server configuration..."),
    };

    rsx! {
        p { class: "c-credentials__source {class}", "{text}" }
    }
}
