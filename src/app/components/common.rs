use dioxus::prelude::*;

use crate::domain::models::StepFailure;

// Spinner with a progress label (BEM: c-loading)
#[component]
pub fn LoadingText(message: String) -> Element {
    rsx! {
        div { class: "c-loading",
            div { class: "c-loading__spinner" }
            p { class: "c-loading__text", "{message}" }
        }
    }
}

// Inline error (BEM: c-error)
#[component]
pub fn ErrorMessage(message: String, #[props(default)] title: Option<String>) -> Element {
    rsx! {
        div { class: "c-error", role: "alert",
            span { class: "c-error__icon", "❌" }
            div {
                if let Some(title) = title {
                    p { class: "c-error__title", "{title}" }
                }
                p { class: "c-error__text", "{message}" }
            }
        }
    }
}

/// Error shown in place of the step that failed
#[component]
pub fn StepError(failure: StepFailure) -> Element {
    let title = match failure.kind {
        crate::shared::errors::ErrorKind::Validation => "Invalid image",
        crate::shared::errors::ErrorKind::Credentials => "API key problem",
        crate::shared::errors::ErrorKind::Remote => "Service error",
    };
    let step = match failure.stage.progress_label() {
        Some(label) => format!("{} ({})", title, label.trim_end_matches("...").to_lowercase()),
        None => title.to_string(),
    };

    rsx! {
        ErrorMessage { title: step, message: failure.message.clone() }
    }
}
