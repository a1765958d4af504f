//! Upload control for the ad workflow

use dioxus::prelude::*;

use crate::domain::models::UPLOAD_ACCEPT;
use crate::shared::hooks::{AdWorkflowState, CredentialsState, UPLOAD_INPUT_ID, start_upload};

/// File picker restricted to jpg/png/jpeg; choosing a file starts a new run
#[component]
pub fn AdImageUpload(workflow: AdWorkflowState) -> Element {
    let credentials = use_context::<CredentialsState>();
    let busy = workflow.is_busy();
    let filename = workflow.session.read().filename.clone();
    let hint = workflow.limits.read().hint();

    rsx! {
        div { class: "c-upload",
            label { class: "c-upload__label", r#for: UPLOAD_INPUT_ID, "Upload an image:" }
            input {
                class: "c-upload__input",
                id: UPLOAD_INPUT_ID,
                r#type: "file",
                accept: UPLOAD_ACCEPT,
                onchange: move |_| {
                    let overrides = credentials.overrides.read().clone();
                    start_upload(overrides, workflow);
                },
            }
            p { class: "c-upload__hint", "{hint}" }
            if let Some(name) = filename {
                p {
                    class: if busy { "c-upload__file c-upload__file--busy" } else { "c-upload__file" },
                    "{name}"
                }
            }
        }
    }
}
