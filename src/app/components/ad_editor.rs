//! Results of a run: hosted image, model outputs, editable ad text, preview

use dioxus::prelude::*;

use crate::app::components::Button;
use crate::domain::models::{HostedImage, WorkflowStage};
use crate::shared::hooks::AdWorkflowState;

/// Hosted image, as soon as the upload step finishes
#[component]
pub fn HostedImageView(image: HostedImage, #[props(default)] caption: Option<String>) -> Element {
    rsx! {
        figure { class: "c-ad-image",
            img { class: "c-ad-image__img", src: "{image.public_url}", alt: "Uploaded Image." }
            if let Some(caption) = caption {
                figcaption { class: "c-ad-image__caption", "{caption}" }
            }
        }
    }
}

/// Classifier and generator outputs as they arrive
#[component]
pub fn ModelOutputs(
    #[props(!optional)] image_type: Option<String>,
    #[props(!optional)] description: Option<String>,
) -> Element {
    rsx! {
        div { class: "c-outputs",
            if let Some(image_type) = image_type {
                p { class: "c-outputs__line",
                    strong { "Image Type: " }
                    "{image_type}"
                }
            }
            if let Some(description) = description {
                p { class: "c-outputs__line",
                    strong { "Description: " }
                    "{description}"
                }
            }
        }
    }
}

/// Editable ad text plus the preview it produces
#[component]
pub fn AdEditor(workflow: AdWorkflowState) -> Element {
    let mut workflow = workflow;
    let session = workflow.session.read();
    let Some(draft) = session.draft.as_ref() else {
        return rsx! {};
    };

    let text = draft.editable_text.clone();
    let previewing = session.stage == WorkflowStage::Previewing;
    let preview_text = session.preview_text.clone();
    let hosted = session.hosted.clone();
    drop(session);

    rsx! {
        div { class: "c-editor",
            label { class: "c-editor__label", r#for: "ad-text", "Customize the ad text:" }
            textarea {
                class: "c-editor__textarea",
                id: "ad-text",
                rows: "6",
                value: "{text}",
                oninput: move |evt| workflow.edit_text(evt.value()),
            }
            Button { onclick: move |_| workflow.preview(), "Preview Ad" }
        }

        if previewing {
            if let Some(preview_text) = preview_text {
                section { class: "c-preview",
                    h2 { class: "c-preview__title", "Ad Preview:" }
                    p { class: "c-preview__text", "{preview_text}" }
                    if let Some(image) = hosted {
                        HostedImageView { image: image }
                    }
                }
            }
        }
    }
}
