//! The single page: upload, progress, model outputs, editor and preview

use dioxus::prelude::*;

use crate::app::components::{
    AdEditor, AdImageUpload, Card, HostedImageView, LoadingText, ModelOutputs, StepError,
};
use crate::app::layouts::app_layout::APP_TITLE;
use crate::shared::hooks::use_ad_workflow;

#[component]
pub fn AdGenerator() -> Element {
    let workflow = use_ad_workflow();
    let session = workflow.session.read().clone();

    let progress = if session.is_busy() {
        session.stage.progress_label()
    } else {
        None
    };

    rsx! {
        div { class: "c-page",
            h1 { class: "c-page__title", "{APP_TITLE}" }

            Card { AdImageUpload { workflow: workflow } }

            if let Some(image) = session.hosted.clone() {
                Card {
                    HostedImageView { image: image, caption: "Uploaded Image.".to_string() }
                }
            }

            if session.image_type.is_some() || session.description.is_some() {
                Card {
                    ModelOutputs {
                        image_type: session.image_type.clone(),
                        description: session.description.clone(),
                    }
                }
            }

            if let Some(label) = progress {
                LoadingText { message: label.to_string() }
            }

            if let Some(failure) = session.failure.clone() {
                StepError { failure: failure }
            }

            if session.draft.is_some() {
                Card { highlight: true, AdEditor { workflow: workflow } }
            }
        }
    }
}
