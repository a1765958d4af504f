use dioxus::prelude::*;
use dioxus::document;

use crate::app::components::CredentialsPanel;
use crate::app::pages::Route;

pub const APP_TITLE: &str = "Automated Social Media Ad Generator";

/// Page shell: credentials side panel on the left, routed content on the right
#[component]
pub fn Layout() -> Element {
    // Produced by build.rs from assets/css
    const BUNDLE_CSS: Asset = asset!("/assets/dist/bundle.css");

    rsx! {
        document::Title { "{APP_TITLE}" }
        document::Link { rel: "stylesheet", href: BUNDLE_CSS }
        div { class: "c-layout",
            nav { class: "c-navbar",
                span { class: "c-navbar__logo", "📣 Ad Generator" }
            }
            div { class: "c-layout__body",
                CredentialsPanel {}
                main { class: "c-layout__main",
                    Outlet::<Route> {}
                }
            }
        }
    }
}
