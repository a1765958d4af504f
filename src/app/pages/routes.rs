use dioxus::prelude::*;

use crate::app::layouts::Layout;
use crate::app::pages::AdGenerator;
use crate::shared::hooks::use_credentials;

#[derive(Clone, Routable, Debug, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
    #[route("/")]
    AdGenerator {},
}

#[component]
pub fn App() -> Element {
    // Session credentials are shared by the side panel and the upload control
    let credentials = use_credentials();
    use_context_provider(|| credentials);

    use_effect(|| {
        tracing::info!("Ad generator app initialized");
    });

    rsx! {
        Router::<Route> {}
    }
}
