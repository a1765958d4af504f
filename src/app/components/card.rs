use dioxus::prelude::*;

/// Titled section of the page (BEM: c-card)
#[component]
pub fn Card(
    title: Option<String>,
    #[props(default)] highlight: bool,
    children: Element,
) -> Element {
    let highlight_class = if highlight { "c-card--highlight" } else { "" };

    rsx! {
        section { class: "c-card {highlight_class}",
            if let Some(title) = title {
                header { class: "c-card__header",
                    h2 { class: "c-card__title", "{title}" }
                }
            }
            div { class: "c-card__body", {children} }
        }
    }
}
