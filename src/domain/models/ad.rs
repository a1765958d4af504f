use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image::HostedImage;

/// Instruction sent to the classifier model with the hosted image URL
pub const CLASSIFIER_PROMPT: &str =
    "As a professional Advertisement Analyst describe this image in a few words.";

/// Prompt for the description model, with the classifier output substituted in
pub fn description_prompt(image_type: &str) -> String {
    format!(
        "Generate a captivating and informative ad description for promoting the {} shown in the image, highlighting its unique features and appealing to potential customers.",
        image_type
    )
}

/// Text the ad editor starts from
pub fn default_ad_text(image_type: &str, description: &str) -> String {
    format!("Discover the perfect {}! {}", image_type.to_lowercase(), description)
}

/// User-editable ad copy built from both model outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdDraft {
    pub image_type: String,
    pub description: String,
    pub editable_text: String,
}

impl AdDraft {
    pub fn new(image_type: impl Into<String>, description: impl Into<String>) -> Self {
        let image_type = image_type.into();
        let description = description.into();
        let editable_text = default_ad_text(&image_type, &description);
        Self {
            image_type,
            description,
            editable_text,
        }
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRun {
    pub run_id: String,
    pub image: HostedImage,
    pub draft: AdDraft,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ad_text() {
        let text = default_ad_text(
            "Sports Car",
            "A sleek red sports car with aerodynamic curves.",
        );
        assert_eq!(
            text,
            "Discover the perfect sports car! A sleek red sports car with aerodynamic curves."
        );
    }

    #[test]
    fn test_description_is_kept_literally() {
        let text = default_ad_text("SNEAKER", "  Bold. LOUD.  ");
        assert_eq!(text, "Discover the perfect sneaker!   Bold. LOUD.  ");
    }

    #[test]
    fn test_description_prompt() {
        assert_eq!(
            description_prompt("leather handbag"),
            "Generate a captivating and informative ad description for promoting the leather handbag shown in the image, highlighting its unique features and appealing to potential customers."
        );
    }

    #[test]
    fn test_draft_starts_from_template() {
        let draft = AdDraft::new("Coffee Mug", "Keeps it hot.");
        assert_eq!(draft.image_type, "Coffee Mug");
        assert_eq!(draft.editable_text, "Discover the perfect coffee mug! Keeps it hot.");
    }
}
