pub mod ad_editor;
pub mod button;
pub mod card;
pub mod common;
pub mod credentials_panel;
pub mod image_upload;

pub use ad_editor::{AdEditor, HostedImageView, ModelOutputs};
pub use button::{Button, ButtonVariant};
pub use card::Card;
pub use common::{ErrorMessage, LoadingText, StepError};
pub use credentials_panel::CredentialsPanel;
pub use image_upload::AdImageUpload;
