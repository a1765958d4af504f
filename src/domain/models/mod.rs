// Domain models (business entities)
// Pure Rust, no framework dependencies

pub mod ad;
pub mod credentials;
pub mod image;
pub mod session;
pub mod workflow;

pub use ad::{AdDraft, AdRun, CLASSIFIER_PROMPT, default_ad_text, description_prompt};
pub use credentials::{CredentialLayer, CredentialStatus, Credentials, HostingCredentials};
pub use self::image::*;
pub use session::{AdSession, StepFailure};
pub use workflow::{WorkflowEvent, WorkflowStage};
