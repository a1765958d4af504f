// Custom Dioxus hooks
pub mod use_ad_workflow;
pub mod use_credentials;

pub use use_ad_workflow::{
    AdWorkflowState, UPLOAD_INPUT_ID, fetch_upload_limits, rejection_kind, start_upload,
    use_ad_workflow,
};
pub use use_credentials::{CredentialsState, fetch_credential_status, use_credentials};
