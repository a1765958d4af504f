/// Ad generation, credential status and upload limit endpoints
pub mod ads;

pub use ads::{
    AdsState, ApiError, ads_routes, create_ad_handler, credential_status_handler,
    upload_limits_handler,
};
