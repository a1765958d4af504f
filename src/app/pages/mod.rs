pub mod ad_generator;
pub mod routes;

pub use ad_generator::AdGenerator;
pub use routes::{App, Route};
