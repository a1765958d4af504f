// Domain layer
// Models are shared with the browser; services run on the server only

pub mod models;
pub mod services;
