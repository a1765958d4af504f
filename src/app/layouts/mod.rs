pub mod app_layout;

pub use app_layout::Layout;
