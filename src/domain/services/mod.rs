// Business logic services
// Server-only: they touch the filesystem and call remote APIs

#[cfg(not(target_arch = "wasm32"))]
pub mod sse;
#[cfg(not(target_arch = "wasm32"))]
pub mod intake;
#[cfg(not(target_arch = "wasm32"))]
pub mod imgur;
#[cfg(not(target_arch = "wasm32"))]
pub mod replicate;
#[cfg(not(target_arch = "wasm32"))]
pub mod classifier;
#[cfg(not(target_arch = "wasm32"))]
pub mod copywriter;
#[cfg(not(target_arch = "wasm32"))]
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(not(target_arch = "wasm32"))]
pub use imgur::{ImageHost, ImgurClient};
#[cfg(not(target_arch = "wasm32"))]
pub use intake::{TempImage, validate_upload};
#[cfg(not(target_arch = "wasm32"))]
pub use pipeline::{AdPipeline, ProgressSink, RunFailure};
#[cfg(not(target_arch = "wasm32"))]
pub use replicate::{FragmentStream, ModelRef, ReplicateClient, VisionModel};
