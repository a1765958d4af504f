// Utility functions
// Stream draining, NDJSON framing

pub mod fragments;
pub mod ndjson;

pub use fragments::drain_fragments;
pub use ndjson::NdjsonBuffer;
