pub mod progress;
pub mod queue;

pub use progress::PreloadProgress;
pub use queue::{DecodePurpose, DecodeQueue, DecodeRequest, DecodedPhoto};
