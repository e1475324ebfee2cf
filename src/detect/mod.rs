mod assets;
mod backend;
pub mod backends;
mod result;

pub use assets::{ClassNames, LoadedAssets, ModelAssets, NetworkConfig};
pub use backend::{DetectorBackend, Strategy};
pub use backends::{MotionBackend, MotionConfig, ModelBackend, ModelConfig, ObjectNetwork, RawDetection};
pub use result::{BoundingRect, Detection, DetectionResult};
