pub mod model;
pub mod motion;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use model::{non_max_suppression, ModelBackend, ModelConfig, ObjectNetwork, RawDetection};
pub use motion::{MotionBackend, MotionConfig};
pub use stub::ScriptedNetwork;

#[cfg(feature = "backend-tract")]
pub use tract::TractNetwork;
