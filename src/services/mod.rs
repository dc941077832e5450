//! Media pipeline and catalog services.

pub mod catalog;
pub mod embed;
pub mod intake;
pub mod range;
pub mod resolver;
pub mod storage;
pub mod streamer;
pub mod transcoder;

pub use intake::{IntakeLimits, MediaIntake};
pub use storage::MediaStorage;
pub use transcoder::{TranscodeQueue, TranscodeWorker};
