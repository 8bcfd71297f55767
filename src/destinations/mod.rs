//! Destination implementations

pub mod capture;
pub mod console;
pub mod file;
pub mod rotating_file;

pub use capture::CaptureDestination;
pub use console::{ColorMode, ConsoleDestination, ConsoleTarget};
pub use file::FileDestination;
pub use rotating_file::{RotatingFileDestination, RotationPolicy, RotationStrategy};

pub use crate::core::Destination;
