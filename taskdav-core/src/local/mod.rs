//! The local side: Taskwarrior.

mod task;
mod taskwarrior;

pub use task::{LocalTask, parse_export};
pub use taskwarrior::Taskwarrior;
