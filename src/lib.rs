#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod buffer;
mod engine;
mod error;
mod handle;
mod reader;
mod scheduler;
mod window;

// public, flat re-exports
pub use error::Error;

pub use buffer::SampleBuffer;
pub use engine::{event::ScheduledEvent, EngineOptions, GrainEngine};
pub use handle::GrainEngineHandle;
pub use message::{EngineEvent, EngineMessage};
pub use reader::{read_cubic, read_frame, read_linear, read_sample, InterpolationMode};
pub use scheduler::GrainScheduler;
pub use settings::{
    apply_anti_mud_rules, clamp_to_mode, commit, get_ranges, GranularSettings, OperatingMode,
};
pub use window::GrainWindowMode;

// public mods
pub mod message;
pub mod settings;
pub mod utils;

pub mod windows {
    //! Grain window functions, evaluated over a 0.0..=1.0 phase.

    pub use super::window::{blackman, gaussian, hann, rectangular, GAUSSIAN_SIGMA};
}
