pub mod config;
pub mod editor;
pub mod error;
pub mod graph;
pub mod math;
pub mod persistence;
pub mod sampling;

pub use error::{Result, TrackError};
