//! Core library of the pixel garden: procedural balloon plants, their
//! bottom-up reveal, and the session flow around them.
//!
//! Main components:
//! - [`policy`] - per-cycle grow / split / flower decisions.
//! - [`engine`] - cycle-based lineage growth that builds a plant structure.
//! - [`generator`] - one-call plant generation from a seed position.
//! - [`reveal`] - ordered, timed reveal of a generated plant.
//! - [`flow`] - splash, transition, main and ending states.
//! - [`tasks`] - frame-polled tasks behind completion handles.
//! - [`garden`] - the session aggregate driven once per frame.
//! - [`script`] - sequential scripts of garden operations.
//! - [`config`] - tunables and layered loading.
//! - [`types`] - shared enums and ID aliases.

pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod garden;
pub mod generator;
pub mod lineage;
pub mod plant;
pub mod policy;
pub mod reveal;
pub mod scene;
pub mod script;
pub mod tasks;
pub mod types;

pub use config::GardenConfig;
pub use error::GardenError;
pub use flow::AppState;
pub use garden::{ClickOutcome, GardenState, Rejection};
pub use script::{Script, ScriptCommand, ScriptStatus};
