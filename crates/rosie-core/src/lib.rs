//! Core types shared by every Rosie crate.

pub mod dataset;
pub mod frame;
pub mod module;
pub mod schema;
pub mod settings;
pub mod tax_id;
pub mod text;
pub mod verdict;

pub use dataset::Dataset;
pub use frame::FrameError;
pub use module::Module;
pub use schema::columns;
pub use settings::{Settings, SettingsError};
pub use verdict::Verdict;
