//! cm-modkit - Combat Master mod toolkit
//!
//! Copies mod files into the game's bundle folder (optionally backing it up
//! first) and installs the recommended asset tools.

pub mod backup;
pub mod config;
pub mod copier;
pub mod error;
pub mod game_finder;
pub mod paths;
pub mod prompt;
pub mod session;
pub mod settings;
pub mod tools;

pub use error::{Error, Result};
