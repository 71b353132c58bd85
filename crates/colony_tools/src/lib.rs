//! # Colony Development Tools
//!
//! Command-line tooling around the simulation core:
//! - Specification data validation
//! - Scenario files describing a map, players and colonies
//! - Headless turn runner with text or JSON output
//!
//! All file IO lives here; `colony_core` never touches the filesystem.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod scenario;
pub mod simulate;
pub mod validate;
