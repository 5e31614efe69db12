//! Text record I/O around the simulation core
//!
//! - `loader`: asteroid records (`id x y vx vy radius` per line)
//! - `writer`: collision records (`time id_low id_high` per line) and
//!   generated asteroid fields
//!
//! The core never touches files; these collaborators hand it bodies and take
//! back the finalized log.

pub mod loader;
pub mod writer;

pub use loader::{LoadError, LoadReport, SkipReason, SkippedRecord, load_asteroids, parse_asteroids};
pub use writer::{
    WriteError, format_event, save_asteroids, save_collisions, write_asteroids, write_collisions,
};
