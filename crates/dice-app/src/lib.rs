//! DICE Canvas Application
//!
//! Native window shell hosting one canvas: the public wall or a school's
//! annotation board.

mod app;
mod config;
mod event_handler;

pub use app::{App, AppError, CanvasSession};
pub use config::{AppConfig, CONFIG_ENV, CanvasSelection, SessionConfig};
