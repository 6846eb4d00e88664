//! DICE Canvas Core Library
//!
//! Platform-agnostic stroke capture, expiry, access control and persistence
//! for the DICE community board's freehand canvases.

pub mod access;
pub mod capture;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod expiry;
pub mod input;
pub mod storage;
pub mod stroke;
pub mod viewport;

pub use access::{Actor, Membership, SchoolId, UserId, WriteAccess, can_write, resolve_membership};
pub use capture::{CaptureEngine, CaptureState};
pub use config::{CanvasConfig, SchoolConfig, StyleConfig, WallConfig, WatermarkConfig};
pub use controller::{CanvasController, CanvasMode, CanvasStatus, LoadRequest, SaveRequest, Ticket};
pub use document::StrokeDocument;
pub use error::CanvasError;
pub use expiry::ExpiryScheduler;
pub use input::{PointerButton, PointerEvent};
pub use storage::{LoadOutcome, MemoryStorage, PersistenceAdapter, Storage, StorageError, StorageResult};
pub use stroke::{Stroke, StrokeId, StrokeSet, Timestamp};
pub use viewport::{CoordinateSpace, Viewport};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
