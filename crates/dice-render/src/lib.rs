//! DICE Render Library
//!
//! Renderer abstraction for DICE canvases.
//! The default implementation uses Vello for GPU-accelerated rendering.

mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{
    FrameStats, RenderContext, RenderOptions, RenderResult, Renderer, RendererError, Watermark,
    parse_color,
};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
