//! Viewport and coordinate-space transforms.
//!
//! Three coordinate systems meet at a canvas:
//!
//! - **device pixels**: the backing buffer, `viewport * scale_factor`;
//! - **CSS pixels**: where the host reports pointer positions;
//! - **canvas units**: where strokes live. For the wall this is the same as
//!   CSS pixels; the school canvas uses a fixed logical resolution stretched
//!   over the viewport.
//!
//! The scale factor is carried explicitly so capture and rendering agree on
//! the mapping without sharing any surface state.

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

/// Visible area of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Size in CSS pixels.
    pub size: Size,
    /// Device pixel ratio.
    pub scale_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            size: Size::ZERO,
            scale_factor: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport. Non-finite or non-positive scale factors fall back to 1.
    pub fn new(size: Size, scale_factor: f64) -> Self {
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self { size, scale_factor }
    }

    /// Build from a physical size as reported by the windowing system.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let viewport = Self::new(Size::ZERO, scale_factor);
        Self {
            size: Size::new(
                width as f64 / viewport.scale_factor,
                height as f64 / viewport.scale_factor,
            ),
            ..viewport
        }
    }

    /// Backing buffer resolution in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.size.width * self.scale_factor).floor().max(0.0) as u32,
            (self.size.height * self.scale_factor).floor().max(0.0) as u32,
        )
    }

    /// Whether there is anything to draw into.
    pub fn is_empty(&self) -> bool {
        let (w, h) = self.backing_size();
        w == 0 || h == 0
    }

    /// Convert a physical (device pixel) position to CSS pixels.
    pub fn physical_to_css(&self, physical: Point) -> Point {
        Point::new(physical.x / self.scale_factor, physical.y / self.scale_factor)
    }
}

/// The unit system strokes are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CoordinateSpace {
    /// Canvas units are CSS pixels.
    #[default]
    Viewport,
    /// A fixed logical resolution stretched over the viewport.
    Logical { width: f64, height: f64 },
}

impl CoordinateSpace {
    /// Size of the drawable area in canvas units.
    pub fn extent(&self, viewport: &Viewport) -> Size {
        match *self {
            CoordinateSpace::Viewport => viewport.size,
            CoordinateSpace::Logical { width, height } => Size::new(width, height),
        }
    }

    /// Canvas units to CSS pixels.
    pub fn to_css(&self, viewport: &Viewport) -> Affine {
        match *self {
            CoordinateSpace::Viewport => Affine::IDENTITY,
            CoordinateSpace::Logical { width, height } => {
                if width <= 0.0 || height <= 0.0 {
                    return Affine::IDENTITY;
                }
                Affine::scale_non_uniform(viewport.size.width / width, viewport.size.height / height)
            }
        }
    }

    /// Canvas units to device pixels: the single compensating transform the
    /// renderer applies to every draw call.
    pub fn surface_transform(&self, viewport: &Viewport) -> Affine {
        Affine::scale(viewport.scale_factor) * self.to_css(viewport)
    }

    /// Map a CSS-pixel position (relative to the canvas origin) into canvas units.
    pub fn css_to_canvas(&self, viewport: &Viewport, css: Point) -> Point {
        match *self {
            CoordinateSpace::Viewport => css,
            CoordinateSpace::Logical { width, height } => {
                if viewport.size.width <= 0.0 || viewport.size.height <= 0.0 {
                    return css;
                }
                Point::new(
                    css.x / viewport.size.width * width,
                    css.y / viewport.size.height * height,
                )
            }
        }
    }
}
