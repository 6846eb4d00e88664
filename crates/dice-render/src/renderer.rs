//! Renderer trait abstraction.

use dice_core::config::{StyleConfig, WatermarkConfig};
use dice_core::controller::CanvasController;
use dice_core::stroke::StrokeSet;
use dice_core::viewport::{CoordinateSpace, Viewport};
use kurbo::{Affine, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Parse a hex color, `#rrggbb` or `#rrggbbaa`.
pub fn parse_color(s: &str) -> Option<Color> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        6 => Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

fn color_from_config(s: &str) -> RenderResult<Color> {
    parse_color(s).ok_or_else(|| RendererError::InvalidColor(s.to_string()))
}

/// Large faint text drawn behind the strokes.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub color: Color,
    /// Multiplied into the color's alpha.
    pub opacity: f32,
    /// Font size in canvas units.
    pub font_size: f32,
    /// CSS-style font family list, e.g. `"Helvetica, Arial, sans-serif"`.
    pub font_stack: String,
    pub weight: f32,
}

impl Watermark {
    pub fn from_config(config: &WatermarkConfig) -> RenderResult<Self> {
        Ok(Self {
            text: config.text.clone(),
            color: color_from_config(&config.color)?,
            opacity: config.opacity.clamp(0.0, 1.0),
            font_size: config.font_size,
            font_stack: config.font_family.clone(),
            weight: config.font_weight,
        })
    }
}

/// Fixed styling applied to a whole frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub background: Color,
    pub stroke_color: Color,
    /// Line width in canvas units. Caps and joins are round.
    pub stroke_width: f64,
    pub watermark: Option<Watermark>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: Color::from_rgba8(0x0b, 0x0b, 0x0c, 255),
            stroke_color: Color::from_rgba8(0xff, 0x6a, 0x00, 255),
            stroke_width: 2.0,
            watermark: None,
        }
    }
}

impl RenderOptions {
    /// Resolve configured colors. Fails on a color that is not valid hex.
    pub fn from_style(style: &StyleConfig) -> RenderResult<Self> {
        let watermark = style
            .watermark
            .as_ref()
            .map(Watermark::from_config)
            .transpose()?;

        Ok(Self {
            background: color_from_config(&style.background)?,
            stroke_color: color_from_config(&style.stroke_color)?,
            stroke_width: style.stroke_width,
            watermark,
        })
    }

    pub fn with_watermark(mut self, watermark: Option<Watermark>) -> Self {
        self.watermark = watermark;
        self
    }
}

/// What the last frame contained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub strokes_drawn: usize,
    /// Strokes with fewer than two points.
    pub strokes_skipped: usize,
    pub watermark_drawn: bool,
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The strokes to draw, in canvas units.
    pub strokes: &'a StrokeSet,
    /// Surface size and device pixel ratio.
    pub viewport: Viewport,
    /// How canvas units map onto the viewport.
    pub space: CoordinateSpace,
    pub options: &'a RenderOptions,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context. Canvas units default to CSS pixels.
    pub fn new(strokes: &'a StrokeSet, viewport: Viewport, options: &'a RenderOptions) -> Self {
        Self {
            strokes,
            viewport,
            space: CoordinateSpace::Viewport,
            options,
        }
    }

    /// Context for the current state of a canvas.
    pub fn for_canvas(canvas: &'a CanvasController, options: &'a RenderOptions) -> Self {
        Self::new(canvas.strokes(), *canvas.viewport(), options)
            .with_coordinate_space(canvas.coordinate_space())
    }

    /// Set the coordinate space strokes are stored in.
    pub fn with_coordinate_space(mut self, space: CoordinateSpace) -> Self {
        self.space = space;
        self
    }

    /// Canvas units to device pixels.
    pub fn surface_transform(&self) -> Affine {
        self.space.surface_transform(&self.viewport)
    }

    /// Backing resolution in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        self.viewport.backing_size()
    }

    /// Drawable area in canvas units.
    pub fn extent(&self) -> Size {
        self.space.extent(&self.viewport)
    }
}

/// Trait for rendering backends.
///
/// Rendering is a pure function of the context: every call clears and
/// redraws the whole frame.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.options.background
    }
}
