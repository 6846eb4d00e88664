//! Vello-based renderer implementation.

use crate::renderer::{FrameStats, RenderContext, Renderer, Watermark};
use kurbo::{Affine, Cap, Join, Rect, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Brush, Fill};
use vello::Scene;

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Font context for the watermark (system fonts, discovered once).
    font_cx: FontContext,
    /// Layout context for the watermark.
    layout_cx: LayoutContext<Brush>,
    /// Stats of the last built frame.
    stats: FrameStats,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            stats: FrameStats::default(),
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// What the last call to `build_scene` drew.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Cover the whole backing surface with the background color.
    fn render_background(&mut self, ctx: &RenderContext) {
        let (width, height) = ctx.backing_size();
        let rect = Rect::new(0.0, 0.0, width as f64, height as f64);
        self.scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            ctx.options.background,
            None,
            &rect,
        );
    }

    /// Draw the watermark centered on the canvas. Returns whether any glyphs
    /// were drawn; a missing font simply leaves the background bare.
    fn render_watermark(&mut self, watermark: &Watermark, ctx: &RenderContext) -> bool {
        if watermark.text.trim().is_empty() || watermark.opacity <= 0.0 {
            return false;
        }

        let brush = Brush::Solid(watermark.color.multiply_alpha(watermark.opacity));

        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, &watermark.text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(watermark.font_size));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontWeight(parley::FontWeight::new(watermark.weight)));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Source(
            watermark.font_stack.as_str().into(),
        )));
        let mut layout = builder.build(&watermark.text);

        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        let extent = ctx.extent();
        let origin = (
            (extent.width - layout.width() as f64) / 2.0,
            (extent.height - layout.height() as f64) / 2.0,
        );
        let text_transform = ctx.surface_transform() * Affine::translate(origin);

        let mut glyph_count = 0;
        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let font_size = run.font_size();
                let glyph_xform = run
                    .synthesis()
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if glyphs.is_empty() {
                    continue;
                }
                glyph_count += glyphs.len();

                self.scene
                    .draw_glyphs(font)
                    .brush(&brush)
                    .hint(true)
                    .transform(text_transform)
                    .glyph_transform(glyph_xform)
                    .font_size(font_size)
                    .normalized_coords(run.normalized_coords())
                    .draw(Fill::NonZero, glyphs.into_iter());
            }
        }

        if glyph_count == 0 {
            log::debug!("No font found for watermark {:?}", watermark.font_stack);
        }
        glyph_count > 0
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        // Clear the scene
        self.scene.reset();
        self.stats = FrameStats::default();

        if ctx.viewport.is_empty() {
            return;
        }

        self.render_background(ctx);

        if let Some(watermark) = &ctx.options.watermark {
            self.stats.watermark_drawn = self.render_watermark(watermark, ctx);
        }

        let transform = ctx.surface_transform();
        let style = Stroke::new(ctx.options.stroke_width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);

        for stroke in ctx.strokes.iter() {
            if !stroke.is_renderable() {
                self.stats.strokes_skipped += 1;
                continue;
            }
            self.scene.stroke(
                &style,
                transform,
                ctx.options.stroke_color,
                None,
                &stroke.to_path(),
            );
            self.stats.strokes_drawn += 1;
        }
    }
}
