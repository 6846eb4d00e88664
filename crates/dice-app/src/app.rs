//! Core application state and lifecycle.

use crate::config::AppConfig;
use crate::event_handler::{is_save_shortcut, mouse_event, touch_event};
use dice_core::access::{Actor, MemoryDirectory, Membership, StaticIdentity, resolve_membership};
use dice_core::config::ConfigError;
use dice_core::controller::{CanvasController, CanvasMode};
use dice_core::input::PointerEvent;
use dice_core::storage::{FileStorage, PersistenceAdapter, StorageError};
use dice_core::stroke::Timestamp;
use dice_core::viewport::Viewport;
use dice_render::{
    RenderContext, RenderOptions, RenderResult, Renderer, RendererError, VelloRenderer,
};
use kurbo::Point;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowId};

/// Errors that stop the application from starting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Resolve the configured viewer's membership through the access services.
fn resolve_session(config: &AppConfig) -> Option<Membership> {
    let session = config.session;
    let actor = session.user_id.map(Actor::user).unwrap_or_default();

    let directory = MemoryDirectory::new();
    if let (Some(user), Some(school)) = (session.user_id, session.school_id) {
        if let Err(e) = directory.enroll(user, school) {
            log::warn!("{}", e);
        }
    }

    pollster::block_on(resolve_membership(&StaticIdentity::new(actor), &directory))
}

/// The mounted canvas plus everything it needs outside the GPU.
pub struct CanvasSession {
    canvas: CanvasController,
    options: RenderOptions,
    adapter: Option<PersistenceAdapter<FileStorage>>,
}

impl CanvasSession {
    /// Build and mount the configured canvas, loading it if it is persistent.
    pub fn open(config: &AppConfig) -> Result<Self, AppError> {
        let mode = config.canvas.mode();
        let options = RenderOptions::from_style(config.style())?;

        let adapter = match mode {
            CanvasMode::Ephemeral => None,
            CanvasMode::Persistent { .. } => {
                let storage = match &config.storage_dir {
                    Some(dir) => FileStorage::new(dir.clone())?,
                    None => FileStorage::default_location()?,
                };
                log::info!("Storing canvases in {}", storage.base_path().display());
                Some(PersistenceAdapter::new(Arc::new(storage)))
            }
        };

        let mut canvas = CanvasController::new(mode, &config.canvases);
        let membership = resolve_session(config);
        let now = Timestamp::now();
        match &adapter {
            Some(adapter) => pollster::block_on(canvas.mount_with(adapter, membership, now)),
            None => {
                canvas.mount(membership, now);
            }
        }

        Ok(Self {
            canvas,
            options,
            adapter,
        })
    }

    pub fn canvas(&self) -> &CanvasController {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut CanvasController {
        &mut self.canvas
    }

    /// Save on explicit request. The outcome lands in the canvas status.
    pub fn save(&mut self) {
        let now = Timestamp::now();
        let result = match &self.adapter {
            Some(adapter) => pollster::block_on(self.canvas.save_with(adapter, now)),
            None => self.canvas.request_save().map(|_| ()),
        };
        if result.is_ok() {
            log::info!("Canvas saved");
        }
    }

    /// Window title reflecting the canvas, write access and latest status.
    pub fn title(&self, base: &str) -> String {
        let mut title = match self.canvas.mode() {
            CanvasMode::Ephemeral => format!("{} - Wall", base),
            CanvasMode::Persistent { school_id } => format!("{} - School {}", base, school_id),
        };
        if !self.canvas.can_write() {
            title.push_str(" (view only)");
        }
        if self.canvas.has_unsaved_changes() {
            title.push_str(" *");
        }
        if let Some(status) = self.canvas.status_text() {
            title.push_str(" - ");
            title.push_str(&status);
        }
        title
    }

    /// Stop timers and drop unsaved strokes.
    pub fn close(&mut self) {
        if self.canvas.has_unsaved_changes() {
            log::warn!("Closing with unsaved strokes");
        }
        self.canvas.unmount();
    }
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    canvas_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // Input
    /// Last cursor position in CSS pixels.
    cursor: Point,
    modifiers: ModifiersState,
    title: String,
}

impl AppState {
    fn sync_title(&mut self, session: &CanvasSession, base: &str) {
        let title = session.title(base);
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }

    /// Build the frame for the canvas and present it. A frame whose surface
    /// texture is unavailable is skipped.
    fn redraw(
        &mut self,
        render_cx: &vello::util::RenderContext,
        session: &mut CanvasSession,
    ) -> RenderResult<()> {
        session.canvas.take_redraw();

        let ctx = RenderContext::for_canvas(&session.canvas, &session.options);
        let base_color = self.canvas_renderer.background_color(&ctx);
        self.canvas_renderer.build_scene(&ctx);
        let scene = self.canvas_renderer.take_scene();

        let device_handle = &render_cx.devices[self.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                return Ok(());
            }
        };

        let width = self.surface.config.width;
        let height = self.surface.config.height;

        let params = RenderParams {
            base_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Vello needs a storage-bindable Rgba8Unorm target; the surface may be Bgra8Unorm.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let render_texture_view =
            render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        self.vello_renderer
            .render_to_texture(device, queue, &scene, &render_texture_view, &params)
            .map_err(|e| RendererError::RenderFailed(format!("{:?}", e)))?;

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        let mut blit_encoder =
            device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                label: Some("blit encoder"),
            });
        self.texture_blitter
            .copy(device, &mut blit_encoder, &render_texture_view, &surface_view);
        queue.submit(std::iter::once(blit_encoder.finish()));

        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    session: CanvasSession,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
}

impl App {
    /// Create the application and mount the configured canvas.
    pub fn with_config(config: AppConfig) -> Result<Self, AppError> {
        let session = CanvasSession::open(&config)?;
        Ok(Self {
            config,
            session,
            state: None,
            render_cx: None,
        })
    }

    /// Run the application with configuration from `DICE_CONFIG`.
    pub async fn run() -> Result<(), AppError> {
        let config = AppConfig::from_env()?;
        let event_loop = EventLoop::new()?;
        let mut app = App::with_config(config)?;
        event_loop.run_app(&mut app)?;
        Ok(())
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<AppState, AppError> {
        let title = self.session.title(&self.config.title);
        let window_attrs = Window::default_attributes()
            .with_title(&title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| RendererError::InitFailed(e.to_string()))?,
        );

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };

        let render_cx = self
            .render_cx
            .get_or_insert_with(vello::util::RenderContext::new);
        let surface = pollster::block_on(render_cx.create_surface(
            window.clone(),
            width,
            height,
            PresentMode::AutoVsync,
        ))
        .map_err(|e| RendererError::Surface(e.to_string()))?;

        let device = &render_cx.devices[surface.dev_id].device;
        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| RendererError::InitFailed(e.to_string()))?;
        let texture_blitter =
            vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        self.session
            .canvas
            .resize(Viewport::from_physical(width, height, window.scale_factor()));

        log::info!("DICE canvas initialized - {}x{}", width, height);

        Ok(AppState {
            window,
            surface,
            vello_renderer,
            canvas_renderer: VelloRenderer::new(),
            texture_blitter,
            cursor: Point::ZERO,
            modifiers: ModifiersState::empty(),
            title,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.init(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Failed to initialize: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        let session = &mut self.session;
        let now = Timestamp::now();

        match event {
            WindowEvent::CloseRequested => {
                session.close();
                event_loop.exit();
                return;
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                session.canvas.resize(Viewport::from_physical(
                    size.width,
                    size.height,
                    state.window.scale_factor(),
                ));
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = state.window.inner_size();
                session
                    .canvas
                    .resize(Viewport::from_physical(size.width, size.height, scale_factor));
            }

            WindowEvent::RedrawRequested => {
                if let Some(render_cx) = self.render_cx.as_ref() {
                    if let Err(e) = state.redraw(render_cx, session) {
                        log::error!("{}", e);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let css = session
                    .canvas
                    .viewport()
                    .physical_to_css(Point::new(position.x, position.y));
                state.cursor = css;
                session
                    .canvas
                    .handle_pointer(PointerEvent::Move { position: css }, now);
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let Some(pointer) = mouse_event(button_state, button, state.cursor) {
                    session.canvas.handle_pointer(pointer, now);
                }
            }

            WindowEvent::Touch(touch) => {
                let css = session
                    .canvas
                    .viewport()
                    .physical_to_css(Point::new(touch.location.x, touch.location.y));
                session.canvas.handle_pointer(touch_event(touch.phase, css), now);
            }

            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                session.canvas.handle_pointer(PointerEvent::Cancel, now);
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.modifiers = modifiers.state();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && !event.repeat
                    && is_save_shortcut(&event.logical_key, state.modifiers)
                {
                    session.save();
                }
            }

            _ => {}
        }

        if session.canvas.needs_redraw() {
            state.window.request_redraw();
        }
        state.sync_title(session, &self.config.title);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Timestamp::now();
        self.session.canvas.tick(now);

        if let Some(state) = &mut self.state {
            if self.session.canvas.needs_redraw() {
                state.window.request_redraw();
            }
            state.sync_title(&self.session, &self.config.title);
        }

        let flow = match self.session.canvas.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(Instant::now() + deadline.since(now)),
            None => ControlFlow::Wait,
        };
        event_loop.set_control_flow(flow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CanvasSelection, SessionConfig};
    use dice_core::access::{SchoolId, UserId};
    use dice_core::controller::CanvasStatus;
    use dice_core::error::CanvasError;
    use uuid::Uuid;

    fn school_config(dir: &std::path::Path, member_of: Option<i64>) -> AppConfig {
        AppConfig {
            canvas: CanvasSelection::School { school_id: SchoolId(7) },
            session: SessionConfig {
                user_id: Some(UserId(Uuid::new_v4())),
                school_id: member_of.map(SchoolId),
            },
            storage_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        }
    }

    fn draw(session: &mut CanvasSession) {
        let canvas = session.canvas_mut();
        assert!(canvas.begin_stroke(Point::new(10.0, 10.0), Timestamp(1)));
        canvas.extend_stroke(Point::new(40.0, 25.0));
        canvas.end_stroke();
    }

    #[test]
    fn test_member_saves_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let config = school_config(dir.path(), Some(7));

        let mut session = CanvasSession::open(&config).unwrap();
        assert!(session.canvas().can_write());
        draw(&mut session);
        assert!(session.title("DICE").ends_with('*'));

        session.save();
        assert_eq!(session.canvas().status(), Some(&CanvasStatus::Saved));
        assert_eq!(session.title("DICE"), "DICE - School 7 - Saved");
        let saved = session.canvas().strokes().clone();
        session.close();

        let reopened = CanvasSession::open(&config).unwrap();
        assert_eq!(reopened.canvas().strokes(), &saved);
    }

    #[test]
    fn test_non_member_is_view_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CanvasSession::open(&school_config(dir.path(), Some(3))).unwrap();

        assert!(!session.canvas_mut().begin_stroke(Point::new(1.0, 1.0), Timestamp(1)));
        session.save();

        assert_eq!(
            session.canvas().status(),
            Some(&CanvasStatus::Error(CanvasError::PermissionDenied))
        );
        assert!(session.title("DICE").contains("(view only)"));
    }

    #[test]
    fn test_wall_session() {
        let mut session = CanvasSession::open(&AppConfig::default()).unwrap();
        assert!(session.canvas().can_write());
        draw(&mut session);
        assert!(session.canvas().next_deadline().is_some());

        session.save();
        assert_eq!(
            session.canvas().status(),
            Some(&CanvasStatus::Error(CanvasError::NotPersistent))
        );
        assert!(session.title("DICE").starts_with("DICE - Wall"));

        session.close();
        assert!(session.canvas().next_deadline().is_none());
    }
}
