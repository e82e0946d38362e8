use anyhow::{anyhow, Context, Result};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use super::bars;
use super::canvas::Canvas;
use super::text::TextOverlay;
use crate::player::{Player, StreamOpener};

type Surface = softbuffer::Surface<Arc<Window>, Arc<Window>>;

/// Window-backed front end: drag a file in, watch it play.
pub struct LiveApp<O> {
    player: Player<O>,
    text: Option<TextOverlay>,
    canvas: Canvas,
    initial_size: (u32, u32),
    frame_interval: Duration,
    next_frame: Instant,
    pending_file: Option<PathBuf>,
    showing_title: bool,
    window: Option<Arc<Window>>,
    surface: Option<Surface>,
    fatal: Option<anyhow::Error>,
}

impl<O: StreamOpener> LiveApp<O> {
    pub fn new(
        player: Player<O>,
        text: Option<TextOverlay>,
        size: (u32, u32),
        fps: u32,
        initial_file: Option<PathBuf>,
    ) -> Self {
        Self {
            player,
            text,
            canvas: Canvas::new(size.0, size.1),
            initial_size: size,
            frame_interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next_frame: Instant::now(),
            pending_file: initial_file,
            showing_title: false,
            window: None,
            surface: None,
            fatal: None,
        }
    }

    /// Runs the event loop until the window is closed or a fatal error occurs.
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        event_loop
            .run_app(&mut self)
            .context("Event loop terminated abnormally")?;
        self.player.stop();
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{:#}", err);
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn load(&mut self, path: PathBuf) -> Result<()> {
        match self.player.load(&path) {
            Ok(title) => {
                if let Some(window) = &self.window {
                    window.set_title(&format!("peakviz - {}", title));
                    self.showing_title = true;
                }
                Ok(())
            }
            Err(err) if !err.is_fatal() => {
                log::warn!("{}", err);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.initial_size;
        let attrs = Window::default_attributes()
            .with_title("peakviz")
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(true);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );

        let context = softbuffer::Context::new(window.clone())
            .map_err(|e| anyhow!("Failed to create drawing context: {}", e))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| anyhow!("Failed to create drawing surface: {}", e))?;

        self.surface = Some(surface);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(window) = self.window.clone() else {
            return Ok(());
        };
        let size = window.inner_size();

        // The stream keeps advancing while minimized.
        let view = self.player.frame(size.height as f32)?;

        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };
        self.canvas.resize(size.width, size.height);
        bars::draw(&mut self.canvas, &view, self.text.as_ref());
        if self.showing_title && !self.player.is_playing() {
            window.set_title("peakviz");
            self.showing_title = false;
        }

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        surface
            .resize(width, height)
            .map_err(|e| anyhow!("Failed to resize surface: {}", e))?;
        let mut buffer = surface
            .buffer_mut()
            .map_err(|e| anyhow!("Failed to map surface buffer: {}", e))?;
        buffer.copy_from_slice(self.canvas.pixels());
        window.pre_present_notify();
        buffer
            .present()
            .map_err(|e| anyhow!("Failed to present frame: {}", e))?;
        Ok(())
    }
}

impl<O: StreamOpener> ApplicationHandler for LiveApp<O> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_window(event_loop) {
            return self.fail(event_loop, err);
        }
        if let Some(path) = self.pending_file.take() {
            if let Err(err) = self.load(path) {
                return self.fail(event_loop, err);
            }
        }
        self.next_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::DroppedFile(path) => {
                if let Err(err) = self.load(path) {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame += self.frame_interval;
            if self.next_frame < now {
                self.next_frame = now + self.frame_interval;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}
