use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use scheduler::{PopupEvent, PopupPayload, QueueReader};
use softbuffer::{Context, Surface};
use tracing::{info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder, WindowId, WindowLevel};

use crate::dispatcher::{Dispatcher, PopupFactory, PopupId};
use crate::draw::Canvas;
use crate::{PopupError, UiConfig};

/// A live popup: a topmost, undecorated window painted from a pre-rendered
/// canvas.
pub struct WinitPopup {
    // Field order is drop order: the surface goes before its context, both
    // before the window.
    surface: Surface<Arc<Window>, Arc<Window>>,
    _context: Context<Arc<Window>>,
    window: Arc<Window>,
    canvas: Canvas,
}

impl WinitPopup {
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn redraw(&mut self) -> Result<(), PopupError> {
        let size = self.window.inner_size();
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return Ok(());
        };
        self.surface
            .resize(width, height)
            .map_err(|err| PopupError::Surface(err.to_string()))?;
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|err| PopupError::Surface(err.to_string()))?;
        self.canvas.blit_into(&mut buffer, size.width, size.height);
        self.window.pre_present_notify();
        buffer
            .present()
            .map_err(|err| PopupError::Surface(err.to_string()))
    }
}

/// Window factory borrowed from the running event loop. It can only exist
/// inside the event loop callback, which runs on the UI thread.
pub struct WinitFactory<'a> {
    target: &'a EventLoopWindowTarget<()>,
    max_image_size: (u32, u32),
}

impl<'a> WinitFactory<'a> {
    fn new(target: &'a EventLoopWindowTarget<()>, max_image_size: (u32, u32)) -> Self {
        Self {
            target,
            max_image_size,
        }
    }

    fn monitor_origin(&self, size: (u32, u32)) -> Option<PhysicalPosition<i32>> {
        let monitor = self
            .target
            .primary_monitor()
            .or_else(|| self.target.available_monitors().next())?;
        Some(centered_origin(monitor.position(), monitor.size(), size))
    }
}

impl PopupFactory for WinitFactory<'_> {
    type Window = WinitPopup;

    fn open(&mut self, id: PopupId, payload: &PopupPayload) -> Result<WinitPopup, PopupError> {
        let (canvas, title) = match payload {
            PopupPayload::Image(path) => (
                Canvas::from_image_file(path, self.max_image_size)?,
                "popcycle image",
            ),
            PopupPayload::Text(message) => (Canvas::from_text(message), "popcycle message"),
        };
        let size = (canvas.width(), canvas.height());

        let mut builder = WindowBuilder::new()
            .with_title(format!("{title} ({id})"))
            .with_inner_size(PhysicalSize::new(size.0, size.1))
            .with_resizable(false)
            .with_decorations(false)
            .with_window_level(WindowLevel::AlwaysOnTop);
        if let Some(origin) = self.monitor_origin(size) {
            builder = builder.with_position(origin);
        }

        let window = builder
            .build(self.target)
            .map_err(|err| PopupError::Window(err.to_string()))?;
        let window = Arc::new(window);
        let context =
            Context::new(window.clone()).map_err(|err| PopupError::Surface(err.to_string()))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| PopupError::Surface(err.to_string()))?;
        window.request_redraw();

        Ok(WinitPopup {
            surface,
            _context: context,
            window,
            canvas,
        })
    }
}

/// Top-left corner that centres a window of `size` on a monitor.
pub fn centered_origin(
    monitor_position: PhysicalPosition<i32>,
    monitor_size: PhysicalSize<u32>,
    size: (u32, u32),
) -> PhysicalPosition<i32> {
    let x = monitor_position.x + (monitor_size.width as i32 - size.0 as i32) / 2;
    let y = monitor_position.y + (monitor_size.height as i32 - size.1 as i32) / 2;
    PhysicalPosition::new(x, y)
}

/// Runs the UI event loop on the calling thread until it exits. All popup
/// windows are created and destroyed here.
pub fn run_event_loop(
    images: QueueReader<PopupEvent>,
    texts: QueueReader<PopupEvent>,
    config: UiConfig,
) -> Result<()> {
    let event_loop = EventLoopBuilder::<()>::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let mut dispatcher: Dispatcher<WinitPopup> =
        Dispatcher::new(images, texts, config.tick, Instant::now());
    info!(
        tick_ms = config.tick.as_millis() as u64,
        "popup dispatcher running"
    );

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } => {
                let Some(id) = dispatcher.find_popup(|popup| popup.window_id() == window_id) else {
                    return;
                };
                match event {
                    WindowEvent::RedrawRequested => {
                        if let Some(popup) = dispatcher.popup_mut(id) {
                            if let Err(err) = popup.redraw() {
                                warn!(%id, error = %err, "failed to paint popup");
                            }
                        }
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    }
                    | WindowEvent::CloseRequested => {
                        dispatcher.dismiss(id);
                    }
                    WindowEvent::KeyboardInput { event, .. }
                        if event.state == ElementState::Pressed
                            && matches!(event.logical_key, Key::Named(NamedKey::Escape)) =>
                    {
                        dispatcher.dismiss(id);
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                if dispatcher.is_due(now) {
                    let mut factory = WinitFactory::new(elwt, config.max_image_size);
                    dispatcher.tick(&mut factory, now);
                } else {
                    dispatcher.close_expired(now);
                }
                elwt.set_control_flow(ControlFlow::WaitUntil(dispatcher.next_wake()));
            }
            _ => {}
        })
        .map_err(|err| anyhow!("popup event loop error: {err}"))
}
