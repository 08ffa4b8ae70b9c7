use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use tracing::{debug, error, info, warn};

use crate::animation::MorphPublisher;
use crate::gpu::GpuSurface;
use crate::lifecycle::ThreadsView;
use crate::runtime::{time_source_for_policy, RenderPolicy};
use crate::types::RendererConfig;

#[derive(Debug, Clone)]
enum WindowCommand {
    Shutdown,
}

/// Hero window running on its own thread.
///
/// The window hosts one [`ThreadsView`] backed by a [`GpuSurface`]. When no
/// GPU is available the window stays open but blank.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    pub fn spawn(config: RendererConfig, publisher: Option<MorphPublisher>) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("attosite-window".into())
            .spawn(move || run_window_thread(config, publisher, ready_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            join_handle: Some(handle),
        })
    }

    /// True once the window was closed and the event loop returned.
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Waits for the user to close the window.
    pub fn join(mut self) -> Result<()> {
        match self.join_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))?,
            None => Ok(()),
        }
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    publisher: Option<MorphPublisher>,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let message = format!("failed to create event loop: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = match WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let message = format!("failed to create hero window: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };

    let mut view = ThreadsView::mount(
        Some(&window),
        config.props.clone(),
        config.schedule,
        publisher,
        |window: &Arc<Window>| GpuSurface::new(Arc::clone(window)),
    );
    if view.is_none() {
        warn!("threads background unavailable; showing an empty window");
    }

    let animate = matches!(config.policy, RenderPolicy::Animate);
    let mut time_source = time_source_for_policy(&config.policy);
    window.request_redraw();

    let _ = ready_tx.send(Ok(proxy));
    info!(
        width = window_size.width,
        height = window_size.height,
        policy = ?config.policy,
        "hero window running"
    );

    let window_id = window.id();
    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(WindowCommand::Shutdown) => {
            elwt.exit();
        }
        Event::WindowEvent { window_id: id, event } if id == window_id => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(view) = view.as_mut() {
                    view.resize(new_size.width, new_size.height);
                }
                window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(view) = view.as_mut() {
                    view.pointer_moved(position.x, position.y);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(view) = view.as_mut() {
                    view.pointer_left();
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(active) = view.as_mut() else {
                    return;
                };
                match active.frame(time_source.sample()) {
                    Ok(_) => {
                        if animate {
                            window.request_redraw();
                        }
                    }
                    Err(err) => {
                        error!(error = %err, "failed to render frame; closing hero window");
                        elwt.exit();
                    }
                }
            }
            _ => {}
        },
        Event::LoopExiting => {
            if let Some(view) = view.take() {
                view.unmount();
            }
            debug!("hero window event loop exiting");
        }
        Event::AboutToWait => {
            elwt.set_control_flow(ControlFlow::Wait);
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
