//! Flow control and application event loop.
//!
//! A "flow" is a scene that handles user input, updates its simulation and
//! hands renderable batches to the engine each frame. The engine owns the
//! window, the GPU [`Context`] and any number of active flows.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S>`] is the trait for scenes that handle events and rendering
//! - [`Out`] lets a lifecycle hook reconfigure the context
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events and pass them to every flow
//! 2. Update the camera and every flow (`on_update`, and `on_tick` once per tick)
//! 3. Collect every flow's `on_render()`
//! 4. Render the batches with the basic pipeline and present the frame

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use anyhow::Context as _;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::{model::DrawModel, texture::Texture},
    render::{Instanced, Render},
};

/// The output of every lifecycle hook.
///
/// `Out::Configure` modifies the Context during runtime, for instance to
/// change the tick speed or the clear colour.
///
/// `Empty` is the default output when nothing has to change.
pub enum Out {
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

impl Debug for Out {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configure(_) => f.write_str("Configure(|&mut Context| -> {...})"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

/// Trait for implementing a renderable scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure the context here
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_tick()` is called every `tick_duration_millis`
/// 5. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out;

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`. Instance buffers that
    /// `on_render` hands out should be written here.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out;

    /// Called every `tick_duration_millis` milliseconds.
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out;

    /// Handle raw device events (mouse motion, raw keys).
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out;

    /// Handle window events (keyboard, mouse buttons, resizing).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out;

    /// Return renderable objects for this flow.
    fn on_render<'pass>(&self) -> Render<'_, 'pass>;
}

impl<S> Debug for dyn GraphicsFlow<S> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// A flow constructor.
///
/// Takes an [`InitContext`] and asynchronously builds the flow, so asset
/// loading can happen before the first frame. A failing constructor aborts
/// the start-up.
pub type FlowConstructor<S> = Box<dyn FnOnce(InitContext) -> FlowFuture<S>>;

/// The pending result of a [`FlowConstructor`].
pub type FlowFuture<S> = Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow<S>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window)
            .await
            .context("App initialization failed. Cannot create the main context")?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(
        &mut self,
        graphics_flows: &mut [Box<dyn GraphicsFlow<State>>],
    ) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut basics: Vec<Instanced> = Vec::new();
            graphics_flows.iter().for_each(|flow| {
                let render = flow.on_render();
                render.set_pipelines(&self.ctx, &mut render_pass, &mut basics);
            });

            render_pass.set_pipeline(&self.ctx.pipelines.basic);
            for instanced in basics {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("you attempted to render something with zero instances");
                    continue;
                }
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_mesh_instanced(
                    instanced.mesh,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App<State: 'static> {
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState<State>>,
    // The fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State>>>,
    // Taken on the first `resumed`.
    constructors: Option<Vec<FlowConstructor<State>>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State: 'static + Default> App<State> {
    fn new(constructors: Vec<FlowConstructor<State>>) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        Ok(Self {
            async_runtime,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let Some(constructors) = self.constructors.take() else {
            return Ok(());
        };
        let window_attributes = Window::default_attributes().with_title("CO2 Factory");
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let init_future = async move {
            let app_state = AppState::new(window).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                // Device and Queue are reference counted, so this only clones handles
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows = futures::future::join_all(flow_futures)
                .await
                .into_iter()
                .collect::<anyhow::Result<Vec<_>>>()?;
            anyhow::Ok((app_state, flows))
        };

        let (mut app_state, flows) = self.async_runtime.block_on(init_future)?;
        self.graphics_flows = flows;
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            handle_flow_output(&mut app_state.ctx, out);
        }
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        app_state.ctx.window.request_redraw();
        self.state = Some(app_state);
        Ok(())
    }
}

impl<State: 'static + Default> ApplicationHandler for App<State> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.init(event_loop) {
            log::error!("{:#}", e);
            event_loop.exit();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let speed_factor = 5.0;
            if let MouseButtonState::Right = state.ctx.mouse.pressed {
                state
                    .ctx
                    .camera
                    .controller
                    .handle_mouse(dx * speed_factor, dy * speed_factor);
            }
        }
        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_device_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(&mut state.ctx, out);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        if let WindowEvent::CursorMoved { position, .. } = event {
            state.ctx.mouse.coords = position;
        };

        for flow in self.graphics_flows.iter_mut() {
            let out = flow.on_window_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(&mut state.ctx, out);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.time_since_tick += dt;

                if self.time_since_tick >= Duration::from_millis(state.ctx.tick_duration_millis) {
                    for flow in self.graphics_flows.iter_mut() {
                        let out = flow.on_tick(&state.ctx, &mut state.state);
                        handle_flow_output(&mut state.ctx, out);
                    }
                    self.time_since_tick = Duration::from_millis(0);
                }

                // Update the camera
                state
                    .ctx
                    .camera
                    .controller
                    .update(&mut state.ctx.camera.camera, dt);
                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                for flow in self.graphics_flows.iter_mut() {
                    let out = flow.on_update(&state.ctx, &mut state.state, dt);
                    handle_flow_output(&mut state.ctx, out);
                }

                match state.render(&mut self.graphics_flows) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {}", e),
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => state.ctx.mouse.pressed = MouseButtonState::Left,
                (MouseButton::Right, true) => state.ctx.mouse.pressed = MouseButtonState::Right,
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            _ => {}
        }
    }
}

fn handle_flow_output(ctx: &mut Context, out: Out) {
    match out {
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Open a window and run the given flows until the window is closed.
pub fn run<State: 'static + Default>(
    constructors: Vec<FlowConstructor<State>>,
) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        eprintln!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app: App<State> = App::new(constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Score;

    #[test]
    fn app_accepts_any_default_state() {
        let constructors: Vec<FlowConstructor<Score>> = Vec::new();
        let app = App::new(constructors).unwrap();
        assert!(app.state.is_none());
        assert!(app.graphics_flows.is_empty());
        assert_eq!(app.constructors.map(|c| c.len()), Some(0));
    }

    #[test]
    fn out_defaults_to_empty() {
        assert!(matches!(Out::default(), Out::Empty));
    }
}
