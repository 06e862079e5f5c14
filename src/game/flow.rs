use instant::Duration;
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    context::{Context, InitContext},
    error::SceneError,
    flow::{FlowConstructor, FlowFuture, GraphicsFlow, Out},
    game::{
        factory::{Factory, GameState, UpdateOutcome},
        settings::GameSettings,
        templates::TemplateSlot,
    },
    render::{Draw, Frame, InstanceBatches, Render},
};

/// Runs a [`Factory`] inside the engine's event loop.
///
/// - `R` restarts once the game is won or lost
/// - `O` turns the oldest remaining CO2 molecule into O2
#[derive(Debug)]
pub struct FactoryFlow {
    factory: Factory,
    // Owns the templates for as long as the scene lives.
    slot: TemplateSlot,
    batches: InstanceBatches,
}

impl FactoryFlow {
    pub async fn new(ctx: InitContext, settings: GameSettings) -> Result<Self, SceneError> {
        let mut slot = TemplateSlot::new();
        let factory = Factory::load(settings, &mut slot).await?;
        factory
            .templates()
            .upload(&ctx.device, &ctx.material_layout);
        Ok(Self {
            factory,
            slot,
            batches: InstanceBatches::new(),
        })
    }

    /// A constructor for [`crate::flow::run`].
    pub fn constructor<S: 'static>(settings: GameSettings) -> FlowConstructor<S> {
        Box::new(move |ctx: InitContext| {
            let flow: FlowFuture<S> = Box::pin(async move {
                let flow = FactoryFlow::new(ctx, settings).await?;
                Ok(Box::new(flow) as Box<dyn GraphicsFlow<S>>)
            });
            flow
        })
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn templates_loaded(&self) -> bool {
        self.slot.is_loaded()
    }

    fn set_clear_colour(colour: wgpu::Color) -> Out {
        Out::Configure(Box::new(move |ctx: &mut Context| ctx.clear_colour = colour))
    }
}

impl<S> GraphicsFlow<S> for FactoryFlow {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut S) -> Out {
        ctx.clear_colour = self.factory.settings().default_clear_colour;
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, _state: &mut S, dt: Duration) -> Out {
        let outcome = self.factory.update(dt);

        let mut frame = Frame::new();
        self.factory.draw(&mut frame);
        self.batches.write(ctx, &frame);

        match outcome {
            UpdateOutcome::Won => Self::set_clear_colour(self.factory.settings().won_clear_colour),
            _ => Out::Empty,
        }
    }

    fn on_tick(&mut self, _ctx: &Context, _state: &mut S) -> Out {
        log::debug!(
            "{:?}: {} CO2, {} molecules in the air",
            self.factory.state(),
            self.factory.co2_count(),
            self.factory.molecules().len()
        );
        Out::Empty
    }

    fn on_device_events(&mut self, _ctx: &Context, _state: &mut S, _event: &DeviceEvent) -> Out {
        Out::Empty
    }

    fn on_window_events(&mut self, _ctx: &Context, _state: &mut S, event: &WindowEvent) -> Out {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        else {
            return Out::Empty;
        };

        match key {
            KeyCode::KeyR if self.factory.state() != GameState::InProgress => {
                self.factory.restart();
                Self::set_clear_colour(self.factory.settings().default_clear_colour)
            }
            KeyCode::KeyO => {
                match self.factory.molecules().iter().position(|m| !m.is_o2()) {
                    Some(index) => {
                        self.factory.make_o2(index);
                        log::info!("Molecule {} is O2 now", index);
                    }
                    None => log::info!("No CO2 molecule left to convert"),
                }
                Out::Empty
            }
            _ => Out::Empty,
        }
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        self.batches.render()
    }
}
