#![cfg(feature = "play")]
//! Interactive player window: the cinematic frame as a fullscreen texture
//! with an egui HUD for narration and transport controls.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use egui::{Color32, FontFamily, FontId, RichText, TextureHandle, TextureOptions};
use egui_wgpu::{Renderer as EguiRenderer, ScreenDescriptor};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event as WinitEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::catalog::{validate_catalog, SceneDescriptor, SCENES, TOTAL_DURATION_SECS};
use crate::config::load_player_config;
use crate::render::FrameRenderer;
use crate::sequence::{resolve_scene, SceneState};
use crate::soundscape::Soundscape;
use crate::transport::{Phase, Transport};

const TARGET_FPS: u32 = 60;

/// Transport commands issued by the HUD, applied after the egui pass.
#[derive(Debug, Clone, Copy)]
enum HudAction {
    Toggle,
    Restart,
    ToggleMute,
}

struct Player {
    transport: Transport,
    soundscape: Soundscape,
    renderer: FrameRenderer,
    texture: Option<TextureHandle>,
}

impl Player {
    /// Advance the clock one display frame and re-target the soundscape.
    fn advance(&mut self, now: Instant) -> SceneState {
        self.transport.tick(now);
        let state = resolve_scene(self.transport.elapsed(), &SCENES);
        let scene = &SCENES[state.index];
        self.soundscape.retarget(scene, state.progress);
        self.soundscape
            .set_master(self.transport.is_running(), self.transport.is_muted());
        state
    }

    fn apply(&mut self, action: HudAction) {
        match action {
            HudAction::Toggle => self.transport.toggle(),
            HudAction::Restart => self.transport.restart(),
            HudAction::ToggleMute => self.transport.toggle_mute(),
        }
        // An unmuted play attempt is one of the two initialization triggers.
        if self.transport.is_running() && !self.transport.is_muted() {
            self.soundscape.ensure_initialized();
        }
        self.soundscape
            .set_master(self.transport.is_running(), self.transport.is_muted());
    }

    /// Every pointer or key press counts as the user gesture that unlocks
    /// the audio engine; the call is idempotent once the engine exists.
    fn note_interaction(&mut self) {
        self.soundscape.ensure_initialized();
    }

    fn update_texture(&mut self, ctx: &egui::Context, state: &SceneState) {
        let size = [
            self.renderer.width() as usize,
            self.renderer.height() as usize,
        ];
        let data = self.renderer.render(&SCENES, state);
        let image = egui::ColorImage::from_rgba_unmultiplied(size, data);
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("firn-frame", image, TextureOptions::LINEAR));
            }
        }
    }
}

pub fn run_play(config_path: Option<&Path>, muted: bool) -> Result<()> {
    validate_catalog(&SCENES)?;
    let config = load_player_config(config_path)?;

    let event_loop = EventLoop::new().context("failed to create play event loop")?;
    let initial_size = PhysicalSize::new(config.window.width, config.window.height);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("FIRN | sixty seconds on the mountain")
            .with_inner_size(initial_size)
            .with_resizable(false)
            .build(&event_loop)
            .context("failed to create player window")?,
    );

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let surface = instance
        .create_surface(window.clone())
        .context("failed to create wgpu surface")?;
    let gpu = pollster::block_on(GpuContext::for_surface(&instance, &surface))
        .context("failed to initialize WGPU context for the player")?;

    let caps = surface.get_capabilities(&gpu.adapter);
    let format = pick_surface_format(&caps.formats);
    let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
        wgpu::PresentMode::Mailbox
    } else {
        wgpu::PresentMode::Fifo
    };
    let alpha_mode = caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

    let mut surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: initial_size.width.max(1),
        height: initial_size.height.max(1),
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&gpu.device, &surface_config);

    let egui_ctx = egui::Context::default();
    let viewport_id = egui::ViewportId::ROOT;
    let mut egui_state =
        egui_winit::State::new(egui_ctx.clone(), viewport_id, &event_loop, None, None);
    let mut egui_renderer = EguiRenderer::new(&gpu.device, surface_config.format, None, 1);

    let mut player = Player {
        transport: Transport::new(),
        soundscape: Soundscape::new(config.audio.master_gain, config.audio.enabled),
        renderer: FrameRenderer::new(config.window.width, config.window.height)?,
        texture: None,
    };
    player
        .transport
        .set_mute(muted || config.audio.start_muted);

    let mut next_redraw_at = Instant::now();

    eprintln!(
        "[firn] play: {}x{}, {} scenes over {}s",
        config.window.width,
        config.window.height,
        SCENES.len(),
        TOTAL_DURATION_SECS
    );
    eprintln!("[firn] Controls: Space launch/pause, R restart, M mute, Esc quit");

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Wait);

            match event {
                WinitEvent::WindowEvent { window_id, event } if window_id == window.id() => {
                    let egui_response = egui_state.on_window_event(&window, &event);
                    if egui_response.repaint {
                        window.request_redraw();
                    }
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            ..
                        } => {
                            player.note_interaction();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.state == ElementState::Pressed
                                && !event.repeat
                                && !egui_response.consumed
                            {
                                player.note_interaction();
                                if handle_key(event.physical_key, &mut player) {
                                    target.exit();
                                }
                                next_redraw_at = Instant::now();
                                window.request_redraw();
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            render_frame(
                                &window,
                                &surface,
                                &gpu,
                                &mut surface_config,
                                &egui_ctx,
                                &mut egui_state,
                                &mut egui_renderer,
                                &mut player,
                            );
                        }
                        WindowEvent::Resized(size) => {
                            if size.width > 0 && size.height > 0 {
                                surface_config.width = size.width;
                                surface_config.height = size.height;
                                surface.configure(&gpu.device, &surface_config);
                            }
                        }
                        _ => {}
                    }
                }
                WinitEvent::AboutToWait => {
                    // Re-arm the frame callback only while running: at most
                    // one pending redraw, scheduled from within the loop.
                    if player.transport.is_running() {
                        let frame_duration = Duration::from_secs_f64(1.0 / TARGET_FPS as f64);
                        let now = Instant::now();
                        if now >= next_redraw_at {
                            window.request_redraw();
                            next_redraw_at = now + frame_duration;
                        }
                        target.set_control_flow(ControlFlow::WaitUntil(next_redraw_at));
                    }
                }
                _ => {}
            }
        })
        .map_err(|error| anyhow!("play event loop terminated: {error}"))
}

struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    async fn for_surface(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'_>,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(surface),
            })
            .await
            .ok_or_else(|| anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("firn-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("failed to request wgpu device")?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }
}

fn render_frame(
    window: &winit::window::Window,
    surface: &wgpu::Surface<'_>,
    gpu: &GpuContext,
    surface_config: &mut wgpu::SurfaceConfiguration,
    egui_ctx: &egui::Context,
    egui_state: &mut egui_winit::State,
    egui_renderer: &mut EguiRenderer,
    player: &mut Player,
) {
    if surface_config.width == 0 || surface_config.height == 0 {
        return;
    }

    let frame = match surface.get_current_texture() {
        Ok(frame) => frame,
        Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
            surface.configure(&gpu.device, surface_config);
            return;
        }
        Err(wgpu::SurfaceError::Timeout) => {
            return;
        }
        Err(wgpu::SurfaceError::OutOfMemory) => {
            eprintln!("[firn] play: surface out of memory");
            return;
        }
    };

    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let state = player.advance(Instant::now());
    player.update_texture(egui_ctx, &state);

    let raw_input = egui_state.take_egui_input(window);
    let mut actions: Vec<HudAction> = Vec::new();
    let full_output = egui_ctx.run(raw_input, |ctx| {
        draw_hud(ctx, player, &state, &mut actions);
    });

    egui_state.handle_platform_output(window, full_output.platform_output);
    let pixels_per_point = window.scale_factor() as f32;
    let paint_jobs = egui_ctx.tessellate(full_output.shapes, pixels_per_point);

    for (texture_id, delta) in &full_output.textures_delta.set {
        egui_renderer.update_texture(&gpu.device, &gpu.queue, *texture_id, delta);
    }

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("firn-hud"),
        });

    let screen_descriptor = ScreenDescriptor {
        size_in_pixels: [surface_config.width, surface_config.height],
        pixels_per_point,
    };
    egui_renderer.update_buffers(
        &gpu.device,
        &gpu.queue,
        &mut encoder,
        &paint_jobs,
        &screen_descriptor,
    );

    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("firn-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
    }

    for texture_id in &full_output.textures_delta.free {
        egui_renderer.free_texture(texture_id);
    }

    gpu.queue.submit(Some(encoder.finish()));
    frame.present();

    for action in actions {
        player.apply(action);
        window.request_redraw();
    }
}

fn draw_hud(
    ctx: &egui::Context,
    player: &Player,
    state: &SceneState,
    actions: &mut Vec<HudAction>,
) {
    let scene = &SCENES[state.index];

    // The rendered frame sits beneath everything egui draws.
    if let Some(texture) = &player.texture {
        let screen = ctx.screen_rect();
        ctx.layer_painter(egui::LayerId::background()).image(
            texture.id(),
            screen,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }

    draw_narration(ctx, scene);
    draw_clock(ctx, state);
    draw_transport(ctx, player, actions);
}

fn draw_narration(ctx: &egui::Context, scene: &SceneDescriptor) {
    egui::Area::new("narration".into())
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(16.0, 16.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(Color32::from_black_alpha(110))
                .rounding(egui::Rounding::same(4.0))
                .inner_margin(egui::Margin::same(10.0))
                .show(ui, |ui| {
                    ui.set_max_width(420.0);
                    ui.label(
                        RichText::new(scene.label)
                            .font(FontId::new(24.0, FontFamily::Proportional))
                            .color(Color32::from_rgb(240, 240, 245)),
                    );
                    ui.label(
                        RichText::new(scene.description)
                            .font(FontId::new(14.0, FontFamily::Proportional))
                            .color(Color32::from_rgb(210, 214, 222)),
                    );
                    ui.add_space(6.0);
                    for (tag, cue) in [
                        ("camera", scene.camera),
                        ("visual", scene.visual_cue),
                        ("audio", scene.audio_cue),
                    ] {
                        ui.label(
                            RichText::new(format!("{tag}: {cue}"))
                                .font(FontId::new(11.0, FontFamily::Monospace))
                                .color(Color32::from_rgb(170, 178, 190)),
                        );
                    }
                });
        });
}

fn draw_clock(ctx: &egui::Context, state: &SceneState) {
    let time_text = format!(
        "{} / {}",
        clock_text(state.total_elapsed),
        clock_text(TOTAL_DURATION_SECS)
    );
    egui::Area::new("clock".into())
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(Color32::from_black_alpha(110))
                .rounding(egui::Rounding::same(3.0))
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(time_text)
                            .font(FontId::new(16.0, FontFamily::Monospace))
                            .color(Color32::from_rgb(200, 230, 255)),
                    );
                    ui.label(
                        RichText::new(format!("scene {:.0}%", state.progress * 100.0))
                            .font(FontId::new(11.0, FontFamily::Monospace))
                            .color(Color32::from_rgb(160, 190, 215)),
                    );
                });
        });
}

fn draw_transport(ctx: &egui::Context, player: &Player, actions: &mut Vec<HudAction>) {
    egui::TopBottomPanel::bottom("transport")
        .resizable(false)
        .frame(
            egui::Frame::none()
                .fill(Color32::from_black_alpha(110))
                .inner_margin(egui::Margin::symmetric(12.0, 8.0)),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                match player.transport.phase() {
                    Phase::Idle if player.transport.elapsed() == 0.0 => {
                        if ui.button("Launch").clicked() {
                            actions.push(HudAction::Toggle);
                        }
                    }
                    Phase::Idle => {
                        if ui.button("Resume").clicked() {
                            actions.push(HudAction::Toggle);
                        }
                        if ui.button("Restart").clicked() {
                            actions.push(HudAction::Restart);
                        }
                    }
                    Phase::Running => {
                        if ui.button("Pause").clicked() {
                            actions.push(HudAction::Toggle);
                        }
                        if ui.button("Restart").clicked() {
                            actions.push(HudAction::Restart);
                        }
                    }
                    Phase::Complete => {
                        if ui.button("Replay").clicked() {
                            actions.push(HudAction::Restart);
                        }
                    }
                }

                let mute_label = if player.transport.is_muted() {
                    "Unmute"
                } else {
                    "Mute"
                };
                if ui.button(mute_label).clicked() {
                    actions.push(HudAction::ToggleMute);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let status = match player.transport.phase() {
                        Phase::Idle => "standing by",
                        Phase::Running => "rolling",
                        Phase::Complete => "complete",
                    };
                    ui.label(
                        RichText::new(status)
                            .font(FontId::new(12.0, FontFamily::Monospace))
                            .color(Color32::from_rgb(150, 160, 175)),
                    );
                });
            });
        });
}

fn handle_key(key: PhysicalKey, player: &mut Player) -> bool {
    match key {
        PhysicalKey::Code(KeyCode::Space) => player.apply(HudAction::Toggle),
        PhysicalKey::Code(KeyCode::KeyR) => player.apply(HudAction::Restart),
        PhysicalKey::Code(KeyCode::KeyM) => player.apply(HudAction::ToggleMute),
        PhysicalKey::Code(KeyCode::Escape) => return true,
        _ => {}
    }
    false
}

fn clock_text(secs: f32) -> String {
    let whole = secs.max(0.0).floor() as u32;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
    formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or_else(|| formats[0])
}
