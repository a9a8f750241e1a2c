use crate::{
    camera::{Camera, CameraController},
    config::Config,
    loader::{AssetLoader, LoadEvent},
    picking::{pixel_to_ndc, ClickTracker},
    renderer::Renderer,
    scene::Scene,
    ui,
};
use anyhow::{Context, Result};
use geoproj::Transform;
use std::sync::Arc;
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    window::Window,
};

pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub scene: Scene,
    pub point_size: f32,
    loader: AssetLoader,
    clicks: ClickTracker,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let transform = Transform::new(&config.source_crs, &config.target_crs)
            .context("invalid source/target projection definition")?;

        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.size;

        let camera = Camera::new(size.width as f32 / size.height.max(1) as f32);
        let camera_controller = CameraController::new();

        let scene = Scene::new(transform, config.pick_threshold, config.height_offset);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let loader = AssetLoader::spawn(&config.input);

        let mut app = Self {
            renderer,
            camera,
            camera_controller,
            egui_ctx,
            egui_state,
            scene,
            point_size: config.point_size,
            loader,
            clicks: ClickTracker::default(),
        };
        app.renderer.upload_scene(&app.scene);

        Ok(app)
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    /// Routes a window event to the overlay, the camera and the picker.
    /// Returns true when the overlay consumed it.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        if let WindowEvent::CursorMoved { position, .. } = event {
            self.clicks.cursor_moved((position.x, position.y));
        }

        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            if matches!(event, WindowEvent::MouseInput { .. }) {
                self.clicks.cancel();
            }
            self.camera_controller.handle_overlay_event(event);
            return true;
        }

        let height = self.renderer.gfx.size.height;
        self.camera_controller
            .handle_event(event, &mut self.camera, height);

        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => self.clicks.pressed(),
                ElementState::Released => {
                    if let Some(xy) = self.clicks.released() {
                        self.handle_click(xy);
                    }
                }
            },
            WindowEvent::Resized(physical_size) => self.resize(*physical_size),
            _ => {}
        }

        false
    }

    fn handle_click(&mut self, (px, py): (f64, f64)) {
        let size = self.renderer.gfx.size;
        let ndc = pixel_to_ndc(px, py, size.width, size.height);

        let Some(outcome) = self.scene.pick(&self.camera, ndc) else {
            return;
        };

        if let Some(cloud) = &self.scene.cloud {
            self.renderer
                .points
                .write_colors(&self.renderer.gfx.queue, &cloud.colors, &outcome.dirty);
        }

        log::info!(
            "{} | {}",
            ui::PickInfo::height_line(Some(&outcome.info)),
            ui::PickInfo::coordinates_line(Some(&outcome.info))
        );
    }

    fn poll_loader(&mut self) {
        match self.loader.poll() {
            Some(LoadEvent::Loaded(cloud)) => {
                if self.scene.install_cloud(cloud, &mut self.camera) {
                    self.renderer.upload_scene(&self.scene);
                }
            }
            Some(LoadEvent::Failed { path, error }) => {
                log::error!("Failed to load point cloud '{}': {}", path.display(), error);
            }
            None => {}
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.poll_loader();

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer
            .render(&swap_view, &self.scene, &self.camera, self.point_size);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        if ui::draw_overlay(
            &self.egui_ctx,
            self.scene.last_pick.as_ref(),
            &mut self.point_size,
        ) {
            log::debug!("Point size set to {:.2}", self.point_size);
        }

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
