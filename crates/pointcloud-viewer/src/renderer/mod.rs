//! The rendering orchestrator. Owns the GPU context, the depth target and
//! the scene pipelines.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{axes::AxesPipeline, points::PointsPipeline},
    targets::Targets,
};
use crate::{camera::Camera, scene::Scene};
use std::sync::Arc;
use winit::window::Window;

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: PointsPipeline,
    pub axes: AxesPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let targets = Targets::new(&gfx.device, gfx.size);

        let points = PointsPipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);
        let axes = AxesPipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            axes,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    /// Pushes the scene's cloud and markers to the GPU.
    pub fn upload_scene(&mut self, scene: &Scene) {
        if let Some(cloud) = &scene.cloud {
            self.points.upload(&self.gfx.device, cloud);
        }
        self.axes.set_axes(&self.gfx.device, &scene.axes);
    }

    /// Draws the scene into `swap_view`, clearing it to the background color.
    pub fn render(
        &mut self,
        swap_view: &wgpu::TextureView,
        scene: &Scene,
        camera: &Camera,
        point_size: f32,
    ) {
        let view = camera.view();
        let proj = camera.proj();

        self.axes.update_uniforms(&self.gfx.queue, proj * view);
        if let Some(cloud) = &scene.cloud {
            self.points
                .update_uniforms(&self.gfx.queue, view * cloud.model_matrix(), proj, point_size);
        }

        let [r, g, b] = scene.background;

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.axes.draw(&mut pass);
            if scene.cloud.is_some() {
                self.points.draw(&mut pass);
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
