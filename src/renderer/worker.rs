use crate::{
    camera::Camera,
    renderer::RenderSettings,
    scene::{Scene, ShadingContext},
    util::{BLACK, Color, clamp_to_ceiling, is_finite, max_channel, stream_seed},
};

/// Counters of samples that needed fixing up.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleStats {
    pub discarded: u64,
    pub clamped: u64,
}

/// Per-thread rendering state. Never shared between threads.
pub struct Worker {
    worker_id: usize,
    ctx: ShadingContext,
}

impl Worker {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ctx: ShadingContext::new(0),
        }
    }

    pub fn id(&self) -> usize {
        self.worker_id
    }

    /// Renders one sample per pixel of row `y` into `row`.
    ///
    /// The random stream is restarted from `(seed, pass, y)`, so the result does not
    /// depend on which worker renders the row or what it rendered before.
    pub fn render_row(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        settings: &RenderSettings,
        pass: u32,
        y: u32,
        row: &mut [Color],
    ) -> SampleStats {
        self.ctx.reseed(stream_seed(settings.seed, pass, y));

        let mut stats = SampleStats::default();
        for (x, pixel) in row.iter_mut().enumerate() {
            let color = self.render_sample(scene, camera, settings, x as u32, y);
            *pixel = if !is_finite(color) {
                stats.discarded += 1;
                BLACK
            } else {
                match settings.firefly_ceiling {
                    Some(ceiling) if max_channel(color) > ceiling => {
                        stats.clamped += 1;
                        clamp_to_ceiling(color, ceiling)
                    }
                    _ => color,
                }
            };
        }
        stats
    }

    fn render_sample(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        settings: &RenderSettings,
        x: u32,
        y: u32,
    ) -> Color {
        let jitter = if settings.anti_alias {
            Camera::jitter(self.ctx.rng())
        } else {
            Camera::PIXEL_CENTER
        };
        let ray = camera.ray_for(x, y, settings.width, settings.height, jitter);
        scene.shade(&mut self.ctx, &ray, settings.recursion_depth)
    }
}
