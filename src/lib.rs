pub mod accumulator;
mod camera;
pub mod demo;
pub mod geometry;
mod renderer;
pub mod scene;
pub mod util;

pub use crate::accumulator::FloatImage;
pub use crate::renderer::{
    PreviewProgress, RenderError, RenderReport, RenderSettings, Rendered, WorkerCount, render,
    render_multi_pass, render_single_pass, start_preview,
};
pub use camera::Camera;
pub use scene::Scene;
