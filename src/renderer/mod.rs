mod machinery;
mod preview;
mod worker;

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use bon::bon;

use crate::accumulator::FloatImage;

pub use crate::renderer::machinery::{render, render_multi_pass, render_single_pass};
pub use crate::renderer::preview::{PreviewProgress, start_preview};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Image must not be empty, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
    #[error("Failed to start thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerCount {
    /// One worker per logical CPU
    Auto,
    Manual(NonZeroUsize),
}

impl WorkerCount {
    pub fn get(self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get(),
            WorkerCount::Manual(n) => n.get(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Maximum number of nested shading calls per primary ray
    pub recursion_depth: u32,
    pub passes: NonZeroU32,
    pub worker_count: WorkerCount,
    /// Base seed of all random streams. Same seed gives the same image.
    pub seed: u64,
    /// Samples brighter than this (in any channel) are scaled down to it
    pub firefly_ceiling: Option<f32>,
    pub anti_alias: bool,
    pub pin_threads: bool,
}

#[bon]
impl RenderSettings {
    #[builder]
    pub fn new(
        width: u32,
        height: u32,
        #[builder(default = 8)] recursion_depth: u32,
        #[builder(default = NonZeroU32::MIN)] passes: NonZeroU32,
        #[builder(default = WorkerCount::Auto)] worker_count: WorkerCount,
        #[builder(default)] seed: u64,
        firefly_ceiling: Option<f32>,
        #[builder(default = true)] anti_alias: bool,
        #[builder(default)] pin_threads: bool,
    ) -> Self {
        RenderSettings {
            width,
            height,
            recursion_depth,
            passes,
            worker_count,
            seed,
            firefly_ceiling,
            anti_alias,
            pin_threads,
        }
    }

    pub(crate) fn check_size(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            Err(RenderError::EmptyImage {
                width: self.width,
                height: self.height,
            })
        } else {
            Ok(())
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Summary of a finished render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Number of complete passes in the image
    pub passes: u32,
    /// Rows whose rendering panicked, summed over passes. These are left black.
    pub rows_failed: u64,
    /// Non-finite samples replaced by black
    pub samples_discarded: u64,
    /// Samples scaled down to the firefly ceiling
    pub samples_clamped: u64,
    pub elapsed: Duration,
}

/// Averaged image together with the statistics of its passes.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub image: FloatImage,
    pub report: RenderReport,
}
