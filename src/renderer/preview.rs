use std::{
    num::NonZeroU32,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use log::{debug, info};

use crate::{
    accumulator::FloatImage,
    camera::Camera,
    renderer::{RenderError, RenderReport, RenderSettings, Rendered, machinery::run_pass},
    scene::Scene,
};

/// Running sum of all finished passes.
struct Accumulated {
    sum: FloatImage,
    passes: u32,
}

struct PreviewState {
    accumulated: Mutex<Accumulated>,
    stop: AtomicBool,
}

impl PreviewState {
    fn lock(&self) -> std::sync::MutexGuard<'_, Accumulated> {
        self.accumulated.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Starts rendering passes in the background until aborted or until `pass_limit` passes are done.
///
/// Each pass is rendered into a private buffer and merged into the shared sum only
/// once it is complete, so snapshots always see whole passes.
pub fn start_preview(
    scene: Arc<Scene>,
    camera: Camera,
    settings: RenderSettings,
    pass_limit: Option<NonZeroU32>,
) -> Result<PreviewProgress, RenderError> {
    settings.check_size()?;

    let state = Arc::new(PreviewState {
        accumulated: Mutex::new(Accumulated {
            sum: FloatImage::new(settings.width, settings.height),
            passes: 0,
        }),
        stop: AtomicBool::new(false),
    });

    let coordinator = {
        let state = Arc::clone(&state);
        thread::Builder::new()
            .name("preview".to_string())
            .spawn(move || run_preview(&scene, &camera, &settings, pass_limit, &state))?
    };

    Ok(PreviewProgress {
        state,
        coordinator: Some(coordinator),
    })
}

fn run_preview(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    pass_limit: Option<NonZeroU32>,
    state: &PreviewState,
) -> Result<RenderReport, RenderError> {
    let start = Instant::now();
    let mut pass_image = FloatImage::new(settings.width, settings.height);
    let mut report = RenderReport::default();

    for pass in 0.. {
        let limit_reached = pass_limit.is_some_and(|limit| pass >= limit.get());
        if state.stop.load(Ordering::Relaxed) || limit_reached {
            break;
        }

        let stats = run_pass(scene, camera, settings, pass, &mut pass_image, &state.stop)?;
        report.add_pass(&stats);
        if !stats.is_complete(settings) {
            debug!("Preview stopped during pass {pass}");
            break;
        }

        let mut accumulated = state.lock();
        accumulated.sum.add(&pass_image);
        accumulated.passes += 1;
        report.passes = accumulated.passes;
    }

    report.elapsed = start.elapsed();
    info!("Preview finished after {} passes in {:.2?}", report.passes, report.elapsed);
    Ok(report)
}

/// Handle to a running preview.
pub struct PreviewProgress {
    state: Arc<PreviewState>,
    coordinator: Option<JoinHandle<Result<RenderReport, RenderError>>>,
}

impl PreviewProgress {
    /// Average of all passes finished so far, `None` before the first one.
    pub fn snapshot(&self) -> Option<FloatImage> {
        let accumulated = self.state.lock();
        debug!("Snapshot after {} passes", accumulated.passes);
        (accumulated.passes > 0).then(|| accumulated.sum.averaged(accumulated.passes))
    }

    /// Number of passes merged so far.
    pub fn passes(&self) -> u32 {
        self.state.lock().passes
    }

    /// Signal the preview to stop.
    /// The pass in progress is abandoned and not merged.
    pub fn abort(&self) {
        self.state.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.coordinator.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Waits for the preview to end and returns the final average.
    /// Without a pass limit this only returns after [`Self::abort`].
    pub fn wait(mut self) -> Result<Rendered, RenderError> {
        let mut report = match self.coordinator.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?,
            None => RenderReport::default(),
        };

        let accumulated = self.state.lock();
        report.passes = accumulated.passes;
        Ok(Rendered {
            image: accumulated.sum.averaged(accumulated.passes),
            report,
        })
    }
}

impl Drop for PreviewProgress {
    fn drop(&mut self) {
        self.abort();
    }
}
