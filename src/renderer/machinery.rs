use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use log::{debug, error, info, warn};

use crate::{
    accumulator::FloatImage,
    camera::Camera,
    renderer::{RenderError, RenderReport, RenderSettings, Rendered, worker::Worker},
    scene::Scene,
    util::{BLACK, Color},
};

/// Outcome of a single pass over the image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PassStats {
    pub rows_rendered: u32,
    pub rows_failed: u32,
    pub samples_discarded: u64,
    pub samples_clamped: u64,
}

impl PassStats {
    fn merge(self, other: PassStats) -> PassStats {
        PassStats {
            rows_rendered: self.rows_rendered + other.rows_rendered,
            rows_failed: self.rows_failed + other.rows_failed,
            samples_discarded: self.samples_discarded + other.samples_discarded,
            samples_clamped: self.samples_clamped + other.samples_clamped,
        }
    }

    /// All rows were processed, the pass was not stopped early.
    pub fn is_complete(&self, settings: &RenderSettings) -> bool {
        self.rows_rendered == settings.height
    }
}

impl RenderReport {
    pub(crate) fn add_pass(&mut self, stats: &PassStats) {
        self.rows_failed += stats.rows_failed as u64;
        self.samples_discarded += stats.samples_discarded;
        self.samples_clamped += stats.samples_clamped;
    }
}

/// Renders a single pass with the settings' seed. Every pixel is sampled once.
pub fn render_single_pass(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    stop: Option<&AtomicBool>,
) -> Result<Rendered, RenderError> {
    settings.check_size()?;
    let start = Instant::now();
    let never = AtomicBool::new(false);

    let mut image = FloatImage::new(settings.width, settings.height);
    let stats = run_pass(scene, camera, settings, 0, &mut image, stop.unwrap_or(&never))?;

    let mut report = RenderReport {
        passes: u32::from(stats.is_complete(settings)),
        ..Default::default()
    };
    report.add_pass(&stats);
    report.elapsed = start.elapsed();
    Ok(Rendered { image, report })
}

/// Renders `settings.passes` independent passes and averages them.
///
/// Passes are summed in order, so the result for a given seed does not depend on
/// scheduling. If stopped, the average covers the completed passes only; a pass
/// interrupted before any pass completed is kept as is.
pub fn render_multi_pass(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    stop: Option<&AtomicBool>,
) -> Result<Rendered, RenderError> {
    settings.check_size()?;
    let start = Instant::now();
    let never = AtomicBool::new(false);
    let stop = stop.unwrap_or(&never);

    let mut sum = FloatImage::new(settings.width, settings.height);
    let mut pass_image = FloatImage::new(settings.width, settings.height);
    let mut report = RenderReport::default();

    for pass in 0..settings.passes.get() {
        let stats = run_pass(scene, camera, settings, pass, &mut pass_image, stop)?;
        report.add_pass(&stats);

        if stats.is_complete(settings) {
            sum.add(&pass_image);
            report.passes += 1;
        } else {
            if report.passes == 0 {
                sum = pass_image;
            }
            debug!("Stopped during pass {pass}");
            break;
        }
    }

    report.elapsed = start.elapsed();
    Ok(Rendered {
        image: sum.averaged(report.passes),
        report,
    })
}

/// Renders the scene with all passes given by the settings.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
) -> Result<Rendered, RenderError> {
    if settings.passes.get() == 1 {
        render_single_pass(scene, camera, settings, None)
    } else {
        render_multi_pass(scene, camera, settings, None)
    }
}

/// Runs one pass on a pool of worker threads, overwriting `target`.
///
/// Workers pop rows from a shared queue; each popped row is owned by that worker
/// until it is finished, so the pixels themselves are written without locking.
/// The stop flag is checked before every row.
pub(crate) fn run_pass(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    pass: u32,
    target: &mut FloatImage,
    stop: &AtomicBool,
) -> Result<PassStats, RenderError> {
    let start = Instant::now();
    target.fill(BLACK);

    let worker_count = settings.worker_count.get().clamp(1, settings.height as usize);
    let cores = if settings.pin_threads {
        core_affinity::get_core_ids().unwrap_or_default()
    } else {
        Vec::new()
    };

    let rows = Mutex::new(target.rows_mut().enumerate());

    let stats = thread::scope(|s| {
        let handles = (0..worker_count)
            .map(|worker_id| {
                let rows = &rows;
                let core = (!cores.is_empty()).then(|| cores[worker_id % cores.len()]);
                thread::Builder::new()
                    .name(format!("worker{worker_id}"))
                    .spawn_scoped(s, move || {
                        if let Some(core) = core {
                            if !core_affinity::set_for_current(core) {
                                debug!("Could not pin worker{worker_id} to core {}", core.id);
                            }
                        }

                        let mut worker = Worker::new(worker_id);
                        let mut stats = PassStats::default();
                        while !stop.load(Ordering::Relaxed) {
                            let next = rows.lock().unwrap_or_else(PoisonError::into_inner).next();
                            let Some((y, row)) = next else {
                                break;
                            };
                            stats = stats.merge(render_row_isolated(
                                &mut worker,
                                scene,
                                camera,
                                settings,
                                pass,
                                y as u32,
                                row,
                            ));
                        }
                        stats
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut total = PassStats::default();
        for handle in handles {
            match handle.join() {
                Ok(stats) => total = total.merge(stats),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        Ok::<_, RenderError>(total)
    })?;

    let elapsed = start.elapsed();
    let mpixels_per_second = settings.pixel_count() as f64 / elapsed.as_secs_f64().max(1e-9) / 1e6;
    info!("Pass {pass}: {elapsed:.2?}, {mpixels_per_second:.1} Mpixel/s");
    if stats.samples_discarded > 0 || stats.rows_failed > 0 {
        warn!(
            "Pass {pass}: {} non-finite samples discarded, {} rows failed",
            stats.samples_discarded, stats.rows_failed
        );
    }

    Ok(stats)
}

/// Renders a row, turning a panic into a black row.
fn render_row_isolated(
    worker: &mut Worker,
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    pass: u32,
    y: u32,
    row: &mut [Color],
) -> PassStats {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        worker.render_row(scene, camera, settings, pass, y, row)
    }));

    match result {
        Ok(samples) => PassStats {
            rows_rendered: 1,
            rows_failed: 0,
            samples_discarded: samples.discarded,
            samples_clamped: samples.clamped,
        },
        Err(payload) => {
            error!(
                "Worker {} failed on row {y} of pass {pass}: {}",
                worker.id(),
                panic_message(payload.as_ref())
            );
            row.fill(BLACK);
            PassStats {
                rows_rendered: 1,
                rows_failed: 1,
                ..Default::default()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
