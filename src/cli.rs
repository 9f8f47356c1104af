use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use csgtrace::{RenderSettings, WorkerCount, demo, render, start_preview};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DemoScene {
    Lens,
    Dice,
    Soft,
}

/// Render one of the built-in CSG scenes to an image file
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(short, long, default_value_t = 640)]
    width: u32,
    #[arg(short = 'H', long, default_value_t = 480)]
    height: u32,
    /// Maximum shading recursion depth
    #[arg(short, long, default_value_t = 8)]
    recursion: u32,
    #[arg(short, long, default_value = "16")]
    passes: NonZeroU32,
    /// Worker threads, one per CPU when omitted
    #[arg(short, long)]
    threads: Option<NonZeroUsize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Clamp the brightest channel of each sample to this value
    #[arg(long)]
    firefly_ceiling: Option<f32>,
    /// Sample pixel centers only
    #[arg(long)]
    no_aa: bool,
    /// Pin worker threads to CPU cores
    #[arg(long)]
    pin_threads: bool,
    #[arg(long, value_enum, default_value_t = DemoScene::Dice)]
    scene: DemoScene,
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,
    /// Keep rewriting the output every N seconds while the passes accumulate
    #[arg(long)]
    preview_seconds: Option<f64>,
}

impl Args {
    fn settings(&self) -> RenderSettings {
        RenderSettings::builder()
            .width(self.width)
            .height(self.height)
            .recursion_depth(self.recursion)
            .passes(self.passes)
            .worker_count(self.threads.map_or(WorkerCount::Auto, WorkerCount::Manual))
            .seed(self.seed)
            .maybe_firefly_ceiling(self.firefly_ceiling)
            .anti_alias(!self.no_aa)
            .pin_threads(self.pin_threads)
            .build()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let demo = match args.scene {
        DemoScene::Lens => demo::lens(),
        DemoScene::Dice => demo::dice(),
        DemoScene::Soft => demo::soft(),
    };
    let settings = args.settings();
    log::info!(
        "Rendering {:?} at {}x{}, {} passes on {} threads",
        args.scene,
        settings.width,
        settings.height,
        settings.passes,
        settings.worker_count.get()
    );

    let bar = ProgressBar::new(settings.passes.get() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} {bar:40} {pos}/{len} passes, {elapsed}")
            .context("Bad progress template")?,
    );

    let rendered = if let Some(seconds) = args.preview_seconds {
        let interval = Duration::try_from_secs_f64(seconds).context("Invalid preview interval")?;
        let preview = start_preview(
            Arc::new(demo.scene),
            demo.camera,
            settings.clone(),
            Some(settings.passes),
        )?;

        let mut last_save = Instant::now();
        while !preview.is_finished() {
            thread::sleep(Duration::from_millis(50));
            bar.set_position(preview.passes() as u64);
            if last_save.elapsed() >= interval {
                if let Some(snapshot) = preview.snapshot() {
                    snapshot
                        .save(&args.output)
                        .with_context(|| format!("Writing {}", args.output.display()))?;
                }
                last_save = Instant::now();
            }
        }
        preview.wait()?
    } else {
        bar.enable_steady_tick(Duration::from_millis(200));
        render(&demo.scene, &demo.camera, &settings)?
    };
    bar.set_position(rendered.report.passes as u64);
    bar.finish();

    rendered
        .image
        .save(&args.output)
        .with_context(|| format!("Writing {}", args.output.display()))?;
    log::info!("Saved {} ({:?})", args.output.display(), rendered.report);

    Ok(())
}
