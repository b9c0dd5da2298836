//! Centroid training entry point.
//!
//! Creates the output tree (`output/data`, `output/logs`), runs
//! [`generate_centroids`] and writes the diagnostic logs. With no flags it
//! trains with built-in defaults; `--config` points at a YAML parameter
//! file, `--output-dir` relocates the output tree and `--threads` caps the
//! worker pool. Exits 0 on success, non-zero with a line on stderr
//! otherwise.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use clap::Parser;
use hand_abstraction_core::abstraction::{diagnostics, TrainProgress};
use hand_abstraction_core::{generate_centroids, AbstractionConfig, Street};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "abstraction-trainer")]
#[command(about = "Train and persist the hand-abstraction centroid store")]
struct Cli {
    /// Path to a YAML parameter file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the output tree; data and logs land beneath it.
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Worker thread count (default: all cores).
    #[arg(short, long)]
    threads: Option<usize>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AbstractionConfig::load(path)?,
        None => AbstractionConfig::default(),
    };
    if cli.config.is_none() {
        // Keep the default store location inside the chosen output tree.
        config.store_path = cli.output_dir.join("data").join("centroids.dat");
    }

    let logs_dir = cli.output_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;
    if let Some(data_dir) = config.store_path.parent() {
        std::fs::create_dir_all(data_dir)?;
    }

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let started = Instant::now();
    let renderer = ProgressRenderer::default();
    let report = generate_centroids(&config, &|progress| renderer.render(progress))?;
    renderer.finish();

    std::fs::write(logs_dir.join("kmeans_log.txt"), diagnostics::kmeans_log(&report))?;
    std::fs::write(
        logs_dir.join("data_distribution_report.txt"),
        diagnostics::distribution_report(&report),
    )?;

    for street in &report.streets {
        println!(
            "{:>5}: {} samples -> {} centroids in {} iterations (reseeds {}, converged {})",
            street.street.name(),
            street.samples,
            street.centroid_count,
            street.iterations.len(),
            street.reseed_total,
            street.converged,
        );
    }
    println!(
        "centroid store written to {} in {:.1}s",
        config.store_path.display(),
        started.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Turns the pipeline's progress callbacks into one indicatif bar per
/// sampling phase. Callbacks arrive from worker threads, hence the mutex.
#[derive(Default)]
struct ProgressRenderer {
    active: Mutex<Option<(Street, ProgressBar)>>,
}

impl ProgressRenderer {
    #[allow(clippy::cast_precision_loss)]
    fn render(&self, progress: TrainProgress) {
        match progress {
            TrainProgress::Sampling { street, done, total } => {
                // Position updates are cheap but not free; thin them out.
                if done % 128 != 0 && done != total && done != 0 {
                    return;
                }
                let mut guard = self.active.lock().expect("progress mutex");
                let stale = !matches!(&*guard, Some((current, _)) if *current == street);
                if stale {
                    if let Some((_, bar)) = guard.take() {
                        bar.finish();
                    }
                    let bar = ProgressBar::new(total as u64);
                    bar.set_style(
                        ProgressStyle::with_template(
                            "{msg:>6} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                        )
                        .expect("progress template")
                        .progress_chars("=>-"),
                    );
                    bar.set_message(street.name());
                    *guard = Some((street, bar));
                }
                if let Some((_, bar)) = &*guard {
                    bar.set_position(done as u64);
                }
            }
            TrainProgress::Clustering { street } => {
                if let Some((_, bar)) = self.active.lock().expect("progress mutex").take() {
                    bar.finish();
                }
                eprintln!("clustering {}...", street.name());
            }
            TrainProgress::Persisting => {
                if let Some((_, bar)) = self.active.lock().expect("progress mutex").take() {
                    bar.finish();
                }
            }
        }
    }

    fn finish(&self) {
        if let Some((_, bar)) = self.active.lock().expect("progress mutex").take() {
            bar.finish();
        }
    }
}
