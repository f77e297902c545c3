//! Batch conversion: one render-and-crop task per page

use crate::cancel::CancelToken;
use crate::constants::page_file_name;
use crate::input::conversion_output_dir;
use crate::options::ConversionOptions;
use crate::pool::{PoolError, WorkerPool};
use crate::render::{PageRenderer, crop_bitmap, save_png};
use crate::types::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Everything a conversion needs, fixed for its whole run
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub total_pages: usize,
    pub zoom: f32,
    pub margins: CropMargins,
    /// Folder the pages are written into (already includes the PDF stem)
    pub output_dir: PathBuf,
}

impl ConversionJob {
    /// Build a job from user options. `base_dir` is the directory the user
    /// chose; pages land in `<base_dir>/<pdf stem>/`.
    pub fn new(
        source: impl Into<PathBuf>,
        total_pages: usize,
        options: &ConversionOptions,
        base_dir: &Path,
    ) -> Self {
        let source = source.into();
        let output_dir = conversion_output_dir(base_dir, &source);
        Self {
            source,
            total_pages,
            zoom: options.quality.zoom(),
            margins: options.effective_margins(),
            output_dir,
        }
    }

    pub fn page_output_path(&self, page_index: usize) -> PathBuf {
        self.output_dir.join(page_file_name(page_index))
    }

    pub fn page_task(&self, page_index: usize) -> PageTask {
        PageTask {
            source: self.source.clone(),
            page_index,
            zoom: self.zoom,
            margins: self.margins,
            output_path: self.page_output_path(page_index),
        }
    }
}

/// Render, crop and write a single page
#[derive(Debug, Clone, PartialEq)]
pub struct PageTask {
    pub source: PathBuf,
    pub page_index: usize,
    pub zoom: f32,
    pub margins: CropMargins,
    pub output_path: PathBuf,
}

impl PageTask {
    /// Run the task against a rasteriser in this process
    pub fn run_with(&self, renderer: &dyn PageRenderer) -> Result<()> {
        let bitmap = renderer.render_page(&self.source, self.page_index, self.zoom)?;
        let cropped = crop_bitmap(bitmap, self.margins)?;
        save_png(&cropped, &self.output_path)
    }
}

/// Executes page tasks on a pool worker. Implementations block.
pub trait PageRunner: Send + Sync + 'static {
    fn run(&self, task: &PageTask) -> Result<()>;
}

/// Renders inside the current process, one document handle per task
pub struct InProcessRunner<R> {
    renderer: R,
}

impl<R: PageRenderer + 'static> InProcessRunner<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }
}

impl<R: PageRenderer + 'static> PageRunner for InProcessRunner<R> {
    fn run(&self, task: &PageTask) -> Result<()> {
        task.run_with(&self.renderer)
    }
}

/// Renders each page in a separate OS process by invoking
/// `<program> render-page ...`, so the rasteriser never shares a process
/// with another page.
pub struct SubprocessRunner {
    program: PathBuf,
}

impl SubprocessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use the running executable as the worker program
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    pub fn command(&self, task: &PageTask) -> Command {
        let m = task.margins;
        let mut command = Command::new(&self.program);
        command
            .arg("render-page")
            .arg("--input")
            .arg(&task.source)
            .arg("--page-index")
            .arg(task.page_index.to_string())
            .arg("--zoom")
            .arg(task.zoom.to_string())
            .arg("--crop")
            .arg(format!("{},{},{},{}", m.left, m.top, m.right, m.bottom))
            .arg("--output")
            .arg(&task.output_path);
        command
    }
}

impl PageRunner for SubprocessRunner {
    fn run(&self, task: &PageTask) -> Result<()> {
        let output = self.command(task).output()?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(CropError::Render(format!(
                "worker for page {} exited with {}: {}",
                task.page_index + 1,
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// Progress after each finished page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionProgress {
    pub completed: usize,
    pub total: usize,
}

impl ConversionProgress {
    pub fn fraction(&self) -> f32 {
        self.completed as f32 / self.total.max(1) as f32
    }
}

/// Outcome of a conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// Pages whose result was collected, failed ones included
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub cancelled: bool,
    pub output_dir: PathBuf,
}

impl ConversionReport {
    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }
}

/// Convert every page of `job` using `pool`.
///
/// Results are collected in page order and `on_progress` fires after each.
/// `cancel` is checked before, and raced against, every wait; once it fires,
/// queued pages are dropped and the call returns without waiting for pages
/// already rendering. A failing page is logged and counted, never fatal.
pub async fn run_conversion<P, F>(
    job: &ConversionJob,
    runner: Arc<P>,
    pool: &WorkerPool,
    cancel: &CancelToken,
    mut on_progress: F,
) -> Result<ConversionReport>
where
    P: PageRunner + ?Sized,
    F: FnMut(ConversionProgress),
{
    tokio::fs::create_dir_all(&job.output_dir).await?;
    log::info!(
        "Converting {} pages of {} into {} using {} workers",
        job.total_pages,
        job.source.display(),
        job.output_dir.display(),
        pool.workers()
    );

    let handles: Vec<_> = (0..job.total_pages)
        .map(|page_index| {
            let task = job.page_task(page_index);
            let runner = runner.clone();
            pool.submit(move || runner.run(&task))
        })
        .collect();

    let mut report = ConversionReport {
        completed: 0,
        failed: 0,
        total: job.total_pages,
        cancelled: false,
        output_dir: job.output_dir.clone(),
    };

    for (page_index, handle) in handles.into_iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            outcome = handle => outcome,
        };

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                report.failed += 1;
                log::error!("Page {} failed: {}", page_index + 1, e);
            }
            Err(PoolError::Cancelled) => {
                report.cancelled = true;
                break;
            }
            Err(e) => {
                report.failed += 1;
                log::error!("Page {} failed: {}", page_index + 1, e);
            }
        }

        report.completed += 1;
        on_progress(ConversionProgress {
            completed: report.completed,
            total: job.total_pages,
        });
    }

    if report.cancelled {
        log::info!(
            "Conversion stopped after {}/{} pages",
            report.completed,
            report.total
        );
        pool.shutdown(false, true).await;
    } else {
        pool.shutdown(true, false).await;
        log::info!(
            "Converted {}/{} pages ({} failed)",
            report.succeeded(),
            report.total,
            report.failed
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{MarginScaling, Quality};

    #[test]
    fn test_job_paths_and_zoom() {
        let options = ConversionOptions {
            margins: CropMargins::new(10, 10, 10, 10),
            quality: Quality::High,
            margin_scaling: MarginScaling::NormalizeToDpi,
            ..Default::default()
        };
        let job = ConversionJob::new("/docs/book.pdf", 3, &options, Path::new("/out"));
        assert_eq!(job.output_dir, PathBuf::from("/out/book"));
        assert_eq!(job.page_output_path(0), PathBuf::from("/out/book/page1.png"));
        assert_eq!(job.margins, CropMargins::new(20, 20, 20, 20));
        assert!((job.zoom - 300.0 / 72.0).abs() < 1e-6);
    }

    #[test]
    fn test_subprocess_command_line() {
        let runner = SubprocessRunner::new("/usr/bin/pdfcrop");
        let task = PageTask {
            source: PathBuf::from("in.pdf"),
            page_index: 4,
            zoom: 2.0,
            margins: CropMargins::new(1, 2, 3, 4),
            output_path: PathBuf::from("out/page5.png"),
        };
        let command = runner.command(&task);
        let args: Vec<_> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "render-page",
                "--input",
                "in.pdf",
                "--page-index",
                "4",
                "--zoom",
                "2",
                "--crop",
                "1,2,3,4",
                "--output",
                "out/page5.png",
            ]
        );
    }
}
