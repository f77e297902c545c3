use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::{Env, Target};
use pdf_crop::constants::{MAX_WORKERS, PREVIEW_DPI, default_worker_count, zoom_for_dpi};
use pdf_crop::{
    CancelToken, ConversionJob, ConversionOptions, CropMargins, MarginScaling, PageRunner,
    PageTask, Quality, SubprocessRunner, WorkerPool, input, run_conversion,
};
use std::path::PathBuf;
use std::sync::Arc;


#[derive(Parser)]
#[command(name = "pdfcrop", about = "Convert PDF pages into cropped PNG images", version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the page count of a PDF
    Info {
        /// Input PDF file
        input: PathBuf,
    },

    /// Render every page, crop it and write page<N>.png files
    Convert {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Base output folder; pages go into <output>/<pdf name>/
        /// (defaults to the folder of the PDF)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output resolution
        #[arg(long, value_enum)]
        dpi: Option<DpiArg>,

        #[command(flatten)]
        margins: MarginArgs,

        /// Load settings from a JSON file saved by the desktop app
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rescale margins from the 150 DPI preview to the output resolution
        #[arg(long)]
        normalize_margins: bool,

        /// Pages rendered in parallel
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..=MAX_WORKERS as i64))]
        workers: Option<u16>,

        /// Render in this process instead of one worker process per page
        #[arg(long)]
        in_process: bool,
    },

    /// Write one page at preview resolution with the crop applied
    Preview {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: String,

        /// Output PNG file
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        margins: MarginArgs,

        /// Load margins from a JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a single page (used by `convert` for its worker processes)
    #[command(hide = true)]
    RenderPage {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        page_index: usize,

        #[arg(long)]
        zoom: f32,

        /// Margins as left,top,right,bottom
        #[arg(long, value_parser = parse_crop)]
        crop: CropMargins,

        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct MarginArgs {
    /// Left margin in pixels
    #[arg(long)]
    left: Option<u32>,

    /// Top margin in pixels
    #[arg(long)]
    top: Option<u32>,

    /// Right margin in pixels
    #[arg(long)]
    right: Option<u32>,

    /// Bottom margin in pixels
    #[arg(long)]
    bottom: Option<u32>,
}

impl MarginArgs {
    /// Override the given sides of `base`
    fn apply(&self, base: CropMargins) -> CropMargins {
        CropMargins {
            left: self.left.unwrap_or(base.left),
            top: self.top.unwrap_or(base.top),
            right: self.right.unwrap_or(base.right),
            bottom: self.bottom.unwrap_or(base.bottom),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DpiArg {
    #[value(name = "72")]
    Dpi72,
    #[value(name = "150")]
    Dpi150,
    #[value(name = "300")]
    Dpi300,
    #[value(name = "600")]
    Dpi600,
}

impl From<DpiArg> for Quality {
    fn from(arg: DpiArg) -> Self {
        match arg {
            DpiArg::Dpi72 => Self::Original,
            DpiArg::Dpi150 => Self::Standard,
            DpiArg::Dpi300 => Self::High,
            DpiArg::Dpi600 => Self::Ultra,
        }
    }
}

fn parse_crop(text: &str) -> std::result::Result<CropMargins, String> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid margin: {e}"))?;
    match values[..] {
        [left, top, right, bottom] => Ok(CropMargins::new(left, top, right, bottom)),
        _ => Err("expected four values: left,top,right,bottom".to_string()),
    }
}

async fn load_options(config: Option<&PathBuf>) -> Result<ConversionOptions> {
    match config {
        Some(path) => ConversionOptions::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ConversionOptions::default()),
    }
}

#[cfg(feature = "pdfium")]
fn in_process_runner() -> Result<Arc<dyn PageRunner>> {
    Ok(Arc::new(pdf_crop::InProcessRunner::new(
        pdf_crop::render::PdfiumRenderer,
    )))
}

#[cfg(not(feature = "pdfium"))]
fn in_process_runner() -> Result<Arc<dyn PageRunner>> {
    bail!("pdfcrop was built without PDFium; in-process rendering is unavailable")
}

#[cfg(feature = "pdfium")]
fn render_task(task: &PageTask) -> Result<()> {
    task.run_with(&pdf_crop::render::PdfiumRenderer)?;
    Ok(())
}

#[cfg(not(feature = "pdfium"))]
fn render_task(_task: &PageTask) -> Result<()> {
    bail!("pdfcrop was built without PDFium")
}

#[cfg(feature = "pdfium")]
fn render_preview(input: &std::path::Path, page_index: usize) -> Result<pdf_crop::RawBitmap> {
    use pdf_crop::PageRenderer;

    Ok(pdf_crop::render::PdfiumRenderer.render_page(
        input,
        page_index,
        zoom_for_dpi(PREVIEW_DPI),
    )?)
}

#[cfg(not(feature = "pdfium"))]
fn render_preview(_input: &std::path::Path, _page_index: usize) -> Result<pdf_crop::RawBitmap> {
    bail!("pdfcrop was built without PDFium")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let pages = pdf_crop::probe_page_count(&input).await?;
            println!("{}: {} pages", input.display(), pages);
        }

        Commands::Convert {
            input,
            output,
            dpi,
            margins,
            config,
            normalize_margins,
            workers,
            in_process,
        } => {
            input::validate_pdf_path(&input)?;

            let mut options = load_options(config.as_ref()).await?;
            options.margins = margins.apply(options.margins);
            if let Some(dpi) = dpi {
                options.quality = dpi.into();
            }
            if normalize_margins {
                options.margin_scaling = MarginScaling::NormalizeToDpi;
            }
            let base = output
                .or_else(|| options.output_dir.clone())
                .or_else(|| input::default_output_dir(&input))
                .unwrap_or_else(|| PathBuf::from("."));
            options.validate()?;

            let pages = pdf_crop::probe_page_count(&input).await?;
            let job = ConversionJob::new(&input, pages, &options, &base);
            println!(
                "Converting {} pages at {} DPI into {}",
                pages,
                options.quality.dpi(),
                job.output_dir.display()
            );

            let runner: Arc<dyn PageRunner> = if in_process {
                in_process_runner()?
            } else {
                Arc::new(SubprocessRunner::current_exe()?)
            };
            let workers = workers.map_or_else(default_worker_count, usize::from);
            let pool = WorkerPool::new(workers);

            let cancel = CancelToken::new();
            let stopper = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Stopping after the pages in progress...");
                    stopper.cancel();
                }
            });

            let report = run_conversion(&job, runner, &pool, &cancel, |progress| {
                println!("[{}/{}] pages done", progress.completed, progress.total);
            })
            .await?;

            if report.cancelled {
                println!(
                    "Stopped after {} of {} pages",
                    report.completed, report.total
                );
            } else {
                println!(
                    "Converted {} of {} pages → {}",
                    report.succeeded(),
                    report.total,
                    report.output_dir.display()
                );
            }
            if report.failed > 0 {
                bail!("{} pages failed to convert", report.failed);
            }
        }

        Commands::Preview {
            input,
            page,
            out,
            margins,
            config,
        } => {
            input::validate_pdf_path(&input)?;
            let options = load_options(config.as_ref()).await?;
            let crop = margins.apply(options.margins);

            let pages = pdf_crop::probe_page_count(&input).await?;
            let page_index = input::parse_page_number(&page, pages)?;

            let bitmap =
                tokio::task::spawn_blocking(move || render_preview(&input, page_index)).await??;
            let (width, height) = pdf_crop::cropped_size(crop, bitmap.size());
            let cropped = pdf_crop::render::crop_bitmap(bitmap, crop)?;
            pdf_crop::render::save_png(&cropped, &out)?;
            println!(
                "Page {} at {} DPI, selected {} x {} px → {}",
                page_index + 1,
                PREVIEW_DPI,
                width,
                height,
                out.display()
            );
        }

        Commands::RenderPage {
            input,
            page_index,
            zoom,
            crop,
            output,
        } => {
            let task = PageTask {
                source: input,
                page_index,
                zoom,
                margins: crop,
                output_path: output,
            };
            render_task(&task)
                .with_context(|| format!("Failed to render page {}", page_index + 1))?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for progress lines. `RUST_LOG` wins
/// over `--verbose` when set.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_logging_installs_once() {
        init_logging(true);
        // A second call must not panic on the already-set logger
        init_logging(false);
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(log::log_enabled!(log::Level::Debug));
        }
    }

    #[test]
    fn test_parse_crop() {
        assert_eq!(parse_crop("1,2,3,4"), Ok(CropMargins::new(1, 2, 3, 4)));
        assert_eq!(parse_crop(" 10, 0 ,5,0"), Ok(CropMargins::new(10, 0, 5, 0)));
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("1,2,3,-4").is_err());
    }

    #[test]
    fn test_convert_arguments() {
        let cli = Cli::try_parse_from([
            "pdfcrop", "convert", "-i", "book.pdf", "--dpi", "300", "--left", "40",
            "--workers", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                dpi,
                margins,
                workers,
                in_process,
                ..
            } => {
                assert_eq!(dpi.map(Quality::from), Some(Quality::High));
                assert_eq!(
                    margins.apply(CropMargins::uniform(5)),
                    CropMargins::new(40, 5, 5, 5)
                );
                assert_eq!(workers, Some(2));
                assert!(!in_process);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_rejects_unknown_dpi_and_too_many_workers() {
        assert!(Cli::try_parse_from(["pdfcrop", "convert", "-i", "a.pdf", "--dpi", "200"]).is_err());
        assert!(
            Cli::try_parse_from(["pdfcrop", "convert", "-i", "a.pdf", "--workers", "9"]).is_err()
        );
    }

    #[test]
    fn test_render_page_matches_worker_command_line() {
        let task = PageTask {
            source: PathBuf::from("in.pdf"),
            page_index: 2,
            zoom: 4.1666665,
            margins: CropMargins::new(1, 2, 3, 4),
            output_path: PathBuf::from("out/page3.png"),
        };
        let command = SubprocessRunner::new("pdfcrop").command(&task);
        let args = std::iter::once("pdfcrop".into()).chain(command.get_args().map(|a| a.to_owned()));

        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::RenderPage {
                input,
                page_index,
                zoom,
                crop,
                output,
            } => {
                let parsed = PageTask {
                    source: input,
                    page_index,
                    zoom,
                    margins: crop,
                    output_path: output,
                };
                assert_eq!(parsed, task);
            }
            _ => panic!("expected render-page"),
        }
    }
}
