use pdf_crop::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Renders blank 100x140-point pages; pages listed in `failing` error out
struct FakeRenderer {
    pages: usize,
    failing: Vec<usize>,
    slow_from: Option<(usize, Duration)>,
    rendered: AtomicUsize,
}

impl FakeRenderer {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            failing: Vec::new(),
            slow_from: None,
            rendered: AtomicUsize::new(0),
        }
    }
}

impl PageRenderer for FakeRenderer {
    fn page_count(&self, _path: &Path) -> Result<usize> {
        Ok(self.pages)
    }

    fn render_page(&self, _path: &Path, page_index: usize, zoom: f32) -> Result<RawBitmap> {
        self.rendered.fetch_add(1, Ordering::SeqCst);
        if let Some((first_slow, delay)) = self.slow_from {
            if page_index >= first_slow {
                std::thread::sleep(delay);
            }
        }
        if self.failing.contains(&page_index) {
            return Err(CropError::Render(format!("page {page_index} is corrupt")));
        }
        let width = (100.0 * zoom).round() as u32;
        let height = (140.0 * zoom).round() as u32;
        Ok(RawBitmap::blank(width, height))
    }
}

fn job(dir: &Path, pages: usize, margins: CropMargins, quality: Quality) -> ConversionJob {
    let options = ConversionOptions {
        margins,
        quality,
        ..Default::default()
    };
    ConversionJob::new(dir.join("scan.pdf"), pages, &options, dir)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_converts_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path(), 4, CropMargins::new(10, 20, 30, 40), Quality::Original);
    let runner = Arc::new(InProcessRunner::new(FakeRenderer::new(4)));
    let pool = WorkerPool::new(2);
    let mut progress = Vec::new();

    let report = run_conversion(&job, runner, &pool, &CancelToken::new(), |p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);
    assert_eq!(report.output_dir, dir.path().join("scan"));
    assert_eq!(
        progress.iter().map(|p| p.completed).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert!(progress.iter().all(|p| p.total == 4));

    for n in 1..=4 {
        let path = dir.path().join("scan").join(format!("page{n}.png"));
        let image = image::open(&path).unwrap();
        // 100x140 at zoom 1.0 minus the margins
        assert_eq!((image.width(), image.height()), (60, 80));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_margins_are_render_pixels() {
    // 150 DPI margins applied unchanged to a 300 DPI render
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path(), 1, CropMargins::new(50, 0, 50, 0), Quality::High);
    let runner = Arc::new(InProcessRunner::new(FakeRenderer::new(1)));
    let pool = WorkerPool::new(1);

    run_conversion(&job, runner, &pool, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    let image = image::open(dir.path().join("scan/page1.png")).unwrap();
    let full_width = (100.0_f32 * 300.0 / 72.0).round() as u32;
    assert_eq!(image.width(), full_width - 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_page_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path(), 5, CropMargins::default(), Quality::Original);
    let mut renderer = FakeRenderer::new(5);
    renderer.failing = vec![1, 3];
    let runner = Arc::new(InProcessRunner::new(renderer));
    let pool = WorkerPool::new(2);

    let report = run_conversion(&job, runner, &pool, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.completed, 5);
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded(), 3);
    let written: Vec<PathBuf> = std::fs::read_dir(dir.path().join("scan"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(written.len(), 3);
    assert!(!dir.path().join("scan/page2.png").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_after_three_pages() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path(), 10, CropMargins::default(), Quality::Original);
    let mut renderer = FakeRenderer::new(10);
    renderer.slow_from = Some((3, Duration::from_millis(300)));
    let renderer = Arc::new(renderer);
    let runner = Arc::new(InProcessRunner::new(renderer.clone()));
    let pool = WorkerPool::new(1);
    let cancel = CancelToken::new();
    let mut seen = Vec::new();

    let started = Instant::now();
    let report = run_conversion(&job, runner, &pool, &cancel, |p| {
        seen.push(p.completed);
        if p.completed == 3 {
            cancel.cancel();
        }
    })
    .await
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.completed, 3);
    assert_eq!(seen, vec![1, 2, 3]);
    // Returned without sitting through the seven slow pages
    assert!(started.elapsed() < Duration::from_millis(1500));
    // At most the page that was already running when the stop came in
    assert!(renderer.rendered.load(Ordering::SeqCst) <= 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_while_waiting_on_a_page() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path(), 3, CropMargins::default(), Quality::Original);
    let mut renderer = FakeRenderer::new(3);
    renderer.slow_from = Some((0, Duration::from_millis(400)));
    let runner = Arc::new(InProcessRunner::new(renderer));
    let pool = WorkerPool::new(1);
    let cancel = CancelToken::new();

    let stopper = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let report = run_conversion(&job, runner, &pool, &cancel, |_| {})
        .await
        .unwrap();
    stopper.await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.completed, 0);
    assert!(started.elapsed() < Duration::from_millis(350));
}
