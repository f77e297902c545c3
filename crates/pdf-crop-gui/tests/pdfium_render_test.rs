#[cfg(all(test, feature = "pdfium"))]
mod pdfium_render_tests {
    use pdf_crop::constants::{PREVIEW_DPI, zoom_for_dpi};
    use pdf_crop::render::{PdfiumRenderer, crop_bitmap, init_pdfium};
    use pdf_crop::{CropMargins, PageRenderer};

    /// One US-letter page with "Hello World" in Helvetica
    const SAMPLE_PDF: &[u8] = b"%PDF-1.4
1 0 obj
<<
/Type /Catalog
/Pages 2 0 R
>>
endobj
2 0 obj
<<
/Type /Pages
/Kids [3 0 R]
/Count 1
>>
endobj
3 0 obj
<<
/Type /Page
/Parent 2 0 R
/Resources <<
/Font <<
/F1 <<
/Type /Font
/Subtype /Type1
/BaseFont /Helvetica
>>
>>
>>
/MediaBox [0 0 612 792]
/Contents 4 0 R
>>
endobj
4 0 obj
<<
/Length 44
>>
stream
BT
/F1 24 Tf
100 700 Td
(Hello World) Tj
ET
endstream
endobj
xref
0 5
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000317 00000 n
trailer
<<
/Size 5
/Root 1 0 R
>>
startxref
410
%%EOF
";

    /// Write the sample to disk, or `None` when no PDFium library can be bound
    fn sample_on_disk(dir: &std::path::Path) -> Option<std::path::PathBuf> {
        if let Err(e) = init_pdfium() {
            eprintln!("skipping: PDFium not available ({e})");
            return None;
        }
        let path = dir.join("hello.pdf");
        std::fs::write(&path, SAMPLE_PDF).unwrap();
        Some(path)
    }

    #[test]
    fn test_renders_preview_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let Some(path) = sample_on_disk(dir.path()) else {
            return;
        };

        assert_eq!(PdfiumRenderer.page_count(&path).unwrap(), 1);

        let bitmap = PdfiumRenderer
            .render_page(&path, 0, zoom_for_dpi(PREVIEW_DPI))
            .unwrap();
        // 612x792 points at 150 DPI
        assert!((bitmap.width as i64 - 1275).abs() <= 1);
        assert!((bitmap.height as i64 - 1650).abs() <= 1);

        let non_white = bitmap
            .rgba
            .chunks_exact(4)
            .filter(|px| px[0] < 200)
            .count();
        assert!(non_white > 0, "rendered page should contain the text");
    }

    #[test]
    fn test_crop_full_resolution_render() {
        let dir = tempfile::tempdir().unwrap();
        let Some(path) = sample_on_disk(dir.path()) else {
            return;
        };

        let bitmap = PdfiumRenderer.render_page(&path, 0, 1.0).unwrap();
        let (width, height) = (bitmap.width, bitmap.height);
        let cropped = crop_bitmap(bitmap, CropMargins::new(100, 50, 100, 50)).unwrap();
        assert_eq!(cropped.width(), width - 200);
        assert_eq!(cropped.height(), height - 100);
    }

    #[test]
    fn test_page_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let Some(path) = sample_on_disk(dir.path()) else {
            return;
        };

        let result = PdfiumRenderer.render_page(&path, 3, 1.0);
        assert!(matches!(
            result,
            Err(pdf_crop::CropError::PageIndexOutOfRange { page: 4, count: 1 })
        ));
    }
}
