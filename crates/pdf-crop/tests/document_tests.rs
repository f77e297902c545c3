use lopdf::{Dictionary, Document, Object, Stream};
use pdf_crop::*;
use std::path::Path;

fn create_test_pdf(num_pages: usize) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    doc.trailer.set("Root", catalog_id);

    doc
}

fn write_pdf(dir: &Path, name: &str, pages: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut doc = create_test_pdf(pages);
    doc.save(&path).unwrap();
    path
}

#[tokio::test]
async fn test_probe_counts_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "seven.pdf", 7);
    assert_eq!(probe_page_count(&path).await.unwrap(), 7);
}

#[tokio::test]
async fn test_probe_accepts_uppercase_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "SCAN.PDF", 2);
    assert_eq!(probe_page_count(&path).await.unwrap(), 2);
}

#[tokio::test]
async fn test_probe_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = probe_page_count(dir.path().join("nope.pdf")).await;
    assert!(matches!(result, Err(CropError::FileNotFound(_))));
}

#[tokio::test]
async fn test_probe_rejects_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not a pdf").unwrap();
    assert!(matches!(
        probe_page_count(&path).await,
        Err(CropError::NotAPdf(_))
    ));
}

#[tokio::test]
async fn test_probe_reports_garbage_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"this is not really a pdf").unwrap();
    assert!(matches!(
        probe_page_count(&path).await,
        Err(CropError::Pdf(_))
    ));
}
