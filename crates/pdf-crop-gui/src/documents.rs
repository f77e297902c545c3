use pdf_async_runtime::DocumentId;
use pdf_crop::PreviewImage;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Preview renders are ~8 MB each at 150 DPI, so only a handful are kept
const MAX_CACHED_PREVIEWS: usize = 12;

pub struct OpenDocument {
    pub path: PathBuf,
    pub page_count: usize,
}

/// Documents known to the worker plus an LRU cache of their preview renders
pub struct DocumentStore {
    documents: HashMap<DocumentId, OpenDocument>,
    preview_cache: HashMap<(DocumentId, usize), PreviewImage>,
    cache_order: VecDeque<(DocumentId, usize)>,
    next_doc_id: AtomicU64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            preview_cache: HashMap::new(),
            cache_order: VecDeque::new(),
            next_doc_id: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> DocumentId {
        DocumentId(self.next_doc_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn add_document(&mut self, doc_id: DocumentId, path: PathBuf, page_count: usize) {
        self.documents
            .insert(doc_id, OpenDocument { path, page_count });
    }

    pub fn get_document(&self, doc_id: &DocumentId) -> Option<&OpenDocument> {
        self.documents.get(doc_id)
    }

    pub fn add_to_cache(&mut self, key: (DocumentId, usize), image: PreviewImage) {
        if self.preview_cache.contains_key(&key) {
            self.cache_order.retain(|k| k != &key);
        }

        while self.cache_order.len() >= MAX_CACHED_PREVIEWS {
            if let Some(old_key) = self.cache_order.pop_front() {
                self.preview_cache.remove(&old_key);
            }
        }

        self.preview_cache.insert(key, image);
        self.cache_order.push_back(key);
    }

    pub fn get_from_cache(&mut self, key: &(DocumentId, usize)) -> Option<&PreviewImage> {
        if self.preview_cache.contains_key(key) {
            self.cache_order.retain(|k| k != key);
            self.cache_order.push_back(*key);
            self.preview_cache.get(key)
        } else {
            None
        }
    }

    pub fn remove_document(&mut self, doc_id: DocumentId) {
        self.documents.remove(&doc_id);
        self.cache_order.retain(|(id, _)| *id != doc_id);
        self.preview_cache.retain(|(id, _), _| *id != doc_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_crop::RawBitmap;
    use std::path::Path;

    fn preview(page: usize) -> PreviewImage {
        PreviewImage::new(page, RawBitmap::blank(2, 2))
    }

    #[test]
    fn test_ids_are_unique() {
        let store = DocumentStore::new();
        assert_ne!(store.next_id(), store.next_id());
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let mut store = DocumentStore::new();
        let doc = store.next_id();
        for page in 0..MAX_CACHED_PREVIEWS {
            store.add_to_cache((doc, page), preview(page));
        }
        // Touch page 0 so page 1 becomes the oldest
        assert!(store.get_from_cache(&(doc, 0)).is_some());
        store.add_to_cache((doc, MAX_CACHED_PREVIEWS), preview(MAX_CACHED_PREVIEWS));

        assert!(store.get_from_cache(&(doc, 0)).is_some());
        assert!(store.get_from_cache(&(doc, 1)).is_none());
        assert!(store.get_from_cache(&(doc, MAX_CACHED_PREVIEWS)).is_some());
    }

    #[test]
    fn test_remove_document_drops_its_previews() {
        let mut store = DocumentStore::new();
        let a = store.next_id();
        let b = store.next_id();
        store.add_document(a, PathBuf::from("a.pdf"), 3);
        store.add_document(b, PathBuf::from("b.pdf"), 1);
        store.add_to_cache((a, 0), preview(0));
        store.add_to_cache((b, 0), preview(0));

        store.remove_document(a);

        assert!(store.get_document(&a).is_none());
        assert!(store.get_from_cache(&(a, 0)).is_none());
        assert_eq!(
            store.get_document(&b).map(|d| d.path.as_path()),
            Some(Path::new("b.pdf"))
        );
        assert!(store.get_from_cache(&(b, 0)).is_some());
    }
}
