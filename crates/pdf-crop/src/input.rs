//! Validation at the UI boundary
//!
//! Everything typed, dropped or picked by the user passes through here before
//! it reaches the crop geometry, which only ever sees clean integers.

use crate::types::*;
use encoding_rs::GBK;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Parse a margin field. Anything that is not a non-negative integer becomes 0.
pub fn parse_margin(text: &str) -> u32 {
    text.trim().parse::<u32>().unwrap_or(0)
}

/// Parse all four margin fields at once
pub fn parse_margins(left: &str, top: &str, right: &str, bottom: &str) -> CropMargins {
    CropMargins::new(
        parse_margin(left),
        parse_margin(top),
        parse_margin(right),
        parse_margin(bottom),
    )
}

/// Add `delta` to a margin, flooring at 0
pub fn adjust_margin(value: u32, delta: i64) -> u32 {
    (value as i64 + delta).clamp(0, u32::MAX as i64) as u32
}

/// Parse a 1-based page number into a 0-based index
pub fn parse_page_number(text: &str, page_count: usize) -> Result<usize> {
    let page: i64 = text
        .trim()
        .parse()
        .map_err(|_| CropError::InvalidInput(format!("'{}' is not a page number", text.trim())))?;
    if page < 1 || page as u64 > page_count as u64 {
        return Err(CropError::PageIndexOutOfRange {
            page: page.max(0) as usize,
            count: page_count,
        });
    }
    Ok(page as usize - 1)
}

/// Decode a path that arrived as raw bytes, such as a drop payload or a
/// legacy file list.
///
/// Tries UTF-8 first, then GBK (what Chinese-locale Windows shells hand out),
/// then falls back to lossy UTF-8.
pub fn decode_dropped_path(raw: &[u8]) -> PathBuf {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => GBK
            .decode_without_bom_handling_and_without_replacement(raw)
            .unwrap_or_else(|| String::from_utf8_lossy(raw)),
    };
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    PathBuf::from(trimmed)
}

/// Accept a dropped path as the windowing system delivered it.
///
/// The path is used unchanged when it names a PDF. Only when nothing exists
/// there are its bytes re-decoded, for sources that hand over GBK names to a
/// UTF-8 file system.
pub fn resolve_dropped_path(path: &Path) -> Result<PathBuf> {
    match validate_pdf_path(path) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(CropError::FileNotFound(_)) => {
            let decoded = decode_dropped_path(path.as_os_str().as_encoded_bytes());
            if decoded.as_path() != path && validate_pdf_path(&decoded).is_ok() {
                log::debug!("Re-decoded dropped path as {}", decoded.display());
                Ok(decoded)
            } else {
                Err(CropError::FileNotFound(path.to_path_buf()))
            }
        }
        Err(e) => Err(e),
    }
}

/// Whether the path names a `.pdf` file, ignoring case
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Accept only existing files with a `.pdf` extension
pub fn validate_pdf_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(CropError::FileNotFound(path.to_path_buf()));
    }
    if !has_pdf_extension(path) {
        return Err(CropError::NotAPdf(path.to_path_buf()));
    }
    Ok(())
}

/// Output directory suggested when the user has not chosen one
pub fn default_output_dir(pdf: &Path) -> Option<PathBuf> {
    pdf.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// `<base>/<pdf file stem>`, the folder a conversion writes its pages into
pub fn conversion_output_dir(base: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    base.join(stem)
}
