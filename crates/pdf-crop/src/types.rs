use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Not a PDF file: {}", .0.display())]
    NotAPdf(PathBuf),
    #[error("Page {page} is out of range (1-{count})")]
    PageIndexOutOfRange { page: usize, count: usize },
    #[error("Render failed: {0}")]
    Render(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CropError>;

/// Pixel dimensions of a raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A pointer position in display coordinates, relative to the image origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One side of the crop window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Top,
    Right,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Top, Side::Right, Side::Bottom];

    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Top => "Top",
            Side::Right => "Right",
            Side::Bottom => "Bottom",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
        }
    }
}

/// Crop margins in source-image pixels, measured inward from each edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CropMargins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropMargins {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Same margin on every side
    pub fn uniform(margin: u32) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
        }
    }

    pub fn set(&mut self, side: Side, value: u32) {
        match side {
            Side::Left => self.left = value,
            Side::Top => self.top = value,
            Side::Right => self.right = value,
            Side::Bottom => self.bottom = value,
        }
    }

    /// Multiply every margin by `factor`, rounding to the nearest pixel
    pub fn scaled(&self, factor: f32) -> Self {
        let scale = |v: u32| (v as f32 * factor).round().max(0.0) as u32;
        Self::new(
            scale(self.left),
            scale(self.top),
            scale(self.right),
            scale(self.bottom),
        )
    }

    /// Pull `side` in so that at least `min_size` pixels remain against the
    /// opposite margin. The opposite margin is left alone.
    pub fn clamp_side(&mut self, side: Side, size: ImageSize, min_size: u32) {
        let extent = match side {
            Side::Left | Side::Right => size.width,
            Side::Top | Side::Bottom => size.height,
        };
        let upper = extent
            .saturating_sub(self.get(side.opposite()))
            .saturating_sub(min_size);
        self.set(side, self.get(side).min(upper));
    }

    /// Whether the margins leave at least `min_size` pixels on both axes
    pub fn fits(&self, size: ImageSize, min_size: u32) -> bool {
        let horizontal = self.left as u64 + self.right as u64 + min_size as u64;
        let vertical = self.top as u64 + self.bottom as u64 + min_size as u64;
        horizontal <= size.width as u64 && vertical <= size.height as u64
    }
}
