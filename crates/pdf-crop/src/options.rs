use crate::constants::{PREVIEW_DPI, zoom_for_dpi};
use crate::types::*;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quality {
    /// 72 DPI, one pixel per PDF point
    Original,
    /// 150 DPI
    #[default]
    Standard,
    /// 300 DPI
    High,
    /// 600 DPI
    Ultra,
}

impl Quality {
    pub const ALL: [Quality; 4] = [
        Quality::Standard,
        Quality::High,
        Quality::Ultra,
        Quality::Original,
    ];

    pub fn dpi(self) -> u32 {
        match self {
            Quality::Original => 72,
            Quality::Standard => 150,
            Quality::High => 300,
            Quality::Ultra => 600,
        }
    }

    pub fn zoom(self) -> f32 {
        zoom_for_dpi(self.dpi())
    }

    pub fn from_dpi(dpi: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.dpi() == dpi)
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Original => "Original (72 DPI)",
            Quality::Standard => "Standard (150 DPI)",
            Quality::High => "High (300 DPI)",
            Quality::Ultra => "Ultra (600 DPI)",
        }
    }
}

/// How preview-calibrated margins are applied to the final render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarginScaling {
    /// Use the margins as pixel counts of the output render. At any quality
    /// other than 150 DPI this crops a different physical region than the
    /// preview showed.
    #[default]
    Raw,
    /// Rescale margins from the preview resolution to the output resolution
    NormalizeToDpi,
}

impl MarginScaling {
    /// Margins to apply to a render at `quality`
    pub fn apply(self, margins: CropMargins, quality: Quality) -> CropMargins {
        match self {
            MarginScaling::Raw => margins,
            MarginScaling::NormalizeToDpi => {
                margins.scaled(quality.dpi() as f32 / PREVIEW_DPI as f32)
            }
        }
    }
}

/// User-facing conversion settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConversionOptions {
    pub margins: CropMargins,
    pub quality: Quality,
    pub margin_scaling: MarginScaling,
    /// Base directory; pages go into `<output_dir>/<pdf stem>/`
    pub output_dir: Option<PathBuf>,
    /// 1-based page shown when the preview opens
    pub preview_page: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            margins: CropMargins::default(),
            quality: Quality::default(),
            margin_scaling: MarginScaling::default(),
            output_dir: None,
            preview_page: 1,
        }
    }
}

impl ConversionOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| CropError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CropError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Margins the converter should cut from each full-resolution page
    pub fn effective_margins(&self) -> CropMargins {
        self.margin_scaling.apply(self.margins, self.quality)
    }

    pub fn validate(&self) -> Result<()> {
        if self.preview_page == 0 {
            return Err(CropError::Config(
                "Preview page numbers start at 1".to_string(),
            ));
        }
        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(CropError::Config("Output directory is empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_zoom() {
        assert_eq!(Quality::Original.zoom(), 1.0);
        assert!((Quality::Standard.zoom() - 150.0 / 72.0).abs() < 1e-6);
        assert!((Quality::Ultra.zoom() - 600.0 / 72.0).abs() < 1e-6);
        assert_eq!(Quality::from_dpi(300), Some(Quality::High));
        assert_eq!(Quality::from_dpi(96), None);
    }

    #[test]
    fn test_raw_margins_pass_through() {
        let options = ConversionOptions {
            margins: CropMargins::new(10, 20, 30, 40),
            quality: Quality::Ultra,
            ..Default::default()
        };
        assert_eq!(options.effective_margins(), CropMargins::new(10, 20, 30, 40));
    }

    #[test]
    fn test_normalized_margins_follow_dpi() {
        let options = ConversionOptions {
            margins: CropMargins::new(10, 20, 30, 45),
            quality: Quality::High,
            margin_scaling: MarginScaling::NormalizeToDpi,
            ..Default::default()
        };
        assert_eq!(options.effective_margins(), CropMargins::new(20, 40, 60, 90));

        let draft = ConversionOptions {
            quality: Quality::Original,
            ..options
        };
        assert_eq!(draft.effective_margins(), CropMargins::new(5, 10, 14, 22));
    }

    #[test]
    fn test_validate() {
        assert!(ConversionOptions::default().validate().is_ok());
        let options = ConversionOptions {
            preview_page: 0,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(CropError::Config(_))));
    }
}
