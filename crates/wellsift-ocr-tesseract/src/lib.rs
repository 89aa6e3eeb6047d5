use tesseract::Tesseract;

use wellsift_core::{BackendError, OcrEngine};

/// Tesseract-based implementation of [`OcrEngine`].
///
/// Handles are not thread-safe, so one is created per call; initialization
/// cost is negligible next to recognition itself.
pub struct TesseractEngine {
    language: String,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize_png(&self, png: &[u8]) -> Result<String, BackendError> {
        let tess = Tesseract::new(None, Some(&self.language))
            .map_err(|e| BackendError::Ocr(e.to_string()))?;
        // PSM 6: assume a single uniform block of text. Completion report
        // pages are dense forms; sparse-mode segmentation shreds them.
        let tess = tess
            .set_variable("tessedit_pageseg_mode", "6")
            .map_err(|e| BackendError::Ocr(e.to_string()))?;
        let mut tess = tess
            .set_image_from_mem(png)
            .map_err(|e| BackendError::Ocr(e.to_string()))?;
        tess.get_text().map_err(|e| BackendError::Ocr(e.to_string()))
    }
}
