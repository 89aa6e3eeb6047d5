use std::path::Path;

use mupdf::{Colorspace, Document, ImageFormat, Matrix, TextPageFlags};

use wellsift_core::{BackendError, PdfSource};

/// MuPDF-based implementation of [`PdfSource`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
#[derive(Default)]
pub struct MupdfSource;

impl MupdfSource {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<Document, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::Open("invalid path encoding".into()))?;
        Document::open(path_str).map_err(|e| BackendError::Open(e.to_string()))
    }
}

impl PdfSource for MupdfSource {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let document = Self::open(path)?;

        let mut pages_text = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::Extraction(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::Extraction(e.to_string()))?;

            // Block/line iteration keeps reading order stable on forms
            // with absolutely positioned fields.
            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        Ok(pages_text.join("\n"))
    }

    fn page_count(&self, path: &Path) -> Result<usize, BackendError> {
        let document = Self::open(path)?;
        let count = document
            .page_count()
            .map_err(|e| BackendError::Extraction(e.to_string()))?;
        Ok(count.max(0) as usize)
    }

    fn render_page_png(
        &self,
        path: &Path,
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, BackendError> {
        let document = Self::open(path)?;
        let page = document
            .load_page(page_index as i32)
            .map_err(|e| BackendError::Render(e.to_string()))?;

        // PDF user space is 72 dpi.
        let zoom = dpi as f32 / 72.0;
        let matrix = Matrix::new_scale(zoom, zoom);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 0.0, false)
            .map_err(|e| BackendError::Render(e.to_string()))?;

        let mut png = Vec::new();
        pixmap
            .write_to(&mut png, ImageFormat::PNG)
            .map_err(|e| BackendError::Render(e.to_string()))?;
        Ok(png)
    }
}
