use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use wellsift_core::{AcquisitionMethod, BackendError, OcrBatchPolicy, OcrEngine, PdfSource};
use wellsift_parsing::{extract_api, extract_coordinates, normalize_text, stimulation_signal};

/// Direct text shorter than this is treated as a scanned document with a
/// vestigial text layer (stamps, form chrome) and sent to OCR.
const DIRECT_TEXT_MIN_CHARS: usize = 400;

/// Normalized document text plus how it was obtained.
#[derive(Debug, Clone)]
pub struct AcquiredText {
    pub text: String,
    pub method: AcquisitionMethod,
}

/// Turns a PDF into normalized text, preferring the native text layer and
/// falling back to batched OCR with an early-completeness probe.
#[derive(Clone)]
pub struct TextAcquirer {
    source: Arc<dyn PdfSource>,
    ocr: Arc<dyn OcrEngine>,
    dpi: u32,
    initial_batch: usize,
}

impl TextAcquirer {
    pub fn new(source: Arc<dyn PdfSource>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            source,
            ocr,
            dpi: 225,
            initial_batch: OcrBatchPolicy::DEFAULT_PAGES,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_batch_pages(mut self, pages: usize) -> Self {
        self.initial_batch = pages;
        self
    }

    /// Acquire the text of `path`. Blocking; meant to run on a worker.
    ///
    /// Cancellation and the deadline are only honored between OCR batches,
    /// so a single batch is the granularity of interruption.
    pub fn acquire(
        &self,
        path: &Path,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> AcquiredText {
        let direct = match self.source.extract_text(path) {
            Ok(text) => normalize_text(&text),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "direct text extraction failed");
                String::new()
            }
        };

        if direct.trim().len() > DIRECT_TEXT_MIN_CHARS && extract_api(&direct).is_some() {
            debug!(path = %path.display(), chars = direct.len(), "accepted direct text layer");
            return AcquiredText {
                text: direct,
                method: AcquisitionMethod::Direct,
            };
        }

        let pages = match self.source.page_count(path) {
            Ok(pages) => pages,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "page count unavailable, skipping OCR");
                return AcquiredText {
                    text: direct,
                    method: AcquisitionMethod::Direct,
                };
            }
        };

        // OCR output is appended after whatever direct text exists; a thin
        // text layer can still carry the API number the form chrome prints.
        let mut raw = direct;
        let mut policy = OcrBatchPolicy::new(self.initial_batch);
        let mut ocr_any = false;
        let mut page = 0;

        while page < pages {
            if cancel.is_cancelled() {
                debug!(path = %path.display(), page, "cancelled between OCR batches");
                break;
            }
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                warn!(path = %path.display(), page, "document deadline hit, stopping OCR");
                break;
            }

            let end = (page + policy.pages()).min(pages);
            match self.ocr_batch(path, page, end) {
                Ok(batch_text) => {
                    raw.push('\n');
                    raw.push_str(&batch_text);
                    ocr_any = true;
                    page = end;

                    let text = normalize_text(&raw);
                    if acquisition_complete(&text) {
                        debug!(path = %path.display(), pages_done = page, "early stop: key fields present");
                        return AcquiredText {
                            text,
                            method: AcquisitionMethod::Ocr,
                        };
                    }
                }
                Err(err) => {
                    if policy.at_floor() {
                        warn!(
                            path = %path.display(),
                            start = page,
                            end,
                            error = %err,
                            "OCR batch failed at floor size, skipping range"
                        );
                        page = end;
                    } else {
                        policy = policy.shrink();
                        warn!(
                            path = %path.display(),
                            start = page,
                            error = %err,
                            retry_pages = policy.pages(),
                            "OCR batch failed, halving batch size"
                        );
                    }
                }
            }
        }

        let method = if ocr_any {
            AcquisitionMethod::Ocr
        } else {
            AcquisitionMethod::Direct
        };
        AcquiredText {
            text: normalize_text(&raw),
            method,
        }
    }

    fn ocr_batch(&self, path: &Path, start: usize, end: usize) -> Result<String, BackendError> {
        let mut out = String::new();
        for index in start..end {
            let png = self.source.render_page_png(path, index, self.dpi)?;
            let text = self.ocr.recognize_png(&png)?;
            out.push_str(&text);
            out.push('\n');
        }
        Ok(out)
    }
}

/// The three signals that together mean further pages cannot change the
/// record in a way QC cares about: an API number, a coordinate pair, and
/// some evidence of stimulation data.
fn acquisition_complete(text: &str) -> bool {
    extract_api(text).is_some() && extract_coordinates(text).is_some() && stimulation_signal(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COMPLETE_PAGE: &str = "WELL COMPLETION REPORT\n\
        API # 33-053-01234\n\
        Latitude: 47 12' 30\" N\n\
        Longitude: 102 5' 10\" W\n\
        Type Treatment: Sand Frac\n\
        Lbs Proppant: 2,500,000\n";

    struct MockSource {
        direct: String,
        pages: usize,
        fail_render: HashSet<usize>,
        render_calls: AtomicUsize,
    }

    impl MockSource {
        fn new(direct: &str, pages: usize) -> Self {
            Self {
                direct: direct.to_string(),
                pages,
                fail_render: HashSet::new(),
                render_calls: AtomicUsize::new(0),
            }
        }

        fn failing_pages(mut self, pages: impl IntoIterator<Item = usize>) -> Self {
            self.fail_render = pages.into_iter().collect();
            self
        }
    }

    impl PdfSource for MockSource {
        fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
            Ok(self.direct.clone())
        }

        fn page_count(&self, _path: &Path) -> Result<usize, BackendError> {
            if self.pages == usize::MAX {
                return Err(BackendError::Extraction("page tree damaged".into()));
            }
            Ok(self.pages)
        }

        fn render_page_png(
            &self,
            _path: &Path,
            page_index: usize,
            _dpi: u32,
        ) -> Result<Vec<u8>, BackendError> {
            self.render_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_render.contains(&page_index) {
                return Err(BackendError::Render(format!("page {page_index} corrupt")));
            }
            Ok(format!("page-{page_index}").into_bytes())
        }
    }

    struct MockOcr {
        // page key ("page-N") to recognized text
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MockOcr {
        fn new(pages: impl IntoIterator<Item = (usize, &'static str)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(index, text)| (format!("page-{index}"), text.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl OcrEngine for MockOcr {
        fn recognize_png(&self, png: &[u8]) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = String::from_utf8_lossy(png).into_owned();
            Ok(self
                .pages
                .get(&key)
                .cloned()
                .unwrap_or_else(|| "illegible smudge".to_string()))
        }
    }

    fn acquirer(source: Arc<MockSource>, ocr: Arc<MockOcr>) -> TextAcquirer {
        TextAcquirer::new(source, ocr)
    }

    fn pdf_path() -> PathBuf {
        PathBuf::from("w12345.pdf")
    }

    #[test]
    fn long_direct_text_with_api_skips_ocr() {
        let direct = format!("{COMPLETE_PAGE}{}", "filler line of form text\n".repeat(30));
        assert!(direct.trim().len() > DIRECT_TEXT_MIN_CHARS);
        let source = Arc::new(MockSource::new(&direct, 5));
        let ocr = Arc::new(MockOcr::new([]));
        let acquired = acquirer(source.clone(), ocr.clone()).acquire(
            &pdf_path(),
            &CancellationToken::new(),
            None,
        );
        assert_eq!(acquired.method, AcquisitionMethod::Direct);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.render_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn short_direct_text_falls_back_to_ocr() {
        let source = Arc::new(MockSource::new("scan artifact", 1));
        let ocr = Arc::new(MockOcr::new([(0, COMPLETE_PAGE)]));
        let acquired = acquirer(source, ocr).acquire(&pdf_path(), &CancellationToken::new(), None);
        assert_eq!(acquired.method, AcquisitionMethod::Ocr);
        assert!(acquired.text.contains("33-053-01234"));
        // Direct text is retained in front of the OCR output.
        assert!(acquired.text.starts_with("scan artifact"));
    }

    #[test]
    fn early_stop_after_first_complete_batch() {
        let source = Arc::new(MockSource::new("", 24));
        let ocr = Arc::new(MockOcr::new([(0, COMPLETE_PAGE)]));
        let acquired = acquirer(source, ocr.clone()).acquire(
            &pdf_path(),
            &CancellationToken::new(),
            None,
        );
        assert_eq!(acquired.method, AcquisitionMethod::Ocr);
        // First 12-page batch carried everything; the second was never run.
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn failing_batch_halves_then_skips_at_floor() {
        // Page 0 always fails to render: 12 -> 6 -> 4, then skip 0..4.
        let source = Arc::new(MockSource::new("", 6).failing_pages([0]));
        let ocr = Arc::new(MockOcr::new([(4, COMPLETE_PAGE)]));
        let acquired = acquirer(source.clone(), ocr.clone()).acquire(
            &pdf_path(),
            &CancellationToken::new(),
            None,
        );
        assert_eq!(acquired.method, AcquisitionMethod::Ocr);
        assert!(acquired.text.contains("33-053-01234"));
        // Three failed attempts at page 0, then pages 4 and 5.
        assert_eq!(source.render_calls.load(Ordering::SeqCst), 5);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn all_batches_failing_returns_direct_text() {
        let source = Arc::new(MockSource::new("thin layer", 4).failing_pages([0, 1, 2, 3]));
        let ocr = Arc::new(MockOcr::new([]));
        let acquired = acquirer(source, ocr.clone()).acquire(
            &pdf_path(),
            &CancellationToken::new(),
            None,
        );
        assert_eq!(acquired.method, AcquisitionMethod::Direct);
        assert_eq!(acquired.text, "thin layer");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_page_count_returns_direct_text() {
        let source = Arc::new(MockSource::new("partial text", usize::MAX));
        let ocr = Arc::new(MockOcr::new([]));
        let acquired = acquirer(source, ocr.clone()).acquire(
            &pdf_path(),
            &CancellationToken::new(),
            None,
        );
        assert_eq!(acquired.method, AcquisitionMethod::Direct);
        assert_eq!(acquired.text, "partial text");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelled_token_stops_before_any_batch() {
        let source = Arc::new(MockSource::new("", 24));
        let ocr = Arc::new(MockOcr::new([(0, COMPLETE_PAGE)]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let acquired = acquirer(source, ocr.clone()).acquire(&pdf_path(), &cancel, None);
        assert_eq!(acquired.method, AcquisitionMethod::Direct);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn expired_deadline_stops_between_batches() {
        let source = Arc::new(MockSource::new("", 24));
        let ocr = Arc::new(MockOcr::new([]));
        let deadline = Instant::now() - std::time::Duration::from_secs(1);
        let acquired = acquirer(source, ocr.clone()).acquire(
            &pdf_path(),
            &CancellationToken::new(),
            Some(deadline),
        );
        assert_eq!(acquired.method, AcquisitionMethod::Direct);
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }
}
