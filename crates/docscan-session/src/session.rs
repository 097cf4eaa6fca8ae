// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session state.
//
// A session owns the documents collected so far, the photo currently shown
// for corner adjustment and the hands-free trigger. It is mutated by exactly
// one task (see `driver`); detection itself runs elsewhere and its results
// are handed in.
//
// Photo files written by the camera belong to the session: each one is
// deleted once its documents are cropped, or when it is retaken, cancelled
// or rejected.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use docscan_bridge::VisionPrimitives;
use docscan_core::error::{DocScanError, Result};
use docscan_core::mapping::{analysis_height, fit_centered, scale_ratio, to_original_space, to_preview_space};
use docscan_core::{ColorFilter, Quad, Rect, ResponseFormat, ScanConfig, ViewLayout};
use docscan_document::{CornerAnalyzer, CornerDetector, CropFinalizer, DetectParams, Document};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::output::{SessionOutcome, deliver, save_crop};
use crate::trigger::{LiveCaptureTrigger, TriggerDecision};

/// Identifier attached to a session's log spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Live camera preview.
    Camera,
    /// A captured photo with draggable corners.
    Adjusting,
}

/// Result of feeding one live-frame detection into the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveFrameOutcome {
    /// Detected quads in overlay coordinates.
    pub overlay: Vec<Quad>,
    /// The hands-free trigger fired; the caller must take a photo.
    pub capture_requested: bool,
}

/// What happens after a photo has been analysed.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOutcome {
    /// Show the photo inside `bounds` with `quads` (screen coordinates) for
    /// the user to adjust.
    AwaitingAdjustment { bounds: Rect, quads: Vec<Quad> },
    /// Hands-free: the document was recorded and the session can finish.
    ReadyToFinish,
}

/// The photo on screen while the user adjusts corners.
struct PendingCapture {
    photo_path: PathBuf,
    preview: Arc<DynamicImage>,
    bounds: Rect,
    ratio: f64,
    screen_quads: Vec<Quad>,
    color_filter: Option<ColorFilter>,
}

pub struct ScanSession {
    id: SessionId,
    config: ScanConfig,
    layout: ViewLayout,
    analyzer: Arc<dyn CornerAnalyzer>,
    finalizer: CropFinalizer,
    output_dir: PathBuf,
    documents: Vec<Document>,
    current: Option<PendingCapture>,
    mode: SessionMode,
    trigger: LiveCaptureTrigger,
}

impl ScanSession {
    /// Start a session. Crops are written to `output_dir`.
    pub fn new(
        config: ScanConfig,
        layout: ViewLayout,
        vision: Arc<dyn VisionPrimitives>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        let id = SessionId::new();
        info!(
            session = %id,
            hands_free = config.hands_free(),
            max_documents = config.effective_max_documents(),
            "scan session created"
        );
        Ok(Self {
            id,
            analyzer: Arc::new(CornerDetector::new(Arc::clone(&vision))),
            finalizer: CropFinalizer::new(vision),
            config,
            layout,
            output_dir: output_dir.into(),
            documents: Vec::new(),
            current: None,
            mode: SessionMode::Camera,
            trigger: LiveCaptureTrigger::new(),
        })
    }

    /// Replace the default corner detector.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn CornerAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Replace the hands-free trigger (e.g. with a different threshold).
    pub fn with_trigger(mut self, trigger: LiveCaptureTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn analyzer(&self) -> Arc<dyn CornerAnalyzer> {
        Arc::clone(&self.analyzer)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.config
            .effective_max_documents()
            .saturating_sub(self.documents.len())
    }

    pub fn is_capture_in_flight(&self) -> bool {
        self.trigger.is_capture_in_flight()
    }

    /// Detection parameters for a live frame.
    pub fn live_params(&self, rotation_degrees: i32) -> DetectParams {
        DetectParams::for_live_frame(&self.config, rotation_degrees)
    }

    /// Detection parameters for a captured photo.
    pub fn photo_params(&self) -> DetectParams {
        DetectParams::for_photo(&self.config)
    }

    // -- Live preview ---------------------------------------------------------

    /// Scale a live detection onto the overlay and advance the trigger.
    pub fn handle_live_detection(
        &mut self,
        quads: Option<&[Quad]>,
        frame_w: u32,
        frame_h: u32,
        rotation_degrees: i32,
    ) -> LiveFrameOutcome {
        if self.mode != SessionMode::Camera {
            return LiveFrameOutcome::default();
        }

        let detected = quads.is_some_and(|q| !q.is_empty());
        let source_height = analysis_height(frame_w, frame_h, rotation_degrees);
        let overlay = match quads {
            Some(quads) if source_height > 0 => {
                let ratio = f64::from(self.layout.overlay_height) / f64::from(source_height);
                quads.iter().map(|q| q.scale(ratio)).collect()
            }
            _ => Vec::new(),
        };

        let armed = self.config.hands_free() && self.remaining_capacity() > 0;
        let capture_requested =
            self.trigger.observe(detected, armed) == TriggerDecision::FireCapture;
        if capture_requested {
            info!(session = %self.id, "hands-free capture triggered");
        }

        LiveFrameOutcome {
            overlay,
            capture_requested,
        }
    }

    // -- Capture --------------------------------------------------------------

    /// Claim the camera for a manual photo.
    pub fn begin_capture(&mut self) -> Result<()> {
        if self.remaining_capacity() == 0 {
            return Err(DocScanError::DocumentLimit {
                max: self.config.effective_max_documents(),
            });
        }
        if self.trigger.is_capture_in_flight() || self.current.is_some() {
            return Err(DocScanError::CaptureInFlight);
        }
        self.trigger.mark_capture_started();
        debug!(session = %self.id, "capture started");
        Ok(())
    }

    /// The requested photo never arrived.
    pub fn capture_failed(&mut self) {
        self.trigger.capture_finished();
    }

    /// The photo arrived but could not be read.
    pub fn photo_failed(&mut self, photo_path: &Path) {
        self.trigger.capture_finished();
        remove_photo(photo_path);
    }

    /// Take in a captured photo together with the quads detected on its
    /// preview.
    ///
    /// The photo file is deleted if no quad was found.
    #[instrument(skip_all, fields(session = %self.id, path = %photo_path.display()))]
    pub fn handle_photo(
        &mut self,
        photo_path: PathBuf,
        preview: DynamicImage,
        quads: Option<Vec<Quad>>,
    ) -> Result<PhotoOutcome> {
        self.trigger.capture_finished();

        let quads = match quads {
            Some(quads) if !quads.is_empty() => quads,
            _ => {
                remove_photo(&photo_path);
                return Err(DocScanError::NoCorners);
            }
        };

        if let Some(stale) = self.current.take() {
            warn!(path = %stale.photo_path.display(), "replacing photo that was never accepted");
            remove_photo(&stale.photo_path);
        }

        let preview = Arc::new(preview);

        if self.config.hands_free() {
            if self.remaining_capacity() == 0 {
                remove_photo(&photo_path);
                return Err(DocScanError::DocumentLimit {
                    max: self.config.effective_max_documents(),
                });
            }
            self.documents
                .push(Document::new(photo_path, Some(preview)).with_quad(quads[0]));
            info!(documents = self.documents.len(), "document recorded");
            return Ok(PhotoOutcome::ReadyToFinish);
        }

        let (bounds, ratio) = match self.screen_fit(&preview) {
            Ok(fit) => fit,
            Err(err) => {
                remove_photo(&photo_path);
                return Err(err);
            }
        };

        let screen_quads: Vec<Quad> = quads
            .iter()
            .map(|q| to_preview_space(q, &bounds, ratio))
            .collect();

        self.current = Some(PendingCapture {
            photo_path,
            preview,
            bounds,
            ratio,
            screen_quads: screen_quads.clone(),
            color_filter: None,
        });
        self.mode = SessionMode::Adjusting;
        debug!(quads = screen_quads.len(), ?bounds, "awaiting adjustment");

        Ok(PhotoOutcome::AwaitingAdjustment {
            bounds,
            quads: screen_quads,
        })
    }

    /// Where a preview lands on screen, and its scale: centred in the screen
    /// area left above the filter bar.
    fn screen_fit(&self, preview: &DynamicImage) -> Result<(Rect, f64)> {
        let controls = if self.config.show_color_filters {
            self.layout.controls_height
        } else {
            0
        };
        let container_h = self.layout.screen_height.saturating_sub(controls);
        let bounds = fit_centered(
            preview.width(),
            preview.height(),
            self.layout.screen_width,
            container_h,
        )?;
        let ratio = scale_ratio(bounds.height, preview.height())?;
        Ok((bounds, ratio))
    }

    // -- Adjustment -----------------------------------------------------------

    /// Record the user's latest corner positions and filter choice.
    pub fn update_adjustment(&mut self, screen_quads: Vec<Quad>, filter: Option<ColorFilter>) -> Result<()> {
        let pending = self.current.as_mut().ok_or(DocScanError::NoPendingCapture)?;
        pending.screen_quads = screen_quads;
        pending.color_filter = filter;
        Ok(())
    }

    /// Accept the corners last recorded by [`update_adjustment`](Self::update_adjustment)
    /// (or the detected ones if the user changed nothing).
    pub fn accept_pending(&mut self) -> Result<usize> {
        let pending = self.current.as_ref().ok_or(DocScanError::NoPendingCapture)?;
        let quads = pending.screen_quads.clone();
        let filter = pending.color_filter;
        self.accept_adjustment(&quads, filter)
    }

    /// Turn the on-screen quads into documents and return to the camera.
    ///
    /// At most `max_num_simultaneous_documents` quads are taken from one
    /// photo, and none beyond the total document cap. Returns how many
    /// documents were added.
    #[instrument(skip(self, screen_quads), fields(session = %self.id, quads = screen_quads.len()))]
    pub fn accept_adjustment(
        &mut self,
        screen_quads: &[Quad],
        filter: Option<ColorFilter>,
    ) -> Result<usize> {
        let pending = self.current.take().ok_or(DocScanError::NoPendingCapture)?;

        let limit = self
            .config
            .max_num_simultaneous_documents
            .min(self.remaining_capacity());
        if screen_quads.len() > limit {
            warn!(
                dropped = screen_quads.len() - limit,
                max_simultaneous = self.config.max_num_simultaneous_documents,
                max = self.config.effective_max_documents(),
                "document limit reached, dropping quads"
            );
        }

        let mut added = 0;
        for quad in screen_quads.iter().take(limit) {
            let image_quad = to_original_space(quad, &pending.bounds, pending.ratio);
            self.documents.push(
                Document::new(pending.photo_path.clone(), Some(Arc::clone(&pending.preview)))
                    .with_quad(image_quad)
                    .with_color_filter(filter),
            );
            added += 1;
        }

        if added == 0 {
            remove_photo(&pending.photo_path);
        }
        self.mode = SessionMode::Camera;
        info!(added, documents = self.documents.len(), "adjustment accepted");
        Ok(added)
    }

    /// Throw away the photo on screen and go back to the camera.
    pub fn retake(&mut self) -> Result<()> {
        let pending = self.current.take().ok_or(DocScanError::NoPendingCapture)?;
        remove_photo(&pending.photo_path);
        self.mode = SessionMode::Camera;
        debug!(session = %self.id, "photo discarded for retake");
        Ok(())
    }

    // -- Ending ---------------------------------------------------------------

    /// Delete every photo the session still owns and forget its documents.
    pub fn discard(&mut self) {
        if let Some(pending) = self.current.take() {
            remove_photo(&pending.photo_path);
        }
        for document in self.documents.drain(..) {
            remove_photo(&document.original_photo_path);
        }
        self.mode = SessionMode::Camera;
        self.trigger.capture_finished();
    }

    /// User backed out.
    pub fn cancel(&mut self) -> SessionOutcome {
        info!(session = %self.id, "scan cancelled");
        self.discard();
        SessionOutcome::Cancelled
    }

    /// Hand the collected documents to a [`FinishJob`], leaving the session
    /// empty. Run the job off the event loop; it decodes full-size photos.
    pub fn finish_job(&mut self) -> FinishJob {
        if let Some(pending) = self.current.take() {
            warn!(path = %pending.photo_path.display(), "finishing with an unaccepted photo; discarding it");
            remove_photo(&pending.photo_path);
        }
        self.mode = SessionMode::Camera;
        FinishJob {
            session: self.id,
            documents: std::mem::take(&mut self.documents),
            finalizer: self.finalizer.clone(),
            output_dir: self.output_dir.clone(),
            quality: self.config.cropped_image_quality,
            format: self.config.response_format,
        }
    }

    /// Crop, save and deliver every document on the current thread.
    pub fn finish(&mut self) -> SessionOutcome {
        self.finish_job().run()
    }
}

/// The cropping work of a finished session.
pub struct FinishJob {
    session: SessionId,
    documents: Vec<Document>,
    finalizer: CropFinalizer,
    output_dir: PathBuf,
    quality: u8,
    format: ResponseFormat,
}

impl FinishJob {
    pub fn page_count(&self) -> usize {
        self.documents.len()
    }

    /// Crop every document in order, deleting each original photo once its
    /// last document is done. The first failure stops cropping; remaining
    /// originals and already saved crops are still removed.
    #[instrument(skip(self), fields(session = %self.session, pages = self.documents.len()))]
    pub fn run(self) -> SessionOutcome {
        let taken_at = Local::now();
        let mut saved = Vec::with_capacity(self.documents.len());
        let mut failure: Option<DocScanError> = None;

        for (page, document) in self.documents.iter().enumerate() {
            if failure.is_none() {
                let result = self
                    .finalizer
                    .finalize_crop(document, document.color_filter.as_ref())
                    .and_then(|crop| save_crop(&crop, &self.output_dir, page, &taken_at, self.quality));
                match result {
                    Ok(path) => saved.push(path),
                    Err(err) => {
                        warn!(page, error = %err, "page failed, stopping");
                        failure = Some(err);
                    }
                }
            }

            let shared_later = self.documents[page + 1..]
                .iter()
                .any(|d| d.original_photo_path == document.original_photo_path);
            if !shared_later {
                remove_photo(&document.original_photo_path);
            }
        }

        if let Some(err) = failure {
            for path in &saved {
                remove_photo(path);
            }
            return SessionOutcome::failed(&err);
        }

        match deliver(saved, self.format, self.quality) {
            Ok(outputs) => SessionOutcome::Completed(outputs),
            Err(err) => SessionOutcome::failed(&err),
        }
    }
}

/// Delete a session-owned file. Already-missing files are fine.
fn remove_photo(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "photo deleted"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "could not delete photo"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ScanOutput;
    use docscan_bridge::HoughVision;
    use docscan_core::Point;
    use image::{Rgb, RgbImage};

    fn rect_quad(x0: f64, y0: f64, x1: f64, y1: f64) -> Quad {
        Quad {
            top_left: Point::new(x0, y0),
            top_right: Point::new(x1, y0),
            bottom_right: Point::new(x1, y1),
            bottom_left: Point::new(x0, y1),
        }
    }

    fn assert_close(a: &Quad, b: &Quad) {
        for (p, q) in a.corners().iter().zip(b.corners().iter()) {
            assert!((p.x - q.x).abs() < 1e-6 && (p.y - q.y).abs() < 1e-6, "{a:?} != {b:?}");
        }
    }

    fn layout() -> ViewLayout {
        ViewLayout {
            screen_width: 1080,
            screen_height: 1920,
            controls_height: 0,
            overlay_height: 1000,
        }
    }

    fn session(config: ScanConfig, dir: &Path) -> ScanSession {
        ScanSession::new(config, layout(), Arc::new(HoughVision), dir.join("out")).expect("session")
    }

    fn hands_free() -> ScanConfig {
        ScanConfig {
            let_user_adjust_crop: false,
            ..ScanConfig::default()
        }
    }

    fn write_photo(dir: &Path, name: &str, w: u32, h: u32) -> (PathBuf, DynamicImage) {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([220, 220, 210])));
        let path = dir.join(name);
        image.save(&path).expect("write photo");
        (path, image)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ScanConfig {
            cropped_image_quality: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(
            ScanSession::new(config, layout(), Arc::new(HoughVision), dir.path()),
            Err(DocScanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn live_quads_are_scaled_to_overlay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());
        // Sideways 640x480 frame: 640 px tall once rotated, overlay is 1000.
        let quads = [rect_quad(64.0, 64.0, 320.0, 320.0)];
        let outcome = session.handle_live_detection(Some(&quads), 640, 480, 90);
        assert!(!outcome.capture_requested);
        assert_close(&outcome.overlay[0], &rect_quad(100.0, 100.0, 500.0, 500.0));
    }

    #[test]
    fn hands_free_trigger_requests_capture() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session =
            session(hands_free(), dir.path()).with_trigger(LiveCaptureTrigger::with_threshold(5));
        let quads = [rect_quad(10.0, 10.0, 100.0, 100.0)];
        let fired: Vec<bool> = (0..5)
            .map(|_| session.handle_live_detection(Some(&quads), 400, 300, 0).capture_requested)
            .collect();
        assert_eq!(fired, vec![false, false, false, false, true]);
        assert!(session.is_capture_in_flight());
        assert!(matches!(session.begin_capture(), Err(DocScanError::CaptureInFlight)));
    }

    #[test]
    fn adjust_mode_never_triggers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path())
            .with_trigger(LiveCaptureTrigger::with_threshold(1));
        let quads = [rect_quad(10.0, 10.0, 100.0, 100.0)];
        for _ in 0..5 {
            assert!(!session.handle_live_detection(Some(&quads), 400, 300, 0).capture_requested);
        }
    }

    #[test]
    fn photo_without_corners_fails_and_is_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 60, 80);
        session.begin_capture().expect("capture");

        let err = session
            .handle_photo(path.clone(), preview, None)
            .expect_err("no corners");
        assert_eq!(err.to_string(), "unable to get document corners");
        assert!(!path.exists());
        assert!(!session.is_capture_in_flight());
    }

    #[test]
    fn adjustment_round_trips_through_screen_space() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 600, 800);
        let detected = rect_quad(100.0, 100.0, 500.0, 700.0);

        let outcome = session
            .handle_photo(path, preview, Some(vec![detected]))
            .expect("photo");
        let PhotoOutcome::AwaitingAdjustment { bounds, quads } = outcome else {
            panic!("expected adjustment");
        };
        // 600x800 fitted into 1080x1920 scales by 1.8 and is centred vertically.
        assert!((bounds.top - 240.0).abs() < 1e-9);
        assert_close(&quads[0], &rect_quad(180.0, 420.0, 900.0, 1500.0));
        assert_eq!(session.mode(), SessionMode::Adjusting);

        let added = session
            .accept_adjustment(&quads, Some(ColorFilter::GRAYSCALE))
            .expect("accept");
        assert_eq!(added, 1);
        assert_eq!(session.mode(), SessionMode::Camera);
        let document = &session.documents()[0];
        assert_close(&document.quad.expect("quad"), &detected);
        assert_eq!(document.color_filter, Some(ColorFilter::GRAYSCALE));
    }

    #[test]
    fn document_cap_drops_extra_quads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ScanConfig {
            max_num_documents: 2,
            max_num_simultaneous_documents: 3,
            ..ScanConfig::default()
        };
        let mut session = session(config, dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 300, 400);
        let quads = vec![
            rect_quad(0.0, 0.0, 50.0, 50.0),
            rect_quad(100.0, 0.0, 150.0, 50.0),
            rect_quad(200.0, 0.0, 250.0, 50.0),
        ];
        session.handle_photo(path, preview, Some(quads)).expect("photo");

        assert_eq!(session.accept_pending().expect("accept"), 2);
        assert_eq!(session.document_count(), 2);
        assert_eq!(session.remaining_capacity(), 0);
        assert!(matches!(
            session.begin_capture(),
            Err(DocScanError::DocumentLimit { max: 2 })
        ));
    }

    #[test]
    fn simultaneous_cap_limits_quads_per_photo() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ScanConfig {
            max_num_documents: 5,
            max_num_simultaneous_documents: 1,
            ..ScanConfig::default()
        };
        let mut session = session(config, dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 300, 400);
        session
            .handle_photo(path, preview, Some(vec![rect_quad(0.0, 0.0, 50.0, 50.0)]))
            .expect("photo");

        let submitted = [
            rect_quad(0.0, 0.0, 50.0, 50.0),
            rect_quad(100.0, 0.0, 150.0, 50.0),
            rect_quad(200.0, 0.0, 250.0, 50.0),
        ];
        assert_eq!(session.accept_adjustment(&submitted, None).expect("accept"), 1);
        assert_eq!(session.document_count(), 1);
        assert_eq!(session.remaining_capacity(), 4);
    }

    #[test]
    fn retake_deletes_photo() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 300, 400);
        session
            .handle_photo(path.clone(), preview, Some(vec![rect_quad(0.0, 0.0, 50.0, 50.0)]))
            .expect("photo");

        session.retake().expect("retake");
        assert!(!path.exists());
        assert_eq!(session.mode(), SessionMode::Camera);
        assert!(matches!(session.retake(), Err(DocScanError::NoPendingCapture)));
    }

    #[test]
    fn cancel_deletes_all_photos() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());
        let (first, preview) = write_photo(dir.path(), "a.png", 300, 400);
        session
            .handle_photo(first.clone(), preview, Some(vec![rect_quad(0.0, 0.0, 50.0, 50.0)]))
            .expect("photo");
        session.accept_pending().expect("accept");
        let (second, preview) = write_photo(dir.path(), "b.png", 300, 400);
        session
            .handle_photo(second.clone(), preview, Some(vec![rect_quad(0.0, 0.0, 50.0, 50.0)]))
            .expect("photo");

        assert_eq!(session.cancel(), SessionOutcome::Cancelled);
        assert!(!first.exists());
        assert!(!second.exists());
        assert_eq!(session.document_count(), 0);
    }

    #[test]
    fn hands_free_end_to_end_base64() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(hands_free(), dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 400, 600);

        session.begin_capture().expect("capture");
        let outcome = session
            .handle_photo(path.clone(), preview, Some(vec![rect_quad(50.0, 50.0, 350.0, 550.0)]))
            .expect("photo");
        assert_eq!(outcome, PhotoOutcome::ReadyToFinish);
        assert_eq!(session.remaining_capacity(), 0);

        let SessionOutcome::Completed(outputs) = session.finish() else {
            panic!("expected completion");
        };
        assert_eq!(outputs.len(), 1);
        assert!(matches!(&outputs[0], ScanOutput::Base64(s) if !s.is_empty()));
        assert!(!path.exists());
        assert_eq!(session.document_count(), 0);
    }

    #[test]
    fn finish_to_files_keeps_crops() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ScanConfig {
            response_format: ResponseFormat::ImageFilePath,
            max_num_simultaneous_documents: 2,
            ..ScanConfig::default()
        };
        let mut session = session(config, dir.path());
        let (path, preview) = write_photo(dir.path(), "p.png", 400, 600);
        session
            .handle_photo(
                path.clone(),
                preview,
                Some(vec![rect_quad(0.0, 0.0, 200.0, 300.0), rect_quad(200.0, 300.0, 400.0, 600.0)]),
            )
            .expect("photo");
        assert_eq!(session.accept_pending().expect("accept"), 2);

        let SessionOutcome::Completed(outputs) = session.finish() else {
            panic!("expected completion");
        };
        assert_eq!(outputs.len(), 2);
        for (page, output) in outputs.iter().enumerate() {
            let ScanOutput::File(file) = output else {
                panic!("expected file output");
            };
            assert!(file.exists());
            let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            assert!(name.starts_with(&format!("SCAN_{page}_")));
        }
        assert!(!path.exists());
    }

    #[test]
    fn first_crop_failure_halts_and_cleans_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());

        let (missing, preview) = write_photo(dir.path(), "gone.png", 300, 400);
        session
            .handle_photo(missing.clone(), preview, Some(vec![rect_quad(10.0, 10.0, 200.0, 300.0)]))
            .expect("photo");
        session.accept_pending().expect("accept");
        std::fs::remove_file(&missing).expect("simulate lost photo");

        let (kept, preview) = write_photo(dir.path(), "kept.png", 300, 400);
        session
            .handle_photo(kept.clone(), preview, Some(vec![rect_quad(10.0, 10.0, 200.0, 300.0)]))
            .expect("photo");
        session.accept_pending().expect("accept");

        let SessionOutcome::Failed(message) = session.finish() else {
            panic!("expected failure");
        };
        assert!(message.starts_with("unable to crop image"));
        assert!(!kept.exists());
    }

    #[test]
    fn accept_without_photo_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(ScanConfig::default(), dir.path());
        assert!(matches!(
            session.accept_adjustment(&[], None),
            Err(DocScanError::NoPendingCapture)
        ));
    }
}
