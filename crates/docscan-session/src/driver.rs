// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session driver: the single task that owns a `ScanSession`.
//
// Camera callbacks and user actions arrive as events; detection and cropping
// run on the blocking pool and report back into the loop, which is the only
// place session state changes. While a live frame is being analysed, newer
// frames are dropped.

use std::path::PathBuf;
use std::sync::Arc;

use docscan_bridge::{CameraEvent, NativeCamera};
use docscan_core::error::{DocScanError, Result};
use docscan_core::{ColorFilter, Quad, Rect};
use docscan_document::ImageProcessor;
use image::DynamicImage;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::output::SessionOutcome;
use crate::session::{PhotoOutcome, ScanSession, SessionMode};

/// Something the person holding the phone did.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    TakePhoto,
    /// Corners dragged or filter picked on the photo being adjusted.
    Adjust {
        quads: Vec<Quad>,
        filter: Option<ColorFilter>,
    },
    /// Keep the adjusted photo and go back to the camera.
    AcceptAndNew,
    /// Keep the adjusted photo (if any) and finish the scan.
    Done,
    Retake,
    Cancel,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Camera(CameraEvent),
    User(UserAction),
}

/// What the UI should show next.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// Live detection overlay, in overlay coordinates.
    Overlay(Vec<Quad>),
    /// Show the photo inside `bounds` with adjustable `quads`.
    AwaitingAdjustment { bounds: Rect, quads: Vec<Quad> },
    DocumentCount { count: usize, remaining: usize },
    /// The session is over.
    Finished(SessionOutcome),
}

/// The caller's side of a driver.
pub struct SessionChannels {
    pub events: UnboundedSender<SessionEvent>,
    pub updates: UnboundedReceiver<SessionUpdate>,
}

struct LiveResult {
    quads: Option<Vec<Quad>>,
    frame_w: u32,
    frame_h: u32,
    rotation_degrees: i32,
}

type PhotoResult = Result<(DynamicImage, Option<Vec<Quad>>)>;

pub struct SessionDriver {
    session: ScanSession,
    camera: Arc<dyn NativeCamera>,
    events: UnboundedReceiver<SessionEvent>,
    updates: UnboundedSender<SessionUpdate>,
    live_task: Option<JoinHandle<LiveResult>>,
    photo_task: Option<(PathBuf, JoinHandle<PhotoResult>)>,
    finish_task: Option<JoinHandle<SessionOutcome>>,
}

impl SessionDriver {
    pub fn new(session: ScanSession, camera: Arc<dyn NativeCamera>) -> (Self, SessionChannels) {
        let (events_tx, events_rx) = unbounded_channel();
        let (updates_tx, updates_rx) = unbounded_channel();
        let driver = Self {
            session,
            camera,
            events: events_rx,
            updates: updates_tx,
            live_task: None,
            photo_task: None,
            finish_task: None,
        };
        let channels = SessionChannels {
            events: events_tx,
            updates: updates_rx,
        };
        (driver, channels)
    }

    /// Run the session to completion. The camera is stopped on every exit
    /// path and photos still owned by an unfinished session are deleted.
    pub async fn run(mut self) -> SessionOutcome {
        let session_id = self.session.id();
        info!(session = %session_id, "session driver started");

        let (camera_tx, mut camera_rx) = unbounded_channel();
        let outcome = match self.start_camera(camera_tx) {
            Ok(()) => self.event_loop(&mut camera_rx).await,
            Err(err) => SessionOutcome::failed(&err),
        };

        self.camera.stop();
        if !matches!(outcome, SessionOutcome::Completed(_)) {
            self.session.discard();
        }
        info!(session = %session_id, ?outcome, "session driver finished");
        self.publish(SessionUpdate::Finished(outcome.clone()));
        outcome
    }

    fn start_camera(&self, camera_tx: UnboundedSender<CameraEvent>) -> Result<()> {
        self.camera.start(camera_tx)?;
        let config = self.session.config();
        if let Err(err) = self.camera.set_flash_mode(config.flash_mode) {
            warn!(error = %err, "could not set flash mode");
        }
        if let Err(err) = self.camera.set_auto_focus(config.auto_focus) {
            warn!(error = %err, "could not set auto focus");
        }
        Ok(())
    }

    async fn event_loop(&mut self, camera_rx: &mut UnboundedReceiver<CameraEvent>) -> SessionOutcome {
        loop {
            let step = tokio::select! {
                Some(event) = camera_rx.recv() => self.on_camera(event),
                event = self.events.recv() => match event {
                    Some(SessionEvent::Camera(event)) => self.on_camera(event),
                    Some(SessionEvent::User(action)) => self.on_user(action),
                    None => {
                        debug!("event channel closed, cancelling");
                        Some(self.session.cancel())
                    }
                },
                joined = join(&mut self.live_task), if self.live_task.is_some() => {
                    self.live_task = None;
                    self.on_live_result(joined);
                    None
                },
                joined = join_photo(&mut self.photo_task), if self.photo_task.is_some() => {
                    let path = self.photo_task.take().map(|(path, _)| path);
                    path.and_then(|path| self.on_photo_result(path, joined))
                },
                joined = join(&mut self.finish_task), if self.finish_task.is_some() => {
                    self.finish_task = None;
                    Some(joined.unwrap_or_else(|err| SessionOutcome::Failed(err.to_string())))
                },
            };
            if let Some(outcome) = step {
                return outcome;
            }
        }
    }

    // -- Camera ---------------------------------------------------------------

    fn on_camera(&mut self, event: CameraEvent) -> Option<SessionOutcome> {
        match event {
            CameraEvent::FrameReady {
                frame,
                rotation_degrees,
            } => {
                self.analyse_frame(frame, rotation_degrees);
                None
            }
            CameraEvent::PhotoReady { path } => {
                self.analyse_photo(path);
                None
            }
            CameraEvent::Error { message } => {
                warn!(%message, "camera error");
                self.session.capture_failed();
                Some(SessionOutcome::Failed(message))
            }
        }
    }

    fn analyse_frame(&mut self, frame: DynamicImage, rotation_degrees: i32) {
        if self.live_task.is_some() || self.finish_task.is_some() {
            debug!("analysis busy, dropping frame");
            return;
        }
        if self.session.mode() != SessionMode::Camera {
            return;
        }

        let analyzer = self.session.analyzer();
        let params = self.session.live_params(rotation_degrees);
        self.live_task = Some(tokio::task::spawn_blocking(move || LiveResult {
            quads: analyzer.detect_corners(&frame, &params),
            frame_w: frame.width(),
            frame_h: frame.height(),
            rotation_degrees,
        }));
    }

    fn on_live_result(&mut self, joined: std::result::Result<LiveResult, JoinError>) {
        let result = match joined {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "live analysis task failed");
                return;
            }
        };

        let outcome = self.session.handle_live_detection(
            result.quads.as_deref(),
            result.frame_w,
            result.frame_h,
            result.rotation_degrees,
        );
        self.publish(SessionUpdate::Overlay(outcome.overlay));

        if outcome.capture_requested {
            self.request_photo();
        }
    }

    fn request_photo(&mut self) {
        if let Err(err) = self.camera.take_photo() {
            warn!(error = %err, "take_photo failed");
            self.session.capture_failed();
        }
    }

    fn analyse_photo(&mut self, path: PathBuf) {
        if self.photo_task.is_some() {
            warn!(path = %path.display(), "photo arrived while another is being analysed; ignoring");
            return;
        }

        let analyzer = self.session.analyzer();
        let params = self.session.photo_params();
        let max_width = self.session.layout().screen_width;
        let source = path.clone();
        let handle = tokio::task::spawn_blocking(move || -> PhotoResult {
            let preview = ImageProcessor::open(&source)?.fit_width(max_width).into_dynamic();
            let quads = analyzer.detect_corners(&preview, &params);
            Ok((preview, quads))
        });
        self.photo_task = Some((path, handle));
    }

    fn on_photo_result(
        &mut self,
        path: PathBuf,
        joined: std::result::Result<PhotoResult, JoinError>,
    ) -> Option<SessionOutcome> {
        let analysed = joined
            .map_err(|err| DocScanError::ImageError(err.to_string()))
            .and_then(|result| result);
        let (preview, quads) = match analysed {
            Ok(analysed) => analysed,
            Err(err) => {
                self.session.photo_failed(&path);
                return Some(SessionOutcome::failed(&err));
            }
        };

        match self.session.handle_photo(path, preview, quads) {
            Ok(PhotoOutcome::AwaitingAdjustment { bounds, quads }) => {
                self.publish(SessionUpdate::AwaitingAdjustment { bounds, quads });
                None
            }
            Ok(PhotoOutcome::ReadyToFinish) => {
                self.publish_count();
                self.start_finish();
                None
            }
            Err(err) => Some(SessionOutcome::failed(&err)),
        }
    }

    // -- User -----------------------------------------------------------------

    fn on_user(&mut self, action: UserAction) -> Option<SessionOutcome> {
        if self.finish_task.is_some() {
            debug!(?action, "finishing, ignoring user action");
            return None;
        }

        match action {
            UserAction::TakePhoto => match self.session.begin_capture() {
                Ok(()) => self.request_photo(),
                Err(err) => warn!(error = %err, "photo request refused"),
            },
            UserAction::Adjust { quads, filter } => {
                if let Err(err) = self.session.update_adjustment(quads, filter) {
                    warn!(error = %err, "adjustment ignored");
                }
            }
            UserAction::AcceptAndNew => self.accept_pending(),
            UserAction::Done => {
                if self.session.mode() == SessionMode::Adjusting {
                    self.accept_pending();
                }
                self.start_finish();
            }
            UserAction::Retake => {
                if let Err(err) = self.session.retake() {
                    warn!(error = %err, "nothing to retake");
                }
            }
            UserAction::Cancel => return Some(self.session.cancel()),
        }
        None
    }

    fn accept_pending(&mut self) {
        match self.session.accept_pending() {
            Ok(_) => self.publish_count(),
            Err(err) => warn!(error = %err, "nothing to accept"),
        }
    }

    fn start_finish(&mut self) {
        if self.finish_task.is_some() {
            return;
        }
        let job = self.session.finish_job();
        info!(pages = job.page_count(), "cropping documents");
        self.finish_task = Some(tokio::task::spawn_blocking(move || job.run()));
    }

    // -- Updates --------------------------------------------------------------

    fn publish(&self, update: SessionUpdate) {
        if self.updates.send(update).is_err() {
            debug!("no update listener");
        }
    }

    fn publish_count(&self) {
        self.publish(SessionUpdate::DocumentCount {
            count: self.session.document_count(),
            remaining: self.session.remaining_capacity(),
        });
    }
}

/// Await an optional task; pends forever when there is none (the `select!`
/// guard keeps that branch disabled).
async fn join<T>(task: &mut Option<JoinHandle<T>>) -> std::result::Result<T, JoinError> {
    match task.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn join_photo(
    task: &mut Option<(PathBuf, JoinHandle<PhotoResult>)>,
) -> std::result::Result<PhotoResult, JoinError> {
    match task.as_mut() {
        Some((_, handle)) => handle.await,
        None => std::future::pending().await,
    }
}
