//! The mobile capture state machine.
//!
//! Pure transitions: every input is a method on [`CaptureMachine`] returning
//! the [`Effect`]s the host must perform (submit over the network, show a
//! toast, navigate, persist). The machine itself never does I/O, which is
//! what makes the retry/timeout/dedup guarantees unit-testable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Local size gate: files beyond this are rejected before any network call.
pub const MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;

/// Watchdog on the analyzing state. Independent of any server-side timeout —
/// the client cannot always observe that the server gave up.
pub const ANALYZING_TIMEOUT: Duration = Duration::from_secs(50);

/// UI step of the capture flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Capture,
    Analyzing,
    Success,
    Voice,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastTone {
    Success,
    Error,
}

/// Side effects the host performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the image to the scan endpoint. `attempt` is the explicit
    /// per-submission counter (0 = first try, 1 = the one automatic retry)
    /// and must be echoed back in [`SubmissionOutcome::Empty`] handling.
    Submit { image: String, attempt: u8 },
    /// POST the transcript to the variant-parse endpoint.
    SubmitTranscript { transcript: String },
    /// Ask the server for a fresh session ("scan next product").
    RequestNewSession,
    /// Server superseded the session: load the new session's URL.
    Navigate { session_id: String },
    /// Wipe all session-scoped persisted state.
    ClearStorage,
    /// Mirror the current state into session-scoped storage.
    Persist,
    Toast { message: String, tone: ToastTone },
}

/// What came back from a scan submission.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Server-reported error message.
    Error(String),
    /// Single-capture success.
    Success,
    /// Batch add confirmed; `batch_count` is the server's running total.
    BatchAdded { batch_count: i64 },
    /// The session was superseded; continue under the new id.
    NewSession { session_id: String },
    /// Completed with neither error nor payload (ambiguous network/server
    /// failure) — the retry-once case.
    Empty,
}

/// A file handed over by the camera or gallery picker.
#[derive(Debug, Clone)]
pub struct CapturedFile {
    pub size_bytes: u64,
    pub data_url: String,
}

/// Compression seam. The pixel work (center-crop, downscale, re-encode)
/// belongs to the UI layer; the machine only cares that a failure falls back
/// to the original bytes instead of blocking the user.
pub trait ImageCompressor {
    /// Returns the compressed data URL, or an error to trigger the raw-bytes
    /// fallback.
    fn compress(&self, data_url: &str) -> Result<String, String>;
}

/// Compressor that hands the original bytes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompressor;

impl ImageCompressor for PassthroughCompressor {
    fn compress(&self, data_url: &str) -> Result<String, String> {
        Ok(data_url.to_string())
    }
}

/// The client-side capture state machine.
#[derive(Debug, Clone)]
pub struct CaptureMachine {
    step: Step,
    batch_mode: bool,
    submitting: bool,
    /// Explicit per-submission attempt counter backing the exactly-one-retry
    /// guarantee.
    attempt: u8,
    last_submitted_image: Option<String>,
    image_preview: Option<String>,
    error: Option<String>,
    voice_error: Option<String>,
}

impl CaptureMachine {
    #[must_use]
    pub fn new(batch_mode: bool) -> Self {
        Self {
            step: Step::Capture,
            batch_mode,
            submitting: false,
            attempt: 0,
            last_submitted_image: None,
            image_preview: None,
            error: None,
            voice_error: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    #[must_use]
    pub fn image_preview(&self) -> Option<&str> {
        self.image_preview.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn voice_error(&self) -> Option<&str> {
        self.voice_error.as_deref()
    }

    /// A photo was taken or picked. Oversized files are rejected locally;
    /// everything else is compressed (falling back to the original on
    /// failure) and submitted immediately.
    pub fn capture<C: ImageCompressor>(
        &mut self,
        file: &CapturedFile,
        compressor: &C,
    ) -> Vec<Effect> {
        if file.size_bytes > MAX_IMAGE_BYTES {
            self.error = Some("Image too large. Please take a smaller photo.".to_string());
            return vec![];
        }

        let image = match compressor.compress(&file.data_url) {
            Ok(compressed) => compressed,
            Err(reason) => {
                tracing::warn!(reason, "compression failed; submitting original image");
                file.data_url.clone()
            }
        };

        self.image_preview = Some(image.clone());
        self.error = None;
        self.analyze(Some(image))
    }

    /// Starts a submission for `image` (or the stored preview). Refused while
    /// one is already in flight; a fresh capture after completion is always
    /// allowed (retake).
    pub fn analyze(&mut self, image: Option<String>) -> Vec<Effect> {
        if self.submitting {
            return vec![];
        }

        let image = image
            .filter(|i| i.starts_with("data:"))
            .or_else(|| {
                self.image_preview
                    .clone()
                    .filter(|i| i.starts_with("data:"))
            });
        let Some(image) = image else {
            self.error = Some("No image to analyze.".to_string());
            self.step = Step::Capture;
            return vec![Effect::Persist];
        };

        self.step = Step::Analyzing;
        self.submitting = true;
        self.attempt = 0;
        self.last_submitted_image = Some(image.clone());

        vec![Effect::Submit { image, attempt: 0 }, Effect::Persist]
    }

    /// The submission finished (in any way).
    pub fn complete_submission(&mut self, outcome: &SubmissionOutcome) -> Vec<Effect> {
        if let SubmissionOutcome::NewSession { session_id } = outcome {
            // Supersession wins over everything: wipe local state and move on.
            return vec![
                Effect::ClearStorage,
                Effect::Navigate {
                    session_id: session_id.clone(),
                },
            ];
        }

        if !self.submitting {
            // Stale completion (e.g. after the watchdog already reset us).
            return vec![];
        }

        match outcome {
            SubmissionOutcome::Error(message) => {
                self.reset_in_flight();
                self.step = Step::Capture;
                vec![
                    Effect::Toast {
                        message: message.clone(),
                        tone: ToastTone::Error,
                    },
                    Effect::Persist,
                ]
            }
            SubmissionOutcome::BatchAdded { batch_count } => {
                self.reset_in_flight();
                self.step = Step::Capture;
                self.image_preview = None;
                let message = if *batch_count > 0 {
                    format!("Photo {batch_count} added to batch")
                } else {
                    "Photo added to batch".to_string()
                };
                vec![
                    Effect::Toast {
                        message,
                        tone: ToastTone::Success,
                    },
                    Effect::Persist,
                ]
            }
            SubmissionOutcome::Success => {
                self.reset_in_flight();
                self.step = Step::Success;
                vec![
                    Effect::Toast {
                        message: "Scan complete! Retake to replace or scan a new product."
                            .to_string(),
                        tone: ToastTone::Success,
                    },
                    Effect::Persist,
                ]
            }
            SubmissionOutcome::Empty => {
                // Ambiguous failure: resubmit the same image exactly once,
                // then give up silently (not worth alarming the user over).
                if self.attempt == 0 {
                    if let Some(image) = self.last_submitted_image.clone() {
                        self.attempt = 1;
                        return vec![Effect::Submit { image, attempt: 1 }];
                    }
                }
                self.reset_in_flight();
                self.step = Step::Capture;
                vec![Effect::Persist]
            }
            // Handled before the submitting guard.
            SubmissionOutcome::NewSession { .. } => vec![],
        }
    }

    /// The analyzing watchdog fired. Only meaningful mid-submission; a stale
    /// timer after completion is ignored.
    pub fn timeout_fired(&mut self) -> Vec<Effect> {
        if self.step != Step::Analyzing || !self.submitting {
            return vec![];
        }
        self.reset_in_flight();
        self.step = Step::Capture;
        vec![
            Effect::Toast {
                message: "Scan timed out. Try again.".to_string(),
                tone: ToastTone::Error,
            },
            Effect::Persist,
        ]
    }

    /// Opens variant dictation (reachable from the post-scan success view).
    pub fn open_voice(&mut self) -> Vec<Effect> {
        if self.step != Step::Success {
            return vec![];
        }
        self.step = Step::Voice;
        self.voice_error = None;
        vec![Effect::Persist]
    }

    /// A finalized transcript (dictated or typed) is ready to parse.
    pub fn finalize_transcript(&mut self, transcript: &str) -> Vec<Effect> {
        let trimmed = transcript.trim();
        if trimmed.is_empty() {
            return vec![];
        }
        vec![Effect::SubmitTranscript {
            transcript: trimmed.to_string(),
        }]
    }

    /// The server parsed the transcript into options.
    pub fn variants_parsed(&mut self) -> Vec<Effect> {
        self.voice_error = None;
        self.step = Step::Confirm;
        vec![Effect::Persist]
    }

    /// The parse failed; stay in the voice view with the message.
    pub fn variant_parse_failed(&mut self, message: &str) -> Vec<Effect> {
        self.voice_error = Some(message.to_string());
        vec![]
    }

    /// "Scan next product": wipe local state and ask for a fresh session.
    pub fn scan_next(&mut self) -> Vec<Effect> {
        self.image_preview = None;
        self.error = None;
        self.step = Step::Capture;
        vec![Effect::ClearStorage, Effect::RequestNewSession]
    }

    fn reset_in_flight(&mut self) {
        self.submitting = false;
        self.attempt = 0;
        self.last_submitted_image = None;
        self.error = None;
    }

    /// Snapshot for session-scoped storage.
    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            image: self
                .image_preview
                .clone()
                .filter(|i| i.starts_with("data:")),
            step: self.step,
            submitting: self.submitting,
        }
    }

    /// Rebuilds a machine from persisted state. A reload caught
    /// mid-`Analyzing` is not trusted — the in-flight request cannot survive
    /// a reload — so that case restores to `Capture` with the in-flight
    /// markers cleared.
    #[must_use]
    pub fn restore(state: PersistedState, batch_mode: bool) -> Self {
        let mut machine = Self::new(batch_mode);
        machine.image_preview = state.image;
        machine.step = if state.step == Step::Analyzing {
            Step::Capture
        } else {
            state.step
        };
        machine
    }

    #[must_use]
    pub fn batch_mode(&self) -> bool {
        self.batch_mode
    }
}

/// The session-scoped storage entries: {image, step, submitting}.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub image: Option<String>,
    pub step: Step,
    pub submitting: bool,
}
