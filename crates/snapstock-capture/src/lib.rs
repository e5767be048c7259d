//! Client-side capture flow: the step state machine, its effects, and the
//! session-scoped persistence that survives reloads.

pub mod machine;
pub mod storage;

pub use machine::{
    CaptureMachine, CapturedFile, Effect, ImageCompressor, PassthroughCompressor, PersistedState,
    Step, SubmissionOutcome, ToastTone, ANALYZING_TIMEOUT, MAX_IMAGE_BYTES,
};
pub use storage::{load_state, restore_machine, save_state, CaptureStore, InMemoryStore};

#[cfg(test)]
mod machine_tests {
    use super::*;

    struct FailingCompressor;
    impl ImageCompressor for FailingCompressor {
        fn compress(&self, _data_url: &str) -> Result<String, String> {
            Err("canvas unavailable".to_string())
        }
    }

    struct ShrinkingCompressor;
    impl ImageCompressor for ShrinkingCompressor {
        fn compress(&self, _data_url: &str) -> Result<String, String> {
            Ok("data:image/jpeg;base64,small".to_string())
        }
    }

    fn file(size_bytes: u64) -> CapturedFile {
        CapturedFile {
            size_bytes,
            data_url: "data:image/jpeg;base64,original".to_string(),
        }
    }

    fn submit_effects(effects: &[Effect]) -> Vec<(String, u8)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Submit { image, attempt } => Some((image.clone(), *attempt)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn oversized_file_is_rejected_locally() {
        let mut machine = CaptureMachine::new(false);
        let effects = machine.capture(&file(MAX_IMAGE_BYTES + 1), &PassthroughCompressor);

        assert!(effects.is_empty(), "no network call for oversized files");
        assert_eq!(machine.step(), Step::Capture);
        assert!(machine.error().is_some());
    }

    #[test]
    fn capture_compresses_and_submits() {
        let mut machine = CaptureMachine::new(false);
        let effects = machine.capture(&file(1024), &ShrinkingCompressor);

        assert_eq!(
            submit_effects(&effects),
            vec![("data:image/jpeg;base64,small".to_string(), 0)]
        );
        assert_eq!(machine.step(), Step::Analyzing);
        assert!(machine.is_submitting());
    }

    #[test]
    fn compression_failure_falls_back_to_original() {
        let mut machine = CaptureMachine::new(false);
        let effects = machine.capture(&file(1024), &FailingCompressor);

        assert_eq!(
            submit_effects(&effects),
            vec![("data:image/jpeg;base64,original".to_string(), 0)]
        );
    }

    #[test]
    fn second_analyze_refused_while_in_flight() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        let effects = machine.analyze(Some("data:image/jpeg;base64,other".to_string()));
        assert!(effects.is_empty(), "duplicate submission must be refused");
    }

    #[test]
    fn retake_allowed_after_completion() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);
        machine.complete_submission(&SubmissionOutcome::Success);

        let effects = machine.capture(&file(2048), &PassthroughCompressor);
        assert_eq!(submit_effects(&effects).len(), 1);
    }

    #[test]
    fn analyze_without_image_errors_locally() {
        let mut machine = CaptureMachine::new(false);
        let effects = machine.analyze(None);

        assert!(submit_effects(&effects).is_empty());
        assert_eq!(machine.error(), Some("No image to analyze."));
    }

    #[test]
    fn empty_completion_retries_exactly_once() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        // First empty completion: one automatic resubmit of the same image.
        let effects = machine.complete_submission(&SubmissionOutcome::Empty);
        assert_eq!(
            submit_effects(&effects),
            vec![("data:image/jpeg;base64,original".to_string(), 1)]
        );
        assert!(machine.is_submitting(), "retry keeps the submission in flight");

        // Second empty completion: silent give-up, no toast.
        let effects = machine.complete_submission(&SubmissionOutcome::Empty);
        assert!(submit_effects(&effects).is_empty());
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::Toast { .. })));
        assert_eq!(machine.step(), Step::Capture);
        assert!(!machine.is_submitting());
    }

    #[test]
    fn error_completion_toasts_and_resets() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        let effects =
            machine.complete_submission(&SubmissionOutcome::Error("Scan limit reached.".to_string()));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Toast { message, tone: ToastTone::Error } if message == "Scan limit reached."
        )));
        assert_eq!(machine.step(), Step::Capture);
    }

    #[test]
    fn single_mode_success_lands_on_success_step() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        machine.complete_submission(&SubmissionOutcome::Success);
        assert_eq!(machine.step(), Step::Success);
        assert!(!machine.is_submitting());
    }

    #[test]
    fn batch_mode_success_returns_to_capture_with_count_toast() {
        let mut machine = CaptureMachine::new(true);
        machine.capture(&file(1024), &PassthroughCompressor);

        let effects = machine.complete_submission(&SubmissionOutcome::BatchAdded { batch_count: 3 });
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Toast { message, .. } if message == "Photo 3 added to batch"
        )));
        assert_eq!(machine.step(), Step::Capture);
        assert!(machine.image_preview().is_none(), "preview cleared for the next shot");
    }

    #[test]
    fn new_session_clears_storage_and_navigates() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        let effects = machine.complete_submission(&SubmissionOutcome::NewSession {
            session_id: "next-session".to_string(),
        });
        assert_eq!(
            effects,
            vec![
                Effect::ClearStorage,
                Effect::Navigate {
                    session_id: "next-session".to_string()
                }
            ]
        );
    }

    #[test]
    fn timeout_resets_analyzing_with_toast() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        let effects = machine.timeout_fired();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Toast { message, tone: ToastTone::Error } if message == "Scan timed out. Try again."
        )));
        assert_eq!(machine.step(), Step::Capture);
        assert!(!machine.is_submitting());

        // A submission completing after the watchdog reset is stale.
        let effects = machine.complete_submission(&SubmissionOutcome::Success);
        assert!(effects.is_empty());
    }

    #[test]
    fn timeout_outside_analyzing_is_ignored() {
        let mut machine = CaptureMachine::new(false);
        assert!(machine.timeout_fired().is_empty());
    }

    #[test]
    fn voice_flow_reaches_confirm() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);
        machine.complete_submission(&SubmissionOutcome::Success);

        machine.open_voice();
        assert_eq!(machine.step(), Step::Voice);

        let effects = machine.finalize_transcript("small 4, medium 5, large 7");
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::SubmitTranscript { transcript } if transcript == "small 4, medium 5, large 7"
        )));

        machine.variants_parsed();
        assert_eq!(machine.step(), Step::Confirm);
    }

    #[test]
    fn voice_not_reachable_from_capture() {
        let mut machine = CaptureMachine::new(false);
        assert!(machine.open_voice().is_empty());
        assert_eq!(machine.step(), Step::Capture);
    }

    #[test]
    fn empty_transcript_is_not_submitted() {
        let mut machine = CaptureMachine::new(false);
        assert!(machine.finalize_transcript("   ").is_empty());
    }

    #[test]
    fn parse_failure_keeps_voice_step_with_error() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);
        machine.complete_submission(&SubmissionOutcome::Success);
        machine.open_voice();

        machine.variant_parse_failed("Missing transcript");
        assert_eq!(machine.step(), Step::Voice);
        assert_eq!(machine.voice_error(), Some("Missing transcript"));
    }

    #[test]
    fn scan_next_clears_and_requests_new_session() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);
        machine.complete_submission(&SubmissionOutcome::Success);

        let effects = machine.scan_next();
        assert_eq!(effects, vec![Effect::ClearStorage, Effect::RequestNewSession]);
        assert_eq!(machine.step(), Step::Capture);
        assert!(machine.image_preview().is_none());
    }

    #[test]
    fn persisted_state_only_keeps_inline_images() {
        let mut machine = CaptureMachine::new(false);
        machine.capture(&file(1024), &PassthroughCompressor);

        let state = machine.persisted_state();
        assert_eq!(state.step, Step::Analyzing);
        assert!(state.submitting);
        assert!(state.image.as_deref().is_some_and(|i| i.starts_with("data:")));
    }
}
