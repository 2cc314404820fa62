//! Scenario: AAPT2 fails and the legacy encoder takes over

use crate::helpers::*;
use apk_repack::core::{
    StepError, StepState, APPLY_PATCHES, CHECK_PREREQUISITES, ENCODE, ENCODE_AAPT2,
    ENCODE_AAPT_FALLBACK, FALLBACK_REASON, SIGN,
};

#[tokio::test]
async fn test_aapt2_failure_falls_back_to_aapt() {
    let fixture = Fixture::new().with_encoder(
        Script::Fail(vec!["W: resource error"], "exit code 1"),
        Script::Succeed(vec!["I: Built apk"]),
    );
    let result = run_fixture(&fixture).await;

    assert_pipeline_completed(&result);
    assert_trace(
        &result,
        &[
            entry(CHECK_PREREQUISITES, "ok"),
            entry(APPLY_PATCHES, "ok"),
            entry(ENCODE_AAPT2, "skipped"),
            entry(ENCODE_AAPT_FALLBACK, "ok"),
            entry(SIGN, "ok"),
        ],
    );
    assert_eq!(fixture.encode_calls(), vec![true, false]);

    let output = std::fs::read_to_string(fixture.output_path()).unwrap();
    assert_eq!(output, "aapt+signed");
}

#[tokio::test]
async fn test_primary_step_shows_the_fallback_reason() {
    let fixture = Fixture::new().with_encoder(Script::fail("exit code 1"), Script::ok());
    let result = run_fixture(&fixture).await;

    assert_pipeline_completed(&result);
    match result.step_state(ENCODE_AAPT2) {
        Some(StepState::Skipped { reason }) => {
            assert_eq!(reason.as_deref(), Some(FALLBACK_REASON))
        }
        other => panic!("expected the AAPT2 step to be skipped, got {:?}", other),
    }
    assert!(matches!(
        result.step_state(ENCODE),
        Some(StepState::Completed { .. })
    ));
    assert!(result.pipeline.state().should_fall_back());
    assert!(result
        .pipeline
        .state()
        .primary_failure()
        .unwrap()
        .contains("exit code 1"));
}

#[tokio::test]
async fn test_primary_output_is_still_reported_before_falling_back() {
    let fixture = Fixture::new().with_encoder(
        Script::Fail(vec!["W: aapt2 crashed"], "exit code 1"),
        Script::Succeed(vec!["I: Built apk"]),
    );
    let result = run_fixture(&fixture).await;

    assert_pipeline_completed(&result);
    assert_eq!(result.lines_of(ENCODE_AAPT2), vec!["W: aapt2 crashed"]);
    assert_eq!(result.lines_of(ENCODE_AAPT_FALLBACK), vec!["I: Built apk"]);
}

#[tokio::test]
async fn test_both_encoders_failing_stops_before_signing() {
    let fixture = Fixture::new().with_encoder(
        Script::fail("aapt2 exit code 1"),
        Script::fail("aapt exit code 1"),
    );
    let result = run_fixture(&fixture).await;

    assert_pipeline_failed_at(&result, ENCODE_AAPT_FALLBACK);
    assert_trace(
        &result,
        &[
            entry(CHECK_PREREQUISITES, "ok"),
            entry(APPLY_PATCHES, "ok"),
            entry(ENCODE_AAPT2, "skipped"),
            entry(ENCODE_AAPT_FALLBACK, "failed"),
        ],
    );
    assert!(matches!(
        result.step_state(ENCODE),
        Some(StepState::Failed { .. })
    ));
    assert!(fixture.sign_calls().is_empty());
    assert!(!fixture.output_path().exists());
}

#[tokio::test]
async fn test_fallback_error_carries_the_primary_failure() {
    let fixture = Fixture::new().with_encoder(
        Script::fail("aapt2 exit code 1"),
        Script::fail("aapt exit code 2"),
    );
    let result = run_fixture(&fixture).await;

    let error = result.result.as_ref().unwrap_err();
    match &error.source {
        StepError::Encode {
            primary_failure, ..
        } => {
            assert!(primary_failure
                .as_deref()
                .unwrap()
                .contains("aapt2 exit code 1"));
        }
        other => panic!("expected an encode error, got {:?}", other),
    }

    match result.step_state(ENCODE_AAPT_FALLBACK) {
        Some(StepState::Failed { error, .. }) => {
            assert!(error.contains("aapt exit code 2"));
            assert!(error.contains("aapt2 exit code 1"));
        }
        other => panic!("expected the fallback to fail, got {:?}", other),
    }
}
