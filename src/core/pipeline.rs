//! The repack pipeline: check, patch, pause, encode, sign

use crate::core::{
    EncodeStrategy, PipelineError, PipelineOptions, RunReport, RunState, Step, StepError,
    StepOutcome,
};
use crate::execution::{forward_lines, observe, ExecutionEngine};
use crate::tools::{SignOptions, ToolError};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CHECK_PREREQUISITES: &str = "Checking prerequisites";
pub const APPLY_PATCHES: &str = "Applying patches";
pub const WAIT_FOR_OPERATOR: &str = "Waiting for you to make changes";
pub const ENCODE: &str = "Encoding patched APK file";
pub const ENCODE_AAPT2: &str = "Encoding using AAPT2";
pub const ENCODE_AAPT_FALLBACK: &str = "Encoding using AAPT [fallback]";
pub const SIGN: &str = "Signing patched APK file";

pub const FALLBACK_REASON: &str = "Failed, falling back to AAPT...";
pub const PATCHES_SKIPPED_REASON: &str = "Skipped on request";
pub const PRESS_ANY_KEY: &str = "Press any key to continue.";

/// One run of the repack pipeline
///
/// Each instance owns its own [`RunState`], so two pipelines never share a
/// fallback flag or a temporary archive.
pub struct RepackPipeline {
    options: Arc<PipelineOptions>,
    state: Arc<RunState>,
}

impl RepackPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        let state = Arc::new(RunState::new(&options.tmp_dir));
        Self {
            options: Arc::new(options),
            state,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.state.run_id()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Build the step graph and run it
    pub async fn execute(
        &self,
        engine: &ExecutionEngine,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let steps = self.steps();
        engine.execute(&steps, report).await
    }

    /// The step graph for this run
    pub fn steps(&self) -> Vec<Step> {
        vec![
            self.check_prerequisites(),
            self.apply_patches(),
            self.wait_for_operator(),
            Step::group(ENCODE, vec![self.encode_primary(), self.encode_fallback()]),
            self.sign_and_deliver(),
        ]
    }

    fn check_prerequisites(&self) -> Step {
        let options = Arc::clone(&self.options);
        Step::task(CHECK_PREREQUISITES, move |_| {
            let options = Arc::clone(&options);
            async move {
                options
                    .tools
                    .prerequisites
                    .check(&options)
                    .await
                    .map_err(StepError::Prerequisite)?;
                Ok(StepOutcome::Completed)
            }
        })
    }

    fn apply_patches(&self) -> Step {
        let options = Arc::clone(&self.options);
        let skip = options.skip_patches;
        Step::task(APPLY_PATCHES, move |reporter| {
            let options = Arc::clone(&options);
            async move {
                let lines = options
                    .tools
                    .patcher
                    .apply(&options.input_path, &options.patch);
                forward_lines(&reporter, lines)
                    .await
                    .map_err(StepError::Patch)?;
                Ok(StepOutcome::Completed)
            }
        })
        .skip_if(move || skip)
        .with_skip_reason(PATCHES_SKIPPED_REASON)
    }

    fn wait_for_operator(&self) -> Step {
        let options = Arc::clone(&self.options);
        let wait = options.wait;
        Step::task(WAIT_FOR_OPERATOR, move |reporter| {
            let options = Arc::clone(&options);
            async move {
                observe(&reporter, |log| async move {
                    log.report(PRESS_ANY_KEY);
                    options.tools.input.wait_for_key().await
                })
                .await
                .map_err(|e| match e {
                    ToolError::Interrupted => StepError::Interrupted,
                    other => StepError::Input(other),
                })?;
                Ok(StepOutcome::Completed)
            }
        })
        .enabled_if(move || wait)
    }

    fn encode_primary(&self) -> Step {
        let options = Arc::clone(&self.options);
        let state = Arc::clone(&self.state);
        Step::task(ENCODE_AAPT2, move |reporter| {
            let options = Arc::clone(&options);
            let state = Arc::clone(&state);
            async move {
                let lines = options.tools.encoder.encode(
                    &options.input_path,
                    state.tmp_archive(),
                    EncodeStrategy::Aapt2.uses_aapt2(),
                );
                match forward_lines(&reporter, lines).await {
                    Ok(count) => {
                        debug!("AAPT2 encode produced {} lines", count);
                        Ok(StepOutcome::Completed)
                    }
                    Err(e) => {
                        warn!("Encoding with AAPT2 failed, falling back to AAPT: {}", e);
                        state.fall_back(e.to_string());
                        Ok(StepOutcome::Skipped {
                            reason: FALLBACK_REASON.to_string(),
                        })
                    }
                }
            }
        })
    }

    fn encode_fallback(&self) -> Step {
        let options = Arc::clone(&self.options);
        let state = Arc::clone(&self.state);
        let flag = Arc::clone(&self.state);
        Step::task(ENCODE_AAPT_FALLBACK, move |reporter| {
            let options = Arc::clone(&options);
            let state = Arc::clone(&state);
            async move {
                let lines = options.tools.encoder.encode(
                    &options.input_path,
                    state.tmp_archive(),
                    EncodeStrategy::Aapt.uses_aapt2(),
                );
                forward_lines(&reporter, lines)
                    .await
                    .map_err(|source| StepError::Encode {
                        strategy: EncodeStrategy::Aapt,
                        source,
                        primary_failure: state.primary_failure(),
                    })?;
                Ok(StepOutcome::Completed)
            }
        })
        .skip_if(move || !flag.should_fall_back())
    }

    fn sign_and_deliver(&self) -> Step {
        let options = Arc::clone(&self.options);
        let state = Arc::clone(&self.state);
        Step::task(SIGN, move |reporter| {
            let options = Arc::clone(&options);
            let state = Arc::clone(&state);
            async move {
                let archive = state.tmp_archive().to_path_buf();
                let lines = options
                    .tools
                    .signer
                    .sign(std::slice::from_ref(&archive), SignOptions { zipalign: true });
                forward_lines(&reporter, lines)
                    .await
                    .map_err(StepError::Sign)?;

                tokio::fs::copy(&archive, &options.output_path)
                    .await
                    .map_err(|source| StepError::Copy {
                        from: archive.clone(),
                        to: options.output_path.clone(),
                        source,
                    })?;
                debug!(
                    "Copied {} to {}",
                    archive.display(),
                    options.output_path.display()
                );
                Ok(StepOutcome::Completed)
            }
        })
    }
}
