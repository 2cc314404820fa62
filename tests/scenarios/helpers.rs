//! Test utility functions for apk-repack

use apk_repack::core::{
    PatchOptions, PipelineError, PipelineOptions, RepackPipeline, RunReport, StepState,
};
use apk_repack::execution::{ExecutionEngine, ExecutionEvent};
use apk_repack::tools::{
    Encoder, LineStream, OperatorInput, PatchEngine, PrerequisiteChecker, SignOptions, Signer,
    ToolError, Toolbox,
};

use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What a scripted collaborator does when called
#[derive(Debug, Clone)]
pub enum Script {
    /// Emit these lines, then succeed
    Succeed(Vec<&'static str>),
    /// Emit these lines, then fail with the message
    Fail(Vec<&'static str>, &'static str),
}

impl Script {
    pub fn ok() -> Self {
        Script::Succeed(Vec::new())
    }

    pub fn fail(message: &'static str) -> Self {
        Script::Fail(Vec::new(), message)
    }

    fn succeeds(&self) -> bool {
        matches!(self, Script::Succeed(_))
    }

    fn into_stream(self) -> LineStream {
        let items: Vec<Result<String, ToolError>> = match self {
            Script::Succeed(lines) => lines.into_iter().map(|l| Ok(l.to_string())).collect(),
            Script::Fail(lines, message) => lines
                .into_iter()
                .map(|l| Ok(l.to_string()))
                .chain(std::iter::once(Err(ToolError::Failed(message.to_string()))))
                .collect(),
        };
        futures::stream::iter(items).boxed()
    }
}

/// Prerequisite checker that passes or fails on demand
pub struct MockPrerequisites {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl PrerequisiteChecker for MockPrerequisites {
    async fn check(&self, _options: &PipelineOptions) -> Result<(), ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ToolError::NotFound("java".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Patch engine that records its calls and touches a marker file on success
pub struct MockPatcher {
    pub script: Script,
    pub calls: Mutex<Vec<(PathBuf, PatchOptions)>>,
}

impl PatchEngine for MockPatcher {
    fn apply(&self, decode_dir: &Path, options: &PatchOptions) -> LineStream {
        self.calls
            .lock()
            .unwrap()
            .push((decode_dir.to_path_buf(), options.clone()));
        if self.script.succeeds() {
            std::fs::write(decode_dir.join("patched.marker"), b"patched").unwrap();
        }
        self.script.clone().into_stream()
    }
}

/// Encoder with separate scripts for the two strategies
///
/// A successful encode writes the strategy name into the output archive.
pub struct MockEncoder {
    pub aapt2: Script,
    pub aapt: Script,
    pub calls: Mutex<Vec<(PathBuf, bool)>>,
}

impl Encoder for MockEncoder {
    fn encode(&self, _decode_dir: &Path, output: &Path, use_aapt2: bool) -> LineStream {
        self.calls
            .lock()
            .unwrap()
            .push((output.to_path_buf(), use_aapt2));
        let script = if use_aapt2 { &self.aapt2 } else { &self.aapt };
        if script.succeeds() {
            let content = if use_aapt2 { "aapt2" } else { "aapt" };
            std::fs::write(output, content).unwrap();
        }
        script.clone().into_stream()
    }
}

/// Signer that appends a signature marker to each archive on success
pub struct MockSigner {
    pub script: Script,
    pub calls: Mutex<Vec<(Vec<PathBuf>, SignOptions)>>,
}

impl Signer for MockSigner {
    fn sign(&self, archives: &[PathBuf], options: SignOptions) -> LineStream {
        self.calls.lock().unwrap().push((archives.to_vec(), options));
        if self.script.succeeds() {
            for archive in archives {
                let mut content = std::fs::read_to_string(archive).unwrap();
                content.push_str("+signed");
                std::fs::write(archive, content).unwrap();
            }
        }
        self.script.clone().into_stream()
    }
}

/// Operator input that "presses a key" immediately
#[derive(Default)]
pub struct MockInput {
    pub calls: AtomicUsize,
}

#[async_trait]
impl OperatorInput for MockInput {
    async fn wait_for_key(&self) -> Result<(), ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted collaborators plus a scratch directory layout
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub prerequisites: Arc<MockPrerequisites>,
    pub patcher: Arc<MockPatcher>,
    pub encoder: Arc<MockEncoder>,
    pub signer: Arc<MockSigner>,
    pub input: Arc<MockInput>,
    pub skip_patches: bool,
    pub wait: bool,
    pub patch: PatchOptions,
}

impl Fixture {
    /// Everything succeeds silently
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("decoded")).unwrap();
        std::fs::create_dir(dir.path().join("tmp")).unwrap();

        Self {
            dir,
            prerequisites: Arc::new(MockPrerequisites {
                fail: false,
                calls: AtomicUsize::new(0),
            }),
            patcher: Arc::new(MockPatcher {
                script: Script::ok(),
                calls: Mutex::new(Vec::new()),
            }),
            encoder: Arc::new(MockEncoder {
                aapt2: Script::ok(),
                aapt: Script::ok(),
                calls: Mutex::new(Vec::new()),
            }),
            signer: Arc::new(MockSigner {
                script: Script::ok(),
                calls: Mutex::new(Vec::new()),
            }),
            input: Arc::new(MockInput::default()),
            skip_patches: false,
            wait: false,
            patch: PatchOptions::default(),
        }
    }

    pub fn failing_prerequisites(mut self) -> Self {
        self.prerequisites = Arc::new(MockPrerequisites {
            fail: true,
            calls: AtomicUsize::new(0),
        });
        self
    }

    pub fn with_patcher(mut self, script: Script) -> Self {
        self.patcher = Arc::new(MockPatcher {
            script,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn with_encoder(mut self, aapt2: Script, aapt: Script) -> Self {
        self.encoder = Arc::new(MockEncoder {
            aapt2,
            aapt,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn with_signer(mut self, script: Script) -> Self {
        self.signer = Arc::new(MockSigner {
            script,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn skip_patches(mut self) -> Self {
        self.skip_patches = true;
        self
    }

    pub fn wait(mut self) -> Self {
        self.wait = true;
        self
    }

    pub fn decode_dir(&self) -> PathBuf {
        self.dir.path().join("decoded")
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join("out").join("patched.apk")
    }

    pub fn options(&self) -> PipelineOptions {
        std::fs::create_dir_all(self.dir.path().join("out")).unwrap();
        PipelineOptions {
            input_path: self.decode_dir(),
            tmp_dir: self.dir.path().join("tmp"),
            output_path: self.output_path(),
            skip_patches: self.skip_patches,
            wait: self.wait,
            patch: self.patch.clone(),
            tools: Toolbox {
                prerequisites: self.prerequisites.clone(),
                patcher: self.patcher.clone(),
                encoder: self.encoder.clone(),
                signer: self.signer.clone(),
                input: self.input.clone(),
            },
        }
    }

    /// Encoder calls as `use_aapt2` flags, in order
    pub fn encode_calls(&self) -> Vec<bool> {
        self.encoder
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, aapt2)| *aapt2)
            .collect()
    }

    pub fn sign_calls(&self) -> Vec<(Vec<PathBuf>, SignOptions)> {
        self.signer.calls.lock().unwrap().clone()
    }

    pub fn patch_calls(&self) -> usize {
        self.patcher.calls.lock().unwrap().len()
    }
}

/// Test result from running the pipeline
pub struct PipelineTestResult {
    pub pipeline: RepackPipeline,
    pub report: RunReport,
    pub result: Result<(), PipelineError>,
    /// `(step title, line)` pairs in the order they were reported
    pub lines: Vec<(String, String)>,
}

impl PipelineTestResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok() && self.report.is_success()
    }

    pub fn step_state(&self, title: &str) -> Option<&StepState> {
        self.report.record(title).map(|r| &r.state)
    }

    /// Lines reported by one step
    pub fn lines_of(&self, title: &str) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(t, _)| t == title)
            .map(|(_, l)| l.as_str())
            .collect()
    }
}

/// Run the repack pipeline against the fixture's collaborators
pub async fn run_fixture(fixture: &Fixture) -> PipelineTestResult {
    run_options(fixture.options()).await
}

/// Run the repack pipeline with hand-adjusted options
pub async fn run_options(options: PipelineOptions) -> PipelineTestResult {
    let pipeline = RepackPipeline::new(options);
    let engine = ExecutionEngine::new();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    engine.add_event_handler(move |event| {
        if let ExecutionEvent::StepOutput { title, line } = event {
            sink.lock().unwrap().push((title.clone(), line.clone()));
        }
    });

    let mut report = RunReport::new(pipeline.run_id());
    let result = pipeline.execute(&engine, &mut report).await;
    let lines = lines.lock().unwrap().clone();

    PipelineTestResult {
        pipeline,
        report,
        result,
        lines,
    }
}

/// Assert the leaf trace, written as `title:label`
pub fn assert_trace(result: &PipelineTestResult, expected: &[String]) {
    assert_eq!(
        result.report.trace(),
        expected,
        "unexpected trace (result: {:?})",
        result.result
    );
}

pub fn entry(title: &str, label: &str) -> String {
    format!("{}:{}", title, label)
}

pub fn assert_pipeline_completed(result: &PipelineTestResult) {
    assert!(
        result.is_success(),
        "Pipeline should be completed, but got {:?} with trace {:?}",
        result.result,
        result.report.trace()
    );
}

pub fn assert_pipeline_failed_at(result: &PipelineTestResult, title: &str) {
    match &result.result {
        Err(e) => assert_eq!(e.step, title, "failed at the wrong step: {:?}", e),
        Ok(()) => panic!("Pipeline should have failed at '{}'", title),
    }
    assert!(!result.report.is_success());
}
