//! Test utilities: a scripted in-process compute service

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use preview_compute::{AssembleRequest, ComputeService, PostprocessRequest};
use preview_core::{
    ContextSnapshot, ContextSnapshotProvider, PreviewError, PreviewMode, PreviewModeSource,
    Result,
};
use serde_json::{json, Value};
use tokio::sync::{Notify, Semaphore};

type Responder<R> = Box<dyn Fn(&R, usize) -> Result<Value> + Send + Sync>;

/// Records every request and answers from closures.
///
/// By default `assemble` returns a fixed system prompt followed by the
/// request history, and `postprocess` tags each message with the view name
/// and reports `{"view": <view>}` merged into the incoming variables as the
/// final bag.
pub struct ScriptedComputeService {
    assemble: Responder<AssembleRequest>,
    postprocess: Responder<PostprocessRequest>,
    pub assemble_calls: Mutex<Vec<AssembleRequest>>,
    pub postprocess_calls: Mutex<Vec<PostprocessRequest>>,
    gate: Option<Arc<Semaphore>>,
    pub entered: Arc<Notify>,
}

impl ScriptedComputeService {
    pub fn new() -> Self {
        Self {
            assemble: Box::new(|request: &AssembleRequest, _: usize| {
                Ok(default_assemble(request))
            }),
            postprocess: Box::new(|request: &PostprocessRequest, _: usize| {
                Ok(default_postprocess(request))
            }),
            assemble_calls: Mutex::new(Vec::new()),
            postprocess_calls: Mutex::new(Vec::new()),
            gate: None,
            entered: Arc::new(Notify::new()),
        }
    }

    /// `f` receives the request and the zero-based call index.
    pub fn with_assemble<F>(mut self, f: F) -> Self
    where
        F: Fn(&AssembleRequest, usize) -> Result<Value> + Send + Sync + 'static,
    {
        self.assemble = Box::new(f);
        self
    }

    pub fn with_postprocess<F>(mut self, f: F) -> Self
    where
        F: Fn(&PostprocessRequest, usize) -> Result<Value> + Send + Sync + 'static,
    {
        self.postprocess = Box::new(f);
        self
    }

    /// Every call waits for a permit from the returned semaphore before answering.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn assemble_count(&self) -> usize {
        self.assemble_calls.lock().unwrap().len()
    }

    pub fn postprocess_count(&self) -> usize {
        self.postprocess_calls.lock().unwrap().len()
    }

    async fn wait_for_gate(&self) {
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

#[async_trait]
impl ComputeService for ScriptedComputeService {
    async fn assemble(&self, request: &AssembleRequest) -> Result<Value> {
        let index = {
            let mut calls = self.assemble_calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        self.wait_for_gate().await;
        (self.assemble)(request, index)
    }

    async fn postprocess(&self, request: &PostprocessRequest) -> Result<Value> {
        let index = {
            let mut calls = self.postprocess_calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        self.wait_for_gate().await;
        (self.postprocess)(request, index)
    }
}

pub fn default_assemble(request: &AssembleRequest) -> Value {
    let mut messages = vec![json!({"role": "system", "content": "You are a storyteller."})];
    messages.extend(
        request
            .history
            .iter()
            .map(|m| serde_json::to_value(m).unwrap()),
    );
    json!({ "messages": messages })
}

pub fn default_postprocess(request: &PostprocessRequest) -> Value {
    let view = request.view.as_str();
    let messages: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({"role": m.role, "content": format!("[{}] {}", view, m.content)}))
        .collect();
    let mut final_vars = request.variables.clone();
    final_vars.insert("view".into(), json!(view));
    json!({
        "message": messages,
        "variables": {"initial": request.variables, "final": final_vars}
    })
}

/// Snapshot provider whose next capture can be made to fail.
pub struct FlakySnapshots {
    pub snapshot: ContextSnapshot,
    pub fail: Mutex<bool>,
}

impl FlakySnapshots {
    pub fn new(snapshot: ContextSnapshot) -> Self {
        Self {
            snapshot,
            fail: Mutex::new(false),
        }
    }
}

#[async_trait]
impl ContextSnapshotProvider for FlakySnapshots {
    async fn snapshot(&self) -> Result<ContextSnapshot> {
        if *self.fail.lock().unwrap() {
            return Err(PreviewError::Snapshot("workspace unreadable".into()));
        }
        Ok(self.snapshot.clone())
    }
}

/// Mode source the test can flip.
#[derive(Default)]
pub struct SwitchableMode(pub Mutex<PreviewMode>);

impl PreviewModeSource for SwitchableMode {
    fn current_mode(&self) -> PreviewMode {
        *self.0.lock().unwrap()
    }
}
