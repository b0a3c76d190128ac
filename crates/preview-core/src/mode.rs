use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::view::ViewResult;

/// How far down the stage chain a preview goes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// Assembled messages, no post-processing.
    #[default]
    Raw,
    /// User-facing dialog (`user_view`).
    Message,
    /// What is sent to the model (`assistant_view`).
    Preflight,
}

impl PreviewMode {
    pub const ALL: [PreviewMode; 3] = [PreviewMode::Raw, PreviewMode::Message, PreviewMode::Preflight];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewMode::Raw => "raw",
            PreviewMode::Message => "message",
            PreviewMode::Preflight => "preflight",
        }
    }
}

impl std::fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(PreviewMode::Raw),
            "message" | "dialog" => Ok(PreviewMode::Message),
            "preflight" => Ok(PreviewMode::Preflight),
            other => Err(format!(
                "unknown preview mode '{}', expected raw, message or preflight",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawResult {
    pub messages: Vec<Message>,
}

/// Output of one full stage chain, tagged by the mode that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PipelineResult {
    Raw(RawResult),
    Message(ViewResult),
    Preflight(ViewResult),
}

impl PipelineResult {
    pub fn mode(&self) -> PreviewMode {
        match self {
            PipelineResult::Raw(_) => PreviewMode::Raw,
            PipelineResult::Message(_) => PreviewMode::Message,
            PipelineResult::Preflight(_) => PreviewMode::Preflight,
        }
    }

    pub fn messages(&self) -> &[Message] {
        match self {
            PipelineResult::Raw(raw) => &raw.messages,
            PipelineResult::Message(view) | PipelineResult::Preflight(view) => &view.messages,
        }
    }
}

/// Last successful result for each mode. Storing one mode never touches the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineResults {
    pub raw: Option<RawResult>,
    pub message: Option<ViewResult>,
    pub preflight: Option<ViewResult>,
}

impl PipelineResults {
    pub fn store(&mut self, result: PipelineResult) {
        match result {
            PipelineResult::Raw(raw) => self.raw = Some(raw),
            PipelineResult::Message(view) => self.message = Some(view),
            PipelineResult::Preflight(view) => self.preflight = Some(view),
        }
    }

    pub fn get(&self, mode: PreviewMode) -> Option<PipelineResult> {
        match mode {
            PreviewMode::Raw => self.raw.clone().map(PipelineResult::Raw),
            PreviewMode::Message => self.message.clone().map(PipelineResult::Message),
            PreviewMode::Preflight => self.preflight.clone().map(PipelineResult::Preflight),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_none() && self.message.is_none() && self.preflight.is_none()
    }
}
