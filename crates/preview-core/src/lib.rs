pub mod config;
pub mod error;
pub mod message;
pub mod mode;
pub mod preset;
pub mod settings;
pub mod snapshot;
pub mod storage;
pub mod view;

pub use config::PreviewConfig;
pub use error::{PreviewError, Result};
pub use message::{Message, Role};
pub use mode::{PipelineResult, PipelineResults, PreviewMode, RawResult};
pub use preset::{ContentPrompt, MarkerPrompt, PresetDocument, PromptItem};
pub use settings::{FixedMode, PreviewModeSource, PreviewSettings};
pub use snapshot::{ContextSnapshot, ContextSnapshotProvider, EditingState, SharedSnapshotProvider};
pub use storage::DirectorySnapshotProvider;
pub use view::{VariableBag, Variables, View, ViewResult};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
