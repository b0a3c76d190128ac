pub mod chain;
pub mod config;
pub mod events;
pub mod orchestrator;
pub mod state;

pub use chain::StageChain;
pub use config::PipelineConfig;
pub use events::{GenerationOutcome, PipelineEvent};
pub use orchestrator::PipelineOrchestrator;
pub use state::PipelineStatus;
