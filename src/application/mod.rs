pub mod pipeline;
pub mod orchestrator;

pub use pipeline::{PipelineReport, Stage, StrategyPipeline, VariantError, VariantResult};
pub use orchestrator::{BacktestOrchestrator, HistoryRequest, OrchestratorError};
