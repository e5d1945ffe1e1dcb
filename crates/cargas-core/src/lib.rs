pub mod columns;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod ingestion;
pub mod processing;
pub mod shift;
pub mod timestamp;

pub use columns::{ColumnIndices, ColumnMap, ColumnRole, IndexBase};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use filters::{FilterPipeline, FilterResult, FilterStage, StageCount};
pub use ingestion::{FileInput, LoadedTable};
pub use processing::{process, RunOutput, RunReport};
pub use shift::{ShiftTimes, ShiftWindow};
