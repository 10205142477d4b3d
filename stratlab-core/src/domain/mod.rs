//! Domain types for StratLab

pub mod ids;
pub mod kinds;
pub mod prompt;
pub mod record;

pub use ids::{PromptId, RecordId};
pub use kinds::{AssetKind, ExecutionPriority, ParseKindError, RiskLevel, StrategyKind};
pub use prompt::{Metadata, UserPrompt};
pub use record::{RecordDraft, RecordError, StrategyRecord, SUPPORTED_PROTOCOL};
