pub mod enrichment;
pub mod item;
pub mod run;
pub mod source;

pub use enrichment::Enrichment;
pub use item::{ChannelVideo, ItemCore, NewsArticle, SourceItem};
pub use run::{AdapterResult, FailureDetail, InstanceFailure, RunResult};
pub use source::{AdapterKind, SourceConfig};
