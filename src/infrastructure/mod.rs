// Infrastructure implementations for Setting Miner.

pub mod concurrency;
pub mod exporters;
pub mod file_walker;
pub mod json_source;
pub mod service_client;
pub mod tree_cache;

pub use exporters::{JsonExporter, TextExporter};
pub use file_walker::{relative_source_path, SourceWalker};
pub use json_source::JsonTreeSource;
pub use service_client::{RetryPolicy, ServiceTreeSource};
pub use tree_cache::CachingTreeSource;
