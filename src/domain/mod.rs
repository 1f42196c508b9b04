// Domain layer for Setting Miner: tree model, query engine and setting extraction.

pub mod default_value;
pub mod extractor;
pub mod java;
pub mod properties;
pub mod query;
pub mod setting;
pub mod uast;
