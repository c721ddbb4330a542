//! Sample history: a JSONL log of poll rounds and its aggregation.

pub mod logger;
pub mod reporter;
