//! Fetch request and progress message types.

pub mod types;

pub use types::{
    FetchMessage, FetchOutcome, FetchRequest, FetchResult, ProgressEvent, ProgressStage, RequestId,
};
