//! Background pipeline reducing per-season competitive-run datasets into
//! "most-used group composition" summaries.
//!
//! Two stages, both isolated from the interactive surface that displays
//! their output: a streaming fetch stage ([`StreamFetcher`]) downloads one
//! season dataset per request while emitting throttled, request-correlated
//! progress telemetry, and an aggregation stage ([`CompositionAggregator`])
//! reduces a batch of materialized datasets into per-season dominant
//! compositions, grouped by expansion. A coordinator (out of scope here)
//! assigns request ids, dispatches to the stages, and consumes their
//! messages.

pub mod aggregate;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod request;

// Re-export commonly used types
pub use aggregate::{AggregateRequest, AggregationOutcome, CompositionAggregator};
pub use domain::{
    AggregationResult, GroupedCompositions, Member, Run, SeasonCompositionSummary, SeasonDataset,
    SpecId, TopComposition,
};
pub use error::{CompmetaError, Result};
pub use fetcher::{FetcherConfig, StreamFetcher};
pub use http::{HttpBody, HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use request::{
    FetchMessage, FetchOutcome, FetchRequest, FetchResult, ProgressEvent, ProgressStage, RequestId,
};
