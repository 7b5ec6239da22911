//! Domain types: season datasets in, composition summaries out.

pub mod composition;
pub mod season;

pub use composition::{
    AggregationResult, GroupedCompositions, SeasonCompositionSummary, TopComposition,
};
pub use season::{Member, Run, SeasonDataset, SpecId};
