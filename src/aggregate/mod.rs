//! Composition aggregation over fully materialized season datasets.
//!
//! Pure and synchronous: a call either fully succeeds with one result or
//! fully fails; there is no partial-success mode and no state survives a
//! call. All input crosses the boundary by value.

use std::collections::HashMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{
    AggregationResult, GroupedCompositions, Run, SeasonCompositionSummary, SeasonDataset, SpecId,
    TopComposition,
};
use crate::error::{CompmetaError, Result};

pub mod roles;

use roles::role_rank;

/// Inbound message for one aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub seasons: Vec<SeasonDataset>,
}

/// Terminal outbound message for one aggregation call.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationOutcome {
    Success(AggregationResult),
    Failure(String),
}

// Wire shape: {"success": true, "compositions": [...], "grouped_compositions": {...}}
//          or {"success": false, "error": ...}
impl Serialize for AggregationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AggregationOutcome::Success(result) => {
                let mut state = serializer.serialize_struct("AggregationOutcome", 3)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("compositions", &result.compositions)?;
                state.serialize_field("grouped_compositions", &result.grouped_compositions)?;
                state.end()
            }
            AggregationOutcome::Failure(error) => {
                let mut state = serializer.serialize_struct("AggregationOutcome", 2)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.end()
            }
        }
    }
}

/// Reduces a batch of season datasets into per-season dominant-composition
/// summaries and groups them by expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionAggregator;

impl CompositionAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate already-validated datasets.
    ///
    /// Summaries come back in original season order; the grouped form
    /// buckets them by expansion (first-seen bucket order) with each bucket
    /// sorted by `season_id` descending, stable for equal ids.
    #[tracing::instrument(skip(self, seasons), fields(seasons = seasons.len()))]
    pub fn aggregate(&self, seasons: &[SeasonDataset]) -> AggregationResult {
        let compositions: Vec<SeasonCompositionSummary> =
            seasons.iter().map(summarize_season).collect();

        let mut grouped = GroupedCompositions::default();
        for summary in &compositions {
            grouped.push(summary.clone());
        }
        for (_, bucket) in grouped.0.iter_mut() {
            // Vec::sort_by is stable, so equal ids keep their input order.
            bucket.sort_by(|a, b| b.season_id.cmp(&a.season_id));
        }

        tracing::debug!(
            summaries = compositions.len(),
            expansions = grouped.len(),
            "Aggregation complete"
        );

        AggregationResult {
            compositions,
            grouped_compositions: grouped,
        }
    }

    /// Message-boundary entry point: deserialize `{"seasons": [...]}` and
    /// aggregate.
    ///
    /// Fail-fast, all-or-nothing: one malformed run (missing members,
    /// non-numeric spec id) anywhere in the batch aborts the whole call
    /// with a single descriptive error and zero summaries.
    pub fn handle(&self, input: serde_json::Value) -> Result<AggregationResult> {
        let request: AggregateRequest = serde_json::from_value(input)
            .map_err(|e| CompmetaError::Aggregation(e.to_string()))?;
        Ok(self.aggregate(&request.seasons))
    }

    /// Like [`CompositionAggregator::handle`], but shaped as the outbound
    /// message a coordinator forwards verbatim.
    pub fn respond(&self, input: serde_json::Value) -> AggregationOutcome {
        match self.handle(input) {
            Ok(result) => AggregationOutcome::Success(result),
            Err(e) => {
                tracing::warn!(error = %e, "Aggregation batch rejected");
                AggregationOutcome::Failure(e.to_string())
            }
        }
    }
}

/// Deterministic grouping key for a run's spec makeup.
///
/// Invariant to member input order: a copy of the members is sorted by
/// `(role_rank, spec_id)` ascending before the ids are hyphen-joined.
pub fn composition_key(run: &Run) -> String {
    let mut specs: Vec<SpecId> = run.members.iter().map(|m| m.spec).collect();
    specs.sort_by_key(|&spec| (role_rank(spec), spec));
    specs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

struct Tally {
    count: usize,
    runs: Vec<Run>,
}

fn summarize_season(season: &SeasonDataset) -> SeasonCompositionSummary {
    // Insertion-ordered tally: entries keep first-encounter order, the
    // index map only locates them.
    let mut entries: Vec<(String, Tally)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for run in &season.data {
        let key = composition_key(run);
        match index.get(&key) {
            Some(&i) => {
                entries[i].1.count += 1;
                entries[i].1.runs.push(run.clone());
            }
            None => {
                index.insert(key.clone(), entries.len());
                entries.push((
                    key,
                    Tally {
                        count: 1,
                        runs: vec![run.clone()],
                    },
                ));
            }
        }
    }

    // First-encountered entry wins ties: later equal counts never replace
    // the current max (strictly-greater test).
    let mut top: Option<&(String, Tally)> = None;
    for entry in &entries {
        if top.map_or(true, |t| entry.1.count > t.1.count) {
            top = Some(entry);
        }
    }

    let (spec_combination, count, runs) = match top {
        Some((key, tally)) => (key.clone(), tally.count, tally.runs.clone()),
        None => (String::new(), 0, Vec::new()),
    };

    let total = season.data.len();
    let percentage = if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    };

    SeasonCompositionSummary {
        season_id: season.season_id,
        season_name: season.season_name.clone(),
        expansion: season.expansion.clone(),
        patch: season.patch.clone(),
        keys_count: season.keys_count,
        top_composition: TopComposition {
            spec_combination,
            count,
            percentage,
            runs,
        },
    }
}
