//! Aggregation output types.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::season::Run;

/// The dominant composition observed within one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopComposition {
    /// Deterministic key summarizing the run's spec makeup (see the
    /// aggregator's key construction); empty for a season with no runs
    pub spec_combination: String,
    /// Number of runs with this composition
    pub count: usize,
    /// `100 * count / total_runs`, 0.0 for an empty season
    pub percentage: f64,
    /// The runs that produced this composition, in input order
    pub runs: Vec<Run>,
}

/// Per-season summary produced by the aggregator. Immutable output; no
/// state survives a single aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonCompositionSummary {
    pub season_id: u32,
    pub season_name: String,
    pub expansion: String,
    pub patch: String,
    pub keys_count: u64,
    pub top_composition: TopComposition,
}

/// Summaries bucketed by expansion.
///
/// Buckets appear in first-seen order and are keyed by the expansion string
/// verbatim. Within a bucket, summaries are sorted by `season_id`
/// descending, stable for equal ids. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedCompositions(pub Vec<(String, Vec<SeasonCompositionSummary>)>);

impl GroupedCompositions {
    /// Append a summary to its expansion's bucket, creating the bucket at
    /// the end on first sight.
    pub fn push(&mut self, summary: SeasonCompositionSummary) {
        match self.0.iter_mut().find(|(exp, _)| *exp == summary.expansion) {
            Some((_, bucket)) => bucket.push(summary),
            None => self.0.push((summary.expansion.clone(), vec![summary])),
        }
    }

    /// Bucket for one expansion, if any.
    pub fn get(&self, expansion: &str) -> Option<&[SeasonCompositionSummary]> {
        self.0
            .iter()
            .find(|(exp, _)| exp == expansion)
            .map(|(_, bucket)| bucket.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SeasonCompositionSummary])> {
        self.0
            .iter()
            .map(|(exp, bucket)| (exp.as_str(), bucket.as_slice()))
    }
}

impl Serialize for GroupedCompositions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (expansion, bucket) in &self.0 {
            map.serialize_entry(expansion, bucket)?;
        }
        map.end()
    }
}

/// Terminal output of one aggregation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    /// One summary per input season, in original season order
    pub compositions: Vec<SeasonCompositionSummary>,
    /// The same summaries bucketed by expansion
    pub grouped_compositions: GroupedCompositions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(expansion: &str, season_id: u32) -> SeasonCompositionSummary {
        SeasonCompositionSummary {
            season_id,
            season_name: format!("Season {}", season_id),
            expansion: expansion.to_string(),
            patch: "x.y".to_string(),
            keys_count: 0,
            top_composition: TopComposition {
                spec_combination: String::new(),
                count: 0,
                percentage: 0.0,
                runs: Vec::new(),
            },
        }
    }

    #[test]
    fn test_buckets_keep_first_seen_order() {
        let mut grouped = GroupedCompositions::default();
        grouped.push(summary("TWW", 10));
        grouped.push(summary("DF", 5));
        grouped.push(summary("TWW", 9));

        let order: Vec<_> = grouped.iter().map(|(exp, _)| exp.to_string()).collect();
        assert_eq!(order, vec!["TWW", "DF"]);
        assert_eq!(grouped.get("TWW").unwrap().len(), 2);
    }

    #[test]
    fn test_serializes_as_json_object() {
        let mut grouped = GroupedCompositions::default();
        grouped.push(summary("TWW", 10));
        grouped.push(summary("DF", 5));

        let value = serde_json::to_value(&grouped).unwrap();
        assert!(value.is_object());
        assert_eq!(value["TWW"][0]["season_id"], 10);
        assert_eq!(value["DF"][0]["season_id"], 5);
    }
}
