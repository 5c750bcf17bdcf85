use std::collections::BTreeSet;

use super::capability;
use super::entry::CapabilityValue;

/// A best-effort capability guess for an unmapped numeric datapoint.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HeuristicMatch {
    pub(crate) capability: &'static str,
    pub(crate) value: CapabilityValue,
}

#[derive(Debug, Clone, Copy)]
struct RangeCandidate {
    capability: &'static str,
    min_raw: i64,
    max_raw: i64,
    divisor: f64,
}

// Checked in order; the first candidate whose range contains the raw value
// and whose capability the platform declared possible wins. The ranges
// overlap by nature, so this tier is diagnostics-grade, not authoritative.
const CANDIDATES: [RangeCandidate; 3] = [
    RangeCandidate {
        capability: capability::MEASURE_TEMPERATURE,
        min_raw: -400,
        max_raw: 1250,
        divisor: 10.0,
    },
    RangeCandidate {
        capability: capability::MEASURE_HUMIDITY,
        min_raw: 0,
        max_raw: 100,
        divisor: 1.0,
    },
    RangeCandidate {
        capability: capability::MEASURE_BATTERY,
        min_raw: 0,
        max_raw: 100,
        divisor: 1.0,
    },
];

/// Classifies an unmapped raw numeric reading by plausible value range.
///
/// Only capabilities in `possible` are considered; with an empty set the
/// heuristic never matches and the datapoint stays unmapped.
pub(crate) fn classify_unmapped(raw: i64, possible: &BTreeSet<String>) -> Option<HeuristicMatch> {
    CANDIDATES
        .iter()
        .find(|candidate| {
            (candidate.min_raw..=candidate.max_raw).contains(&raw)
                && possible.contains(candidate.capability)
        })
        .map(|candidate| HeuristicMatch {
            capability: candidate.capability,
            value: CapabilityValue::Number(raw as f64 / candidate.divisor),
        })
}
