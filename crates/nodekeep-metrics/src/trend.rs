//! Trend derivation over a run history.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use nodekeep_types::{MetricsRecord, Trend, TrendReport};

/// Compare each record with the previous record of the same validator type
/// by issue total and report the majority direction.
///
/// One `report` run appends a record per validator, so pairing across types
/// would compare unrelated counts. Within a type, stable pairs are tallied
/// but do not vote: `5, 3, 3` is one improving and one stable pair, so the
/// verdict is improving. A tie between improving and worsening, or no
/// movement at all, is stable. A history without any same-type pair is
/// [`Trend::InsufficientData`].
pub fn derive<'a>(history: impl IntoIterator<Item = &'a MetricsRecord>) -> TrendReport {
    let mut report = TrendReport {
        verdict: Trend::InsufficientData,
        improving: 0,
        worsening: 0,
        stable: 0,
        samples: 0,
    };
    let mut previous: BTreeMap<&str, usize> = BTreeMap::new();
    for record in history {
        report.samples += 1;
        let total = record.summary.issue_total();
        let Some(before) = previous.insert(record.validator.as_str(), total) else {
            continue;
        };
        match total.cmp(&before) {
            Ordering::Less => report.improving += 1,
            Ordering::Greater => report.worsening += 1,
            Ordering::Equal => report.stable += 1,
        }
    }
    if report.improving + report.worsening + report.stable == 0 {
        return report;
    }

    report.verdict = match report.improving.cmp(&report.worsening) {
        Ordering::Greater => Trend::Improving,
        Ordering::Less => Trend::Worsening,
        Ordering::Equal => Trend::Stable,
    };
    report
}
