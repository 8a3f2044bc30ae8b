//! Statistics Calculator Module
//! Central tendency helpers shared by cleaning and aggregation.

use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Stateless statistics helpers.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Median of the values, `None` for an empty slice.
    pub fn median(values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Some(median)
    }

    /// Arithmetic mean; NaN for an empty slice.
    pub fn mean(values: &[f64]) -> f64 {
        values.iter().mean()
    }

    /// Most frequent value. Ties resolve to the smallest value so repeated
    /// runs over the same data agree.
    pub fn mode<'a, I>(values: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for v in values {
            *counts.entry(v).or_default() += 1;
        }

        let mut best: Option<(&str, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value.to_string())
    }

    /// Percentage change between consecutive values. The first entry, and any
    /// entry whose predecessor is zero, has no defined rate.
    pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
        if values.is_empty() {
            return Vec::new();
        }
        std::iter::once(None)
            .chain(values.windows(2).map(|w| {
                let (prev, cur) = (w[0], w[1]);
                if prev == 0.0 || !prev.is_finite() {
                    None
                } else {
                    Some((cur - prev) / prev * 100.0)
                }
            }))
            .collect()
    }
}
