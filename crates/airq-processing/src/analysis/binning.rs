//! Fixed-threshold categorical binning.

use crate::analysis::column_values;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Three-way split of a numeric column.
///
/// A value below `lower` gets the first label, a value up to and
/// including `upper` the second, anything above the third.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinRule {
    pub column: &'static str,
    pub lower: f64,
    pub upper: f64,
    pub labels: [&'static str; 3],
}

impl BinRule {
    pub fn classify(&self, value: f64) -> &'static str {
        if value < self.lower {
            self.labels[0]
        } else if value <= self.upper {
            self.labels[1]
        } else {
            self.labels[2]
        }
    }
}

pub const NO2_BINS: BinRule = BinRule {
    column: "NO2",
    lower: 40.0,
    upper: 80.0,
    labels: ["Low", "Moderate", "High"],
};

pub const CO_BINS: BinRule = BinRule {
    column: "CO",
    lower: 1000.0,
    upper: 2000.0,
    labels: ["Low", "Moderate", "High"],
};

pub const TEMP_BINS: BinRule = BinRule {
    column: "TEMP",
    lower: 0.0,
    upper: 20.0,
    labels: ["Cold", "Mild", "Hot"],
};

pub const DEWP_BINS: BinRule = BinRule {
    column: "DEWP",
    lower: 0.0,
    upper: 10.0,
    labels: ["Low Humidity", "Moderate Humidity", "High Humidity"],
};

pub const DEFAULT_BIN_RULES: [BinRule; 4] = [NO2_BINS, CO_BINS, TEMP_BINS, DEWP_BINS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinCount {
    pub label: String,
    pub count: usize,
}

/// Counts per bin, in bin order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinDistribution {
    pub column: String,
    pub counts: Vec<BinCount>,
    /// Null or NaN values, left out of every bin.
    pub unbinned: usize,
}

impl BinDistribution {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }
}

fn labels_for(df: &DataFrame, rule: &BinRule) -> Result<Vec<Option<&'static str>>> {
    Ok(column_values(df, rule.column)?
        .into_iter()
        .map(|v| v.filter(|v| !v.is_nan()).map(|v| rule.classify(v)))
        .collect())
}

/// Count the rows of `df` falling into each bin of `rule`.
pub fn bin_distribution(df: &DataFrame, rule: &BinRule) -> Result<BinDistribution> {
    let mut counts = [0usize; 3];
    let mut unbinned = 0;

    for label in labels_for(df, rule)? {
        match label.and_then(|l| rule.labels.iter().position(|x| *x == l)) {
            Some(idx) => counts[idx] += 1,
            None => unbinned += 1,
        }
    }

    Ok(BinDistribution {
        column: rule.column.to_string(),
        counts: rule
            .labels
            .iter()
            .zip(counts)
            .map(|(label, count)| BinCount {
                label: label.to_string(),
                count,
            })
            .collect(),
        unbinned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_threshold_edges() {
        assert_eq!(NO2_BINS.classify(39.9), "Low");
        assert_eq!(NO2_BINS.classify(40.0), "Moderate");
        assert_eq!(NO2_BINS.classify(80.0), "Moderate");
        assert_eq!(NO2_BINS.classify(80.1), "High");
        assert_eq!(TEMP_BINS.classify(-0.1), "Cold");
        assert_eq!(DEWP_BINS.classify(10.0), "Moderate Humidity");
    }

    #[test]
    fn test_distribution_in_bin_order() {
        let df = df![
            "CO" => [Some(2500.0), Some(300.0), None, Some(1000.0), Some(3000.0)],
        ]
        .unwrap();

        let dist = bin_distribution(&df, &CO_BINS).unwrap();
        let counts: Vec<(&str, usize)> = dist
            .counts
            .iter()
            .map(|c| (c.label.as_str(), c.count))
            .collect();
        assert_eq!(counts, vec![("Low", 1), ("Moderate", 1), ("High", 2)]);
        assert_eq!(dist.unbinned, 1);
        assert_eq!(dist.total(), 4);
    }
}
