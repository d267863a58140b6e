//! Log-likelihood ratios of observed over expected co-occurrence.
//!
//! ```text
//! marginal(i)    = documents(i) / sum(documents(k) for k in subset)
//! expected(i, j) = marginal(i) * marginal(j)
//! total          = off_diagonal_total / 2
//! observed(i, j) = M(i, j) / total
//! llr(i, j)      = ln(observed(i, j) / expected(i, j))
//! ```

use crate::matrix::CooccurrenceMatrix;
use meshstat_core::{finite, Measure, Undefined};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One defined upper-triangle value, written as `uid,uid,llr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodRecord {
    pub first: String,
    pub second: String,
    pub llr: f64,
}

impl fmt::Display for LikelihoodRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.first, self.second, self.llr)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikelihoodReport {
    pub records: Vec<LikelihoodRecord>,
    pub undefined: u64,
}

/// Per-term share of all term-document incidences.
pub fn marginals(matrix: &CooccurrenceMatrix) -> Vec<Measure> {
    let total = matrix.tally().total();
    (0..matrix.dim())
        .map(|i| {
            if total == 0 {
                Err(Undefined::EmptyCorpus)
            } else {
                Ok(matrix.document_count(i) as f64 / total as f64)
            }
        })
        .collect()
}

/// Number of distinct co-occurring pairs observed, counted once per pair.
#[inline]
pub fn cooccurrence_total(matrix: &CooccurrenceMatrix) -> f64 {
    matrix.off_diagonal_total() as f64 / 2.0
}

pub fn log_likelihood_ratio(count: u64, total: f64, expected: f64) -> Measure {
    if count == 0 {
        return Err(Undefined::ZeroProbability);
    }
    if total == 0.0 || expected == 0.0 {
        return Err(Undefined::ZeroDenominator);
    }
    let observed = count as f64 / total;
    finite((observed / expected).ln(), Undefined::ZeroDenominator)
}

/// Every defined upper-triangle (`i < j`) value in row order; undefined
/// cells are skipped and counted.
pub fn log_likelihoods(matrix: &CooccurrenceMatrix) -> LikelihoodReport {
    let marginals = marginals(matrix);
    let total = cooccurrence_total(matrix);
    let mut report = LikelihoodReport::default();

    for i in 0..matrix.dim() {
        for j in (i + 1)..matrix.dim() {
            let llr = marginals[i]
                .and_then(|mi| marginals[j].map(|mj| mi * mj))
                .and_then(|expected| log_likelihood_ratio(matrix.get(i, j), total, expected));
            match llr {
                Ok(llr) => report.records.push(LikelihoodRecord {
                    first: matrix.term(i).to_string(),
                    second: matrix.term(j).to_string(),
                    llr,
                }),
                Err(_) => report.undefined += 1,
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidence::DocumentTally;
    use ndarray::arr2;

    fn matrix(cells: [[u64; 3]; 3], counts: [u64; 3], documents: u64) -> CooccurrenceMatrix {
        CooccurrenceMatrix::new(
            vec!["a".into(), "b".into(), "c".into()],
            arr2(&cells),
            DocumentTally {
                counts: counts.to_vec(),
                documents,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_uniform_scenario() {
        let m = matrix([[2, 1, 1], [1, 2, 1], [1, 1, 2]], [2, 2, 2], 3);
        let report = log_likelihoods(&m);
        assert_eq!(report.undefined, 0);
        assert_eq!(report.records.len(), 3);

        // total = 3, observed = 1/3, expected = 1/9
        let expected = 3.0f64.ln();
        for record in &report.records {
            assert!((record.llr - expected).abs() < 1e-12);
        }
        let pairs: Vec<(&str, &str)> = report
            .records
            .iter()
            .map(|r| (r.first.as_str(), r.second.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn test_zero_cells_and_absent_terms_are_skipped() {
        // c never appears; a and b co-occur once
        let m = matrix([[2, 1, 0], [1, 1, 0], [0, 0, 0]], [2, 1, 0], 2);
        let report = log_likelihoods(&m);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.undefined, 2);

        let record = &report.records[0];
        let expected = (1.0f64 / 1.0) / ((2.0 / 3.0) * (1.0 / 3.0));
        assert!((record.llr - expected.ln()).abs() < 1e-12);
        assert_eq!(record.to_string(), format!("a,b,{}", record.llr));
    }

    #[test]
    fn test_empty_corpus() {
        let m = matrix([[0; 3]; 3], [0; 3], 0);
        assert!(marginals(&m).iter().all(|p| *p == Err(Undefined::EmptyCorpus)));
        let report = log_likelihoods(&m);
        assert!(report.records.is_empty());
        assert_eq!(report.undefined, 3);
    }

    #[test]
    fn test_ratio_edge_cases() {
        assert_eq!(log_likelihood_ratio(0, 3.0, 0.1), Err(Undefined::ZeroProbability));
        assert_eq!(log_likelihood_ratio(2, 0.0, 0.1), Err(Undefined::ZeroDenominator));
        assert_eq!(log_likelihood_ratio(2, 4.0, 0.0), Err(Undefined::ZeroDenominator));
        assert_eq!(log_likelihood_ratio(1, 2.0, 0.5), Ok(0.0));
    }
}
