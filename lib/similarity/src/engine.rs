//! Pairwise semantic similarity over shared ancestors.
//!
//! `similarity(a, b) = 2 * sum(weight(x) for x in anc(a) & anc(b)) / (value(a) + value(b))`
//!
//! Ancestor sets are sorted by handle and the intersection is summed in
//! ascending handle order, so the result does not depend on argument order
//! and `similarity(t, t)` reproduces `semantic_value(t)` exactly.

use crate::information::InformationModel;
use meshstat_core::{
    finite, AncestorTable, FrequencyAggregator, Measure, Ontology, Result, TermId, Undefined,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    ontology: Arc<Ontology>,
    ancestors: AncestorTable,
    model: InformationModel,
}

impl SimilarityEngine {
    /// Computes frequencies, ancestor sets and the information model.
    pub fn new(ontology: Arc<Ontology>) -> Result<Self> {
        let frequencies = FrequencyAggregator::new(&ontology).compute_all()?;

        let start = Instant::now();
        let ancestors = ontology.hierarchy().ancestor_table(ontology.index());
        let model = InformationModel::build(&frequencies, &ancestors);
        info!(
            "Information model built for {} terms in {:.1} seconds",
            model.len(),
            start.elapsed().as_secs_f64()
        );

        let undefined = model.undefined_terms();
        if !undefined.is_empty() {
            warn!(
                "{} terms have no defined semantic weight; pairs involving them are skipped",
                undefined.len()
            );
        }

        Ok(Self::from_parts(ontology, ancestors, model))
    }

    pub fn from_parts(
        ontology: Arc<Ontology>,
        ancestors: AncestorTable,
        model: InformationModel,
    ) -> Self {
        Self {
            ontology,
            ancestors,
            model,
        }
    }

    #[inline]
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    #[inline]
    pub fn model(&self) -> &InformationModel {
        &self.model
    }

    #[inline]
    pub fn ancestors(&self, term: TermId) -> &[TermId] {
        self.ancestors.get(term)
    }

    /// Sum of semantic weights over the shared ancestors of `a` and `b`.
    fn shared_weight(&self, a: TermId, b: TermId) -> Measure {
        let (left, right) = (self.ancestors.get(a), self.ancestors.get(b));
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self
                        .model
                        .semantic_weight(left[i])
                        .map_err(|_| Undefined::UndefinedOperand)?;
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(sum)
    }

    /// Similarity with undefined cases tagged.
    pub fn try_similarity(&self, a: TermId, b: TermId) -> Measure {
        let numerator = 2.0 * self.shared_weight(a, b)?;
        let denominator = self
            .model
            .semantic_value(a)
            .and_then(|va| self.model.semantic_value(b).map(|vb| va + vb))
            .map_err(|_| Undefined::UndefinedOperand)?;
        if denominator == 0.0 {
            return Err(Undefined::ZeroDenominator);
        }
        finite(numerator / denominator, Undefined::ZeroDenominator)
    }

    /// Similarity, with 0 standing in for an undefined result.
    #[inline]
    pub fn similarity(&self, a: TermId, b: TermId) -> f64 {
        self.try_similarity(a, b).unwrap_or(0.0)
    }

    /// Looks both terms up by identifier.
    pub fn similarity_by_id(&self, a: &str, b: &str) -> Result<f64> {
        let a = self.ontology.require(a)?;
        let b = self.ontology.require(b)?;
        Ok(self.similarity(a, b))
    }
}
