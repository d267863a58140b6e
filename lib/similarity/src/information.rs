//! Aggregate information-content model.
//!
//! ```text
//! probability(t)     = frequency(t) / root_frequency
//! info_content(t)    = -ln(probability(t))
//! knowledge(t)       = 1 / info_content(t)
//! semantic_weight(t) = 1 / (1 + e^(-knowledge(t)))
//! semantic_value(t)  = sum of semantic_weight(a) over ancestors(t), t included
//! ```
//!
//! Every table is computed once, in full, before any similarity query.

use meshstat_core::{finite, AncestorTable, FrequencyTable, Measure, TermId, Undefined};
use rayon::prelude::*;

pub fn probability(frequency: u64, root_frequency: u64) -> Measure {
    if root_frequency == 0 {
        return Err(Undefined::EmptyCorpus);
    }
    Ok(frequency as f64 / root_frequency as f64)
}

pub fn information_content(probability: f64) -> Measure {
    if probability == 0.0 {
        return Err(Undefined::ZeroProbability);
    }
    finite(-probability.ln(), Undefined::ZeroProbability)
}

pub fn knowledge(information_content: f64) -> Measure {
    if information_content == 0.0 {
        return Err(Undefined::ZeroInformation);
    }
    finite(1.0 / information_content, Undefined::ZeroInformation)
}

#[inline]
pub fn semantic_weight(knowledge: f64) -> f64 {
    1.0 / (1.0 + (-knowledge).exp())
}

#[derive(Debug, Clone)]
pub struct InformationModel {
    root_frequency: u64,
    probability: Vec<Measure>,
    information: Vec<Measure>,
    knowledge: Vec<Measure>,
    weight: Vec<Measure>,
    value: Vec<Measure>,
}

impl InformationModel {
    pub fn build(frequencies: &FrequencyTable, ancestors: &AncestorTable) -> Self {
        let root_frequency = frequencies.root_frequency();
        let n = frequencies.len();

        let per_term: Vec<(Measure, Measure, Measure, Measure)> = (0..n)
            .into_par_iter()
            .map(|idx| {
                let p = probability(frequencies.get(TermId::from_index(idx)), root_frequency);
                let ic = p.and_then(information_content);
                let k = ic.and_then(knowledge);
                let w = k.map(semantic_weight);
                (p, ic, k, w)
            })
            .collect();

        let mut probability = Vec::with_capacity(n);
        let mut information = Vec::with_capacity(n);
        let mut knowledge = Vec::with_capacity(n);
        let mut weight = Vec::with_capacity(n);
        for (p, ic, k, w) in per_term {
            probability.push(p);
            information.push(ic);
            knowledge.push(k);
            weight.push(w);
        }

        let value = (0..n)
            .into_par_iter()
            .map(|idx| {
                let term = TermId::from_index(idx);
                ancestors.get(term).iter().try_fold(0.0, |sum, a| {
                    weight[a.index()]
                        .map(|w| sum + w)
                        .map_err(|_| Undefined::UndefinedOperand)
                })
            })
            .collect();

        Self {
            root_frequency,
            probability,
            information,
            knowledge,
            weight,
            value,
        }
    }

    #[inline]
    #[must_use]
    pub fn root_frequency(&self) -> u64 {
        self.root_frequency
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weight.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }

    #[inline]
    pub fn probability(&self, term: TermId) -> Measure {
        self.probability[term.index()]
    }

    #[inline]
    pub fn information_content(&self, term: TermId) -> Measure {
        self.information[term.index()]
    }

    #[inline]
    pub fn knowledge(&self, term: TermId) -> Measure {
        self.knowledge[term.index()]
    }

    #[inline]
    pub fn semantic_weight(&self, term: TermId) -> Measure {
        self.weight[term.index()]
    }

    #[inline]
    pub fn semantic_value(&self, term: TermId) -> Measure {
        self.value[term.index()]
    }

    /// Terms whose semantic weight is undefined, with the reason.
    pub fn undefined_terms(&self) -> Vec<(TermId, Undefined)> {
        self.weight
            .iter()
            .enumerate()
            .filter_map(|(idx, w)| w.err().map(|reason| (TermId::from_index(idx), reason)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstat_core::{FrequencyAggregator, Ontology, TermRecord};

    fn chain_ontology(counts: [u64; 3]) -> Ontology {
        Ontology::build(
            vec![
                TermRecord::new("A", "a", &["1"]),
                TermRecord::new("B", "b", &["1.001"]),
                TermRecord::new("C", "c", &["1.001.001"]),
            ],
            ["A", "B", "C"]
                .iter()
                .zip(counts)
                .map(|(k, v)| (k.to_string(), v)),
        )
        .unwrap()
    }

    fn model(ontology: &Ontology) -> InformationModel {
        let frequencies = FrequencyAggregator::new(ontology).compute_all().unwrap();
        let ancestors = ontology.hierarchy().ancestor_table(ontology.index());
        InformationModel::build(&frequencies, &ancestors)
    }

    #[test]
    fn test_formula_chain() {
        let ontology = chain_ontology([2, 3, 5]);
        let model = model(&ontology);
        let c = ontology.term_id("C").unwrap();

        // frequencies 10, 8, 5 -> root 23
        assert_eq!(model.root_frequency(), 23);
        let p = model.probability(c).unwrap();
        assert!((p - 5.0 / 23.0).abs() < 1e-12);
        let ic = model.information_content(c).unwrap();
        assert!((ic - (23.0f64 / 5.0).ln()).abs() < 1e-12);
        let k = model.knowledge(c).unwrap();
        assert!((k - 1.0 / ic).abs() < 1e-12);
        let w = model.semantic_weight(c).unwrap();
        assert!((w - 1.0 / (1.0 + (-k).exp())).abs() < 1e-12);
        assert!(w > 0.5 && w < 1.0);
    }

    #[test]
    fn test_semantic_value_sums_ancestor_weights() {
        let ontology = chain_ontology([2, 3, 5]);
        let model = model(&ontology);
        let weight = |uid: &str| model.semantic_weight(ontology.term_id(uid).unwrap()).unwrap();
        let c = ontology.term_id("C").unwrap();
        let expected = weight("A") + weight("B") + weight("C");
        assert!((model.semantic_value(c).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_frequency_is_tagged_undefined() {
        let ontology = chain_ontology([4, 0, 0]);
        let model = model(&ontology);
        let c = ontology.term_id("C").unwrap();
        assert_eq!(model.probability(c), Ok(0.0));
        assert_eq!(model.information_content(c), Err(Undefined::ZeroProbability));
        assert_eq!(model.semantic_weight(c), Err(Undefined::ZeroProbability));
        assert_eq!(model.semantic_value(c), Err(Undefined::UndefinedOperand));

        // A carries the whole corpus: probability 1, information content 0.
        let a = ontology.term_id("A").unwrap();
        assert_eq!(model.semantic_weight(a), Err(Undefined::ZeroInformation));

        let undefined: Vec<TermId> = model.undefined_terms().into_iter().map(|(t, _)| t).collect();
        assert_eq!(undefined.len(), 3);
        assert!(undefined.contains(&c));
    }

    #[test]
    fn test_empty_corpus_and_certain_term() {
        assert_eq!(probability(0, 0), Err(Undefined::EmptyCorpus));
        assert_eq!(information_content(1.0).map(|ic| ic == 0.0), Ok(true));
        assert_eq!(knowledge(0.0), Err(Undefined::ZeroInformation));
        assert_eq!(knowledge(-0.0), Err(Undefined::ZeroInformation));
    }
}
