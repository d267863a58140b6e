//! End-to-end runs behind each `meshstat` subcommand.

use anyhow::{bail, Context, Result};
use meshstat_cooccurrence::{
    log_likelihoods, CooccurrenceConfig, CooccurrencePipeline, CooccurrenceReport, TermSubset,
};
use meshstat_core::{CancelToken, FrequencyAggregator, Ontology, TermId};
use meshstat_similarity::{PairwiseConfig, PairwisePipeline, PairwiseReport, SimilarityEngine};
use meshstat_storage::{
    load_ontology, merge_shards, read_descriptor_table, read_term_subset, save_matrix, shard_path,
    write_edges, write_frequencies, write_likelihoods, CountSource, DocumentReader, EdgeLabel,
    ShardWriter,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Raw term counts: a `term_id,count` file or a document-terms file.
#[derive(Debug, Clone)]
pub enum CountInput {
    Counts(PathBuf),
    Documents(PathBuf),
}

impl CountInput {
    fn source(&self) -> CountSource<'_> {
        match self {
            CountInput::Counts(path) => CountSource::Counts(path),
            CountInput::Documents(path) => CountSource::Documents(path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimilarityJob {
    pub descriptors: PathBuf,
    pub counts: CountInput,
    /// Restricts the pairs to these terms; every term otherwise.
    pub subset: Option<PathBuf>,
    pub output: PathBuf,
    pub config: PairwiseConfig,
}

#[derive(Debug, Clone)]
pub struct CooccurrenceJob {
    pub documents: PathBuf,
    pub subset: Option<PathBuf>,
    /// Every descriptor becomes a matrix term when no subset is given.
    pub descriptors: Option<PathBuf>,
    pub output: PathBuf,
    /// Where to keep the raw matrix, if anywhere.
    pub matrix: Option<PathBuf>,
    pub config: CooccurrenceConfig,
}

#[derive(Debug, Clone)]
pub struct FrequencyJob {
    pub descriptors: PathBuf,
    pub counts: CountInput,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EdgeJob {
    pub descriptors: PathBuf,
    pub output: PathBuf,
    pub directed: bool,
    pub label: EdgeLabel,
}

fn remove_shards(paths: &[PathBuf]) {
    for path in paths {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to remove shard {}: {}", path.display(), e);
            }
        }
    }
}

fn similarity_terms(ontology: &Ontology, subset: Option<&Path>) -> Result<Vec<TermId>> {
    match subset {
        None => Ok(ontology.term_ids().collect()),
        Some(path) => {
            let subset = read_term_subset(path)?;
            subset
                .terms()
                .iter()
                .map(|uid| Ok(ontology.require(uid)?))
                .collect()
        }
    }
}

/// Pairwise similarity of every term pair, merged into `job.output`.
pub fn run_similarity(job: &SimilarityJob, cancel: CancelToken) -> Result<PairwiseReport> {
    let ontology = load_ontology(&job.descriptors, job.counts.source())?;
    let terms = similarity_terms(&ontology, job.subset.as_deref())?;
    let engine = Arc::new(SimilarityEngine::new(Arc::new(ontology))?);

    let paths: Vec<PathBuf> = (0..job.config.writers)
        .map(|n| shard_path(&job.output, n))
        .collect();
    let sinks = paths
        .iter()
        .map(ShardWriter::create)
        .collect::<Result<Vec<_>>>()?;

    let pipeline = PairwisePipeline::new(job.config.clone()).with_cancel(cancel);
    let output = match pipeline.run(engine, &terms, sinks) {
        Ok(output) => output,
        Err(e) => {
            remove_shards(&paths);
            return Err(e).context("Similarity run failed");
        }
    };
    drop(output.sinks);

    merge_shards(&job.output, &paths)?;
    Ok(output.report)
}

fn cooccurrence_subset(job: &CooccurrenceJob) -> Result<TermSubset> {
    match (&job.subset, &job.descriptors) {
        (Some(path), _) => read_term_subset(path),
        (None, Some(path)) => {
            let records = read_descriptor_table(path)?;
            Ok(TermSubset::new(records.into_iter().map(|r| r.uid))?)
        }
        (None, None) => bail!("Either a term subset or a descriptor table is required"),
    }
}

/// Co-occurrence counts over the subset and their log-likelihood ratios.
pub fn run_cooccurrence(job: &CooccurrenceJob, cancel: CancelToken) -> Result<CooccurrenceReport> {
    let subset = cooccurrence_subset(job)?;
    let documents = DocumentReader::open(&job.documents)?;

    let pipeline = CooccurrencePipeline::new(job.config.clone()).with_cancel(cancel);
    let (matrix, report) = pipeline
        .run(&subset, documents)
        .context("Co-occurrence run failed")?;

    if let Some(path) = &job.matrix {
        save_matrix(path, &matrix)?;
    }

    let likelihoods = log_likelihoods(&matrix);
    if likelihoods.undefined > 0 {
        info!(
            "{} term pairs have no defined log-likelihood and were skipped",
            likelihoods.undefined
        );
    }
    write_likelihoods(&job.output, &likelihoods.records)?;
    info!(
        "Wrote {} log-likelihood ratios to {}",
        likelihoods.records.len(),
        job.output.display()
    );
    Ok(report)
}

/// Aggregate frequencies of every term. Returns the root frequency.
pub fn run_frequencies(job: &FrequencyJob) -> Result<u64> {
    let ontology = load_ontology(&job.descriptors, job.counts.source())?;
    let table = FrequencyAggregator::new(&ontology).compute_all()?;
    write_frequencies(&job.output, &ontology, &table)?;
    Ok(table.root_frequency())
}

/// Hierarchy edge list. Returns the number of edges written.
pub fn run_edges(job: &EdgeJob) -> Result<usize> {
    let records = read_descriptor_table(&job.descriptors)?;
    let zero_counts: Vec<(String, u64)> = records.iter().map(|r| (r.uid.clone(), 0)).collect();
    let ontology = Ontology::build(records, zero_counts)?;
    write_edges(&job.output, &ontology, job.directed, job.label)
}
