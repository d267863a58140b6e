//! Chunked co-occurrence counting on builder and accumulator threads.
//!
//! ```text
//!   documents -> Chunker --chunks--> [work queue] --> builders --partials--> [accumulate queue] --> accumulators
//! ```
//!
//! Builder `Stop`s are enqueued after the last chunk, so every chunk is
//! taken before any builder stops. Accumulator `Stop`s follow once all
//! builders have been joined; each accumulator hands its running total back
//! over its join handle and the coordinator sums them.

use crate::incidence::Chunker;
use crate::matrix::{partial_cooccurrence, CooccurrenceMatrix};
use crate::subset::TermSubset;
use meshstat_core::{
    root_cause, BoundedQueue, CancelToken, Closable, DocumentTerms, Error, Job, Result, WorkerPool,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Accumulators log progress every this many partial matrices.
const PROGRESS_INTERVAL: u64 = 800;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceConfig {
    pub builders: usize,
    pub accumulators: usize,
    /// Documents per incidence chunk.
    pub chunk_size: usize,
    pub work_capacity: usize,
    pub accumulate_capacity: usize,
    pub max_documents: Option<u64>,
}

impl Default for CooccurrenceConfig {
    fn default() -> Self {
        Self {
            builders: 5,
            accumulators: 2,
            chunk_size: 34,
            work_capacity: 5,
            accumulate_capacity: 5,
            max_documents: None,
        }
    }
}

impl CooccurrenceConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            (self.builders, "builders"),
            (self.accumulators, "accumulators"),
            (self.chunk_size, "chunk size"),
            (self.work_capacity, "work queue capacity"),
            (self.accumulate_capacity, "accumulation queue capacity"),
        ];
        for (value, name) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CooccurrenceReport {
    pub documents: u64,
    pub chunks: u64,
    /// Chunks handled by each builder.
    pub per_builder: Vec<u64>,
    /// Partial matrices summed by each accumulator.
    pub per_accumulator: Vec<u64>,
    pub elapsed: Duration,
}

pub struct CooccurrencePipeline {
    config: CooccurrenceConfig,
    cancel: CancelToken,
}

impl CooccurrencePipeline {
    pub fn new(config: CooccurrenceConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn config(&self) -> &CooccurrenceConfig {
        &self.config
    }

    /// Counts co-occurrences of the subset terms over `documents`.
    pub fn run<I>(
        &self,
        subset: &TermSubset,
        documents: I,
    ) -> Result<(CooccurrenceMatrix, CooccurrenceReport)>
    where
        I: IntoIterator<Item = Result<DocumentTerms>>,
    {
        self.config.validate()?;
        let start = Instant::now();
        let dim = subset.len();

        let work: Arc<BoundedQueue<Job<Array2<u64>>>> =
            Arc::new(BoundedQueue::new(self.config.work_capacity));
        let accumulate: Arc<BoundedQueue<Job<Array2<u64>>>> =
            Arc::new(BoundedQueue::new(self.config.accumulate_capacity));
        let closers: Vec<Arc<dyn Closable>> = vec![work.clone(), accumulate.clone()];

        let accumulators = {
            let accumulate = accumulate.clone();
            let chunk_size = self.config.chunk_size as u64;
            WorkerPool::spawn("cooc-accumulator", self.config.accumulators, closers.clone(), move |index| {
                let mut total: Array2<u64> = Array2::zeros((dim, dim));
                let mut added = 0u64;
                let mut interval = Instant::now();
                loop {
                    match accumulate.get() {
                        Some(Job::Work(partial)) => {
                            total += &partial;
                            added += 1;
                            if added % PROGRESS_INTERVAL == 0 {
                                debug!(
                                    "Accumulator {}: {} docs added, last {} in {:.1} seconds",
                                    index,
                                    added * chunk_size,
                                    PROGRESS_INTERVAL * chunk_size,
                                    interval.elapsed().as_secs_f64()
                                );
                                interval = Instant::now();
                            }
                        }
                        Some(Job::Stop) => return Ok((total, added)),
                        None => return Err(Error::QueueClosed),
                    }
                }
            })?
        };

        let builders = {
            let work = work.clone();
            let accumulate = accumulate.clone();
            WorkerPool::spawn("cooc-builder", self.config.builders, closers, move |_| {
                let mut built = 0u64;
                loop {
                    match work.get() {
                        Some(Job::Work(chunk)) => {
                            accumulate.put(Job::Work(partial_cooccurrence(&chunk)))?;
                            built += 1;
                        }
                        Some(Job::Stop) => return Ok(built),
                        None => return Err(Error::QueueClosed),
                    }
                }
            })?
        };

        info!(
            "Counting co-occurrences of {} terms with {} builders and {} accumulators",
            dim, self.config.builders, self.config.accumulators
        );

        let mut chunker = Chunker::new(
            subset,
            documents.into_iter(),
            self.config.chunk_size,
            self.config.max_documents,
        )?;
        let fed = (|| -> Result<()> {
            while !self.cancel.is_cancelled() {
                match chunker.next() {
                    Some(chunk) => work.put(Job::Work(chunk?))?,
                    None => break,
                }
            }
            for _ in 0..self.config.builders {
                work.put(Job::Stop)?;
            }
            Ok(())
        })();
        if fed.is_err() {
            work.close();
        }

        let built = builders.join();
        if fed.is_ok() && built.is_ok() {
            for _ in 0..self.config.accumulators {
                if accumulate.put(Job::Stop).is_err() {
                    break;
                }
            }
        } else {
            accumulate.close();
        }
        let summed = accumulators.join();

        let (per_builder, totals) = match (fed, built, summed) {
            (Ok(()), Ok(built), Ok(totals)) => (built, totals),
            (fed, built, summed) => {
                let failures = [fed.err(), built.err(), summed.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                return Err(root_cause(failures).unwrap_or(Error::QueueClosed));
            }
        };

        if self.cancel.is_cancelled() {
            info!(
                "Co-occurrence run cancelled after {} documents",
                chunker.tally().documents
            );
            return Err(Error::Cancelled);
        }

        let chunks = chunker.chunks();
        let mut cells: Array2<u64> = Array2::zeros((dim, dim));
        let mut per_accumulator = Vec::with_capacity(totals.len());
        for (total, added) in totals {
            cells += &total;
            per_accumulator.push(added);
        }
        let tally = chunker.into_tally();
        let report = CooccurrenceReport {
            documents: tally.documents,
            chunks,
            per_builder,
            per_accumulator,
            elapsed: start.elapsed(),
        };
        info!(
            "Co-occurrence matrix built from {} documents in {:.1} seconds",
            report.documents,
            report.elapsed.as_secs_f64()
        );

        let matrix = CooccurrenceMatrix::new(subset.terms().to_vec(), cells, tally)?;
        Ok((matrix, report))
    }
}
