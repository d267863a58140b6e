//! All-pairs similarity over a worker pool and a writer pool.
//!
//! ```text
//!   coordinator --pairs--> [work queue] --> workers --records--> [result queue] --> writers --> shards
//! ```
//!
//! The coordinator enqueues every unordered pair, then one `Stop` per
//! worker. Once all workers have been joined it enqueues one `Stop` per
//! writer; each writer flushes its shard on `Stop`. Records keep their order
//! within a shard only.

use crate::engine::SimilarityEngine;
use meshstat_core::{
    root_cause, BoundedQueue, CancelToken, Closable, Error, Job, RecordSink, Result, TermId,
    WorkerPool,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Configuration for a pairwise run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseConfig {
    pub workers: usize,
    pub writers: usize,
    pub queue_capacity: usize,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            writers: 2,
            queue_capacity: 100,
        }
    }
}

impl PairwiseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("at least one worker is required".into()));
        }
        if self.writers == 0 {
            return Err(Error::InvalidConfig("at least one writer is required".into()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue capacity must be positive".into()));
        }
        Ok(())
    }
}

/// One similarity result, written as `uid,uid,value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub first: String,
    pub second: String,
    pub similarity: f64,
}

impl fmt::Display for PairRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.first, self.second, self.similarity)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed: u64,
    pub undefined: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseReport {
    pub pairs: u64,
    pub written: u64,
    pub undefined: u64,
    pub per_worker: Vec<WorkerStats>,
    pub elapsed: Duration,
}

/// Report plus the sinks handed back by the writers, in writer order.
pub struct PairwiseOutput<S> {
    pub report: PairwiseReport,
    pub sinks: Vec<S>,
}

/// Number of unordered pairs without self pairs.
#[inline]
pub fn pair_count(terms: usize) -> u64 {
    let n = terms as u64;
    n * n.saturating_sub(1) / 2
}

/// Unordered pairs `(terms[i], terms[j])` with `i < j`, in index order.
pub fn unordered_pairs(terms: &[TermId]) -> impl Iterator<Item = (TermId, TermId)> + '_ {
    terms
        .iter()
        .enumerate()
        .flat_map(move |(i, &a)| terms[i + 1..].iter().map(move |&b| (a, b)))
}

pub struct PairwisePipeline {
    config: PairwiseConfig,
    cancel: CancelToken,
}

impl PairwisePipeline {
    pub fn new(config: PairwiseConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Shares an externally owned cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn config(&self) -> &PairwiseConfig {
        &self.config
    }

    /// Scores every unordered pair of `terms`. Writer `n` owns `sinks[n]`;
    /// there must be exactly one sink per writer.
    pub fn run<S>(
        &self,
        engine: Arc<SimilarityEngine>,
        terms: &[TermId],
        sinks: Vec<S>,
    ) -> Result<PairwiseOutput<S>>
    where
        S: RecordSink<PairRecord> + 'static,
    {
        self.config.validate()?;
        if sinks.len() != self.config.writers {
            return Err(Error::InvalidConfig(format!(
                "{} writers need {} sinks, got {}",
                self.config.writers,
                self.config.writers,
                sinks.len()
            )));
        }
        let start = Instant::now();

        let work: Arc<BoundedQueue<Job<(TermId, TermId)>>> =
            Arc::new(BoundedQueue::new(self.config.queue_capacity));
        let results: Arc<BoundedQueue<Job<PairRecord>>> =
            Arc::new(BoundedQueue::new(self.config.queue_capacity));
        let closers: Vec<Arc<dyn Closable>> = vec![work.clone(), results.clone()];

        let writers = {
            let results = results.clone();
            WorkerPool::spawn_with("sim-writer", sinks, closers.clone(), move |_, mut sink: S| {
                let mut written = 0u64;
                loop {
                    match results.get() {
                        Some(Job::Work(record)) => {
                            sink.write(&record)?;
                            written += 1;
                        }
                        Some(Job::Stop) => {
                            sink.flush()?;
                            return Ok((sink, written));
                        }
                        None => return Err(Error::QueueClosed),
                    }
                }
            })?
        };

        let workers = {
            let work = work.clone();
            let results = results.clone();
            let engine = engine.clone();
            WorkerPool::spawn("sim-worker", self.config.workers, closers, move |_| {
                let ontology = engine.ontology();
                let mut stats = WorkerStats::default();
                loop {
                    match work.get() {
                        Some(Job::Work((a, b))) => {
                            stats.processed += 1;
                            match engine.try_similarity(a, b) {
                                Ok(similarity) => results.put(Job::Work(PairRecord {
                                    first: ontology.uid(a).to_string(),
                                    second: ontology.uid(b).to_string(),
                                    similarity,
                                }))?,
                                Err(_) => stats.undefined += 1,
                            }
                        }
                        Some(Job::Stop) => return Ok(stats),
                        None => return Err(Error::QueueClosed),
                    }
                }
            })?
        };

        let total = pair_count(terms.len());
        info!(
            "Scoring {} pairs with {} workers and {} writers",
            total, self.config.workers, self.config.writers
        );

        let mut enqueued = 0u64;
        let fed = (|| -> Result<()> {
            for pair in unordered_pairs(terms) {
                if self.cancel.is_cancelled() {
                    break;
                }
                work.put(Job::Work(pair))?;
                enqueued += 1;
            }
            for _ in 0..self.config.workers {
                work.put(Job::Stop)?;
            }
            Ok(())
        })();

        let worker_stats = workers.join();
        if worker_stats.is_ok() {
            for _ in 0..self.config.writers {
                if results.put(Job::Stop).is_err() {
                    break;
                }
            }
        } else {
            results.close();
        }
        let writer_out = writers.join();

        let (per_worker, writer_out) = match (fed, worker_stats, writer_out) {
            (Ok(()), Ok(stats), Ok(out)) => (stats, out),
            (fed, stats, out) => {
                let failures = [fed.err(), stats.err(), out.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                return Err(root_cause(failures).unwrap_or(Error::QueueClosed));
            }
        };

        if self.cancel.is_cancelled() {
            info!("Pairwise run cancelled after {} of {} pairs", enqueued, total);
            return Err(Error::Cancelled);
        }

        let mut sinks = Vec::with_capacity(writer_out.len());
        let mut written = 0;
        for (sink, count) in writer_out {
            sinks.push(sink);
            written += count;
        }
        let undefined = per_worker.iter().map(|s| s.undefined).sum();

        let report = PairwiseReport {
            pairs: enqueued,
            written,
            undefined,
            per_worker,
            elapsed: start.elapsed(),
        };
        info!(
            "Semantic similarities calculated in {:.1} seconds: {} written, {} undefined",
            report.elapsed.as_secs_f64(),
            report.written,
            report.undefined
        );
        Ok(PairwiseOutput { report, sinks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstat_core::{Ontology, TermRecord};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    fn engine() -> Arc<SimilarityEngine> {
        let records = vec![
            TermRecord::new("A", "a", &["1"]),
            TermRecord::new("B", "b", &["1.001"]),
            TermRecord::new("C", "c", &["1.002"]),
            TermRecord::new("D", "d", &["1.001.001", "1.002.001"]),
            TermRecord::new("E", "e", &["1.002.002"]),
            TermRecord::new("X", "x", &["2"]),
            TermRecord::new("Y", "y", &["2.001"]),
            TermRecord::new("Z", "z", &["2.002"]),
            TermRecord::new("F", "f", &[]),
        ];
        let counts = ["A", "B", "C", "D", "E", "X", "Y", "Z", "F"]
            .iter()
            .enumerate()
            .map(|(i, uid)| (uid.to_string(), i as u64 + 1));
        let ontology = Ontology::build(records, counts).unwrap();
        Arc::new(SimilarityEngine::new(Arc::new(ontology)).unwrap())
    }

    fn terms(engine: &SimilarityEngine) -> Vec<TermId> {
        engine.ontology().term_ids().collect()
    }

    #[test]
    fn test_pair_enumeration() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(9), 36);

        let ids: Vec<TermId> = (0..4).map(TermId::from_index).collect();
        let pairs: Vec<(usize, usize)> = unordered_pairs(&ids)
            .map(|(a, b)| (a.index(), b.index()))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_every_pair_written_once() {
        let engine = engine();
        let terms = terms(&engine);
        let pipeline = PairwisePipeline::new(PairwiseConfig {
            workers: 3,
            writers: 2,
            queue_capacity: 4,
        });
        let output = pipeline
            .run(engine.clone(), &terms, vec![Vec::<PairRecord>::new(), Vec::new()])
            .unwrap();

        assert_eq!(output.sinks.len(), 2);
        assert_eq!(output.report.pairs, 36);
        assert_eq!(output.report.written, 36);
        assert_eq!(output.report.undefined, 0);
        assert_eq!(
            output.report.per_worker.iter().map(|s| s.processed).sum::<u64>(),
            36
        );

        let mut seen = HashSet::new();
        for record in output.sinks.iter().flatten() {
            assert_ne!(record.first, record.second);
            let key = if record.first < record.second {
                (record.first.clone(), record.second.clone())
            } else {
                (record.second.clone(), record.first.clone())
            };
            assert!(seen.insert(key));
            let expected = engine
                .similarity_by_id(&record.first, &record.second)
                .unwrap();
            assert_eq!(record.similarity, expected);
        }
        assert_eq!(seen.len(), 36);
    }

    #[test]
    fn test_undefined_pairs_are_counted_not_written() {
        let records = vec![
            TermRecord::new("A", "a", &["1"]),
            TermRecord::new("B", "b", &["1.001"]),
            TermRecord::new("C", "c", &["2"]),
        ];
        let counts = vec![("A".to_string(), 1), ("B".to_string(), 0), ("C".to_string(), 4)];
        let ontology = Ontology::build(records, counts).unwrap();
        let engine = Arc::new(SimilarityEngine::new(Arc::new(ontology)).unwrap());
        let terms = terms(&engine);

        let pipeline = PairwisePipeline::new(PairwiseConfig {
            workers: 2,
            writers: 2,
            queue_capacity: 2,
        });
        let output = pipeline
            .run(engine, &terms, vec![Vec::<PairRecord>::new(), Vec::new()])
            .unwrap();

        assert_eq!(output.report.pairs, 3);
        assert_eq!(output.report.undefined, 2);
        assert_eq!(output.report.written, 1);
        assert_eq!(
            output.report.written + output.report.undefined,
            output.report.pairs
        );

        let records: Vec<&PairRecord> = output.sinks.iter().flatten().collect();
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].first.as_str(), records[0].second.as_str()), ("A", "C"));
        assert_eq!(records[0].similarity, 0.0);
        assert!(records.iter().all(|r| r.first != "B" && r.second != "B"));
    }

    #[test]
    fn test_single_worker_keeps_pair_order() {
        let engine = engine();
        let terms = terms(&engine);
        let pipeline = PairwisePipeline::new(PairwiseConfig {
            workers: 1,
            writers: 1,
            queue_capacity: 2,
        });
        let output = pipeline
            .run(engine.clone(), &terms, vec![Vec::<PairRecord>::new()])
            .unwrap();

        let written: Vec<(String, String)> = output.sinks[0]
            .iter()
            .map(|r| (r.first.clone(), r.second.clone()))
            .collect();
        let ontology = engine.ontology();
        let expected: Vec<(String, String)> = unordered_pairs(&terms)
            .map(|(a, b)| (ontology.uid(a).to_string(), ontology.uid(b).to_string()))
            .collect();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_cancelled_run_shuts_down() {
        let engine = engine();
        let terms = terms(&engine);
        let cancel = CancelToken::new();
        cancel.cancel();
        let pipeline = PairwisePipeline::new(PairwiseConfig::default()).with_cancel(cancel);
        let sinks: Vec<Vec<PairRecord>> = vec![Vec::new(), Vec::new()];
        let result = pipeline.run(engine, &terms, sinks);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    struct FailingSink {
        writes: Arc<Mutex<u32>>,
    }

    impl RecordSink<PairRecord> for FailingSink {
        fn write(&mut self, _record: &PairRecord) -> Result<()> {
            *self.writes.lock() += 1;
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_failure_aborts_run() {
        let engine = engine();
        let terms = terms(&engine);
        let writes = Arc::new(Mutex::new(0));
        let pipeline = PairwisePipeline::new(PairwiseConfig {
            workers: 2,
            writers: 1,
            queue_capacity: 1,
        });
        let sink = FailingSink {
            writes: writes.clone(),
        };
        let result = pipeline.run(engine, &terms, vec![sink]);

        match result {
            Err(Error::WorkerFailed { role, reason, .. }) => {
                assert_eq!(role, "sim-writer");
                assert!(reason.contains("disk full"));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("run should fail"),
        }
        assert_eq!(*writes.lock(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = engine();
        let pipeline = PairwisePipeline::new(PairwiseConfig {
            workers: 0,
            ..PairwiseConfig::default()
        });
        let sinks: Vec<Vec<PairRecord>> = vec![Vec::new(), Vec::new()];
        let result = pipeline.run(engine.clone(), &[], sinks);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let pipeline = PairwisePipeline::new(PairwiseConfig::default());
        let result = pipeline.run(engine, &[], vec![Vec::<PairRecord>::new()]);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
