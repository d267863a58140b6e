use clap::{Args as ClapArgs, Parser, Subcommand};
use meshstat::commands::{
    run_cooccurrence, run_edges, run_frequencies, run_similarity, CooccurrenceJob, CountInput,
    EdgeJob, FrequencyJob, SimilarityJob,
};
use meshstat::{CancelToken, CooccurrenceConfig, EdgeLabel, PairwiseConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Semantic similarity and co-occurrence statistics over the MeSH hierarchy
#[derive(Parser, Debug)]
#[command(name = "meshstat")]
#[command(about = "MeSH term similarity and co-occurrence statistics", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct CountArgs {
    /// Raw term counts, one `term_id,count` per line
    #[arg(long, conflicts_with = "documents", required_unless_present = "documents")]
    counts: Option<PathBuf>,

    /// Document terms, one `doc_id,term_id,...` per line; terms are counted on load
    #[arg(long)]
    documents: Option<PathBuf>,
}

impl CountArgs {
    fn into_input(self) -> anyhow::Result<CountInput> {
        match (self.counts, self.documents) {
            (Some(path), _) => Ok(CountInput::Counts(path)),
            (None, Some(path)) => Ok(CountInput::Documents(path)),
            (None, None) => anyhow::bail!("--counts or --documents is required"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pairwise semantic similarity of every term pair
    Similarity {
        /// Descriptor table (uid, name, positions; tab-separated)
        #[arg(long)]
        descriptors: PathBuf,

        #[command(flatten)]
        counts: CountArgs,

        /// Only compare the terms listed in this file
        #[arg(long)]
        subset: Option<PathBuf>,

        /// Output file; shards are written next to it and merged
        #[arg(short, long)]
        output: PathBuf,

        /// Similarity worker threads
        #[arg(long, default_value_t = 3)]
        workers: usize,

        /// Output writer threads (one shard each)
        #[arg(long, default_value_t = 2)]
        writers: usize,

        /// Work and result queue capacity
        #[arg(long, default_value_t = 100)]
        queue_capacity: usize,
    },

    /// Term co-occurrence matrix and log-likelihood ratios
    Cooccurrence {
        /// Document terms, one `doc_id,term_id,...` per line
        #[arg(long)]
        documents: PathBuf,

        /// Terms to count, one per line
        #[arg(long, required_unless_present = "descriptors")]
        subset: Option<PathBuf>,

        /// Use every descriptor as a matrix term
        #[arg(long)]
        descriptors: Option<PathBuf>,

        /// Log-likelihood output
        #[arg(short, long)]
        output: PathBuf,

        /// Also save the raw co-occurrence matrix here
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// Matrix builder threads
        #[arg(long, default_value_t = 5)]
        builders: usize,

        /// Matrix accumulator threads
        #[arg(long, default_value_t = 2)]
        accumulators: usize,

        /// Documents per incidence chunk
        #[arg(long, default_value_t = 34)]
        chunk_size: usize,

        /// Accumulation queue capacity
        #[arg(long, default_value_t = 5)]
        accumulate_capacity: usize,

        /// Stop after this many documents
        #[arg(long)]
        max_documents: Option<u64>,
    },

    /// Aggregate frequency of every term
    Frequencies {
        #[arg(long)]
        descriptors: PathBuf,

        #[command(flatten)]
        counts: CountArgs,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Hierarchy edge list
    Edges {
        #[arg(long)]
        descriptors: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Keep parent-to-child direction
        #[arg(long)]
        directed: bool,

        /// Label edges with display names instead of identifiers
        #[arg(long)]
        names: bool,
    },
}

fn run(command: Command, cancel: CancelToken) -> anyhow::Result<()> {
    match command {
        Command::Similarity {
            descriptors,
            counts,
            subset,
            output,
            workers,
            writers,
            queue_capacity,
        } => {
            let job = SimilarityJob {
                descriptors,
                counts: counts.into_input()?,
                subset,
                output,
                config: PairwiseConfig {
                    workers,
                    writers,
                    queue_capacity,
                },
            };
            let report = run_similarity(&job, cancel)?;
            info!(
                "{} pairs scored: {} written to {}, {} undefined",
                report.pairs,
                report.written,
                job.output.display(),
                report.undefined
            );
        }
        Command::Cooccurrence {
            documents,
            subset,
            descriptors,
            output,
            matrix,
            builders,
            accumulators,
            chunk_size,
            accumulate_capacity,
            max_documents,
        } => {
            let job = CooccurrenceJob {
                documents,
                subset,
                descriptors,
                output,
                matrix,
                config: CooccurrenceConfig {
                    builders,
                    accumulators,
                    chunk_size,
                    work_capacity: builders,
                    accumulate_capacity,
                    max_documents,
                },
            };
            let report = run_cooccurrence(&job, cancel)?;
            info!("{} documents in {} chunks", report.documents, report.chunks);
        }
        Command::Frequencies {
            descriptors,
            counts,
            output,
        } => {
            let job = FrequencyJob {
                descriptors,
                counts: counts.into_input()?,
                output,
            };
            let root = run_frequencies(&job)?;
            info!("Root frequency {} written to {}", root, job.output.display());
        }
        Command::Edges {
            descriptors,
            output,
            directed,
            names,
        } => {
            let job = EdgeJob {
                descriptors,
                output,
                directed,
                label: if names { EdgeLabel::Name } else { EdgeLabel::Uid },
            };
            run_edges(&job)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting meshstat v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let command = args.command;
    let mut task = tokio::task::spawn_blocking(move || run(command, worker_cancel));

    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, cancelling run");
            cancel.cancel();
            (&mut task).await?
        }
        result = &mut task => result?,
    };

    if let Err(e) = &outcome {
        if matches!(e.downcast_ref::<meshstat::Error>(), Some(meshstat::Error::Cancelled)) {
            info!("Run cancelled");
            return Ok(());
        }
    }
    outcome
}
