use anyhow::{Context, Result};
use meshstat_cooccurrence::LikelihoodRecord;
use meshstat_core::Ontology;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// One `uid,uid,llr` line per record.
pub fn write_likelihoods<P: AsRef<Path>>(path: P, records: &[LikelihoodRecord]) -> Result<()> {
    let mut out = create(path.as_ref())?;
    for record in records {
        writeln!(out, "{}", record)?;
    }
    out.flush()?;
    Ok(())
}

/// How edge endpoints are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeLabel {
    #[default]
    Uid,
    Name,
}

/// Writes the hierarchy as `parent<TAB>child` lines. An undirected list
/// keeps one line per connected pair.
pub fn write_edges<P: AsRef<Path>>(
    path: P,
    ontology: &Ontology,
    directed: bool,
    label: EdgeLabel,
) -> Result<usize> {
    let name = |term| match label {
        EdgeLabel::Uid => ontology.uid(term),
        EdgeLabel::Name => ontology.name(term),
    };
    let edges = ontology.hierarchy().edges(directed);
    let mut out = create(path.as_ref())?;
    for &(parent, child) in &edges {
        writeln!(out, "{}\t{}", name(parent), name(child))?;
    }
    out.flush()?;
    tracing::info!("Wrote {} edges to {}", edges.len(), path.as_ref().display());
    Ok(edges.len())
}
