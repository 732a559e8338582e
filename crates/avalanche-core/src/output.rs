//! Result files written next to (or alongside) the input.
//!
//! For an input `data/run7.csv` the outputs are named after the stem:
//!
//! | file                | contents                                         |
//! |---------------------|--------------------------------------------------|
//! | `run7_size.csv`     | one avalanche size per line                      |
//! | `run7_list.csv`     | first timestamp, then the member node ids        |
//! | `run7_summary.csv`  | `id,start,end,width,size` per avalanche          |
//! | `run7_report.json`  | run counters and timing                          |
//!
//! All files list avalanches in creation order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cluster::Cluster;
use crate::driver::RunReport;
use crate::error::DetectError;

/// Output file locations derived from an input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Avalanche sizes.
    pub sizes: PathBuf,
    /// Avalanche membership lists.
    pub members: PathBuf,
    /// Per-avalanche start, end, width and size.
    pub summary: PathBuf,
    /// JSON run report.
    pub report: PathBuf,
}

impl OutputPaths {
    /// Derive output paths from `input`, placed in `out_dir` when given and
    /// otherwise in the input's own directory.
    pub fn for_input(input: &Path, out_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map_or_else(|| "avalanches".into(), |s| s.to_string_lossy());
        let dir = out_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        Self {
            sizes: dir.join(format!("{stem}_size.csv")),
            members: dir.join(format!("{stem}_list.csv")),
            summary: dir.join(format!("{stem}_summary.csv")),
            report: dir.join(format!("{stem}_report.json")),
        }
    }
}

/// Write one avalanche size per line.
///
/// # Errors
///
/// Returns [`DetectError::Io`] if the file cannot be written.
pub fn write_sizes<'a>(
    path: &Path,
    avalanches: impl IntoIterator<Item = &'a Cluster>,
) -> Result<(), DetectError> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut count: usize = 0;
    for cluster in avalanches {
        writeln!(out, "{}", cluster.len())?;
        count = count.saturating_add(1);
    }
    out.flush()?;
    debug!(path = %path.display(), avalanches = count, "wrote sizes");
    Ok(())
}

/// Write each avalanche as its first timestamp followed by its member node
/// ids in timestamp order.
///
/// # Errors
///
/// Returns [`DetectError`] if the file cannot be written.
pub fn write_members<'a>(
    path: &Path,
    avalanches: impl IntoIterator<Item = &'a Cluster>,
) -> Result<(), DetectError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    for cluster in avalanches {
        let mut record = Vec::with_capacity(cluster.len().saturating_add(1));
        record.push(cluster.first_timestamp().to_string());
        record.extend(cluster.iter().map(|spike| spike.node.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "wrote member lists");
    Ok(())
}

/// Write one `id,start,end,width,size` row per avalanche, with a header.
///
/// # Errors
///
/// Returns [`DetectError`] if the file cannot be written.
pub fn write_summary<'a>(
    path: &Path,
    avalanches: impl IntoIterator<Item = &'a Cluster>,
) -> Result<(), DetectError> {
    let mut writer = csv::Writer::from_path(path)?;
    for cluster in avalanches {
        writer.serialize(cluster.summary())?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "wrote summary");
    Ok(())
}

/// Write the run report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`DetectError`] if the file cannot be written.
pub fn write_report(path: &Path, report: &RunReport) -> Result<(), DetectError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()?;
    debug!(path = %path.display(), "wrote report");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use avalanche_types::{ClusterId, NodeId, Spike};

    use super::*;

    fn cluster(id: u64, spikes: &[(u64, u32)]) -> Option<Cluster> {
        let (&(t, n), rest) = spikes.split_first()?;
        let mut cluster = Cluster::new(ClusterId(id), Spike::new(t, NodeId(n)));
        for &(t, n) in rest {
            cluster.append(Spike::new(t, NodeId(n)));
        }
        Some(cluster)
    }

    #[test]
    fn paths_follow_input_stem() {
        let paths = OutputPaths::for_input(Path::new("data/run7.csv"), None);
        assert_eq!(paths.sizes, PathBuf::from("data/run7_size.csv"));
        assert_eq!(paths.members, PathBuf::from("data/run7_list.csv"));
        assert_eq!(paths.summary, PathBuf::from("data/run7_summary.csv"));
        assert_eq!(paths.report, PathBuf::from("data/run7_report.json"));

        let paths = OutputPaths::for_input(Path::new("data/run7.csv"), Some(Path::new("out")));
        assert_eq!(paths.sizes, PathBuf::from("out/run7_size.csv"));
    }

    #[test]
    fn writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let clusters: Vec<Cluster> = [
            cluster(0, &[(5, 12), (6, 13), (9, 14)]),
            cluster(3, &[(20, 40), (20, 41)]),
        ]
        .into_iter()
        .flatten()
        .collect();
        let paths = OutputPaths::for_input(Path::new("spikes.csv"), Some(dir.path()));

        write_sizes(&paths.sizes, &clusters).unwrap();
        write_members(&paths.members, &clusters).unwrap();
        write_summary(&paths.summary, &clusters).unwrap();

        let sizes = std::fs::read_to_string(&paths.sizes).unwrap();
        assert_eq!(sizes, "3\n2\n");
        let members = std::fs::read_to_string(&paths.members).unwrap();
        assert_eq!(members, "5,12,13,14\n20,40,41\n");
        let summary = std::fs::read_to_string(&paths.summary).unwrap();
        assert_eq!(summary, "id,start,end,width,size\n0,5,9,5,3\n3,20,20,1,2\n");
    }

    #[test]
    fn empty_run_writes_empty_sizes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty_size.csv");
        write_sizes(&path, std::iter::empty()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
