use std::fs::File;
use std::io;
use std::path::Path;

use memmap2::Mmap;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::emit::emit;
use crate::error::{Error, Result};
use crate::table::Table;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub keys: usize,
    pub records: u64,
}

/// Stages output next to its destination so a failed run leaves nothing behind.
fn stage_output(output: &Path) -> Result<NamedTempFile> {
    let dir = output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut builder = Builder::new();
    builder.prefix(".onebrc-");

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o644));
    }

    builder
        .tempfile_in(dir)
        .map_err(|source| Error::WriteOutput {
            path: output.to_path_buf(),
            source,
        })
}

fn aggregate_file(file: File, aggregator: &Aggregator) -> Result<Table> {
    let metadata = file
        .metadata()
        .map_err(|source| Error::ReadInput { source })?;

    if !metadata.is_file() {
        debug!("input is not a regular file, streaming it");
        return aggregator.aggregate_reader(file);
    }

    if metadata.len() == 0 {
        return Ok(Table::new());
    }

    // The input must not be modified while mapped.
    let buf = unsafe { Mmap::map(&file) }.map_err(|source| Error::ReadInput { source })?;
    aggregator.aggregate_bytes(&buf)
}

/// Aggregates `input` and writes the sorted result to `output`.
///
/// `output` is only replaced once every line has been parsed and written.
pub fn process_file(input: &Path, output: &Path, aggregator: &Aggregator) -> Result<Summary> {
    let file = File::open(input).map_err(|source| Error::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;

    let staged = stage_output(output)?;

    info!(
        input = %input.display(),
        workers = aggregator.workers().get(),
        "aggregating"
    );

    let table = aggregate_file(file, aggregator)?;
    let summary = Summary {
        keys: table.len(),
        records: table.records(),
    };

    info!(keys = summary.keys, records = summary.records, "aggregated");

    let write_err = |source: io::Error| Error::WriteOutput {
        path: output.to_path_buf(),
        source,
    };

    emit(table, staged.as_file()).map_err(write_err)?;
    staged.persist(output).map_err(|e| write_err(e.error))?;

    debug!(output = %output.display(), "wrote output");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::num::NonZeroUsize;
    use tempfile::TempDir;

    fn aggregator(workers: usize) -> Aggregator {
        Aggregator::new(NonZeroUsize::new(workers).unwrap())
    }

    #[test]
    fn test_process_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("measurements.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "Tokyo;10.0\nTokyo;20.0\nParis;-5.5\n").unwrap();

        let summary = process_file(&input, &output, &aggregator(2)).unwrap();

        assert_eq!(summary, Summary { keys: 2, records: 3 });
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Paris=-5.5/-5.5/-5.5\nTokyo=10.0/15.0/20.0\n"
        );
    }

    #[test]
    fn test_empty_input_writes_empty_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("empty.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "").unwrap();

        let summary = process_file(&input, &output, &aggregator(4)).unwrap();

        assert_eq!(summary, Summary::default());
        assert_eq!(fs::read(&output).unwrap(), b"");
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("nope.txt");
        let output = dir.path().join("out.txt");

        let err = process_file(&input, &output, &aggregator(1)).unwrap_err();

        assert!(matches!(err, Error::OpenInput { ref path, .. } if path == &input));
        assert!(!output.exists());
    }

    #[test]
    fn test_unwritable_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("measurements.txt");
        let output = dir.path().join("missing-dir").join("out.txt");
        fs::write(&input, "X;3.3\n").unwrap();

        let err = process_file(&input, &output, &aggregator(1)).unwrap_err();

        assert!(matches!(err, Error::WriteOutput { .. }));
    }

    #[test]
    fn test_malformed_input_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("measurements.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "X;3.3\nbroken\n").unwrap();

        let err = process_file(&input, &output, &aggregator(2)).unwrap_err();

        assert!(matches!(err, Error::Malformed { line: 2, .. }));
        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_existing_output_is_replaced() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("measurements.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "X;3.3\n").unwrap();
        fs::write(&output, "stale\n").unwrap();

        process_file(&input, &output, &aggregator(1)).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "X=3.3/3.3/3.3\n");
    }
}
