use std::io::{self, Read};
use std::num::NonZeroUsize;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::byte_buffer::ByteBuffer;
use crate::error::{Error, Result};
use crate::record::{Record, RecordErrorKind, parse_record};
use crate::table::Table;

pub const READ_BUFFER_SIZE: usize = 4 << 20;

/// A malformed line, positioned relative to the slice it was found in.
#[derive(Debug)]
struct LineError<'a> {
    line: usize,
    offset: usize,
    kind: RecordErrorKind,
    bytes: &'a [u8],
}

impl LineError<'_> {
    fn into_error(self, base_line: usize, base_offset: usize) -> Error {
        Error::malformed(
            base_line + self.line + 1,
            base_offset + self.offset,
            self.kind,
            self.bytes,
        )
    }
}

/// Folds every line of `buf` into `table`, returning the number of lines.
///
/// The last line may lack its `\n`.
#[inline]
fn fold_lines<'a>(buf: &'a [u8], table: &mut Table) -> Result<usize, LineError<'a>> {
    let mut start = 0;
    let mut lines = 0;

    while start < buf.len() {
        let end = buf[start..]
            .byte_position(b'\n')
            .map_or(buf.len(), |pos| start + pos);
        let line = &buf[start..end];

        match parse_record(line) {
            Ok(Record { key, value }) => table.record(key, value),
            Err(kind) => {
                return Err(LineError {
                    line: lines,
                    offset: start,
                    kind,
                    bytes: line,
                });
            }
        }

        lines += 1;
        start = end + 1;
    }

    Ok(lines)
}

/// A line-aligned slice of the input and its byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub offset: usize,
    pub bytes: &'a [u8],
}

/// Splits `data` into at most `count` contiguous chunks, each ending on a line boundary.
///
/// No chunk is empty, so a short input yields fewer chunks than asked for.
pub fn split_chunks(data: &[u8], count: usize) -> Vec<Chunk<'_>> {
    let count = count.min(data.len()).max(1);
    let mut chunks = Vec::with_capacity(count);
    let mut start = 0;

    for i in 1..count {
        let target = (data.len() / count * i).max(start);
        if target >= data.len() {
            break;
        }

        let Some(pos) = data[target..].byte_position(b'\n') else {
            break;
        };

        let end = target + pos + 1;
        chunks.push(Chunk {
            offset: start,
            bytes: &data[start..end],
        });
        start = end;
    }

    if start < data.len() {
        chunks.push(Chunk {
            offset: start,
            bytes: &data[start..],
        });
    }

    chunks
}

fn fold_chunk<'a>(chunk: &Chunk<'a>) -> Result<Table, LineError<'a>> {
    let mut table = Table::new();
    let lines = fold_lines(chunk.bytes, &mut table)?;
    trace!(
        offset = chunk.offset,
        lines,
        keys = table.len(),
        "folded chunk"
    );
    Ok(table)
}

/// Builds per-key statistics from `key;value` lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aggregator {
    workers: NonZeroUsize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN)
    }
}

impl Aggregator {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Streams `reader` through a reusable buffer on the calling thread.
    ///
    /// Partial lines are carried over between reads; the buffer doubles
    /// whenever a single line outgrows it.
    pub fn aggregate_reader<R: Read>(&self, mut reader: R) -> Result<Table> {
        let mut table = Table::new();

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut filled = 0;
        let mut base_offset = 0;
        let mut base_line = 0;

        loop {
            if filled == buf.len() {
                buf.resize(buf.len() * 2, 0);
                trace!(capacity = buf.len(), "grew read buffer");
            }

            let bytes_read = match reader.read(&mut buf[filled..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(Error::ReadInput { source }),
            };

            if bytes_read == 0 {
                break;
            }

            // The carried remainder never holds a newline.
            let Some(last_newline) = buf[filled..filled + bytes_read].last_position(b'\n') else {
                filled += bytes_read;
                continue;
            };

            let complete = filled + last_newline + 1;
            filled += bytes_read;

            let lines = fold_lines(&buf[..complete], &mut table)
                .map_err(|e| e.into_error(base_line, base_offset))?;
            base_line += lines;

            buf.copy_within(complete..filled, 0);
            filled -= complete;
            base_offset += complete;
        }

        fold_lines(&buf[..filled], &mut table).map_err(|e| e.into_error(base_line, base_offset))?;

        debug!(
            bytes = base_offset + filled,
            keys = table.len(),
            "streamed input"
        );

        Ok(table)
    }

    /// Folds `data` in parallel, one line-aligned chunk per worker, then
    /// merges the partial tables.
    ///
    /// The pool never has more threads than there are chunks.
    ///
    /// A malformed line aborts the run; with several malformed lines the
    /// earliest one is reported.
    pub fn aggregate_bytes(&self, data: &[u8]) -> Result<Table> {
        let chunks = split_chunks(data, self.workers.get());

        if chunks.len() <= 1 {
            let mut table = Table::new();
            fold_lines(data, &mut table).map_err(|e| e.into_error(0, 0))?;
            return Ok(table);
        }

        debug!(
            chunks = chunks.len(),
            workers = self.workers.get(),
            bytes = data.len(),
            "split input"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(chunks.len())
            .thread_name(|i| format!("onebrc-worker-{i}"))
            .build()
            .map_err(|source| Error::WorkerPool { source })?;

        let partials: Vec<Result<Table, LineError<'_>>> = pool.install(|| {
            chunks
                .par_iter()
                .map(fold_chunk)
                .collect()
        });

        let mut tables = Vec::with_capacity(partials.len());
        for (chunk, partial) in chunks.iter().zip(partials) {
            match partial {
                Ok(table) => tables.push(table),
                Err(e) => {
                    let base_line = data[..chunk.offset].byte_count(b'\n');
                    return Err(e.into_error(base_line, chunk.offset));
                }
            }
        }

        let table = pool.install(|| {
            tables.into_par_iter().reduce(Table::new, |mut acc, partial| {
                acc.merge(partial);
                acc
            })
        });

        Ok(table)
    }
}

/// Single-threaded aggregation of a whole stream.
pub fn aggregate<R: Read>(reader: R) -> Result<Table> {
    Aggregator::default().aggregate_reader(reader)
}
