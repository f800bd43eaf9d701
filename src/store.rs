//! Write-once revision store.
//!
//! Revisions arrive in dump order (grouped by page) and must be replayed in
//! `(timestamp, title)` order. [`RevisionStore`] collects them; [`RevisionStore::seal`]
//! sorts once and hands back a read-only [`RevisionLog`]. The spill backing keeps
//! only ordering keys in memory and the bodies in an anonymous temp file that is
//! removed when the log is dropped.

use crate::config::PROGRESS_INTERVAL;
use crate::models::RevisionRecord;
use crate::stats::make_spinner;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::slice;
use tempfile::NamedTempFile;
use tracing::info;

const SPILL_BUFFER: usize = 256 * 1024;

#[derive(Debug)]
struct SpillEntry {
    timestamp: String,
    title: String,
    offset: u64,
}

enum Backing {
    Memory(Vec<RevisionRecord>),
    Spill {
        file: NamedTempFile,
        writer: BufWriter<File>,
        offset: u64,
        entries: Vec<SpillEntry>,
    },
}

pub struct RevisionStore {
    backing: Backing,
}

impl RevisionStore {
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory(Vec::new()),
        }
    }

    pub fn spill_to_disk() -> Result<Self> {
        let file = NamedTempFile::new().context("Failed to create revision spill file")?;
        let handle = file
            .reopen()
            .context("Failed to open revision spill file for writing")?;
        Ok(Self {
            backing: Backing::Spill {
                file,
                writer: BufWriter::with_capacity(SPILL_BUFFER, handle),
                offset: 0,
                entries: Vec::new(),
            },
        })
    }

    pub fn insert(&mut self, record: RevisionRecord) -> Result<()> {
        match &mut self.backing {
            Backing::Memory(records) => records.push(record),
            Backing::Spill {
                writer,
                offset,
                entries,
                ..
            } => {
                let size =
                    bincode::serialized_size(&record).context("Failed to size revision")?;
                bincode::serialize_into(&mut *writer, &record)
                    .context("Failed to spill revision to disk")?;
                entries.push(SpillEntry {
                    timestamp: record.timestamp,
                    title: record.page_title,
                    offset: *offset,
                });
                *offset += size;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        match &self.backing {
            Backing::Memory(records) => records.len(),
            Backing::Spill { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts by `(timestamp, title)`. The sort is stable, so equal keys keep
    /// insertion order.
    pub fn seal(self) -> Result<RevisionLog> {
        let sealed = match self.backing {
            Backing::Memory(mut records) => {
                records.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
                Sealed::Memory(records)
            }
            Backing::Spill {
                file,
                mut writer,
                offset,
                mut entries,
            } => {
                writer.flush().context("Failed to flush revision spill file")?;
                drop(writer);
                entries.sort_by(|a, b| {
                    (a.timestamp.as_str(), a.title.as_str())
                        .cmp(&(b.timestamp.as_str(), b.title.as_str()))
                });
                info!(revisions = entries.len(), bytes = offset, "Revision spill file sealed");
                Sealed::Spill { file, entries }
            }
        };
        Ok(RevisionLog { sealed })
    }
}

/// Drains a stream of parsed revisions into `store` and seals it. The first
/// parse error aborts the build; nothing partial is returned.
pub fn build_log<I>(records: I, mut store: RevisionStore) -> Result<RevisionLog>
where
    I: IntoIterator<Item = Result<RevisionRecord>>,
{
    let pb = make_spinner("Collecting revisions");
    for (seen, record) in records.into_iter().enumerate() {
        store.insert(record?)?;
        if (seen as u64 + 1) % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{} revisions", seen + 1));
        }
    }
    pb.finish_and_clear();
    info!(revisions = store.len(), "Revisions collected");
    store.seal()
}

enum Sealed {
    Memory(Vec<RevisionRecord>),
    Spill {
        file: NamedTempFile,
        entries: Vec<SpillEntry>,
    },
}

/// Read-only, chronologically ordered revisions.
pub struct RevisionLog {
    sealed: Sealed,
}

impl RevisionLog {
    pub fn len(&self) -> usize {
        match &self.sealed {
            Sealed::Memory(records) => records.len(),
            Sealed::Spill { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A fresh pass over the log from the first revision.
    pub fn iterate_ordered(&self) -> Result<OrderedRevisions<'_>> {
        let cursor = match &self.sealed {
            Sealed::Memory(records) => Cursor::Memory(records.iter()),
            Sealed::Spill { file, entries } => {
                let handle = file
                    .reopen()
                    .context("Failed to open revision spill file for reading")?;
                Cursor::Spill {
                    reader: BufReader::new(handle),
                    entries: entries.iter(),
                }
            }
        };
        Ok(OrderedRevisions { cursor })
    }
}

/// Ordered pass over a [`RevisionLog`].
pub struct OrderedRevisions<'a> {
    cursor: Cursor<'a>,
}

enum Cursor<'a> {
    Memory(slice::Iter<'a, RevisionRecord>),
    Spill {
        reader: BufReader<File>,
        entries: slice::Iter<'a, SpillEntry>,
    },
}

impl Iterator for OrderedRevisions<'_> {
    type Item = Result<RevisionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.cursor {
            Cursor::Memory(records) => records.next().cloned().map(Ok),
            Cursor::Spill { reader, entries } => {
                let entry = entries.next()?;
                Some(read_spilled(reader, entry))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.cursor {
            Cursor::Memory(records) => records.size_hint(),
            Cursor::Spill { entries, .. } => entries.size_hint(),
        }
    }
}

fn read_spilled(reader: &mut BufReader<File>, entry: &SpillEntry) -> Result<RevisionRecord> {
    reader
        .seek(SeekFrom::Start(entry.offset))
        .context("Failed to seek in revision spill file")?;
    bincode::deserialize_from(reader).with_context(|| {
        format!(
            "Failed to read spilled revision of {:?} at {}",
            entry.title, entry.timestamp
        )
    })
}
