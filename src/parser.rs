//! Streaming reader for MediaWiki XML exports.
//!
//! Walks the dump event by event and yields one [`RevisionRecord`] per
//! `<revision>`, never holding more than the current revision in memory.

use crate::error::MigrateError;
use crate::identity::Blocklist;
use crate::models::RevisionRecord;
use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;
use tracing::debug;

const READ_BUFFER: usize = 1024 * 1024;

/// Scalar elements whose text is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Timestamp,
    Username,
    Comment,
    Text,
}

/// Fields that live for the duration of one `<page>`.
#[derive(Debug, Default)]
struct PageState {
    open: bool,
    title: Option<String>,
}

/// Fields that live for the duration of one `<revision>`.
#[derive(Debug, Default)]
struct RevisionState {
    open: bool,
    timestamp: Option<String>,
    username: Option<String>,
    comment: Option<String>,
    text: Option<String>,
}

pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    capturing: Option<Field>,
    field_text: String,
    page: PageState,
    revision: RevisionState,
    blocklist: Blocklist,
    done: bool,
    deleted: u64,
    blocked: u64,
}

impl DumpReader<Box<dyn BufRead>> {
    /// Opens a dump on disk, decompressing `.bz2` files on the fly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open wiki dump at: {:?}", path))?;
        let is_bz2 = path.extension().map(|e| e == "bz2").unwrap_or(false);

        let inner: Box<dyn BufRead> = if is_bz2 {
            Box::new(BufReader::with_capacity(READ_BUFFER, BzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER, file))
        };
        Ok(Self::from_reader(inner))
    }
}

impl<R: BufRead> DumpReader<R> {
    pub fn from_reader(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(8192),
            capturing: None,
            field_text: String::new(),
            page: PageState::default(),
            revision: RevisionState::default(),
            blocklist: Blocklist::default(),
            done: false,
            deleted: 0,
            blocked: 0,
        }
    }

    pub fn with_blocklist(mut self, blocklist: Blocklist) -> Self {
        self.blocklist = blocklist;
        self
    }

    /// Revisions dropped because their text was missing (deleted or suppressed).
    pub fn deleted_count(&self) -> u64 {
        self.deleted
    }

    /// Revisions dropped because their author is blocklisted.
    pub fn blocked_count(&self) -> u64 {
        self.blocked
    }

    fn next_record(&mut self) -> Result<Option<RevisionRecord>> {
        let mut buf = mem::take(&mut self.buf);
        let result = self.pump(&mut buf);
        self.buf = buf;
        result
    }

    fn pump(&mut self, buf: &mut Vec<u8>) -> Result<Option<RevisionRecord>> {
        loop {
            buf.clear();
            let position = self.reader.buffer_position();
            let event = self
                .reader
                .read_event_into(buf)
                .with_context(|| format!("XML error near byte {}", position))?;

            match event {
                Event::Start(e) => self.on_start(e.local_name().as_ref())?,
                Event::Text(e) => {
                    if self.capturing.is_some() {
                        let text = e
                            .unescape()
                            .with_context(|| format!("Bad escape near byte {}", position))?;
                        self.field_text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if self.capturing.is_some() {
                        let raw = e.into_inner();
                        let text = std::str::from_utf8(&raw)
                            .with_context(|| format!("Invalid UTF-8 near byte {}", position))?;
                        self.field_text.push_str(text);
                    }
                }
                Event::End(e) => {
                    if let Some(record) = self.on_end(e.local_name().as_ref())? {
                        return Ok(Some(record));
                    }
                }
                Event::Eof => {
                    if self.page.open {
                        return Err(structure("dump ended inside a <page>"));
                    }
                    return Ok(None);
                }
                // Self-closing elements carry no text: `<text deleted="deleted" />`
                // leaves the revision without content.
                _ => {}
            }
        }
    }

    fn on_start(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"page" => {
                if self.page.open || self.page.title.is_some() {
                    return Err(structure("<page> opened before the previous page closed"));
                }
                self.page.open = true;
            }
            b"revision" => {
                if !self.page.open {
                    return Err(structure("<revision> outside of a <page>"));
                }
                if self.revision.open || self.revision.timestamp.is_some() {
                    return Err(structure(
                        "<revision> opened before the previous revision closed",
                    ));
                }
                self.revision.open = true;
            }
            b"title" if self.page.open && !self.revision.open => {
                if self.page.title.is_some() {
                    return Err(structure("<title> reopened within the same page"));
                }
                self.begin(Field::Title);
            }
            b"timestamp" if self.revision.open => self.begin(Field::Timestamp),
            b"username" if self.revision.open => self.begin(Field::Username),
            b"comment" if self.revision.open => self.begin(Field::Comment),
            b"text" if self.revision.open => self.begin(Field::Text),
            _ => {}
        }
        Ok(())
    }

    fn on_end(&mut self, name: &[u8]) -> Result<Option<RevisionRecord>> {
        match name {
            b"title" | b"timestamp" | b"username" | b"comment" | b"text" => {
                if let Some(field) = self.capturing.take() {
                    self.finish(field);
                }
                Ok(None)
            }
            b"revision" if self.page.open => self.close_revision(),
            b"page" if self.page.open => {
                if self.revision.open || self.revision.timestamp.is_some() {
                    return Err(structure("<page> closed inside an open revision"));
                }
                self.page = PageState::default();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn begin(&mut self, field: Field) {
        self.capturing = Some(field);
        self.field_text.clear();
    }

    fn finish(&mut self, field: Field) {
        let raw = mem::take(&mut self.field_text);
        match field {
            Field::Title => self.page.title = Some(raw.trim().to_string()),
            Field::Timestamp => self.revision.timestamp = Some(raw.trim().to_string()),
            Field::Username => self.revision.username = Some(raw.trim().to_string()),
            Field::Comment => self.revision.comment = Some(raw.trim().to_string()),
            // Body text is kept verbatim; an empty element means no content.
            Field::Text if raw.is_empty() => self.revision.text = None,
            Field::Text => self.revision.text = Some(raw),
        }
    }

    fn close_revision(&mut self) -> Result<Option<RevisionRecord>> {
        let revision = mem::take(&mut self.revision);
        let title = self
            .page
            .title
            .clone()
            .ok_or_else(|| structure("<revision> closed before the page <title>"))?;
        let timestamp = revision
            .timestamp
            .ok_or_else(|| structure(format!("revision of {:?} has no <timestamp>", title)))?;
        let username = revision.username.unwrap_or_default();

        let Some(content) = revision.text else {
            debug!(title = %title, timestamp = %timestamp, "Dropping revision without text");
            self.deleted += 1;
            return Ok(None);
        };
        if self.blocklist.contains(&username) {
            debug!(title = %title, username = %username, "Dropping blocklisted revision");
            self.blocked += 1;
            return Ok(None);
        }

        Ok(Some(RevisionRecord {
            page_title: title,
            timestamp,
            username,
            content,
            comment: revision.comment.unwrap_or_default(),
        }))
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<RevisionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn structure(message: impl Into<String>) -> anyhow::Error {
    MigrateError::Structure(message.into()).into()
}
