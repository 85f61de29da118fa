//! Line-oriented codec for record collections.
//!
//! Each record is one line of the form `key|payload|` terminated by `\r\n`.
//! There is no header, no footer and no escaping. Reading is tolerant: `\r\n`,
//! `\n` and a lone `\r` all end a line, bytes that are not UTF-8 are replaced
//! with U+FFFD, and a line without a separator is skipped and reported. Only a
//! failure of the stream itself is an error.

use crate::{error::Result, Error, Record, RecordCollection};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Separates the fields of a line.
pub const FIELD_SEPARATOR: char = '|';

/// Terminates every line written by [`RecordCodec::format`].
pub const LINE_TERMINATOR: &str = "\r\n";

/// Why a line was dropped while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The line has no field separator, so no payload can be read
    MissingSeparator,
}

/// A line that was dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLine {
    /// 1-based line number in the input
    pub line: usize,
    /// The line content, lossily decoded
    pub content: String,
    pub reason: SkipReason,
}

/// Result of parsing a stream: the records that loaded and the lines that didn't.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub collection: RecordCollection,
    pub skipped: Vec<SkippedLine>,
    /// 1-based numbers of lines that held invalid UTF-8. Their records were
    /// still loaded, with U+FFFD in place of the bad bytes.
    pub lossy_lines: Vec<usize>,
}

impl ParseOutcome {
    /// True if every non-empty line produced a record.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, line: usize, content: String, reason: SkipReason) {
        tracing::warn!(line, ?reason, content = %content, "Skipping malformed record line");
        self.skipped.push(SkippedLine {
            line,
            content,
            reason,
        });
    }
}

/// Converts between [`RecordCollection`] and its serialized line format.
pub struct RecordCodec;

impl RecordCodec {
    /// Read an entire stream and parse it.
    ///
    /// Fails only if the stream cannot be read; no partial collection is
    /// returned in that case.
    pub fn parse<R: Read>(mut reader: R) -> Result<ParseOutcome> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(Error::read)?;
        Ok(Self::parse_bytes(&buf))
    }

    /// Parse an already-acquired buffer.
    ///
    /// Later lines win when a key repeats.
    pub fn parse_bytes(bytes: &[u8]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for (index, raw) in Lines::new(bytes).enumerate() {
            if raw.is_empty() {
                continue;
            }

            let line = index + 1;
            let text = String::from_utf8_lossy(raw);
            if std::str::from_utf8(raw).is_err() {
                tracing::warn!(line, content = %text, "Replaced invalid UTF-8 in record line");
                outcome.lossy_lines.push(line);
            }

            match parse_line(&text) {
                Some(record) => {
                    outcome.collection.insert(record);
                }
                None => outcome.skip(line, text.into_owned(), SkipReason::MissingSeparator),
            }
        }

        tracing::debug!(
            records = outcome.collection.len(),
            skipped = outcome.skipped.len(),
            lossy = outcome.lossy_lines.len(),
            "Parsed record stream"
        );

        outcome
    }

    /// Serialize a collection, one `key|payload|\r\n` line per record.
    pub fn format(collection: &RecordCollection) -> Vec<u8> {
        Self::format_to_string(collection).into_bytes()
    }

    /// Like [`RecordCodec::format`], for callers that want text.
    pub fn format_to_string(collection: &RecordCollection) -> String {
        let mut out = String::new();
        for record in collection.records() {
            push_line(&mut out, record);
        }
        out
    }

    /// Serialize a collection into a writer.
    pub fn write<W: Write>(collection: &RecordCollection, mut writer: W) -> Result<()> {
        writer
            .write_all(&Self::format(collection))
            .map_err(Error::write)?;
        writer.flush().map_err(Error::write)
    }
}

/// Splits a buffer on `\r\n`, `\n` or a lone `\r`. A final line without a
/// terminator is still yielded.
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Lines<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(end) => {
                let line = &self.rest[..end];
                let skip = match &self.rest[end..] {
                    [b'\r', b'\n', ..] => 2,
                    _ => 1,
                };
                self.rest = &self.rest[end + skip..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = &[];
                Some(line)
            }
        }
    }
}

fn parse_line(line: &str) -> Option<Record> {
    let mut fields = line.split(FIELD_SEPARATOR);
    let key = fields.next()?;
    let payload = fields.next()?;
    Some(Record::new(key, payload))
}

fn push_line(out: &mut String, record: &Record) {
    if !record.is_representable() {
        tracing::warn!(
            key = %record.key,
            "Record contains a separator or line break and will not read back intact"
        );
    }

    out.push_str(&record.key);
    out.push(FIELD_SEPARATOR);
    out.push_str(&record.payload);
    out.push(FIELD_SEPARATOR);
    out.push_str(LINE_TERMINATOR);
}
