use crate::collection::{CollectionName, Document};
use crate::common::{COLLECTION_FILE_EXTENSION, COMPACTION_SUFFIX, DELETED_MARKER, RECORD_ID};
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One line to append to a collection file.
pub(crate) enum LogEntry<'a> {
    Put(u64, &'a Document),
    Delete(u64),
}

/// Result of replaying a collection file.
#[derive(Debug, Default)]
pub(crate) struct ReplayedLog {
    pub records: BTreeMap<u64, Document>,
    pub next_record_id: u64,
    pub lines: usize,
    pub corrupt_lines: usize,
}

impl ReplayedLog {
    /// Whether rewriting the file would shrink it.
    pub fn needs_compaction(&self) -> bool {
        self.corrupt_lines > 0 || self.lines != self.records.len()
    }
}

/// Append-only newline-delimited JSON file backing one collection.
///
/// Every line is `{"_id": <record id>, ...fields}`; a deletion appends
/// `{"_id": <record id>, "$$deleted": true}`. Replaying the file keeps the
/// last line per record id.
pub(crate) struct CollectionFile {
    path: PathBuf,
    corrupt_threshold: f64,
    writer: Option<File>,
}

impl CollectionFile {
    pub fn new(db_path: &Path, collection: CollectionName, corrupt_threshold: f64) -> Self {
        CollectionFile {
            path: db_path.join(file_name(collection)),
            corrupt_threshold,
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file, creating it when absent.
    pub fn replay(&mut self) -> StorefrontResult<ReplayedLog> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut log = ReplayedLog {
            next_record_id: 1,
            ..Default::default()
        };
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            log.lines += 1;
            match parse_line(&line) {
                Some((record_id, entry)) => {
                    log.next_record_id = log.next_record_id.max(record_id + 1);
                    match entry {
                        Some(doc) => {
                            log.records.insert(record_id, doc);
                        }
                        None => {
                            log.records.remove(&record_id);
                        }
                    }
                }
                None => {
                    log::warn!("Skipping corrupt line {} in {}", log.lines, self.path.display());
                    log.corrupt_lines += 1;
                }
            }
        }

        if log.lines > 0 {
            let ratio = log.corrupt_lines as f64 / log.lines as f64;
            if ratio > self.corrupt_threshold {
                log::error!(
                    "{} of {} lines corrupt in {}, above threshold {}",
                    log.corrupt_lines,
                    log.lines,
                    self.path.display(),
                    self.corrupt_threshold
                );
                return Err(StorefrontError::new(
                    &format!(
                        "Collection file {} is corrupted ({} of {} lines unreadable)",
                        self.path.display(),
                        log.corrupt_lines,
                        log.lines
                    ),
                    ErrorKind::FileCorrupted,
                ));
            }
        }
        Ok(log)
    }

    /// Appends entries and flushes them in a single write.
    pub fn append(&mut self, entries: &[LogEntry<'_>]) -> StorefrontResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut buffer = String::new();
        for entry in entries {
            let line = match entry {
                LogEntry::Put(record_id, doc) => encode_record(*record_id, doc),
                LogEntry::Delete(record_id) => encode_tombstone(*record_id),
            };
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let writer = self.writer()?;
        writer.write_all(buffer.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Rewrites the file with exactly one line per live record. The new
    /// content goes to a sibling temp file which is then renamed over the
    /// original.
    pub fn compact<'a>(&mut self, records: impl Iterator<Item = (u64, &'a Document)>) -> StorefrontResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = temp_path(&self.path);
        {
            let mut temp = File::create(&temp_path)?;
            let mut buffer = String::new();
            for (record_id, doc) in records {
                buffer.push_str(&encode_record(record_id, doc));
                buffer.push('\n');
            }
            temp.write_all(buffer.as_bytes())?;
            temp.sync_all()?;
        }

        self.writer = None;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn writer(&mut self) -> StorefrontResult<&mut File> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.path)?;
            self.writer = Some(file);
        }
        self.writer.as_mut().ok_or_else(|| {
            StorefrontError::new("Collection file writer is not open", ErrorKind::InternalError)
        })
    }
}

pub(crate) fn file_name(collection: CollectionName) -> String {
    format!("{}.{}", collection.as_str(), COLLECTION_FILE_EXTENSION)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(COMPACTION_SUFFIX);
    PathBuf::from(name)
}

fn encode_record(record_id: u64, doc: &Document) -> String {
    let mut map = Map::with_capacity(doc.size() + 1);
    map.insert(RECORD_ID.to_string(), Value::from(record_id));
    for (key, value) in doc.iter() {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map).to_string()
}

fn encode_tombstone(record_id: u64) -> String {
    let mut map = Map::with_capacity(2);
    map.insert(RECORD_ID.to_string(), Value::from(record_id));
    map.insert(DELETED_MARKER.to_string(), Value::Bool(true));
    Value::Object(map).to_string()
}

/// `None` for an unreadable line, `Some((id, None))` for a tombstone.
fn parse_line(line: &str) -> Option<(u64, Option<Document>)> {
    let mut map = match serde_json::from_str::<Value>(line).ok()? {
        Value::Object(map) => map,
        _ => return None,
    };
    let record_id = map.shift_remove(RECORD_ID)?.as_u64()?;
    if map.get(DELETED_MARKER).and_then(Value::as_bool) == Some(true) {
        return Some((record_id, None));
    }
    Some((record_id, Some(Document::from_map(map))))
}
