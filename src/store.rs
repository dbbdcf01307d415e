//! Durable feedback store backed by a CSV file.
//!
//! The file always starts with the header `Name,Course,Rating,Comment`
//! followed by one row per record. Every mutation rewrites the whole file
//! through a temporary sibling that is renamed over the original, so readers
//! never see a partially written store.

use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::record::{FeedbackRecord, Score};

/// Header row of the persisted file, in field order.
pub const HEADER: [&str; 4] = ["Name", "Course", "Rating", "Comment"];

/// Whether an upsert replaced an existing record or appended a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the store with only its header row if it does not exist yet.
    pub fn initialize(&self) -> Result<()> {
        if self.path.exists() {
            debug!("Store already present at {}", self.path.display());
            return Ok(());
        }
        self.write_all(&[])?;
        info!("Created empty store at {}", self.path.display());
        Ok(())
    }

    /// Inserts a record, or updates score and annotation of the record sharing
    /// its case-insensitive `(subject, category)` key.
    pub fn upsert(
        &self,
        subject: &str,
        category: &str,
        score: Score,
        annotation: &str,
    ) -> Result<UpsertOutcome> {
        if subject.trim().is_empty() {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        if category.trim().is_empty() {
            return Err(Error::InvalidInput("course must not be empty".to_string()));
        }

        let mut records = self.list_all().iter().collect::<Result<Vec<_>>>()?;
        let outcome = match records
            .iter_mut()
            .find(|r| r.matches_key(subject, category))
        {
            Some(existing) => {
                existing.score = score;
                existing.annotation = annotation.to_string();
                UpsertOutcome::Updated
            }
            None => {
                records.push(FeedbackRecord::new(subject, category, score, annotation));
                UpsertOutcome::Created
            }
        };

        self.write_all(&records)?;
        debug!(
            "Upsert {subject}/{category} -> {outcome:?} ({} records)",
            records.len()
        );
        Ok(outcome)
    }

    /// Returns every record in file order.
    ///
    /// The returned value reads lazily and can be iterated any number of
    /// times; each pass starts again from the top of the file.
    pub fn list_all(&self) -> Records<'_> {
        Records { path: &self.path }
    }

    /// Mean score per exact category text, in order of first appearance.
    pub fn aggregate_by_category(&self) -> Result<CategoryAverages> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut totals: Vec<(String, u64, u64)> = Vec::new();

        for record in &self.list_all() {
            let record = record?;
            let slot = match index.get(&record.category) {
                Some(&i) => i,
                None => {
                    index.insert(record.category.clone(), totals.len());
                    totals.push((record.category, 0, 0));
                    totals.len() - 1
                }
            };
            totals[slot].1 += u64::from(record.score.get());
            totals[slot].2 += 1;
        }

        Ok(CategoryAverages {
            entries: totals
                .into_iter()
                .map(|(category, sum, count)| (category, sum as f64 / count as f64))
                .collect(),
        })
    }

    fn write_all(&self, records: &[FeedbackRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        // The renamed file must keep the mode of the store it replaces.
        match std::fs::metadata(&self.path) {
            Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
            Err(err) if err.kind() == ErrorKind::NotFound => set_default_mode(tmp.as_file())?,
            Err(err) => return Err(err.into()),
        }

        let mut writer = csv::Writer::from_writer(tmp);
        writer.write_record(HEADER)?;
        for record in records {
            let rating = record.score.to_string();
            writer.write_record([
                record.subject.as_str(),
                record.category.as_str(),
                rating.as_str(),
                record.annotation.as_str(),
            ])?;
        }
        let tmp = writer
            .into_inner()
            .map_err(|e| Error::FileSystem(e.error().to_string()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::from(e.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_default_mode(file: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_default_mode(_file: &File) -> Result<()> {
    Ok(())
}

/// Restartable view over the records of a store.
pub struct Records<'a> {
    path: &'a Path,
}

impl Records<'_> {
    pub fn iter(&self) -> RecordIter {
        match File::open(self.path) {
            Ok(file) => RecordIter {
                rows: Some(
                    csv::ReaderBuilder::new()
                        .has_headers(false)
                        .flexible(true)
                        .from_reader(file)
                        .into_records(),
                ),
                pending: None,
                header_seen: false,
            },
            Err(err) if err.kind() == ErrorKind::NotFound => RecordIter::empty(),
            Err(err) => RecordIter {
                rows: None,
                pending: Some(err.into()),
                header_seen: false,
            },
        }
    }
}

impl<'a> IntoIterator for &Records<'a> {
    type Item = Result<FeedbackRecord>;
    type IntoIter = RecordIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over the store file. Stops after the first error.
pub struct RecordIter {
    rows: Option<csv::StringRecordsIntoIter<File>>,
    pending: Option<Error>,
    header_seen: bool,
}

impl RecordIter {
    fn empty() -> Self {
        Self {
            rows: None,
            pending: None,
            header_seen: false,
        }
    }

    fn next_row(&mut self) -> Option<Result<FeedbackRecord>> {
        let rows = self.rows.as_mut()?;
        loop {
            let row = match rows.next()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err.into())),
            };
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            if !self.header_seen {
                self.header_seen = true;
                if let Err(err) = check_header(&row, line) {
                    return Some(Err(err));
                }
                continue;
            }
            return Some(parse_row(&row, line));
        }
    }
}

impl Iterator for RecordIter {
    type Item = Result<FeedbackRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }
        let item = self.next_row();
        if matches!(item, Some(Err(_)) | None) {
            self.rows = None;
        }
        item
    }
}

fn check_header(row: &csv::StringRecord, line: u64) -> Result<()> {
    let fields: Vec<&str> = row.iter().map(str::trim).collect();
    if fields.len() == HEADER.len()
        && fields
            .iter()
            .zip(HEADER)
            .all(|(got, want)| got.trim_start_matches('\u{feff}').eq_ignore_ascii_case(want))
    {
        Ok(())
    } else {
        Err(Error::CorruptStore {
            line,
            reason: format!("expected header {}, found {}", HEADER.join(","), fields.join(",")),
        })
    }
}

fn parse_row(row: &csv::StringRecord, line: u64) -> Result<FeedbackRecord> {
    if row.len() != HEADER.len() {
        return Err(Error::CorruptStore {
            line,
            reason: format!("expected {} fields, found {}", HEADER.len(), row.len()),
        });
    }
    let score: Score = row[2].parse().map_err(|_| Error::CorruptStore {
        line,
        reason: format!("invalid rating {:?}", &row[2]),
    })?;
    Ok(FeedbackRecord::new(&row[0], &row[1], score, &row[3]))
}

/// Mean score per category, ordered by first appearance in the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryAverages {
    entries: Vec<(String, f64)>,
}

impl CategoryAverages {
    pub fn get(&self, category: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, mean)| *mean)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(c, mean)| (c.as_str(), *mean))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
