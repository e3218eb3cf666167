//! Reader for the CelebA-HQ to CelebA index mapping table.
//!
//! The table is whitespace-delimited text with a header row naming the
//! columns. Rows are addressed by position: row `i` describes CelebA-HQ
//! image `i`, and its `orig_idx` column gives that image's index in the
//! original CelebA ordering. The header may omit a name for the leading
//! row-label column.

use std::path::Path;

use face_data_core::{DatasetError, Result};
use tracing::debug;

use crate::fs::require_file;

/// Column holding the reference index.
pub const ORIG_IDX_COLUMN: &str = "orig_idx";

/// Row position to reference index lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMapping {
    orig: Vec<u64>,
}

impl IndexMapping {
    /// Reads and parses a mapping file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingFile`] if `path` is not a file and
    /// [`DatasetError::InvalidMapping`] if its contents do not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        require_file(path)?;
        let text = std::fs::read_to_string(path)?;
        let mapping = Self::parse(&text)?;
        debug!("Loaded {} mapping rows from {}", mapping.len(), path.display());
        Ok(mapping)
    }

    /// Parses mapping table text.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidMapping`] on a missing header, a missing
    /// `orig_idx` column, or a non-integer value.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines
            .next()
            .ok_or_else(|| DatasetError::InvalidMapping("empty mapping table".to_string()))?;
        let columns: Vec<&str> = header.split_whitespace().collect();
        let column = columns
            .iter()
            .position(|c| *c == ORIG_IDX_COLUMN)
            .ok_or_else(|| {
                DatasetError::InvalidMapping(format!("no '{ORIG_IDX_COLUMN}' column in header"))
            })?;

        lines
            .map(|(line_no, line)| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                // One extra field means the row label has no header name.
                let offset = usize::from(fields.len() == columns.len() + 1);
                let value = fields.get(column + offset).ok_or_else(|| {
                    DatasetError::InvalidMapping(format!(
                        "line {}: expected {} fields, found {}",
                        line_no + 1,
                        columns.len(),
                        fields.len()
                    ))
                })?;
                value.parse::<u64>().map_err(|_| {
                    DatasetError::InvalidMapping(format!(
                        "line {}: '{value}' is not an integer",
                        line_no + 1
                    ))
                })
            })
            .collect()
    }

    /// Reference index of row `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingMapping`] if the table has no such row.
    pub fn orig_idx(&self, index: u64) -> Result<u64> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.orig.get(i))
            .copied()
            .ok_or(DatasetError::MissingMapping(index))
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orig.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orig.is_empty()
    }
}

impl FromIterator<u64> for IndexMapping {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            orig: iter.into_iter().collect(),
        }
    }
}
