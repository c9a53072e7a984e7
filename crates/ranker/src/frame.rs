//! DataFrame-backed feature provider.
//!
//! Expects a long table with one row per (date, entity): a `date` column
//! (`YYYY-MM-DD` or `YYYYMMDD`), a `code` column, an optional `name` column,
//! and any number of numeric feature columns. Every column other than
//! `date`, `code` and `name` is part of the snapshot schema.

use crate::{
    RankError, Result,
    snapshot::{FeatureRow, FeatureSnapshot, FeatureSource, parse_as_of},
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

const DATE: &str = "date";
const CODE: &str = "code";
const NAME: &str = "name";

/// Feature provider over an in-memory polars [`DataFrame`].
#[derive(Debug, Clone)]
pub struct FrameSource {
    data: DataFrame,
    feature_columns: Vec<String>,
}

impl FrameSource {
    /// Wrap a frame, checking that the key columns exist.
    pub fn new(data: DataFrame) -> Result<Self> {
        let columns: Vec<String> = data
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();

        for required in [DATE, CODE] {
            if !columns.iter().any(|c| c == required) {
                return Err(RankError::MissingColumn(required.to_string()));
            }
        }

        let feature_columns = columns
            .into_iter()
            .filter(|c| c != DATE && c != CODE && c != NAME)
            .collect();

        Ok(Self {
            data,
            feature_columns,
        })
    }

    /// Load a CSV file with a header row.
    ///
    /// Every column is read as text so identifiers such as `005930` keep
    /// their leading zeros; feature columns are parsed when a snapshot is
    /// built.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let data = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;
        Self::new(data)
    }

    /// Names of the feature columns, in frame order.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    fn has_name_column(&self) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == NAME)
    }

    fn rows_for(&self, as_of: NaiveDate) -> Result<DataFrame> {
        let dashed = as_of.format("%Y-%m-%d").to_string();
        let compact = as_of.format("%Y%m%d").to_string();

        let frame = self
            .data
            .clone()
            .lazy()
            .with_columns([
                col(DATE).cast(DataType::String),
                col(CODE).cast(DataType::String),
            ])
            .filter(col(DATE).eq(lit(dashed)).or(col(DATE).eq(lit(compact))))
            .sort([CODE], Default::default())
            .collect()?;

        Ok(frame)
    }
}

impl FeatureSource for FrameSource {
    fn features(&self, as_of: NaiveDate) -> Result<FeatureSnapshot> {
        let frame = self.rows_for(as_of)?;
        if frame.height() == 0 {
            return Ok(FeatureSnapshot::empty());
        }

        let codes = frame.column(CODE)?.str()?.clone();
        let names = if self.has_name_column() {
            Some(frame.column(NAME)?.cast(&DataType::String)?)
        } else {
            None
        };
        let names = match &names {
            Some(column) => Some(column.str()?),
            None => None,
        };

        let mut rows: Vec<FeatureRow> = (0..frame.height())
            .map(|i| {
                let code = codes.get(i).unwrap_or_default();
                let name = names.and_then(|n| n.get(i)).unwrap_or_default();
                FeatureRow::new(code, name)
            })
            .collect();

        for field in &self.feature_columns {
            // Non-numeric cells become null under the non-strict cast.
            let column = frame.column(field)?.cast(&DataType::Float64)?;
            let values = column.f64()?;
            for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    row.values.insert(field.clone(), v);
                }
            }
        }

        Ok(FeatureSnapshot::with_schema(
            as_of,
            self.feature_columns.iter().cloned(),
            rows,
        ))
    }

    fn latest_as_of(&self) -> Result<Option<NaiveDate>> {
        let dates = self.data.column(DATE)?.cast(&DataType::String)?;
        let latest = dates
            .str()?
            .into_iter()
            .flatten()
            .filter_map(parse_as_of)
            .max();
        Ok(latest)
    }
}
