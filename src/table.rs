//! Feature table: one row per entity (state, district or date) with named
//! numeric columns whose cells may be missing.

use crate::error::{Error, Result};
use crate::stats::{self, DescriptiveStats};
use num_traits::ToPrimitive;
use serde::Serialize;

/// A named numeric column with optional cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureColumn {
    name: String,
    values: Vec<Option<f64>>,
}

impl FeatureColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// Tabular input to the anomaly detector and the statistics helpers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    ids: Vec<String>,
    columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    /// Create a table with the given row identifiers and no columns
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeatureTable {
            ids: ids.into_iter().map(Into::into).collect(),
            columns: Vec::new(),
        }
    }

    /// Add a column with possibly-missing cells
    ///
    /// Cells that cannot be represented as `f64`, and NaN cells, count as missing.
    pub fn add_column<T, I>(&mut self, name: impl Into<String>, values: I) -> Result<()>
    where
        T: ToPrimitive,
        I: IntoIterator<Item = Option<T>>,
    {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(Error::DuplicateColumnName(name));
        }

        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.and_then(|v| v.to_f64()).filter(|v| !v.is_nan()))
            .collect();

        if values.len() != self.ids.len() {
            return Err(Error::LengthMismatch {
                expected: self.ids.len(),
                actual: values.len(),
            });
        }

        self.columns.push(FeatureColumn { name, values });
        Ok(())
    }

    /// Add a column with no missing cells
    pub fn add_dense_column<T, I>(&mut self, name: impl Into<String>, values: I) -> Result<()>
    where
        T: ToPrimitive,
        I: IntoIterator<Item = T>,
    {
        self.add_column(name, values.into_iter().map(Some))
    }

    /// Builder-style variant of [`FeatureTable::add_dense_column`]
    pub fn with_column<T, I>(mut self, name: impl Into<String>, values: I) -> Result<Self>
    where
        T: ToPrimitive,
        I: IntoIterator<Item = T>,
    {
        self.add_dense_column(name, values)?;
        Ok(self)
    }

    pub fn row_count(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Cells of a column, in row order
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Non-missing values of a column together with their row positions
    pub fn present_values(&self, name: &str) -> Result<(Vec<usize>, Vec<f64>)> {
        let column = self.column(name)?;
        Ok(column
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.map(|v| (row, v)))
            .unzip())
    }

    /// Rows where every selected feature is present
    ///
    /// Returns the original row positions and the matching feature matrix
    /// (one inner vector per row, features in the requested order).
    pub fn complete_rows<S: AsRef<str>>(
        &self,
        features: &[S],
    ) -> Result<(Vec<usize>, Vec<Vec<f64>>)> {
        if features.is_empty() {
            return Err(Error::InvalidInput(
                "at least one feature column is required".into(),
            ));
        }

        let selected = features
            .iter()
            .map(|f| self.column(f.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        let mut matrix = Vec::new();
        for row in 0..self.row_count() {
            let values: Option<Vec<f64>> = selected.iter().map(|col| col[row]).collect();
            if let Some(values) = values {
                rows.push(row);
                matrix.push(values);
            }
        }

        Ok((rows, matrix))
    }

    /// Univariate summary of one column, skipping missing cells
    pub fn describe(&self, name: &str) -> Result<DescriptiveStats> {
        let (_, values) = self.present_values(name)?;
        stats::univariate_analysis(&values)
    }
}
