//! Literal row-set descriptors consumed by the value scan.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DataType;

use super::expr::Expr;

/// How evaluated cells are written into a column vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Pre-size the vector to the row count and write each cell at its
    /// declared row position.
    #[default]
    Positional,
    /// Reset the vector's storage, then append cells in list order. Row
    /// positions are ignored.
    Append,
}

/// One cell assignment: an expression and the row it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsetCell {
    pub expr: Expr,
    pub row_pos: usize,
}

/// Cell assignments for one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsetColumn {
    pub data_type: DataType,
    pub cells: Vec<RowsetCell>,
}

impl RowsetColumn {
    /// Creates a column with no cells.
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        RowsetColumn {
            data_type,
            cells: Vec::new(),
        }
    }

    /// Adds a cell assignment.
    #[must_use]
    pub fn with_cell(mut self, expr: Expr, row_pos: usize) -> Self {
        self.cells.push(RowsetCell { expr, row_pos });
        self
    }
}

/// Per-column literal data for a value scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsetDescriptor {
    pub row_count: usize,
    pub cols: Vec<RowsetColumn>,
}

impl RowsetDescriptor {
    /// Creates a descriptor with no columns.
    #[must_use]
    pub fn new(row_count: usize) -> Self {
        RowsetDescriptor {
            row_count,
            cols: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn with_column(mut self, col: RowsetColumn) -> Self {
        self.cols.push(col);
        self
    }

    /// Builds a column-major descriptor from `VALUES` rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowset` if a row's width differs from `types`.
    pub fn from_rows(types: &[DataType], rows: Vec<Vec<Expr>>) -> Result<Self> {
        let mut cols: Vec<RowsetColumn> = types.iter().map(|t| RowsetColumn::new(*t)).collect();
        let row_count = rows.len();
        for (row_pos, row) in rows.into_iter().enumerate() {
            if row.len() != types.len() {
                return Err(Error::InvalidRowset(format!(
                    "row {row_pos} has {} values, expected {}",
                    row.len(),
                    types.len()
                )));
            }
            for (col, expr) in cols.iter_mut().zip(row) {
                col.cells.push(RowsetCell { expr, row_pos });
            }
        }
        Ok(RowsetDescriptor { row_count, cols })
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    /// Returns the declared column types.
    #[must_use]
    pub fn types(&self) -> Vec<DataType> {
        self.cols.iter().map(|c| c.data_type).collect()
    }

    /// Returns the total number of cell assignments.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cols.iter().map(|c| c.cells.len()).sum()
    }

    /// Checks the fill invariant for the given discipline.
    ///
    /// Columns without cells are skipped. Positional fill requires every row
    /// in `[0, row_count)` to be assigned exactly once; append fill requires
    /// exactly `row_count` cells.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRowset` describing the first violation.
    pub fn validate(&self, mode: FillMode) -> Result<()> {
        for (i, col) in self.cols.iter().enumerate() {
            if col.cells.is_empty() {
                continue;
            }
            match mode {
                FillMode::Positional => {
                    let mut seen = vec![false; self.row_count];
                    for cell in &col.cells {
                        let slot = seen.get_mut(cell.row_pos).ok_or_else(|| {
                            Error::InvalidRowset(format!(
                                "column {i}: row position {} out of range for {} rows",
                                cell.row_pos, self.row_count
                            ))
                        })?;
                        if *slot {
                            return Err(Error::InvalidRowset(format!(
                                "column {i}: row position {} assigned twice",
                                cell.row_pos
                            )));
                        }
                        *slot = true;
                    }
                    if let Some(missing) = seen.iter().position(|s| !s) {
                        return Err(Error::InvalidRowset(format!(
                            "column {i}: row position {missing} never assigned"
                        )));
                    }
                }
                FillMode::Append => {
                    if col.cells.len() != self.row_count {
                        return Err(Error::InvalidRowset(format!(
                            "column {i}: {} cells for {} rows",
                            col.cells.len(),
                            self.row_count
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
