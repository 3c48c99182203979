//! Columnar batch: the unit of data flow between operators.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::error::{Error, Result};
use crate::types::DataType;

use super::vector::{MemoryPoolRef, Vector};

/// Default batch size for vectorized execution (rows per batch).
pub const DEFAULT_BATCH_SIZE: usize = 2048;

/// An ordered set of vectors sharing one row count.
///
/// Vector order is significant: it is the projection list of the producing
/// operator. A batch with zero rows is a valid empty result, distinct from
/// "no batch" at end of data.
#[derive(Debug, Default)]
pub struct Batch {
    vecs: Vec<Vector>,
    /// Optional column names, used when exporting to Arrow.
    attrs: Vec<String>,
    row_count: usize,
}

impl Batch {
    /// Creates a batch from vectors and an explicit row count.
    #[must_use]
    pub fn new(vecs: Vec<Vector>, row_count: usize) -> Self {
        Batch {
            vecs,
            attrs: Vec::new(),
            row_count,
        }
    }

    /// Allocates a batch with one empty vector per type and room for
    /// `capacity` rows in each.
    pub fn allocate(types: &[DataType], capacity: usize, pool: &MemoryPoolRef) -> Result<Self> {
        let vecs = types
            .iter()
            .map(|t| Vector::with_capacity(*t, capacity, pool))
            .collect::<Result<Vec<_>>>()?;
        Ok(Batch::new(vecs, 0))
    }

    /// The canonical input used to evaluate expressions that reference no
    /// columns: no vectors and no rows.
    #[must_use]
    pub fn empty_for_const_fold() -> Self {
        Batch::default()
    }

    /// Sets the column names.
    #[must_use]
    pub fn with_attrs(mut self, attrs: Vec<String>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Returns the column names, if any were set.
    #[must_use]
    pub fn attrs(&self) -> &[String] {
        &self.attrs
    }

    /// Returns the number of rows in this batch.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Sets the row count shared by all vectors.
    pub fn set_row_count(&mut self, row_count: usize) {
        self.row_count = row_count;
    }

    /// Returns true if the batch has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Returns the number of columns in this batch.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.vecs.len()
    }

    /// Returns a column by index.
    #[must_use]
    pub fn vector(&self, index: usize) -> Option<&Vector> {
        self.vecs.get(index)
    }

    /// Returns a mutable column by index.
    pub fn vector_mut(&mut self, index: usize) -> Option<&mut Vector> {
        self.vecs.get_mut(index)
    }

    /// Returns all columns.
    #[must_use]
    pub fn vecs(&self) -> &[Vector] {
        &self.vecs
    }

    /// Returns the total number of bytes held by the vectors.
    #[must_use]
    pub fn size(&self) -> usize {
        self.vecs.iter().map(Vector::size).sum()
    }

    /// Checks that every non-constant vector has `row_count` rows.
    pub fn validate(&self) -> Result<()> {
        for (i, vec) in self.vecs.iter().enumerate() {
            if !vec.is_const() && vec.len() != self.row_count {
                return Err(Error::InvalidVector(format!(
                    "column {i} has {} rows, batch has {}",
                    vec.len(),
                    self.row_count
                )));
            }
        }
        Ok(())
    }

    /// Builds a new batch holding the selected rows.
    pub fn take(&self, selection: &SelectionVector, pool: &MemoryPoolRef) -> Result<Batch> {
        let vecs = self
            .vecs
            .iter()
            .map(|v| v.take(&selection.indices, pool))
            .collect::<Result<Vec<_>>>()?;
        Ok(Batch {
            vecs,
            attrs: self.attrs.clone(),
            row_count: selection.len(),
        })
    }

    /// Releases every vector's buffers back to the pool.
    pub fn free(&mut self) {
        for vec in &mut self.vecs {
            vec.free();
        }
        self.row_count = 0;
    }

    /// Exports the batch as an Arrow `RecordBatch`. Constants are expanded.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<Field> = self
            .vecs
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let name = self
                    .attrs
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{i}"));
                Field::new(name, v.data_type().to_arrow(), true)
            })
            .collect();
        let columns = self
            .vecs
            .iter()
            .map(|v| self.column_array(v))
            .collect::<Result<Vec<ArrayRef>>>()?;
        let options = RecordBatchOptions::new().with_row_count(Some(self.row_count));
        Ok(RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            columns,
            &options,
        )?)
    }

    /// Imports an Arrow `RecordBatch`, allocating from `pool`.
    pub fn from_record_batch(batch: &RecordBatch, pool: &MemoryPoolRef) -> Result<Batch> {
        let vecs = batch
            .columns()
            .iter()
            .map(|c| Vector::from_array(c.as_ref(), pool))
            .collect::<Result<Vec<_>>>()?;
        let attrs = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        Ok(Batch {
            vecs,
            attrs,
            row_count: batch.num_rows(),
        })
    }

    fn column_array(&self, vec: &Vector) -> Result<ArrayRef> {
        if vec.is_const() && vec.len() != self.row_count {
            let mut broadcast = vec.to_array()?;
            if broadcast.len() > self.row_count {
                broadcast = broadcast.slice(0, self.row_count);
            } else {
                let indices = arrow::array::UInt32Array::from(vec![0u32; self.row_count]);
                broadcast = arrow::compute::take(&broadcast, &indices, None)?;
            }
            return Ok(broadcast);
        }
        vec.to_array()
    }
}

/// Selection vector for filtered batches.
///
/// Instead of materializing filtered results immediately,
/// we keep track of which rows are selected for lazy evaluation.
#[derive(Debug, Clone)]
pub struct SelectionVector {
    /// Indices of selected rows.
    pub indices: Vec<u32>,
}

impl SelectionVector {
    /// Creates a new selection vector with the given indices.
    pub fn new(indices: Vec<u32>) -> Self {
        SelectionVector { indices }
    }

    /// Returns the number of selected rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no rows are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use arrow::array::{Array, Int64Array};
    use datafusion::execution::memory_pool::{MemoryPool, UnboundedMemoryPool};

    fn pool() -> MemoryPoolRef {
        Arc::new(UnboundedMemoryPool::default())
    }

    fn int_vector(values: &[i64], pool: &MemoryPoolRef) -> Vector {
        let mut vec = Vector::new(DataType::Int64, pool);
        for v in values {
            vec.push_value(&Value::Int64(*v)).unwrap();
        }
        vec
    }

    #[test]
    fn test_batch_basic() {
        let pool = pool();
        let batch = Batch::new(
            vec![int_vector(&[1, 2, 3], &pool), int_vector(&[4, 5, 6], &pool)],
            3,
        );
        assert_eq!(batch.row_count(), 3);
        assert_eq!(batch.num_columns(), 2);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ragged_columns() {
        let pool = pool();
        let batch = Batch::new(vec![int_vector(&[1, 2], &pool)], 3);
        assert!(matches!(batch.validate(), Err(Error::InvalidVector(_))));
    }

    #[test]
    fn test_const_fold_batch_is_empty() {
        let batch = Batch::empty_for_const_fold();
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.row_count(), 0);
    }

    #[test]
    fn test_to_record_batch_expands_constants() {
        let pool = pool();
        let constant = Vector::new_const(&Value::Int64(9), DataType::Int64, 1, &pool).unwrap();
        let batch = Batch::new(vec![int_vector(&[1, 2, 3], &pool), constant], 3)
            .with_attrs(vec!["a".into(), "b".into()]);

        let rb = batch.to_record_batch().unwrap();
        assert_eq!(rb.num_rows(), 3);
        assert_eq!(rb.schema().field(1).name(), "b");
        let b = rb.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(b.values().to_vec(), vec![9, 9, 9]);
    }

    #[test]
    fn test_zero_column_batch_keeps_row_count() {
        let batch = Batch::new(Vec::new(), 1);
        let rb = batch.to_record_batch().unwrap();
        assert_eq!(rb.num_rows(), 1);
        assert_eq!(rb.num_columns(), 0);
    }

    #[test]
    fn test_take() {
        let pool = pool();
        let batch = Batch::new(vec![int_vector(&[10, 20, 30], &pool)], 3);
        let taken = batch.take(&SelectionVector::new(vec![0, 2]), &pool).unwrap();
        assert_eq!(taken.row_count(), 2);
        assert_eq!(taken.vector(0).unwrap().get_value(1).unwrap(), Value::Int64(30));
    }

    #[test]
    fn test_free_returns_memory() {
        let pool = pool();
        let mut batch = Batch::new(vec![int_vector(&[1, 2, 3], &pool)], 3);
        assert!(pool.reserved() > 0);
        batch.free();
        assert_eq!(pool.reserved(), 0);
    }

    #[test]
    fn test_selection_vector() {
        let selection = SelectionVector::new(vec![0, 2, 4]);
        assert_eq!(selection.len(), 3);
        assert!(!selection.is_empty());
        assert!(SelectionVector::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_allocate_reserves_capacity() {
        let pool = pool();
        let batch = Batch::allocate(&[DataType::Int64, DataType::String], 16, &pool).unwrap();
        assert_eq!(batch.num_columns(), 2);
        assert_eq!(batch.row_count(), 0);
        assert_eq!(batch.vector(1).unwrap().data_type(), DataType::String);
        assert!(pool.reserved() >= 16 * 8);
    }
}
