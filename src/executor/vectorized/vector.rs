//! Typed column storage backed by pool-accounted buffers.
//!
//! A [`Vector`] keeps its values in a single slot buffer (one fixed-width slot
//! per row; variable-width types store an offset/length pair pointing into a
//! separate byte area) plus an optional validity bitmap. Every byte the vector
//! grows by is first reserved on the shared [`MemoryPool`], and the
//! reservation is returned to the pool when the vector is dropped or freed.

use std::fmt;
use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, BooleanArray, BooleanBufferBuilder, Date32Array,
    Float32Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::buffer::MutableBuffer;
use arrow::datatypes::{
    Date32Type, Float32Type, Float64Type, Int64Type, TimestampMicrosecondType,
};
use datafusion::execution::memory_pool::{MemoryConsumer, MemoryPool, MemoryReservation};

use crate::error::{Error, Result};
use crate::types::{DataType, Value};

/// Shared handle to the memory pool every vector reserves from.
pub type MemoryPoolRef = Arc<dyn MemoryPool>;

/// Physical layout class of a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorClass {
    /// One physical slot per row.
    Flat,
    /// A single physical slot broadcast to every row.
    Const,
}

/// A single typed column.
pub struct Vector {
    data_type: DataType,
    class: VectorClass,
    /// Logical row count. Constant vectors hold one physical row.
    len: usize,
    values: MutableBuffer,
    /// Byte area for variable-width values.
    area: MutableBuffer,
    /// Validity bits (`true` = valid). `None` means no nulls.
    nulls: Option<BooleanBufferBuilder>,
    reservation: MemoryReservation,
}

impl Vector {
    /// Creates an empty flat vector registered on the given pool.
    #[must_use]
    pub fn new(data_type: DataType, pool: &MemoryPoolRef) -> Self {
        Vector {
            data_type,
            class: VectorClass::Flat,
            len: 0,
            values: MutableBuffer::new(0),
            area: MutableBuffer::new(0),
            nulls: None,
            reservation: MemoryConsumer::new("Vector").register(pool),
        }
    }

    /// Creates an empty flat vector with room for `capacity` rows.
    pub fn with_capacity(data_type: DataType, capacity: usize, pool: &MemoryPoolRef) -> Result<Self> {
        let mut vec = Vector::new(data_type, pool);
        let bytes = capacity * data_type.slot_width();
        vec.reservation.try_grow(bytes)?;
        vec.values.reserve(bytes);
        Ok(vec)
    }

    /// Creates a flat vector of `len` rows that are all null.
    pub fn new_nulls(data_type: DataType, len: usize, pool: &MemoryPoolRef) -> Result<Self> {
        let mut vec = Vector::new(data_type, pool);
        vec.extend_nulls_to(len)?;
        Ok(vec)
    }

    /// Creates a constant null vector representing `len` rows.
    #[must_use]
    pub fn new_const_null(data_type: DataType, len: usize, pool: &MemoryPoolRef) -> Self {
        let mut nulls = BooleanBufferBuilder::new(1);
        nulls.append(false);
        Vector {
            class: VectorClass::Const,
            len,
            nulls: Some(nulls),
            ..Vector::new(data_type, pool)
        }
    }

    /// Creates a constant vector broadcasting `value` to `len` rows.
    pub fn new_const(
        value: &Value,
        data_type: DataType,
        len: usize,
        pool: &MemoryPoolRef,
    ) -> Result<Self> {
        if value.is_null() {
            return Ok(Vector::new_const_null(data_type, len, pool));
        }
        let mut vec = Vector::new(data_type, pool);
        vec.push_value(value)?;
        vec.class = VectorClass::Const;
        vec.len = len;
        Ok(vec)
    }

    /// Builds a flat vector from an Arrow array.
    pub fn from_array(array: &dyn Array, pool: &MemoryPoolRef) -> Result<Self> {
        let data_type = DataType::from_arrow(array.data_type()).ok_or_else(|| {
            Error::UnsupportedOperation(format!("Arrow type {} has no vector type", array.data_type()))
        })?;
        let mut vec = Vector::with_capacity(data_type, array.len(), pool)?;
        for row in 0..array.len() {
            vec.push_value(&scalar_at(array, row)?)?;
        }
        Ok(vec)
    }

    /// Returns the element type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the layout class.
    #[must_use]
    pub fn class(&self) -> VectorClass {
        self.class
    }

    /// Returns true for constant (broadcast) vectors.
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.class == VectorClass::Const
    }

    /// Returns true for a constant vector whose single value is null.
    #[must_use]
    pub fn is_const_null(&self) -> bool {
        self.is_const() && self.is_null(0)
    }

    /// Returns the logical row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if any row is null.
    #[must_use]
    pub fn has_nulls(&self) -> bool {
        self.nulls
            .as_ref()
            .is_some_and(|n| (0..n.len()).any(|i| !n.get_bit(i)))
    }

    /// Returns true if the given logical row is null.
    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        let pos = self.physical(row);
        self.nulls
            .as_ref()
            .is_some_and(|n| pos < n.len() && !n.get_bit(pos))
    }

    /// Sets the logical row count of a constant vector.
    pub fn set_const_len(&mut self, len: usize) -> Result<()> {
        if !self.is_const() {
            return Err(Error::InvalidVector(
                "cannot change the length of a flat vector without writing rows".into(),
            ));
        }
        self.len = len;
        Ok(())
    }

    /// Returns the number of bytes currently held in the buffers.
    #[must_use]
    pub fn size(&self) -> usize {
        self.values.len() + self.area.len() + self.nulls.as_ref().map_or(0, |n| n.len().div_ceil(8))
    }

    /// Returns the number of bytes reserved on the memory pool.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.reservation.size()
    }

    /// Reads one logical value.
    pub fn get_value(&self, row: usize) -> Result<Value> {
        if row >= self.len {
            return Err(Error::InvalidVector(format!(
                "row {row} out of range for vector of length {}",
                self.len
            )));
        }
        if self.is_null(row) {
            return Ok(Value::Null);
        }
        let pos = self.physical(row);
        let value = match self.data_type {
            DataType::Int64 => Value::Int64(i64::from_le_bytes(read_array(self.slot(pos)))),
            DataType::Timestamp => Value::Timestamp(i64::from_le_bytes(read_array(self.slot(pos)))),
            DataType::Float64 => Value::Float64(f64::from_le_bytes(read_array(self.slot(pos)))),
            DataType::Float32 => Value::Float32(f32::from_le_bytes(read_array(self.slot(pos)))),
            DataType::Date => Value::Date(i32::from_le_bytes(read_array(self.slot(pos)))),
            DataType::Bool => Value::Bool(self.slot(pos)[0] != 0),
            DataType::String => Value::String(self.varlen_str(pos)?.to_string()),
        };
        Ok(value)
    }

    /// Copies one value from `src` into row `dst_row` of this vector.
    ///
    /// Rows past the current length are created as nulls first, so the
    /// vector grows to at least `dst_row + 1` rows.
    pub fn copy(&mut self, src: &Vector, dst_row: usize, src_row: usize) -> Result<()> {
        self.ensure_writable()?;
        if src_row >= src.len() {
            return Err(Error::InvalidVector(format!(
                "source row {src_row} out of range for vector of length {}",
                src.len()
            )));
        }
        if dst_row >= self.len {
            self.extend_nulls_to(dst_row + 1)?;
        }
        if src.is_null(src_row) {
            self.set_null(dst_row);
            return Ok(());
        }
        if src.data_type != self.data_type {
            return Err(Error::TypeError {
                expected: self.data_type.name().into(),
                actual: src.data_type.name().into(),
            });
        }

        let pos = src.physical(src_row);
        if self.data_type.is_fixed_width() {
            self.write_fixed(dst_row, src.slot(pos));
        } else {
            let (offset, len) = src.varlen_span(pos);
            self.write_varlen(dst_row, &src.area.as_slice()[offset..offset + len])?;
        }
        self.set_valid(dst_row);
        Ok(())
    }

    /// Appends one value from `src` at the end of this vector.
    pub fn append_from(&mut self, src: &Vector, src_row: usize) -> Result<()> {
        let row = self.len;
        self.copy(src, row, src_row)
    }

    /// Appends a scalar value.
    pub fn push_value(&mut self, value: &Value) -> Result<()> {
        let row = self.len;
        self.set_value(row, value)
    }

    /// Writes a scalar value at `row`, growing the vector if needed.
    pub fn set_value(&mut self, row: usize, value: &Value) -> Result<()> {
        self.ensure_writable()?;
        if row >= self.len {
            self.extend_nulls_to(row + 1)?;
        }
        let bytes: Vec<u8> = match (self.data_type, value) {
            (_, Value::Null) => {
                self.set_null(row);
                return Ok(());
            }
            (DataType::Int64, Value::Int64(v)) | (DataType::Timestamp, Value::Timestamp(v)) => {
                v.to_le_bytes().to_vec()
            }
            (DataType::Float64, Value::Float64(v)) => v.to_le_bytes().to_vec(),
            (DataType::Float32, Value::Float32(v)) => v.to_le_bytes().to_vec(),
            (DataType::Date, Value::Date(v)) => v.to_le_bytes().to_vec(),
            (DataType::Bool, Value::Bool(v)) => vec![u8::from(*v)],
            (DataType::String, Value::String(s)) => {
                self.write_varlen(row, s.as_bytes())?;
                self.set_valid(row);
                return Ok(());
            }
            (expected, actual) => {
                return Err(Error::TypeError {
                    expected: expected.name().into(),
                    actual: actual.data_type().map_or("NULL", |t| t.name()).into(),
                })
            }
        };
        self.write_fixed(row, &bytes);
        self.set_valid(row);
        Ok(())
    }

    /// Logically empties the vector while keeping its type, buffers and
    /// null-bitmap shape. Pool reservations are kept for the refill.
    pub fn reset_storage(&mut self) {
        self.class = VectorClass::Flat;
        self.len = 0;
        self.values.clear();
        self.area.clear();
        if let Some(nulls) = self.nulls.as_mut() {
            nulls.truncate(0);
        }
    }

    /// Empties the vector and pre-sizes it to `len` null rows, ready for
    /// writes at arbitrary row positions.
    pub fn reset_nulls(&mut self, len: usize) -> Result<()> {
        self.reset_storage();
        self.extend_nulls_to(len)
    }

    /// Releases all buffers and returns the reservation to the pool.
    pub fn free(&mut self) {
        self.reset_storage();
        self.values = MutableBuffer::new(0);
        self.area = MutableBuffer::new(0);
        self.nulls = None;
        self.reservation.free();
    }

    /// Builds a flat vector with the rows at `indices`, in order.
    pub fn take(&self, indices: &[u32], pool: &MemoryPoolRef) -> Result<Vector> {
        let mut out = Vector::with_capacity(self.data_type, indices.len(), pool)?;
        for &idx in indices {
            out.append_from(self, idx as usize)?;
        }
        Ok(out)
    }

    /// Converts to an Arrow array of `len()` rows. Constants are expanded.
    pub fn to_array(&self) -> Result<ArrayRef> {
        let n = self.len;
        if self.is_const_null() {
            return Ok(new_null_array(&self.data_type.to_arrow(), n));
        }
        let fixed = |row: usize| (!self.is_null(row)).then(|| self.slot(self.physical(row)));
        let array: ArrayRef = match self.data_type {
            DataType::Int64 => Arc::new(
                (0..n)
                    .map(|r| fixed(r).map(|b| i64::from_le_bytes(read_array(b))))
                    .collect::<Int64Array>(),
            ),
            DataType::Timestamp => Arc::new(
                (0..n)
                    .map(|r| fixed(r).map(|b| i64::from_le_bytes(read_array(b))))
                    .collect::<TimestampMicrosecondArray>(),
            ),
            DataType::Float64 => Arc::new(
                (0..n)
                    .map(|r| fixed(r).map(|b| f64::from_le_bytes(read_array(b))))
                    .collect::<Float64Array>(),
            ),
            DataType::Float32 => Arc::new(
                (0..n)
                    .map(|r| fixed(r).map(|b| f32::from_le_bytes(read_array(b))))
                    .collect::<Float32Array>(),
            ),
            DataType::Date => Arc::new(
                (0..n)
                    .map(|r| fixed(r).map(|b| i32::from_le_bytes(read_array(b))))
                    .collect::<Date32Array>(),
            ),
            DataType::Bool => Arc::new(
                (0..n)
                    .map(|r| fixed(r).map(|b| b[0] != 0))
                    .collect::<BooleanArray>(),
            ),
            DataType::String => {
                let strings = (0..n)
                    .map(|r| {
                        if self.is_null(r) {
                            Ok(None)
                        } else {
                            self.varlen_str(self.physical(r)).map(Some)
                        }
                    })
                    .collect::<Result<Vec<Option<&str>>>>()?;
                Arc::new(StringArray::from(strings))
            }
        };
        Ok(array)
    }

    fn physical(&self, row: usize) -> usize {
        match self.class {
            VectorClass::Flat => row,
            VectorClass::Const => 0,
        }
    }

    fn physical_len(&self) -> usize {
        match self.class {
            VectorClass::Flat => self.len,
            VectorClass::Const => 1,
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_const() {
            return Err(Error::InvalidVector("cannot write into a constant vector".into()));
        }
        Ok(())
    }

    /// Reserves pool memory for `rows` slots plus `area_len` bytes of area.
    fn reserve(&mut self, rows: usize, area_len: usize) -> Result<()> {
        let needed = rows * self.data_type.slot_width() + area_len + rows.div_ceil(8);
        if needed > self.reservation.size() {
            self.reservation.try_resize(needed)?;
        }
        Ok(())
    }

    fn extend_nulls_to(&mut self, new_len: usize) -> Result<()> {
        if new_len <= self.len {
            return Ok(());
        }
        self.reserve(new_len, self.area.len())?;
        let current = self.physical_len();
        self.values.resize(new_len * self.data_type.slot_width(), 0);
        let nulls = self.nulls.get_or_insert_with(|| {
            let mut builder = BooleanBufferBuilder::new(new_len);
            builder.append_n(current, true);
            builder
        });
        nulls.append_n(new_len - nulls.len(), false);
        self.len = new_len;
        Ok(())
    }

    fn set_null(&mut self, row: usize) {
        let len = self.physical_len();
        let nulls = self.nulls.get_or_insert_with(|| {
            let mut builder = BooleanBufferBuilder::new(len);
            builder.append_n(len, true);
            builder
        });
        nulls.set_bit(row, false);
    }

    fn set_valid(&mut self, row: usize) {
        if let Some(nulls) = self.nulls.as_mut() {
            nulls.set_bit(row, true);
        }
    }

    fn slot(&self, pos: usize) -> &[u8] {
        let width = self.data_type.slot_width();
        &self.values.as_slice()[pos * width..(pos + 1) * width]
    }

    fn write_fixed(&mut self, row: usize, bytes: &[u8]) {
        let width = self.data_type.slot_width();
        self.values.as_slice_mut()[row * width..(row + 1) * width].copy_from_slice(bytes);
    }

    fn varlen_span(&self, pos: usize) -> (usize, usize) {
        let slot = self.slot(pos);
        let offset = u32::from_le_bytes(read_array(&slot[..4])) as usize;
        let len = u32::from_le_bytes(read_array(&slot[4..8])) as usize;
        (offset, len)
    }

    fn varlen_str(&self, pos: usize) -> Result<&str> {
        let (offset, len) = self.varlen_span(pos);
        std::str::from_utf8(&self.area.as_slice()[offset..offset + len])
            .map_err(|e| Error::InvalidVector(format!("invalid utf-8 in string vector: {e}")))
    }

    fn write_varlen(&mut self, row: usize, bytes: &[u8]) -> Result<()> {
        let offset = self.area.len();
        let end = offset + bytes.len();
        let (Ok(offset32), Ok(len32)) = (u32::try_from(offset), u32::try_from(bytes.len())) else {
            return Err(Error::AllocationError(format!(
                "variable-length area exceeds {} bytes",
                u32::MAX
            )));
        };
        if u32::try_from(end).is_err() {
            return Err(Error::AllocationError(format!(
                "variable-length area exceeds {} bytes",
                u32::MAX
            )));
        }
        self.reserve(self.physical_len(), end)?;
        self.area.extend_from_slice(bytes);
        let mut slot = [0u8; 8];
        slot[..4].copy_from_slice(&offset32.to_le_bytes());
        slot[4..].copy_from_slice(&len32.to_le_bytes());
        self.write_fixed(row, &slot);
        Ok(())
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("data_type", &self.data_type)
            .field("class", &self.class)
            .field("len", &self.len)
            .field("size", &self.size())
            .field("allocated", &self.allocated())
            .finish()
    }
}

/// Reads the scalar at `row` of an Arrow array.
pub(crate) fn scalar_at(array: &dyn Array, row: usize) -> Result<Value> {
    // NullArray carries no validity buffer, so `is_null` reports false.
    if array.data_type() == &arrow::datatypes::DataType::Null || array.is_null(row) {
        return Ok(Value::Null);
    }
    let mismatch = || Error::TypeError {
        expected: "supported Arrow array".into(),
        actual: array.data_type().to_string(),
    };
    let value = match array.data_type() {
        arrow::datatypes::DataType::Int64 => {
            Value::Int64(array.as_primitive_opt::<Int64Type>().ok_or_else(mismatch)?.value(row))
        }
        arrow::datatypes::DataType::Float32 => Value::Float32(
            array.as_primitive_opt::<Float32Type>().ok_or_else(mismatch)?.value(row),
        ),
        arrow::datatypes::DataType::Float64 => Value::Float64(
            array.as_primitive_opt::<Float64Type>().ok_or_else(mismatch)?.value(row),
        ),
        arrow::datatypes::DataType::Date32 => {
            Value::Date(array.as_primitive_opt::<Date32Type>().ok_or_else(mismatch)?.value(row))
        }
        arrow::datatypes::DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, _) => {
            Value::Timestamp(
                array
                    .as_primitive_opt::<TimestampMicrosecondType>()
                    .ok_or_else(mismatch)?
                    .value(row),
            )
        }
        arrow::datatypes::DataType::Boolean => {
            Value::Bool(array.as_boolean_opt().ok_or_else(mismatch)?.value(row))
        }
        arrow::datatypes::DataType::Utf8 => Value::String(
            array.as_string_opt::<i32>().ok_or_else(mismatch)?.value(row).to_string(),
        ),
        _ => return Err(mismatch()),
    };
    Ok(value)
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::execution::memory_pool::{GreedyMemoryPool, UnboundedMemoryPool};

    fn pool() -> MemoryPoolRef {
        Arc::new(UnboundedMemoryPool::default())
    }

    #[test]
    fn test_positional_copy_out_of_order() {
        let pool = pool();
        let mut dst = Vector::new_nulls(DataType::Int64, 3, &pool).unwrap();
        let one = Vector::new_const(&Value::Int64(7), DataType::Int64, 1, &pool).unwrap();

        dst.copy(&one, 2, 0).unwrap();
        assert_eq!(dst.get_value(2).unwrap(), Value::Int64(7));
        assert!(dst.is_null(0));
        assert!(dst.is_null(1));
        assert_eq!(dst.len(), 3);
    }

    #[test]
    fn test_copy_grows_past_length() {
        let pool = pool();
        let mut dst = Vector::new(DataType::String, &pool);
        let src = Vector::new_const(&Value::from("abc"), DataType::String, 1, &pool).unwrap();

        dst.copy(&src, 4, 0).unwrap();
        assert_eq!(dst.len(), 5);
        assert!(dst.is_null(3));
        assert_eq!(dst.get_value(4).unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_copy_type_mismatch() {
        let pool = pool();
        let mut dst = Vector::new_nulls(DataType::Int64, 1, &pool).unwrap();
        let src = Vector::new_const(&Value::from("x"), DataType::String, 1, &pool).unwrap();

        let err = dst.copy(&src, 0, 0).unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn test_copy_null_of_other_type_is_allowed() {
        let pool = pool();
        let mut dst = Vector::new(DataType::String, &pool);
        dst.push_value(&Value::from("keep")).unwrap();
        let null = Vector::new_const_null(DataType::Int64, 1, &pool);

        dst.copy(&null, 0, 0).unwrap();
        assert_eq!(dst.get_value(0).unwrap(), Value::Null);
    }

    #[test]
    fn test_copy_into_const_is_rejected() {
        let pool = pool();
        let mut dst = Vector::new_const_null(DataType::Int64, 1, &pool);
        let src = Vector::new_const(&Value::Int64(1), DataType::Int64, 1, &pool).unwrap();
        assert!(matches!(dst.copy(&src, 0, 0), Err(Error::InvalidVector(_))));
    }

    #[test]
    fn test_reset_storage_keeps_type_and_reservation() {
        let pool = pool();
        let mut vec = Vector::new(DataType::String, &pool);
        vec.push_value(&Value::from("hello")).unwrap();
        vec.push_value(&Value::Null).unwrap();
        let reserved = vec.allocated();

        vec.reset_storage();
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.data_type(), DataType::String);
        assert_eq!(vec.allocated(), reserved);

        vec.push_value(&Value::from("again")).unwrap();
        assert_eq!(vec.get_value(0).unwrap(), Value::from("again"));
        assert!(!vec.has_nulls());
    }

    #[test]
    fn test_reset_nulls_presizes() {
        let pool = pool();
        let mut vec = Vector::new(DataType::Int64, &pool);
        vec.push_value(&Value::Int64(1)).unwrap();
        vec.reset_nulls(3).unwrap();
        assert_eq!(vec.len(), 3);
        assert!((0..3).all(|r| vec.is_null(r)));
    }

    #[test]
    fn test_scalar_at_null_array() {
        let array = new_null_array(&arrow::datatypes::DataType::Null, 1);
        assert_eq!(scalar_at(array.as_ref(), 0).unwrap(), Value::Null);
    }

    #[test]
    fn test_growth_is_accounted_and_released() {
        let pool = pool();
        {
            let mut vec = Vector::new(DataType::Int64, &pool);
            for i in 0..100 {
                vec.push_value(&Value::Int64(i)).unwrap();
            }
            assert!(pool.reserved() >= 800);
        }
        assert_eq!(pool.reserved(), 0);
    }

    #[test]
    fn test_pool_exhaustion_fails_growth() {
        let pool: MemoryPoolRef = Arc::new(GreedyMemoryPool::new(64));
        let mut vec = Vector::new(DataType::Int64, &pool);
        let mut result = Ok(());
        for i in 0..100 {
            result = vec.push_value(&Value::Int64(i));
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Error::AllocationError(_))));
    }

    #[test]
    fn test_const_vector_broadcasts() {
        let pool = pool();
        let vec = Vector::new_const(&Value::Float64(1.5), DataType::Float64, 4, &pool).unwrap();
        assert!(vec.is_const());
        assert_eq!(vec.len(), 4);
        assert_eq!(vec.get_value(3).unwrap(), Value::Float64(1.5));

        let array = vec.to_array().unwrap();
        assert_eq!(array.len(), 4);
    }

    #[test]
    fn test_const_null_to_array() {
        let pool = pool();
        let vec = Vector::new_const_null(DataType::Int64, 1, &pool);
        let array = vec.to_array().unwrap();
        assert_eq!(array.len(), 1);
        assert!(array.is_null(0));
        assert_eq!(array.data_type(), &arrow::datatypes::DataType::Int64);
    }

    #[test]
    fn test_from_array_and_back() {
        let pool = pool();
        let array: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), None, Some("ccc")]));
        let vec = Vector::from_array(array.as_ref(), &pool).unwrap();
        assert_eq!(vec.len(), 3);
        assert!(vec.is_null(1));

        let back = vec.to_array().unwrap();
        assert_eq!(back.as_string::<i32>().value(2), "ccc");
        assert!(back.is_null(1));
    }

    #[test]
    fn test_take_selects_rows() {
        let pool = pool();
        let mut vec = Vector::new(DataType::Bool, &pool);
        for b in [true, false, true] {
            vec.push_value(&Value::Bool(b)).unwrap();
        }
        let taken = vec.take(&[2, 1], &pool).unwrap();
        assert_eq!(taken.get_value(0).unwrap(), Value::Bool(true));
        assert_eq!(taken.get_value(1).unwrap(), Value::Bool(false));
    }
}
