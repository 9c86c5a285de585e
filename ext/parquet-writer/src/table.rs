//! Caller-owned columnar tables
//!
//! A [`Table`] is a set of named, typed columns of equal length. The writer
//! only ever borrows it, so one table can be shared read-only by all column
//! encoders of a row group.

use crate::schema::{ColumnType, Field, Schema, SchemaBuilder, TimeUnit};
use crate::{ParquetError, Result, Value};
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// Typed value storage of a column
///
/// Null slots still hold a value (usually the type's default); the
/// column's validity bitmap decides whether it is read.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Boolean(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<String>),
    Timestamp(TimeUnit, Vec<i64>),
    Duration(TimeUnit, Vec<i64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::UInt8(v) => v.len(),
            ColumnData::UInt16(v) => v.len(),
            ColumnData::UInt32(v) => v.len(),
            ColumnData::UInt64(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
            ColumnData::Timestamp(_, v) => v.len(),
            ColumnData::Duration(_, v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Boolean(_) => ColumnType::Boolean,
            ColumnData::Int8(_) => ColumnType::Int8,
            ColumnData::Int16(_) => ColumnType::Int16,
            ColumnData::Int32(_) => ColumnType::Int32,
            ColumnData::Int64(_) => ColumnType::Int64,
            ColumnData::UInt8(_) => ColumnType::UInt8,
            ColumnData::UInt16(_) => ColumnType::UInt16,
            ColumnData::UInt32(_) => ColumnType::UInt32,
            ColumnData::UInt64(_) => ColumnType::UInt64,
            ColumnData::Float32(_) => ColumnType::Float32,
            ColumnData::Float64(_) => ColumnType::Float64,
            ColumnData::String(_) => ColumnType::String,
            ColumnData::Timestamp(unit, _) => ColumnType::Timestamp(*unit),
            ColumnData::Duration(unit, _) => ColumnType::Duration(*unit),
        }
    }

    /// Empty storage for the given type
    pub fn empty(column_type: ColumnType) -> Self {
        Self::with_capacity(column_type, 0)
    }

    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            ColumnType::Int8 => ColumnData::Int8(Vec::with_capacity(capacity)),
            ColumnType::Int16 => ColumnData::Int16(Vec::with_capacity(capacity)),
            ColumnType::Int32 => ColumnData::Int32(Vec::with_capacity(capacity)),
            ColumnType::Int64 => ColumnData::Int64(Vec::with_capacity(capacity)),
            ColumnType::UInt8 => ColumnData::UInt8(Vec::with_capacity(capacity)),
            ColumnType::UInt16 => ColumnData::UInt16(Vec::with_capacity(capacity)),
            ColumnType::UInt32 => ColumnData::UInt32(Vec::with_capacity(capacity)),
            ColumnType::UInt64 => ColumnData::UInt64(Vec::with_capacity(capacity)),
            ColumnType::Float32 => ColumnData::Float32(Vec::with_capacity(capacity)),
            ColumnType::Float64 => ColumnData::Float64(Vec::with_capacity(capacity)),
            ColumnType::String => ColumnData::String(Vec::with_capacity(capacity)),
            ColumnType::Timestamp(unit) => {
                ColumnData::Timestamp(unit, Vec::with_capacity(capacity))
            }
            ColumnType::Duration(unit) => ColumnData::Duration(unit, Vec::with_capacity(capacity)),
        }
    }

    /// Value at `index` as a cell, ignoring validity
    pub fn value(&self, index: usize) -> Value {
        match self {
            ColumnData::Boolean(v) => Value::Boolean(v[index]),
            ColumnData::Int8(v) => Value::Int8(v[index]),
            ColumnData::Int16(v) => Value::Int16(v[index]),
            ColumnData::Int32(v) => Value::Int32(v[index]),
            ColumnData::Int64(v) => Value::Int64(v[index]),
            ColumnData::UInt8(v) => Value::UInt8(v[index]),
            ColumnData::UInt16(v) => Value::UInt16(v[index]),
            ColumnData::UInt32(v) => Value::UInt32(v[index]),
            ColumnData::UInt64(v) => Value::UInt64(v[index]),
            ColumnData::Float32(v) => Value::Float32(OrderedFloat(v[index])),
            ColumnData::Float64(v) => Value::Float64(OrderedFloat(v[index])),
            ColumnData::String(v) => Value::String(Arc::from(v[index].as_str())),
            ColumnData::Timestamp(unit, v) => Value::Timestamp(v[index], *unit),
            ColumnData::Duration(unit, v) => Value::Duration(v[index], *unit),
        }
    }

    /// Append a cell; `Null` appends the type's default as a placeholder
    fn push(&mut self, value: &Value) -> Result<()> {
        match (self, value) {
            (ColumnData::Boolean(v), Value::Boolean(x)) => v.push(*x),
            (ColumnData::Int8(v), Value::Int8(x)) => v.push(*x),
            (ColumnData::Int16(v), Value::Int16(x)) => v.push(*x),
            (ColumnData::Int32(v), Value::Int32(x)) => v.push(*x),
            (ColumnData::Int64(v), Value::Int64(x)) => v.push(*x),
            (ColumnData::UInt8(v), Value::UInt8(x)) => v.push(*x),
            (ColumnData::UInt16(v), Value::UInt16(x)) => v.push(*x),
            (ColumnData::UInt32(v), Value::UInt32(x)) => v.push(*x),
            (ColumnData::UInt64(v), Value::UInt64(x)) => v.push(*x),
            (ColumnData::Float32(v), Value::Float32(x)) => v.push(x.0),
            (ColumnData::Float64(v), Value::Float64(x)) => v.push(x.0),
            (ColumnData::String(v), Value::String(x)) => v.push(x.to_string()),
            (ColumnData::Timestamp(unit, v), Value::Timestamp(x, u)) if *unit == *u => v.push(*x),
            (ColumnData::Duration(unit, v), Value::Duration(x, u)) if *unit == *u => v.push(*x),
            (data, Value::Null) => data.push_default(),
            (data, value) => {
                return Err(ParquetError::schema(format!(
                    "Type mismatch: expected {}, got {}",
                    data.column_type(),
                    value.type_name()
                )))
            }
        }
        Ok(())
    }

    fn push_default(&mut self) {
        match self {
            ColumnData::Boolean(v) => v.push(false),
            ColumnData::Int8(v) => v.push(0),
            ColumnData::Int16(v) => v.push(0),
            ColumnData::Int32(v) => v.push(0),
            ColumnData::Int64(v) => v.push(0),
            ColumnData::UInt8(v) => v.push(0),
            ColumnData::UInt16(v) => v.push(0),
            ColumnData::UInt32(v) => v.push(0),
            ColumnData::UInt64(v) => v.push(0),
            ColumnData::Float32(v) => v.push(0.0),
            ColumnData::Float64(v) => v.push(0.0),
            ColumnData::String(v) => v.push(String::new()),
            ColumnData::Timestamp(_, v) => v.push(0),
            ColumnData::Duration(_, v) => v.push(0),
        }
    }
}

/// A named column with optional nulls
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    validity: Option<Vec<bool>>,
    nullable: bool,
}

impl Column {
    /// A column without nulls, written as REQUIRED
    pub fn new<S: Into<String>>(name: S, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
            validity: None,
            nullable: false,
        }
    }

    /// A column declared OPTIONAL that currently holds no nulls
    pub fn nullable<S: Into<String>>(name: S, data: ColumnData) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, data)
        }
    }

    /// A nullable column; `validity[i] == false` marks row `i` as null
    pub fn with_validity<S: Into<String>>(
        name: S,
        data: ColumnData,
        validity: Vec<bool>,
    ) -> Result<Self> {
        let name = name.into();
        if validity.len() != data.len() {
            return Err(ParquetError::schema(format!(
                "Column '{}' has {} values but a validity bitmap of {} entries",
                name,
                data.len(),
                validity.len()
            )));
        }
        Ok(Self {
            name,
            data,
            validity: Some(validity),
            nullable: true,
        })
    }

    /// Build a column from cells; any `Null` makes the column nullable
    pub fn from_values<S: Into<String>>(
        name: S,
        column_type: ColumnType,
        values: &[Value],
    ) -> Result<Self> {
        let name = name.into();
        let mut data = ColumnData::with_capacity(column_type, values.len());
        let mut validity = Vec::with_capacity(values.len());
        for (idx, value) in values.iter().enumerate() {
            data.push(value).map_err(|e| {
                ParquetError::schema(format!("column '{}' row {}: {}", name, idx, e))
            })?;
            validity.push(!value.is_null());
        }

        if validity.iter().all(|v| *v) {
            Ok(Self::new(name, data))
        } else {
            Self::with_validity(name, data, validity)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn validity(&self) -> Option<&[bool]> {
        self.validity.as_deref()
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v[index])
    }

    pub fn null_count(&self) -> usize {
        self.validity
            .as_ref()
            .map_or(0, |v| v.iter().filter(|valid| !**valid).count())
    }

    /// Cell at `index`, `Value::Null` for null rows
    pub fn value(&self, index: usize) -> Value {
        if self.is_valid(index) {
            self.data.value(index)
        } else {
            Value::Null
        }
    }

    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }

    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.column_type(), self.nullable)
    }
}

/// An ordered set of equal-length columns
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
    schema: Schema,
}

impl Table {
    pub fn try_new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, Column::len);
        if let Some(column) = columns.iter().find(|c| c.len() != num_rows) {
            return Err(ParquetError::schema(format!(
                "Column '{}' has {} rows but column '{}' has {}",
                column.name(),
                column.len(),
                columns[0].name(),
                num_rows
            )));
        }

        // also rejects duplicate and empty column names
        let schema = columns
            .iter()
            .fold(SchemaBuilder::new(), |builder, column| {
                builder.with_field(column.field())
            })
            .build()?;

        Ok(Self {
            columns,
            num_rows,
            schema,
        })
    }

    /// Transpose rows of cells into a table with the given schema
    pub fn from_rows(schema: &Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        let num_cols = schema.len();
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); num_cols];

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != num_cols {
                return Err(ParquetError::schema(format!(
                    "Row {} has {} values but schema has {} fields",
                    row_idx,
                    row.len(),
                    num_cols
                )));
            }
            for (col_idx, value) in row.into_iter().enumerate() {
                columns[col_idx].push(value);
            }
        }

        let columns = schema
            .fields()
            .iter()
            .zip(columns)
            .map(|(field, values)| {
                let column = Column::from_values(field.name.clone(), field.column_type, &values)?;
                if column.is_nullable() && !field.nullable {
                    return Err(ParquetError::schema(format!(
                        "Found null value for non-nullable field '{}'",
                        field.name
                    )));
                }
                Ok(Column {
                    nullable: field.nullable,
                    ..column
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::try_new(columns)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Schema derived from the columns' names, types and nullability
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
