use crate::format::PhysicalType;
use crate::{ParquetError, Result};
use parquet::format::{
    ConvertedType, DateType, FieldRepetitionType, IntType, LogicalType, MicroSeconds,
    MilliSeconds, NanoSeconds, SchemaElement, StringType, TimeUnit as FormatTimeUnit,
    TimestampType,
};
use std::fmt;

/// Resolution of timestamp and duration columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Days,
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Short suffix used in type names, e.g. `timestamp[ms]`
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Days => "D",
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

/// Declared element type of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,

    // Integer types
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,

    // Floating point types
    Float32,
    Float64,

    String,

    // Time types
    Timestamp(TimeUnit),
    /// Elapsed time; representable in a table but has no Parquet encoding
    Duration(TimeUnit),
}

/// Represents how values are repeated in Parquet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Field must have exactly one value
    Required,
    /// Field can have 0 or 1 value
    Optional,
}

impl From<Repetition> for FieldRepetitionType {
    fn from(value: Repetition) -> Self {
        match value {
            Repetition::Required => FieldRepetitionType::REQUIRED,
            Repetition::Optional => FieldRepetitionType::OPTIONAL,
        }
    }
}

impl ColumnType {
    /// Get the type name for display
    pub fn type_name(&self) -> String {
        match self {
            ColumnType::Boolean => "bool".to_string(),
            ColumnType::Int8 => "int8".to_string(),
            ColumnType::Int16 => "int16".to_string(),
            ColumnType::Int32 => "int32".to_string(),
            ColumnType::Int64 => "int64".to_string(),
            ColumnType::UInt8 => "uint8".to_string(),
            ColumnType::UInt16 => "uint16".to_string(),
            ColumnType::UInt32 => "uint32".to_string(),
            ColumnType::UInt64 => "uint64".to_string(),
            ColumnType::Float32 => "float32".to_string(),
            ColumnType::Float64 => "float64".to_string(),
            ColumnType::String => "string".to_string(),
            ColumnType::Timestamp(unit) => format!("timestamp[{}]", unit.suffix()),
            ColumnType::Duration(unit) => format!("duration[{}]", unit.suffix()),
        }
    }

    /// In-memory width of one value, `None` for variable width types
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ColumnType::Boolean | ColumnType::Int8 | ColumnType::UInt8 => Some(1),
            ColumnType::Int16 | ColumnType::UInt16 => Some(2),
            ColumnType::Int32 | ColumnType::UInt32 | ColumnType::Float32 => Some(4),
            ColumnType::Int64 | ColumnType::UInt64 | ColumnType::Float64 => Some(8),
            ColumnType::Timestamp(TimeUnit::Days) => Some(4),
            ColumnType::Timestamp(_) | ColumnType::Duration(_) => Some(8),
            ColumnType::String => None,
        }
    }

    /// Whether the writer has an encoder for this type
    pub fn is_supported(&self) -> bool {
        !matches!(self, ColumnType::Duration(_))
    }

    /// Parquet physical type used to store values of this type
    pub fn physical_type(&self) -> Result<PhysicalType> {
        Ok(match self {
            ColumnType::Boolean => PhysicalType::Boolean,
            ColumnType::Int8
            | ColumnType::Int16
            | ColumnType::Int32
            | ColumnType::UInt8
            | ColumnType::UInt16
            | ColumnType::UInt32
            | ColumnType::Timestamp(TimeUnit::Days) => PhysicalType::Int32,
            ColumnType::Int64 | ColumnType::UInt64 | ColumnType::Timestamp(_) => {
                PhysicalType::Int64
            }
            ColumnType::Float32 => PhysicalType::Float,
            ColumnType::Float64 => PhysicalType::Double,
            ColumnType::String => PhysicalType::ByteArray,
            ColumnType::Duration(_) => {
                return Err(ParquetError::unsupported_type(format!(
                    "no Parquet encoder for {}",
                    self.type_name()
                )))
            }
        })
    }

    /// Logical type annotation, if any
    pub fn logical_type(&self) -> Option<LogicalType> {
        let integer = |bit_width, is_signed| {
            Some(LogicalType::INTEGER(IntType::new(bit_width, is_signed)))
        };
        let timestamp = |unit| Some(LogicalType::TIMESTAMP(TimestampType::new(true, unit)));

        match self {
            ColumnType::Int8 => integer(8, true),
            ColumnType::Int16 => integer(16, true),
            ColumnType::Int32 => integer(32, true),
            ColumnType::Int64 => integer(64, true),
            ColumnType::UInt8 => integer(8, false),
            ColumnType::UInt16 => integer(16, false),
            ColumnType::UInt32 => integer(32, false),
            ColumnType::UInt64 => integer(64, false),
            ColumnType::String => Some(LogicalType::STRING(StringType::new())),
            ColumnType::Timestamp(TimeUnit::Days) => Some(LogicalType::DATE(DateType::new())),
            // Parquet has no seconds unit; seconds are stored scaled to millis
            ColumnType::Timestamp(TimeUnit::Seconds | TimeUnit::Milliseconds) => {
                timestamp(FormatTimeUnit::MILLIS(MilliSeconds::new()))
            }
            ColumnType::Timestamp(TimeUnit::Microseconds) => {
                timestamp(FormatTimeUnit::MICROS(MicroSeconds::new()))
            }
            ColumnType::Timestamp(TimeUnit::Nanoseconds) => {
                timestamp(FormatTimeUnit::NANOS(NanoSeconds::new()))
            }
            ColumnType::Boolean
            | ColumnType::Float32
            | ColumnType::Float64
            | ColumnType::Duration(_) => None,
        }
    }

    /// Legacy converted type annotation, if one exists
    pub fn converted_type(&self) -> Option<ConvertedType> {
        match self {
            ColumnType::Int8 => Some(ConvertedType::INT_8),
            ColumnType::Int16 => Some(ConvertedType::INT_16),
            ColumnType::Int32 => Some(ConvertedType::INT_32),
            ColumnType::Int64 => Some(ConvertedType::INT_64),
            ColumnType::UInt8 => Some(ConvertedType::UINT_8),
            ColumnType::UInt16 => Some(ConvertedType::UINT_16),
            ColumnType::UInt32 => Some(ConvertedType::UINT_32),
            ColumnType::UInt64 => Some(ConvertedType::UINT_64),
            ColumnType::String => Some(ConvertedType::UTF8),
            ColumnType::Timestamp(TimeUnit::Days) => Some(ConvertedType::DATE),
            ColumnType::Timestamp(TimeUnit::Seconds | TimeUnit::Milliseconds) => {
                Some(ConvertedType::TIMESTAMP_MILLIS)
            }
            ColumnType::Timestamp(TimeUnit::Microseconds) => Some(ConvertedType::TIMESTAMP_MICROS),
            // TIMESTAMP_NANOS only exists as a logical type
            ColumnType::Timestamp(TimeUnit::Nanoseconds) => None,
            ColumnType::Boolean
            | ColumnType::Float32
            | ColumnType::Float64
            | ColumnType::Duration(_) => None,
        }
    }

    /// Whether min/max statistics compare as unsigned integers
    pub(crate) fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ColumnType::UInt8 | ColumnType::UInt16 | ColumnType::UInt32 | ColumnType::UInt64
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// A named, typed column declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }

    /// Get the repetition level based on nullability
    pub fn repetition(&self) -> Repetition {
        if self.nullable {
            Repetition::Optional
        } else {
            Repetition::Required
        }
    }

    fn to_schema_element(&self) -> Result<SchemaElement> {
        Ok(SchemaElement {
            type_: Some(self.column_type.physical_type()?.into()),
            type_length: None,
            repetition_type: Some(self.repetition().into()),
            name: self.name.clone(),
            num_children: None,
            converted_type: self.column_type.converted_type(),
            scale: None,
            precision: None,
            field_id: None,
            logical_type: self.column_type.logical_type(),
        })
    }
}

/// Flat schema of a table: an ordered list of leaf columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the column with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Fail with `UnsupportedType` on the first column without an encoder
    pub fn check_supported(&self) -> Result<()> {
        for field in &self.fields {
            if !field.column_type.is_supported() {
                return Err(ParquetError::unsupported_type(format!(
                    "column '{}' has type {} which has no Parquet encoder",
                    field.name, field.column_type
                )));
            }
        }
        Ok(())
    }

    /// Flattened Thrift schema: a root group followed by one element per column
    pub(crate) fn to_schema_elements(&self) -> Result<Vec<SchemaElement>> {
        let mut elements = Vec::with_capacity(self.fields.len() + 1);
        elements.push(SchemaElement {
            type_: None,
            type_length: None,
            repetition_type: None,
            name: "schema".to_string(),
            num_children: Some(self.fields.len() as i32),
            converted_type: None,
            scale: None,
            precision: None,
            field_id: None,
            logical_type: None,
        });
        for field in &self.fields {
            elements.push(field.to_schema_element()?);
        }
        Ok(elements)
    }
}

/// Builder for creating schemas
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_column<S: Into<String>>(
        self,
        name: S,
        column_type: ColumnType,
        nullable: bool,
    ) -> Self {
        self.with_field(Field::new(name, column_type, nullable))
    }

    pub fn build(self) -> Result<Schema> {
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(ParquetError::schema(format!(
                    "column {} has an empty name",
                    idx
                )));
            }
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(ParquetError::schema(format!(
                    "duplicate column name '{}'",
                    field.name
                )));
            }
        }
        Ok(Schema {
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = SchemaBuilder::new()
            .with_column("id", ColumnType::Int64, false)
            .with_column("name", ColumnType::String, true)
            .build()
            .unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.field(0).unwrap().repetition(), Repetition::Required);
        assert_eq!(schema.field(1).unwrap().repetition(), Repetition::Optional);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = SchemaBuilder::new()
            .with_column("a", ColumnType::Int32, false)
            .with_column("a", ColumnType::Int64, false)
            .build()
            .unwrap_err();
        assert!(matches!(err, ParquetError::Schema(_)));
    }

    #[test]
    fn test_timestamp_mappings() {
        let days = ColumnType::Timestamp(TimeUnit::Days);
        assert_eq!(days.physical_type().unwrap(), PhysicalType::Int32);
        assert_eq!(days.logical_type(), Some(LogicalType::DATE(DateType::new())));

        let seconds = ColumnType::Timestamp(TimeUnit::Seconds);
        assert_eq!(seconds.physical_type().unwrap(), PhysicalType::Int64);
        assert_eq!(seconds.converted_type(), Some(ConvertedType::TIMESTAMP_MILLIS));

        let nanos = ColumnType::Timestamp(TimeUnit::Nanoseconds);
        assert_eq!(nanos.converted_type(), None);
        assert_eq!(
            nanos.logical_type(),
            Some(LogicalType::TIMESTAMP(TimestampType::new(
                true,
                FormatTimeUnit::NANOS(NanoSeconds::new())
            )))
        );
        assert_eq!(nanos.to_string(), "timestamp[ns]");
    }

    #[test]
    fn test_duration_is_unsupported() {
        let duration = ColumnType::Duration(TimeUnit::Seconds);
        assert!(!duration.is_supported());
        assert!(matches!(
            duration.physical_type(),
            Err(ParquetError::UnsupportedType(_))
        ));

        let schema = SchemaBuilder::new()
            .with_column("elapsed", duration, false)
            .build()
            .unwrap();
        assert!(matches!(
            schema.check_supported(),
            Err(ParquetError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_schema_elements() {
        let schema = SchemaBuilder::new()
            .with_column("flag", ColumnType::Boolean, false)
            .with_column("small", ColumnType::UInt8, true)
            .build()
            .unwrap();

        let elements = schema.to_schema_elements().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].num_children, Some(2));
        assert_eq!(elements[0].physical_type, None);
        assert_eq!(elements[2].repetition, Some(Repetition::Optional));
        assert_eq!(elements[2].converted_type, Some(ConvertedType::UINT_8));
    }
}
