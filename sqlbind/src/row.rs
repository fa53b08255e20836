///
/// Whole-row reads: shape resolution and the `FromRow` dispatch.
///
/// A `RowShape` is the per-statement mapping from a target type's
/// fields to column indices. Record targets resolve it by matching
/// field names against the statement's column names (case-sensitive,
/// exact); tuple targets map fields to columns by declaration order;
/// scalar targets read column 0. The cursor resolves a shape once per
/// statement and reuses it for every row, so column names are scanned
/// once, not per row.
///

use crate::column::FromColumn;
use crate::error::{Error, ErrorCode, Result};
use crate::statement::{ColumnType, Statement};
use crate::value::{OwnedValue, Value};

/// One result row, borrowed from the statement that produced it.
/// Text/blob reads through a `Row` alias the statement's buffers and
/// are invalidated by the next step, reset, or finalize.
pub struct Row<'a> {
    stmt: &'a Statement<'a>,
}

impl<'a> Row<'a> {
    pub(crate) fn new(stmt: &'a Statement<'a>) -> Self {
        Row { stmt }
    }

    /// The statement this row belongs to, for user `FromColumn` and
    /// `FromRow` implementations that need the raw column primitives.
    pub fn stmt(&self) -> &'a Statement<'a> {
        self.stmt
    }

    pub fn column_count(&self) -> usize {
        self.stmt.column_count()
    }

    /// Dynamic read of one column, as whatever storage class the
    /// engine reports for it.
    pub fn value(&self, index: usize) -> Result<Value<'a>> {
        Ok(match self.stmt.column_type(index) {
            ColumnType::Integer => Value::Integer(self.stmt.column_i64(index)),
            ColumnType::Float => Value::Float(self.stmt.column_f64(index)),
            ColumnType::Text => Value::Text(self.stmt.column_text(index)?),
            ColumnType::Blob => Value::Blob(self.stmt.column_blob(index)),
            ColumnType::Null => Value::Null,
        })
    }

    /// Typed read of one column.
    pub fn get<T: FromColumn<'a>>(&self, index: usize) -> Result<T> {
        T::from_column(self, index)
    }

    /// Decodes the whole row, resolving the target's shape on the
    /// spot. The cursor's typed `next` caches the shape instead.
    pub fn decode<T: FromRow<'a>>(&self) -> Result<T> {
        let shape = T::shape(self.stmt)?;
        T::from_row(self, &shape)
    }
}

/// Where one field of a row target comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeSlot {
    /// Read from this column index.
    Column(usize),
    /// No matching column; use the field's declared default.
    Default,
}

/// Resolved field-to-column mapping for one target type against one
/// prepared statement.
#[derive(Debug, Clone)]
pub struct RowShape {
    slots: Vec<ShapeSlot>,
}

impl RowShape {
    /// Shape of a scalar target: one slot reading column 0.
    pub fn single() -> RowShape {
        RowShape {
            slots: vec![ShapeSlot::Column(0)],
        }
    }

    /// Shape of a tuple target: fields map to columns by declaration
    /// order. Fails when the statement produces fewer columns.
    pub fn positional(stmt: &Statement<'_>, fields: usize) -> Result<RowShape> {
        let columns = stmt.column_count();
        if columns < fields {
            return Err(Error::Sqlite {
                code: ErrorCode::Range,
                message: format!(
                    "statement produces {columns} columns but the target needs {fields}"
                ),
            });
        }
        Ok(RowShape {
            slots: (0..fields).map(ShapeSlot::Column).collect(),
        })
    }

    /// Shape of a record target: each field matches the same-named
    /// column (case-sensitive, exact). A field with no matching column
    /// falls back to its declared default, or fails `UndefinedField`.
    pub fn resolve(
        stmt: &Statement<'_>,
        target: &'static str,
        fields: &[(&'static str, bool)],
    ) -> Result<RowShape> {
        let columns = stmt.column_count();
        let mut slots = Vec::with_capacity(fields.len());
        for &(field, has_default) in fields {
            let index = (0..columns).find(|&i| stmt.column_name(i) == Some(field));
            match index {
                Some(i) => slots.push(ShapeSlot::Column(i)),
                None if has_default => slots.push(ShapeSlot::Default),
                None => return Err(Error::UndefinedField { field, target }),
            }
        }
        Ok(RowShape { slots })
    }

    pub fn slot(&self, field: usize) -> ShapeSlot {
        self.slots
            .get(field)
            .copied()
            .unwrap_or(ShapeSlot::Default)
    }
}

/// Reads a whole row into a host type.
///
/// `shape` is resolved once per prepared statement and passed back to
/// every `from_row` call for that statement's rows. Implementing this
/// trait on a user type is the whole-row read override hook.
pub trait FromRow<'a>: Sized {
    fn shape(stmt: &Statement<'_>) -> Result<RowShape>;
    fn from_row(row: &Row<'a>, shape: &RowShape) -> Result<Self>;
}

/// The unit target reads nothing; it is what run-to-completion uses.
impl<'a> FromRow<'a> for () {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape { slots: Vec::new() })
    }

    fn from_row(_row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        Ok(())
    }
}

macro_rules! scalar_from_row {
    ($($t:ty),+) => {
        $(impl<'a> FromRow<'a> for $t {
            fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
                Ok(RowShape::single())
            }

            fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
                row.get(0)
            }
        })+
    };
}

scalar_from_row!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, i128, u128, f32, f64, String, Vec<u8>
);

impl<'a> FromRow<'a> for &'a str {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape::single())
    }

    fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        row.get(0)
    }
}

impl<'a> FromRow<'a> for &'a [u8] {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape::single())
    }

    fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        row.get(0)
    }
}

impl<'a> FromRow<'a> for Value<'a> {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape::single())
    }

    fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        row.get(0)
    }
}

impl<'a> FromRow<'a> for OwnedValue {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape::single())
    }

    fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        row.get(0)
    }
}

impl<'a, const N: usize> FromRow<'a> for [u8; N] {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape::single())
    }

    fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        row.get(0)
    }
}

impl<'a, T: FromColumn<'a>> FromRow<'a> for Option<T> {
    fn shape(_stmt: &Statement<'_>) -> Result<RowShape> {
        Ok(RowShape::single())
    }

    fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
        row.get(0)
    }
}

macro_rules! tuple_from_row {
    ($( ($($name:ident : $idx:tt),+) ),+ $(,)?) => {
        $(impl<'a, $($name: FromColumn<'a>),+> FromRow<'a> for ($($name,)+) {
            fn shape(stmt: &Statement<'_>) -> Result<RowShape> {
                RowShape::positional(stmt, count_fields!($($name)+))
            }

            fn from_row(row: &Row<'a>, _shape: &RowShape) -> Result<Self> {
                Ok(($(row.get::<$name>($idx)?,)+))
            }
        })+
    };
}

macro_rules! count_fields {
    ($($name:ident)+) => { [$(count_fields!(@one $name)),+].len() };
    (@one $name:ident) => { () };
}

tuple_from_row!(
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
    (A: 0, B: 1, C: 2, D: 3, E: 4),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11),
);

/// Implements `FromRow` for a record type: fields match same-named
/// columns, with optional per-field defaults for columns the query
/// may not produce. A lifetime parameter on the record ties borrowing
/// fields (`&str`, `&[u8]`, `Value`) to the row.
///
/// ```ignore
/// struct User { id: i64, name: String, age: i64 }
/// sqlbind::impl_from_row!(User { id, name, age = 0 });
///
/// struct UserRef<'a> { id: i64, name: &'a str }
/// sqlbind::impl_from_row!(UserRef<'a> { id, name });
/// ```
#[macro_export]
macro_rules! impl_from_row {
    ($ty:ident { $($field:ident $(= $default:expr)?),+ $(,)? }) => {
        $crate::impl_from_row!(@imp ('a) $ty ($ty) { $($field $(= $default)?),+ });
    };
    ($ty:ident<$lt:lifetime> { $($field:ident $(= $default:expr)?),+ $(,)? }) => {
        $crate::impl_from_row!(@imp ($lt) $ty ($ty<$lt>) { $($field $(= $default)?),+ });
    };
    (@imp ($lt:lifetime) $ty:ident ($($self_ty:tt)+) { $($field:ident $(= $default:expr)?),+ }) => {
        impl<$lt> $crate::FromRow<$lt> for $($self_ty)+ {
            fn shape(stmt: &$crate::Statement<'_>) -> $crate::Result<$crate::RowShape> {
                $crate::RowShape::resolve(
                    stmt,
                    stringify!($ty),
                    &[$((
                        stringify!($field),
                        $crate::impl_from_row!(@has_default $($default)?),
                    )),+],
                )
            }

            fn from_row(
                row: &$crate::Row<$lt>,
                shape: &$crate::RowShape,
            ) -> $crate::Result<Self> {
                let mut field = 0usize;
                Ok($ty {
                    $($field: {
                        let slot = shape.slot(field);
                        field += 1;
                        match slot {
                            $crate::ShapeSlot::Column(index) => row.get(index)?,
                            $crate::ShapeSlot::Default => {
                                $crate::impl_from_row!(@default $ty $field $(, $default)?)
                            }
                        }
                    },)+
                })
            }
        }
    };
    (@has_default) => { false };
    (@has_default $default:expr) => { true };
    (@default $ty:ident $field:ident) => {
        return Err($crate::Error::UndefinedField {
            field: stringify!($field),
            target: stringify!($ty),
        })
    };
    (@default $ty:ident $field:ident, $default:expr) => { $default };
}
