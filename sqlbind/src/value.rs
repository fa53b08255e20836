///
/// Dynamic values over the engine's five storage classes.
///
/// `Value` borrows its text/blob bytes from the source (a host value,
/// or the current row's buffers); `OwnedValue` owns copies of them.
/// `ToValue` is the one-value conversion every parameter leaf goes
/// through: the borrowing form refuses numbers that do not fit the
/// engine's 64-bit width, the owning form re-encodes them as decimal
/// text.
///

use crate::error::{Error, Result};
use crate::statement::Statement;

/// One value in the engine's storage model. Text/Blob spans are valid
/// only as long as their source is alive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a str),
    Blob(&'a [u8]),
    Null,
}

/// A dynamic value that owns its text/blob bytes. Integer, Float and
/// Null never carry an allocation; releasing is `Drop`.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl<'a> Value<'a> {
    /// Copies borrowed bytes into an owning value.
    pub fn to_owned_value(self) -> OwnedValue {
        match self {
            Value::Integer(v) => OwnedValue::Integer(v),
            Value::Float(v) => OwnedValue::Float(v),
            Value::Text(v) => OwnedValue::Text(v.to_string()),
            Value::Blob(v) => OwnedValue::Blob(v.to_vec()),
            Value::Null => OwnedValue::Null,
        }
    }

    /// Binds this value at the 1-based parameter slot, dispatching to
    /// the engine primitive for the active variant.
    pub fn bind(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
        match self {
            Value::Integer(v) => stmt.bind_i64(index, *v),
            Value::Float(v) => stmt.bind_f64(index, *v),
            Value::Text(v) => stmt.bind_text(index, v),
            Value::Blob(v) => stmt.bind_blob(index, v),
            Value::Null => stmt.bind_null(index),
        }
    }
}

impl OwnedValue {
    /// A borrowed view of this value.
    pub fn borrow(&self) -> Value<'_> {
        match self {
            OwnedValue::Integer(v) => Value::Integer(*v),
            OwnedValue::Float(v) => Value::Float(*v),
            OwnedValue::Text(v) => Value::Text(v),
            OwnedValue::Blob(v) => Value::Blob(v),
            OwnedValue::Null => Value::Null,
        }
    }

    pub fn bind(&self, stmt: &mut Statement<'_>, index: usize) -> Result<()> {
        self.borrow().bind(stmt, index)
    }
}

/// Conversion of one host value into a dynamic value.
///
/// `to_value` is the strict borrowing form: a number outside the
/// engine's 64-bit range fails with `NumberTooLarge`. `to_value_owned`
/// is the owning form used by the binder's overflow recovery path: an
/// out-of-range integer is re-encoded as decimal text so it survives
/// the round trip through a text column.
///
/// Implementing this trait on a user type is the one-value bind
/// override hook; unsupported shapes simply have no implementation,
/// so they are rejected at compile time with the offending type named
/// in the diagnostic.
pub trait ToValue {
    fn to_value(&self) -> Result<Value<'_>>;

    fn to_value_owned(&self) -> Result<OwnedValue> {
        Ok(self.to_value()?.to_owned_value())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Integer(if *self { 1 } else { 0 }))
    }
}

macro_rules! integer_to_value {
    ($($t:ty),+) => {
        $(impl ToValue for $t {
            fn to_value(&self) -> Result<Value<'_>> {
                Ok(Value::Integer(*self as i64))
            }
        })+
    };
}

integer_to_value!(i8, i16, i32, i64, u8, u16, u32);

// Integers wider than the engine's native width: strict conversion
// fails, the owning conversion falls back to decimal text.
macro_rules! wide_integer_to_value {
    ($($t:ty),+) => {
        $(impl ToValue for $t {
            fn to_value(&self) -> Result<Value<'_>> {
                match i64::try_from(*self) {
                    Ok(v) => Ok(Value::Integer(v)),
                    Err(_) => Err(Error::NumberTooLarge),
                }
            }

            fn to_value_owned(&self) -> Result<OwnedValue> {
                match i64::try_from(*self) {
                    Ok(v) => Ok(OwnedValue::Integer(v)),
                    Err(_) => Ok(OwnedValue::Text(self.to_string())),
                }
            }
        })+
    };
}

wide_integer_to_value!(u64, i128, u128);

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Float(f64::from(*self)))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Float(*self))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Text(self))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Text(self))
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Blob(self))
    }
}

impl<const N: usize> ToValue for [u8; N] {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Blob(self))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(Value::Blob(self))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value<'_>> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn to_value_owned(&self) -> Result<OwnedValue> {
        match self {
            Some(v) => v.to_value_owned(),
            None => Ok(OwnedValue::Null),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value<'_>> {
        (**self).to_value()
    }

    fn to_value_owned(&self) -> Result<OwnedValue> {
        (**self).to_value_owned()
    }
}

impl ToValue for Value<'_> {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(*self)
    }
}

impl ToValue for OwnedValue {
    fn to_value(&self) -> Result<Value<'_>> {
        Ok(self.borrow())
    }
}

/// Implements the scalar marshalling traits (`ToValue`, `BindParams`,
/// `FromColumn`, `FromRow`) for a C-like enumeration, marshalled
/// through its underlying integer value. Reading an integer that
/// matches no member fails with `InvalidValue`.
///
/// ```ignore
/// enum Color { Red, Green }
/// sqlbind::impl_scalar_enum!(Color { Red = 1, Green = 2 });
/// ```
#[macro_export]
macro_rules! impl_scalar_enum {
    ($ty:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        impl $crate::ToValue for $ty {
            fn to_value(&self) -> $crate::Result<$crate::Value<'_>> {
                Ok($crate::Value::Integer(match self {
                    $($ty::$variant => $value,)+
                }))
            }
        }

        impl $crate::BindParams for $ty {
            fn bind_all(&self, stmt: &mut $crate::Statement<'_>) -> $crate::Result<()> {
                $crate::bind_value_at(stmt, 1, self)
            }
        }

        impl<'a> $crate::FromColumn<'a> for $ty {
            fn from_column(row: &$crate::Row<'a>, index: usize) -> $crate::Result<Self> {
                let value = <i64 as $crate::FromColumn>::from_column(row, index)?;
                match value {
                    $(v if v == $value => Ok($ty::$variant),)+
                    other => Err($crate::Error::InvalidValue {
                        value: other,
                        target: stringify!($ty),
                    }),
                }
            }
        }

        impl<'a> $crate::FromRow<'a> for $ty {
            fn shape(_stmt: &$crate::Statement<'_>) -> $crate::Result<$crate::RowShape> {
                Ok($crate::RowShape::single())
            }

            fn from_row(
                row: &$crate::Row<'a>,
                _shape: &$crate::RowShape,
            ) -> $crate::Result<Self> {
                row.get(0)
            }
        }
    };
}
