///
/// One-column reads: the inverse of the one-value conversion.
///
/// `FromColumn` turns the engine's column value into the requested
/// host type. Integer targets accept the decimal-text fallback that
/// the owning binder produces for out-of-range numbers, so an
/// overflowed value round-trips through a text column. Borrowing
/// targets (`&str`, `&[u8]`, `Value`) alias the statement's buffers
/// and live only as long as the current row.
///

use crate::error::{Error, Result};
use crate::row::Row;
use crate::statement::ColumnType;
use crate::value::{OwnedValue, Value};

/// Reads one column into a host type. Implementing this on a user
/// type is the one-column read override hook; shapes without an
/// implementation are rejected at compile time.
pub trait FromColumn<'a>: Sized {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self>;
}

impl<'a> FromColumn<'a> for bool {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        Ok(row.stmt().column_i64(index) != 0)
    }
}

macro_rules! integer_from_column {
    ($($t:ty),+) => {
        $(impl<'a> FromColumn<'a> for $t {
            fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
                let stmt = row.stmt();
                match stmt.column_type(index) {
                    // Decimal-text fallback: how out-of-range numbers
                    // are stored by the owning binder.
                    ColumnType::Text => {
                        let text = stmt.column_text(index)?;
                        text.parse::<$t>().map_err(|_| Error::NotANumber {
                            text: text.to_string(),
                        })
                    }
                    _ => <$t>::try_from(stmt.column_i64(index))
                        .map_err(|_| Error::NumberTooLarge),
                }
            }
        })+
    };
}

integer_from_column!(i8, i16, i32, i64, u8, u16, u32, u64, i128, u128);

impl<'a> FromColumn<'a> for f64 {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        let stmt = row.stmt();
        match stmt.column_type(index) {
            ColumnType::Text => {
                let text = stmt.column_text(index)?;
                text.parse::<f64>().map_err(|_| Error::NotANumber {
                    text: text.to_string(),
                })
            }
            _ => Ok(stmt.column_f64(index)),
        }
    }
}

impl<'a> FromColumn<'a> for f32 {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        Ok(f64::from_column(row, index)? as f32)
    }
}

impl<'a> FromColumn<'a> for &'a str {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        row.stmt().column_text(index)
    }
}

impl<'a> FromColumn<'a> for String {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        Ok(row.stmt().column_text(index)?.to_string())
    }
}

impl<'a> FromColumn<'a> for &'a [u8] {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        Ok(row.stmt().column_blob(index))
    }
}

impl<'a> FromColumn<'a> for Vec<u8> {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        Ok(row.stmt().column_blob(index).to_vec())
    }
}

/// Fixed-capacity byte target: fails `ValueTooLarge` when the column
/// holds more bytes than fit; unused capacity is zero-filled.
impl<'a, const N: usize> FromColumn<'a> for [u8; N] {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        let bytes = row.stmt().column_blob(index);
        if bytes.len() > N {
            return Err(Error::ValueTooLarge {
                capacity: N,
                len: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(out)
    }
}

impl<'a, T: FromColumn<'a>> FromColumn<'a> for Option<T> {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        // The null check names the column index explicitly.
        if row.stmt().column_type(index) == ColumnType::Null {
            Ok(None)
        } else {
            Ok(Some(T::from_column(row, index)?))
        }
    }
}

impl<'a> FromColumn<'a> for Value<'a> {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        row.value(index)
    }
}

impl<'a> FromColumn<'a> for OwnedValue {
    fn from_column(row: &Row<'a>, index: usize) -> Result<Self> {
        Ok(row.value(index)?.to_owned_value())
    }
}
