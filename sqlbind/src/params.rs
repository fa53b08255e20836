///
/// Whole-parameter-set binding: the recursive dispatch that walks a
/// host value's shape and fills a statement's parameter slots.
///
/// Scalar leaves bind at position 1; tuples and collections bind
/// positionally; records bind by matching field names against the
/// statement's declared parameter names with the leading sigil
/// stripped; optionals and references recurse. Implementing
/// `BindParams` on a user type is the whole-set override hook, and a
/// `ToValue` impl is the one-value hook the built-in shapes recurse
/// into.
///

use crate::error::{Error, Result};
use crate::statement::Statement;
use crate::value::{OwnedValue, ToValue, Value};

/// Binds a complete parameter set against a prepared statement.
pub trait BindParams {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()>;
}

/// Binds one value at the 1-based slot, recovering from numeric
/// overflow by re-encoding through the owning conversion (decimal
/// text), which completes the owning binder contract.
pub fn bind_value_at<T: ToValue + ?Sized>(
    stmt: &mut Statement<'_>,
    index: usize,
    value: &T,
) -> Result<()> {
    match value.to_value() {
        Ok(v) => v.bind(stmt, index),
        Err(Error::NumberTooLarge) => value.to_value_owned()?.bind(stmt, index),
        Err(e) => Err(e),
    }
}

impl<'conn> Statement<'conn> {
    /// Entry point for binding: resolves the parameter count and
    /// no-ops when the statement takes no parameters.
    pub fn bind_params(&mut self, params: &(impl BindParams + ?Sized)) -> Result<()> {
        if self.parameter_count() == 0 {
            return Ok(());
        }
        params.bind_all(self)
    }
}

/// No parameters.
impl BindParams for () {
    fn bind_all(&self, _stmt: &mut Statement<'_>) -> Result<()> {
        Ok(())
    }
}

// Scalar leaves bind at position 1.
macro_rules! scalar_params {
    ($($t:ty),+) => {
        $(impl BindParams for $t {
            fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
                bind_value_at(stmt, 1, self)
            }
        })+
    };
}

scalar_params!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, i128, u128, f32, f64, str, String, Vec<u8>,
    OwnedValue
);

impl BindParams for [u8] {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        bind_value_at(stmt, 1, self)
    }
}

impl<const N: usize> BindParams for [u8; N] {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        bind_value_at(stmt, 1, self)
    }
}

impl BindParams for Value<'_> {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        self.bind(stmt, 1)
    }
}

impl<T: BindParams + ?Sized> BindParams for &T {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        (**self).bind_all(stmt)
    }
}

/// Empty optional binds nothing: the engine defaults every slot to
/// null.
impl<T: BindParams> BindParams for Option<T> {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        match self {
            Some(params) => params.bind_all(stmt),
            None => Ok(()),
        }
    }
}

// Ordered collections bind element i at position i+1, stopping at the
// statement's parameter count. The byte types are excluded: a byte
// span is one blob scalar, not a parameter list.
macro_rules! list_params {
    ($($t:ty),+) => {
        $(impl BindParams for [$t] {
            fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
                let count = stmt.parameter_count();
                for (i, item) in self.iter().take(count).enumerate() {
                    bind_value_at(stmt, i + 1, item)?;
                }
                Ok(())
            }
        }

        impl BindParams for Vec<$t> {
            fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
                self.as_slice().bind_all(stmt)
            }
        }

        impl<const N: usize> BindParams for [$t; N] {
            fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
                self[..].bind_all(stmt)
            }
        })+
    };
}

list_params!(bool, i16, i32, i64, u16, u32, u64, f32, f64, String, OwnedValue);

impl BindParams for [&dyn ToValue] {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        let count = stmt.parameter_count();
        for (i, item) in self.iter().take(count).enumerate() {
            bind_value_at(stmt, i + 1, *item)?;
        }
        Ok(())
    }
}

impl BindParams for Vec<&dyn ToValue> {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        self.as_slice().bind_all(stmt)
    }
}

impl<const N: usize> BindParams for [&dyn ToValue; N] {
    fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
        self[..].bind_all(stmt)
    }
}

// Tuples bind field i at position i+1.
macro_rules! tuple_params {
    ($( ($($name:ident : $idx:tt),+) ),+ $(,)?) => {
        $(impl<$($name: ToValue),+> BindParams for ($($name,)+) {
            fn bind_all(&self, stmt: &mut Statement<'_>) -> Result<()> {
                $(bind_value_at(stmt, $idx + 1, &self.$idx)?;)+
                Ok(())
            }
        })+
    };
}

tuple_params!(
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

/// Implements `BindParams` for a record type: each of the statement's
/// named parameter slots is matched, with its leading sigil stripped,
/// against a same-named field. Slots with no matching field stay at
/// the engine default (null).
///
/// ```ignore
/// struct NewUser { id: i64, name: String }
/// sqlbind::impl_bind_struct!(NewUser { id, name });
/// ```
#[macro_export]
macro_rules! impl_bind_struct {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::BindParams for $ty {
            fn bind_all(&self, stmt: &mut $crate::Statement<'_>) -> $crate::Result<()> {
                let count = stmt.parameter_count();
                for index in 1..=count {
                    let name = match stmt.parameter_name(index) {
                        Some(name) => name
                            .trim_start_matches([':', '@', '$', '?'])
                            .to_string(),
                        None => continue,
                    };
                    match name.as_str() {
                        $(stringify!($field) => {
                            $crate::bind_value_at(stmt, index, &self.$field)?;
                        })+
                        _ => {}
                    }
                }
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::statement::StepOutcome;

    fn probe(db: &Connection, sql: &str, params: &(impl BindParams + ?Sized)) -> Vec<OwnedValue> {
        let mut stmt = db.prepare(sql).unwrap();
        stmt.bind_params(params).unwrap();
        assert_eq!(stmt.step().unwrap(), StepOutcome::Row);
        let row = crate::row::Row::new(&stmt);
        (0..row.column_count())
            .map(|i| row.value(i).unwrap().to_owned_value())
            .collect()
    }

    #[test]
    fn test_scalar_binds_slot_one() {
        let db = Connection::open_in_memory().unwrap();
        assert_eq!(probe(&db, "SELECT ?", &7i64), vec![OwnedValue::Integer(7)]);
        assert_eq!(
            probe(&db, "SELECT ?", "abc"),
            vec![OwnedValue::Text("abc".to_string())]
        );
    }

    #[test]
    fn test_tuple_binds_positionally() {
        let db = Connection::open_in_memory().unwrap();
        assert_eq!(
            probe(&db, "SELECT ?, ?, ?", &(1i64, 2.5f64, "x")),
            vec![
                OwnedValue::Integer(1),
                OwnedValue::Float(2.5),
                OwnedValue::Text("x".to_string())
            ]
        );
    }

    #[test]
    fn test_slice_stops_at_parameter_count() {
        let db = Connection::open_in_memory().unwrap();
        // Three elements, two slots: the third is ignored.
        assert_eq!(
            probe(&db, "SELECT ?, ?", &[10i64, 20, 30][..]),
            vec![OwnedValue::Integer(10), OwnedValue::Integer(20)]
        );
        assert_eq!(
            probe(&db, "SELECT ?, ?", &[10i64, 20]),
            vec![OwnedValue::Integer(10), OwnedValue::Integer(20)]
        );
    }

    #[test]
    fn test_dyn_list_binds_mixed_shapes() {
        let db = Connection::open_in_memory().unwrap();
        let params: Vec<&dyn ToValue> = vec![&1i64, &"y"];
        assert_eq!(
            probe(&db, "SELECT ?, ?", &params),
            vec![OwnedValue::Integer(1), OwnedValue::Text("y".to_string())]
        );
    }

    #[test]
    fn test_none_leaves_slot_null() {
        let db = Connection::open_in_memory().unwrap();
        assert_eq!(
            probe(&db, "SELECT ?", &Option::<i64>::None),
            vec![OwnedValue::Null]
        );
    }

    #[test]
    fn test_overflowing_integer_falls_back_to_text() {
        let db = Connection::open_in_memory().unwrap();
        assert_eq!(
            probe(&db, "SELECT ?", &(1u64 << 63)),
            vec![OwnedValue::Text("9223372036854775808".to_string())]
        );
    }

    #[test]
    fn test_zero_parameter_statement_ignores_params() {
        let db = Connection::open_in_memory().unwrap();
        assert_eq!(
            probe(&db, "SELECT 5", &(1i64, 2i64)),
            vec![OwnedValue::Integer(5)]
        );
    }

    struct Transfer {
        amount: i64,
        memo: String,
    }

    crate::impl_bind_struct!(Transfer { amount, memo });

    #[test]
    fn test_record_binds_by_stripped_name() {
        let db = Connection::open_in_memory().unwrap();
        let t = Transfer {
            amount: 250,
            memo: "rent".to_string(),
        };
        // @memo and :amount resolve by name; :other has no field and
        // stays null.
        assert_eq!(
            probe(&db, "SELECT :amount, @memo, :other", &t),
            vec![
                OwnedValue::Integer(250),
                OwnedValue::Text("rent".to_string()),
                OwnedValue::Null
            ]
        );
    }
}
