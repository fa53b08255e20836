///
/// Prepared-statement wrapper over the engine's C ABI.
///
/// `Statement` owns one `sqlite3_stmt` handle and exposes the fixed
/// primitive contract the marshalling layer is built on: step,
/// finalize, by-index bind calls, by-index column reads, and
/// parameter/column name lookup. Everything above this module works in
/// terms of these primitives and never touches the ffi crate directly.
///
/// Text and blob binds use the engine's transient mode, so the engine
/// copies the bytes during the call and the caller's buffer may be
/// freed as soon as the bind returns.
///

use std::ffi::{c_char, c_int, CStr};
use std::marker::PhantomData;

use libsqlite3_sys as ffi;

use crate::connection::Connection;
use crate::error::{Error, ErrorCode, Result};

/// Outcome of stepping a statement: a row is available, or the
/// statement has run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Row,
    Done,
}

/// Storage class of one column value, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

/// Captures the connection's current error message for a failed call.
pub(crate) unsafe fn error_from_handle(db: *mut ffi::sqlite3, rc: c_int) -> Error {
    let message = if db.is_null() {
        String::new()
    } else {
        let msg = ffi::sqlite3_errmsg(db);
        if msg.is_null() {
            String::new()
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    };
    Error::Sqlite {
        code: ErrorCode::from_code(rc),
        message,
    }
}

#[derive(Debug)]
pub struct Statement<'conn> {
    raw: *mut ffi::sqlite3_stmt,
    _conn: PhantomData<&'conn Connection>,
}

impl<'conn> Statement<'conn> {
    /// Prepares the first statement found in `sql`. Returns the
    /// statement (None when `sql` holds no statement, e.g. whitespace
    /// or a bare comment) and the byte offset into `sql` where the
    /// unconsumed tail begins.
    pub(crate) fn prepare(conn: &'conn Connection, sql: &str) -> Result<(Option<Self>, usize)> {
        let db = conn.handle();
        let len = c_int::try_from(sql.len()).map_err(|_| Error::Sqlite {
            code: ErrorCode::TooBig,
            message: "statement text exceeds the engine's size limit".to_string(),
        })?;

        let mut raw: *mut ffi::sqlite3_stmt = std::ptr::null_mut();
        let mut tail: *const c_char = std::ptr::null();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                db,
                sql.as_ptr() as *const c_char,
                len,
                &mut raw,
                &mut tail,
            )
        };
        if rc != ffi::SQLITE_OK {
            return Err(unsafe { error_from_handle(db, rc) });
        }

        // Tail offset is computed against the original text so the
        // caller can keep slicing the same buffer.
        let consumed = if tail.is_null() {
            sql.len()
        } else {
            (unsafe { tail.offset_from(sql.as_ptr() as *const c_char) }) as usize
        };

        let stmt = if raw.is_null() {
            None
        } else {
            Some(Statement {
                raw,
                _conn: PhantomData,
            })
        };
        Ok((stmt, consumed))
    }

    /// The owning connection handle, recoverable from the statement.
    pub(crate) fn db_handle(&self) -> *mut ffi::sqlite3 {
        unsafe { ffi::sqlite3_db_handle(self.raw) }
    }

    fn check(&self, rc: c_int) -> Result<()> {
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(unsafe { error_from_handle(self.db_handle(), rc) })
        }
    }

    /// Advances the statement by one row.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let rc = unsafe { ffi::sqlite3_step(self.raw) };
        match rc {
            ffi::SQLITE_ROW => Ok(StepOutcome::Row),
            ffi::SQLITE_DONE => Ok(StepOutcome::Done),
            _ => Err(unsafe { error_from_handle(self.db_handle(), rc) }),
        }
    }

    /// Resets the statement for re-execution and clears all bindings.
    pub fn reset(&mut self) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_reset(self.raw) };
        self.check(rc)?;
        let rc = unsafe { ffi::sqlite3_clear_bindings(self.raw) };
        self.check(rc)
    }

    /// Finalizes the statement, reporting any deferred engine error.
    /// Dropping a statement also finalizes it, discarding the code.
    pub fn finalize(self) -> Result<()> {
        let db = self.db_handle();
        let raw = self.raw;
        std::mem::forget(self);
        let rc = unsafe { ffi::sqlite3_finalize(raw) };
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(unsafe { error_from_handle(db, rc) })
        }
    }

    // Parameter slots. Bind indices are 1-based, per the engine.

    pub fn parameter_count(&self) -> usize {
        unsafe { ffi::sqlite3_bind_parameter_count(self.raw) as usize }
    }

    /// Declared name of the 1-based parameter slot, including its
    /// leading sigil, or None for positional (`?`) slots.
    pub fn parameter_name(&self, index: usize) -> Option<&str> {
        let name = unsafe { ffi::sqlite3_bind_parameter_name(self.raw, index as c_int) };
        if name.is_null() {
            None
        } else {
            unsafe { CStr::from_ptr(name) }.to_str().ok()
        }
    }

    pub fn bind_i64(&mut self, index: usize, value: i64) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_bind_int64(self.raw, index as c_int, value) };
        self.check(rc)
    }

    pub fn bind_f64(&mut self, index: usize, value: f64) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_bind_double(self.raw, index as c_int, value) };
        self.check(rc)
    }

    pub fn bind_text(&mut self, index: usize, value: &str) -> Result<()> {
        let rc = unsafe {
            ffi::sqlite3_bind_text(
                self.raw,
                index as c_int,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        self.check(rc)
    }

    pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<()> {
        let rc = unsafe {
            ffi::sqlite3_bind_blob(
                self.raw,
                index as c_int,
                value.as_ptr() as *const std::ffi::c_void,
                value.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        self.check(rc)
    }

    pub fn bind_null(&mut self, index: usize) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_bind_null(self.raw, index as c_int) };
        self.check(rc)
    }

    // Result columns. Column indices are 0-based, per the engine.

    pub fn column_count(&self) -> usize {
        unsafe { ffi::sqlite3_column_count(self.raw) as usize }
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        let name = unsafe { ffi::sqlite3_column_name(self.raw, index as c_int) };
        if name.is_null() {
            None
        } else {
            unsafe { CStr::from_ptr(name) }.to_str().ok()
        }
    }

    pub fn column_type(&self, index: usize) -> ColumnType {
        match unsafe { ffi::sqlite3_column_type(self.raw, index as c_int) } {
            ffi::SQLITE_INTEGER => ColumnType::Integer,
            ffi::SQLITE_FLOAT => ColumnType::Float,
            ffi::SQLITE_TEXT => ColumnType::Text,
            ffi::SQLITE_BLOB => ColumnType::Blob,
            _ => ColumnType::Null,
        }
    }

    pub fn column_i64(&self, index: usize) -> i64 {
        unsafe { ffi::sqlite3_column_int64(self.raw, index as c_int) }
    }

    pub fn column_f64(&self, index: usize) -> f64 {
        unsafe { ffi::sqlite3_column_double(self.raw, index as c_int) }
    }

    /// Raw text bytes of the column. The slice aliases the statement's
    /// internal buffer and is invalidated by the next step, reset, or
    /// finalize on this statement.
    pub fn column_text(&self, index: usize) -> Result<&str> {
        let ptr = unsafe { ffi::sqlite3_column_text(self.raw, index as c_int) };
        let len = unsafe { ffi::sqlite3_column_bytes(self.raw, index as c_int) };
        if ptr.is_null() || len <= 0 {
            return Ok("");
        }
        let bytes = unsafe { std::slice::from_raw_parts(ptr, len as usize) };
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Raw blob bytes of the column, with the same lifetime contract
    /// as `column_text`.
    pub fn column_blob(&self, index: usize) -> &[u8] {
        let ptr = unsafe { ffi::sqlite3_column_blob(self.raw, index as c_int) };
        let len = unsafe { ffi::sqlite3_column_bytes(self.raw, index as c_int) };
        if ptr.is_null() || len <= 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(ptr as *const u8, len as usize) }
        }
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        unsafe {
            ffi::sqlite3_finalize(self.raw);
        }
    }
}
