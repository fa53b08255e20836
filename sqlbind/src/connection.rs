///
/// Connection handle and the query entry points built on top of the
/// sequence and cursor machinery.
///

use std::ffi::{c_int, CString};
use std::ptr;
use std::time::Duration;

use libsqlite3_sys as ffi;
use tracing::debug;

use crate::error::{Error, Result};
use crate::params::BindParams;
use crate::row::FromRow;
use crate::rows::Rows;
use crate::sequence::StatementSequence;
use crate::statement::{error_from_handle, Statement};

/// An open database. Single-threaded by construction; the handle is
/// released when the connection drops.
pub struct Connection {
    raw: *mut ffi::sqlite3,
}

impl Connection {
    /// Opens (creating if absent) the database file at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        Self::open_with_flags(path, flags)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn open_with_flags(path: &str, flags: c_int) -> Result<Self> {
        let c_path = CString::new(path).map_err(|_| Error::Sqlite {
            code: crate::error::ErrorCode::Misuse,
            message: "database path contains an interior nul byte".to_string(),
        })?;
        let mut raw: *mut ffi::sqlite3 = ptr::null_mut();
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut raw, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            // A handle is allocated even on failure and carries the
            // error message; close it after reading.
            let err = if raw.is_null() {
                Error::Sqlite {
                    code: crate::error::ErrorCode::from_code(rc),
                    message: "out of memory opening database".to_string(),
                }
            } else {
                let err = unsafe { error_from_handle(raw, rc) };
                unsafe { ffi::sqlite3_close_v2(raw) };
                err
            };
            return Err(err);
        }
        debug!(path, "opened database");
        Ok(Connection { raw })
    }

    pub(crate) fn handle(&self) -> *mut ffi::sqlite3 {
        self.raw
    }

    /// Prepares the first statement of `sql` without running it.
    /// Comment-only or empty input is `Error::NoResult`.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        let mut rest = sql;
        loop {
            let (stmt, consumed) = Statement::prepare(self, rest)?;
            if let Some(stmt) = stmt {
                return Ok(stmt);
            }
            if consumed == 0 || consumed >= rest.len() {
                return Err(Error::NoResult);
            }
            rest = &rest[consumed..];
        }
    }

    /// Begins iterating `sql`, which may hold several statements.
    /// `params` is bound to the first statement; later statements are
    /// prepared only as iteration reaches them.
    pub fn execute<'conn, 'sql, T>(
        &'conn self,
        sql: &'sql str,
        params: &(impl BindParams + ?Sized),
    ) -> Result<Rows<'conn, 'sql, T>> {
        let mut sequence = StatementSequence::begin(self, sql)?;
        if let Some(stmt) = sequence.current_mut() {
            stmt.bind_params(params)?;
        }
        Ok(Rows::from_sequence(sequence))
    }

    /// Runs every statement of `sql` to completion, discarding any
    /// result rows.
    pub fn run(&self, sql: &str, params: &(impl BindParams + ?Sized)) -> Result<()> {
        self.execute::<()>(sql, params)?.run_to_completion()
    }

    /// Runs `sql` and decodes its first result row. No row at all is
    /// `Error::NoResult`.
    pub fn get<T>(&self, sql: &str, params: &(impl BindParams + ?Sized)) -> Result<T>
    where
        T: for<'r> FromRow<'r>,
    {
        self.execute::<T>(sql, params)?.first_or_error()
    }

    /// Like `get`, but an empty result set is `Ok(None)`.
    pub fn get_optional<T>(
        &self,
        sql: &str,
        params: &(impl BindParams + ?Sized),
    ) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r>,
    {
        self.execute::<T>(sql, params)?.first_or_none()
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> usize {
        let n = unsafe { ffi::sqlite3_changes(self.raw) };
        n.max(0) as usize
    }

    pub fn last_insert_rowid(&self) -> i64 {
        unsafe { ffi::sqlite3_last_insert_rowid(self.raw) }
    }

    /// How long the engine retries when a table is locked by another
    /// connection before reporting busy.
    pub fn busy_timeout(&self, timeout: Duration) -> Result<()> {
        let ms = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
        let rc = unsafe { ffi::sqlite3_busy_timeout(self.raw, ms) };
        if rc != ffi::SQLITE_OK {
            return Err(unsafe { error_from_handle(self.raw, rc) });
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // close_v2 defers if statements are still outstanding instead
        // of failing.
        unsafe { ffi::sqlite3_close_v2(self.raw) };
    }
}
