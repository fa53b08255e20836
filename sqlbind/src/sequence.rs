///
/// Lazy multi-statement preparation over a single SQL text.
///
/// A `StatementSequence` owns the statement currently being stepped
/// plus the unconsumed remainder of the source text. Statements after
/// the current one exist only as text until `advance` is called, so a
/// failure in a later statement is not observed while earlier result
/// rows are still being drained.
///

use tracing::debug;

use crate::connection::Connection;
use crate::error::Result;
use crate::statement::Statement;

pub struct StatementSequence<'conn, 'sql> {
    conn: &'conn Connection,
    current: Option<Statement<'conn>>,
    remainder: &'sql str,
}

impl<'conn, 'sql> StatementSequence<'conn, 'sql> {
    /// Prepares the first statement of `sql`, leaving everything after
    /// it untouched as text. Whitespace-only or empty input yields a
    /// sequence that is already exhausted.
    pub fn begin(conn: &'conn Connection, sql: &'sql str) -> Result<Self> {
        let mut seq = StatementSequence {
            conn,
            current: None,
            remainder: sql,
        };
        seq.prepare_next()?;
        Ok(seq)
    }

    /// Consumes the leading statement of the remainder. Skips over
    /// spans the engine consumes without producing a statement, such
    /// as comments and stray whitespace between statements.
    fn prepare_next(&mut self) -> Result<()> {
        loop {
            if self.remainder.is_empty() {
                self.current = None;
                return Ok(());
            }
            let (stmt, consumed) = Statement::prepare(self.conn, self.remainder)?;
            if consumed == 0 {
                self.current = None;
                self.remainder = "";
                return Ok(());
            }
            debug!(consumed, "prepared statement from sequence");
            self.remainder = &self.remainder[consumed..];
            if stmt.is_some() {
                self.current = stmt;
                return Ok(());
            }
        }
    }

    /// Prepares the next statement in the text and hands the one it
    /// replaces to the caller, who controls when it is finalized.
    /// `None` once all statement text is consumed. If preparing the
    /// successor fails, the outgoing statement is finalized by drop
    /// before the error propagates.
    pub fn advance(&mut self) -> Result<Option<Statement<'conn>>> {
        let previous = self.current.take();
        self.prepare_next()?;
        Ok(previous)
    }

    pub fn current(&self) -> Option<&Statement<'conn>> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Statement<'conn>> {
        self.current.as_mut()
    }

    /// Text of the statements not yet prepared.
    pub fn remainder(&self) -> &'sql str {
        self.remainder
    }

    /// Finalizes the current statement and drops the remaining text
    /// without preparing it.
    pub fn dispose(&mut self) -> Result<()> {
        self.remainder = "";
        match self.current.take() {
            Some(stmt) => stmt.finalize(),
            None => Ok(()),
        }
    }
}
