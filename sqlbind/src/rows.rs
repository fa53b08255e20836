///
/// Typed iteration over the result rows of one or more statements.
///
/// `Rows` drives a statement source through the step protocol and
/// decodes each result row into `T` via `FromRow`. The source is
/// either an owned `StatementSequence` (the cursor finalizes each
/// statement as it is passed) or a borrowed `&mut Statement` (the
/// caller keeps finalize responsibility). The row shape for `T` is
/// resolved once per statement and cached.
///

use std::marker::PhantomData;
use std::mem;

use tracing::debug;

use crate::error::{Error, Result};
use crate::row::{FromRow, Row, RowShape};
use crate::sequence::StatementSequence;
use crate::statement::{Statement, StepOutcome};

enum Source<'conn, 'sql> {
    Owned(StatementSequence<'conn, 'sql>),
    Borrowed {
        stmt: &'sql mut Statement<'conn>,
        done: bool,
    },
    Disposed,
}

pub struct Rows<'conn, 'sql, T> {
    source: Source<'conn, 'sql>,
    shape: Option<RowShape>,
    _marker: PhantomData<fn() -> T>,
}

impl<'conn, 'sql, T> Rows<'conn, 'sql, T> {
    pub fn from_sequence(sequence: StatementSequence<'conn, 'sql>) -> Self {
        Rows {
            source: Source::Owned(sequence),
            shape: None,
            _marker: PhantomData,
        }
    }

    /// Iterates an already-prepared statement without taking ownership
    /// of it. The cursor stops at the statement's DONE and never
    /// finalizes it.
    pub fn from_statement(stmt: &'sql mut Statement<'conn>) -> Self {
        Rows {
            source: Source::Borrowed { stmt, done: false },
            shape: None,
            _marker: PhantomData,
        }
    }

    /// Decodes the next result row, crossing statement boundaries in
    /// an owned sequence. `None` once every statement has run to
    /// completion. Any error releases the held statements before it
    /// propagates.
    pub fn next(&mut self) -> Option<Result<T>>
    where
        T: for<'r> FromRow<'r>,
    {
        loop {
            match self.step_current() {
                Ok(None) => return None,
                Ok(Some(StepOutcome::Done)) => {
                    if let Err(e) = self.advance_source() {
                        self.exhaust();
                        return Some(Err(e));
                    }
                }
                Ok(Some(StepOutcome::Row)) => {
                    return match self.decode_current() {
                        Ok(value) => Some(Ok(value)),
                        Err(e) => {
                            self.exhaust();
                            Some(Err(e))
                        }
                    };
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Lending form of `next`: the returned `Row` borrows the cursor,
    /// so borrowing reads (`&str`, `&[u8]`, `Value`) stay valid until
    /// the next call.
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>> {
        loop {
            match self.step_current() {
                Ok(None) => return Ok(None),
                Ok(Some(StepOutcome::Done)) => {
                    if let Err(e) = self.advance_source() {
                        self.exhaust();
                        return Err(e);
                    }
                }
                Ok(Some(StepOutcome::Row)) => break,
                Err(e) => return Err(e),
            }
        }
        match self.current_stmt() {
            Some(stmt) => Ok(Some(Row::new(stmt))),
            None => Ok(None),
        }
    }

    /// Drains every remaining row of every remaining statement,
    /// discarding the values.
    pub fn run_to_completion(&mut self) -> Result<()> {
        loop {
            match self.step_current() {
                Ok(None) => return Ok(()),
                Ok(Some(StepOutcome::Done)) => {
                    if let Err(e) = self.advance_source() {
                        self.exhaust();
                        return Err(e);
                    }
                }
                Ok(Some(StepOutcome::Row)) => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Decodes at most one row, then disposes the cursor whatever the
    /// outcome. Statements past the one that produced the row are
    /// never prepared.
    pub fn first_or_none(&mut self) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r>,
    {
        let first = match self.next() {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        };
        let disposed = self.dispose();
        let value = first?;
        disposed?;
        Ok(value)
    }

    /// Like `first_or_none`, but an empty result set is an error.
    pub fn first_or_error(&mut self) -> Result<T>
    where
        T: for<'r> FromRow<'r>,
    {
        self.first_or_none()?.ok_or(Error::NoResult)
    }

    /// Releases every held statement. Idempotent. An owned source is
    /// finalized; a borrowed statement is reset for its owner.
    pub fn dispose(&mut self) -> Result<()> {
        self.shape = None;
        match mem::replace(&mut self.source, Source::Disposed) {
            Source::Owned(mut sequence) => {
                debug!("disposing cursor and its statement sequence");
                sequence.dispose()
            }
            Source::Borrowed { stmt, .. } => stmt.reset(),
            Source::Disposed => Ok(()),
        }
    }

    /// Steps the active statement. `Ok(None)` when the source is
    /// exhausted or disposed. A step error releases the source first.
    fn step_current(&mut self) -> Result<Option<StepOutcome>> {
        let stmt = match &mut self.source {
            Source::Owned(sequence) => match sequence.current_mut() {
                Some(stmt) => stmt,
                None => return Ok(None),
            },
            Source::Borrowed { stmt, done } => {
                if *done {
                    return Ok(None);
                }
                &mut **stmt
            }
            Source::Disposed => return Ok(None),
        };
        match stmt.step() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                self.exhaust();
                Err(e)
            }
        }
    }

    /// Reacts to a statement's DONE: an owned source finalizes it and
    /// prepares its successor, a borrowed source simply stops.
    fn advance_source(&mut self) -> Result<()> {
        self.shape = None;
        match &mut self.source {
            Source::Owned(sequence) => {
                if let Some(finished) = sequence.advance()? {
                    finished.finalize()?;
                }
                Ok(())
            }
            Source::Borrowed { done, .. } => {
                *done = true;
                Ok(())
            }
            Source::Disposed => Ok(()),
        }
    }

    fn current_stmt(&self) -> Option<&Statement<'conn>> {
        match &self.source {
            Source::Owned(sequence) => sequence.current(),
            Source::Borrowed { stmt, .. } => Some(&**stmt),
            Source::Disposed => None,
        }
    }

    fn decode_current(&mut self) -> Result<T>
    where
        T: for<'r> FromRow<'r>,
    {
        let stmt = match &self.source {
            Source::Owned(sequence) => sequence.current().ok_or(Error::NoResult)?,
            Source::Borrowed { stmt, .. } => &**stmt,
            Source::Disposed => return Err(Error::NoResult),
        };
        if self.shape.is_none() {
            self.shape = Some(T::shape(stmt)?);
        }
        let shape = self.shape.as_ref().ok_or(Error::NoResult)?;
        let row = Row::new(stmt);
        T::from_row(&row, shape)
    }

    fn exhaust(&mut self) {
        if let Source::Borrowed { done, .. } = &mut self.source {
            *done = true;
            return;
        }
        if let Source::Owned(mut sequence) = mem::replace(&mut self.source, Source::Disposed) {
            // The step error is what the caller sees; a secondary
            // finalize failure carries no extra information.
            let _ = sequence.dispose();
        }
    }
}
