//! RowCursor trait - lazy result stream of one statement
//!
//! Many backends only guarantee that a statement's work is complete once its
//! cursor is exhausted, so callers that do not need rows still `drain`.

use crate::{ContractError, Row};

/// Lazy, possibly asynchronous sequence of rows
#[trait_variant::make(RowCursor: Send)]
pub trait LocalRowCursor {
    /// Column names of the result set (empty for statements without rows)
    fn column_names(&self) -> &[String];

    /// Fetch the next row
    ///
    /// Returns `Ok(None)` once the cursor is exhausted.
    ///
    /// # Errors
    /// Returns the runtime error of the statement (should include context)
    async fn next_row(&mut self) -> Result<Option<Row>, ContractError>;
}

/// Read every remaining row into memory
pub async fn collect_rows<C: RowCursor>(cursor: &mut C) -> Result<Vec<Row>, ContractError> {
    let mut rows = Vec::new();
    while let Some(row) = cursor.next_row().await? {
        rows.push(row);
    }
    Ok(rows)
}

/// Consume every remaining row, returning how many were read
pub async fn drain<C: RowCursor>(cursor: &mut C) -> Result<u64, ContractError> {
    let mut count = 0u64;
    while cursor.next_row().await?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Read the single row of a cursor
///
/// # Errors
/// `UnexpectedRowCount` when the cursor yields zero or more than one row.
pub async fn one<C: RowCursor>(cursor: &mut C) -> Result<Row, ContractError> {
    let first = cursor.next_row().await?;
    let extra = drain(cursor).await?;
    match first {
        Some(row) if extra == 0 => Ok(row),
        Some(_) => Err(ContractError::UnexpectedRowCount { actual: extra + 1 }),
        None => Err(ContractError::UnexpectedRowCount { actual: 0 }),
    }
}
