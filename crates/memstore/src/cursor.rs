//! MemoryCursor - lazy cursor over a fixture result set

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, Row, RowCursor};

use crate::replica::MemoryReplica;

/// Cursor returned by [`MemoryTarget::exec`](crate::MemoryTarget)
///
/// Marks its replica's statement as completed once exhausted.
#[derive(Debug)]
pub struct MemoryCursor {
    replica: Arc<MemoryReplica>,
    columns: Vec<String>,
    rows: VecDeque<Row>,
    fail_after_rows: Option<u64>,
    row_delay: Option<Duration>,
    rows_read: u64,
    exhausted: bool,
}

impl MemoryCursor {
    pub(crate) fn new(
        replica: Arc<MemoryReplica>,
        columns: Vec<String>,
        rows: Vec<Row>,
        fail_after_rows: Option<u64>,
        row_delay: Option<Duration>,
    ) -> Self {
        Self {
            replica,
            columns,
            rows: rows.into(),
            fail_after_rows,
            row_delay,
            rows_read: 0,
            exhausted: false,
        }
    }

    /// Rows handed out so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Rows still buffered
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for MemoryCursor {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Row>, ContractError> {
        if self.exhausted {
            return Ok(None);
        }

        if let Some(delay) = self.row_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_after_rows == Some(self.rows_read) {
            return Err(ContractError::cursor(
                self.replica.name(),
                self.rows_read,
                "injected cursor failure",
            ));
        }

        match self.rows.pop_front() {
            Some(row) => {
                self.rows_read += 1;
                Ok(Some(row))
            }
            None => {
                self.exhausted = true;
                self.replica.mark_completed();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{drain, Value};

    fn cursor_with(rows: i64, delay: Option<Duration>) -> MemoryCursor {
        let replica = Arc::new(MemoryReplica::new("replica-a", None));
        MemoryCursor::new(
            replica,
            vec!["id".to_string()],
            (0..rows).map(|i| Row::new(vec![Value::Integer(i)])).collect(),
            None,
            delay,
        )
    }

    #[tokio::test]
    async fn test_exhausted_cursor_marks_completed_once() {
        let mut cursor = cursor_with(2, None);
        assert_eq!(cursor.remaining(), 2);
        assert_eq!(drain(&mut cursor).await.unwrap(), 2);
        assert_eq!(cursor.rows_read(), 2);

        // Reading past the end stays at None and does not double count
        assert!(cursor.next_row().await.unwrap().is_none());
        assert_eq!(cursor.replica.completed(), 1);
    }

    #[tokio::test]
    async fn test_row_delay_applies_per_row() {
        let mut cursor = cursor_with(3, Some(Duration::from_millis(10)));
        let start = tokio::time::Instant::now();
        drain(&mut cursor).await.unwrap();
        // 3 rows + the terminating read
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
