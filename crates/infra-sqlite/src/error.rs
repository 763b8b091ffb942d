// sqlx::Error -> AppError mapping

use pending_core::error::AppError;

// SQLite primary result codes: https://www.sqlite.org/rescode.html
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Convert sqlx::Error to AppError, classifying lock contention and
/// connection loss as transient
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let Some(code) = db_err.code() else {
                return AppError::Database(format!("Database error: {}", db_err.message()));
            };

            // Extended codes keep the primary code in the low byte
            let primary = code.parse::<i32>().ok().map(|c| c & 0xff);
            match primary {
                Some(SQLITE_BUSY) => AppError::Transient(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                Some(SQLITE_LOCKED) => AppError::Transient(format!(
                    "Table locked (SQLITE_LOCKED): {}",
                    db_err.message()
                )),
                _ => AppError::Database(format!(
                    "Database error [{}]: {}",
                    code,
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolTimedOut => {
            AppError::Transient("Timed out waiting for a database connection".to_string())
        }
        sqlx::Error::Io(io_err) => AppError::Transient(format!("Database I/O error: {}", io_err)),
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn test_pool_closed_is_permanent() {
        let err = map_sqlx_error(sqlx::Error::PoolClosed);
        assert!(!err.is_transient());
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_io_error_is_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(map_sqlx_error(sqlx::Error::Io(io)).is_transient());
    }
}
