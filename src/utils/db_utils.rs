use crate::error::ApiError;
use chrono::NaiveDate;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Date(NaiveDate),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names come from the typed request DTOs, never from the client.
pub fn build_update_sql(
    table: &str,
    columns: Vec<(&str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    if columns.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    let set_clause = columns
        .iter()
        .map(|(name, _)| format!("{} = ?", name))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = columns.into_iter().map(|(_, v)| v).collect();
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_set_clause_in_column_order() {
        let update = build_update_sql(
            "employees",
            vec![
                ("name", SqlValue::String("Ann".into())),
                ("salary", SqlValue::F64(50000.0)),
            ],
            "id",
            7,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE employees SET name = ?, salary = ? WHERE id = ?"
        );
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn empty_update_is_a_validation_error() {
        let err = build_update_sql("employees", vec![], "id", 7).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
