//! `StorageConnection` implementation for `rusqlite::Connection`.

use super::{Row, Statement, StorageConnection, StorageResult};
use crate::model::value::Value;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue};
use rusqlite::{params_from_iter, Connection, ToSql};

const SQLITE_DIALECT: &str = "sqlite";

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let owned = match self {
            Self::Null => SqliteValue::Null,
            Self::Integer(value) => SqliteValue::Integer(*value),
            Self::Real(value) => SqliteValue::Real(*value),
            Self::Text(value) => SqliteValue::Text(value.clone()),
            Self::Blob(value) => SqliteValue::Blob(value.clone()),
        };
        Ok(ToSqlOutput::Owned(owned))
    }
}

impl From<SqliteValue> for Value {
    fn from(value: SqliteValue) -> Self {
        match value {
            SqliteValue::Null => Self::Null,
            SqliteValue::Integer(value) => Self::Integer(value),
            SqliteValue::Real(value) => Self::Real(value),
            SqliteValue::Text(value) => Self::Text(value),
            SqliteValue::Blob(value) => Self::Blob(value),
        }
    }
}

impl StorageConnection for Connection {
    fn dialect_name(&self) -> &str {
        SQLITE_DIALECT
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Integer(value) => value.to_string(),
            Value::Real(value) if value.is_nan() => "NULL".to_string(),
            // SQLite reads out-of-range literals as infinity.
            Value::Real(value) if value.is_infinite() => {
                let literal = if value.is_sign_positive() { "9e999" } else { "-9e999" };
                literal.to_string()
            }
            Value::Real(value) => value.to_string(),
            Value::Text(value) => format!("'{}'", value.replace('\'', "''")),
            Value::Blob(value) => {
                let hex = value
                    .iter()
                    .map(|byte| format!("{byte:02X}"))
                    .collect::<String>();
                format!("X'{hex}'")
            }
        }
    }

    fn fetch_all(&self, statement: &Statement) -> StorageResult<Vec<Row>> {
        let mut stmt = self.prepare(&statement.sql)?;
        let column_names = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let mut fields = Row::with_capacity(column_names.len());
            for (index, name) in column_names.iter().enumerate() {
                let value: SqliteValue = row.get(index)?;
                fields.insert(name.clone(), value.into());
            }
            fetched.push(fields);
        }

        Ok(fetched)
    }

    fn fetch_column(&self, statement: &Statement) -> StorageResult<Option<Value>> {
        let mut stmt = self.prepare(&statement.sql)?;
        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        match rows.next()? {
            Some(row) => {
                let value: SqliteValue = row.get(0)?;
                Ok(Some(value.into()))
            }
            None => Ok(None),
        }
    }

    fn execute(&self, statement: &Statement) -> StorageResult<usize> {
        let changed = Connection::execute(
            self,
            &statement.sql,
            params_from_iter(statement.params.iter()),
        )?;
        Ok(changed)
    }

    fn last_insert_id(&self) -> StorageResult<Value> {
        Ok(Value::Integer(self.last_insert_rowid()))
    }
}
