//! [`RecordStore`] over SQLite.

use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

use super::{Database, DbError, DbResult, RecordStore, Table};

/// The entity's `id`, which must be a string.
fn entity_id(entity: &Value) -> DbResult<&str> {
    entity
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| DbError::Constraint("entity has no string id".to_string()))
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn insert(conn: &Connection, table: Table, entity: &Value) -> DbResult<()> {
    let id = entity_id(entity)?;
    let body = serde_json::to_string(entity)?;
    let sql = format!("INSERT INTO {} (id, body) VALUES (?1, ?2)", table.name());

    conn.execute(&sql, [id, body.as_str()]).map_err(|e| {
        if is_primary_key_violation(&e) {
            DbError::Duplicate {
                table,
                id: id.to_string(),
            }
        } else {
            e.into()
        }
    })?;
    Ok(())
}

fn query_bodies<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> DbResult<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

    let mut entities = Vec::new();
    for row in rows {
        entities.push(serde_json::from_str(&row?)?);
    }
    Ok(entities)
}

impl RecordStore for Database {
    fn get_all(&self, table: Table) -> DbResult<Vec<Value>> {
        let sql = format!("SELECT body FROM {} ORDER BY rowid", table.name());
        query_bodies(&self.conn, &sql, [])
    }

    fn get_by_id(&self, table: Table, id: &str) -> DbResult<Option<Value>> {
        let sql = format!("SELECT body FROM {} WHERE id = ?1", table.name());
        let body: Option<String> = self
            .conn
            .query_row(&sql, [id], |row| row.get(0))
            .optional()?;

        body.map(|b| serde_json::from_str(&b).map_err(Into::into))
            .transpose()
    }

    fn add(&self, table: Table, entity: &Value) -> DbResult<()> {
        insert(&self.conn, table, entity)
    }

    fn put(&self, table: Table, entity: &Value) -> DbResult<()> {
        let id = entity_id(entity)?;
        let body = serde_json::to_string(entity)?;
        let sql = format!(
            r#"
            INSERT INTO {} (id, body) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET body = excluded.body, stored_at = datetime('now')
            "#,
            table.name()
        );
        self.conn.execute(&sql, [id, body.as_str()])?;
        Ok(())
    }

    fn delete(&self, table: Table, id: &str) -> DbResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        self.conn.execute(&sql, [id])?;
        Ok(())
    }

    fn find_equal(&self, table: Table, field: &str, value: &str) -> DbResult<Vec<Value>> {
        let column = table.column(field)?;
        let sql = format!(
            "SELECT body FROM {} WHERE {} = ?1 ORDER BY rowid",
            table.name(),
            column
        );
        query_bodies(&self.conn, &sql, [value])
    }

    fn find_prefix(&self, table: Table, fields: &[&str], prefix: &str) -> DbResult<Vec<Value>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        // lower() only folds ASCII, which covers ids, emails and phones
        let conditions = fields
            .iter()
            .map(|field| {
                table
                    .column(field)
                    .map(|c| format!("lower(substr({}, 1, length(?1))) = lower(?1)", c))
            })
            .collect::<DbResult<Vec<_>>>()?;

        let sql = format!(
            "SELECT body FROM {} WHERE {} ORDER BY rowid",
            table.name(),
            conditions.join(" OR ")
        );
        query_bodies(&self.conn, &sql, params_from_iter([prefix]))
    }

    fn bulk_add(&self, batches: &[(Table, Vec<Value>)]) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (table, entities) in batches {
            for entity in entities {
                insert(&tx, *table, entity)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn bulk_delete(&self, batches: &[(Table, &str, &str)]) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        for (table, field, value) in batches {
            let sql = format!("DELETE FROM {} WHERE {} = ?1", table.name(), table.column(field)?);
            removed += tx.execute(&sql, [value])?;
        }
        tx.commit()?;
        Ok(removed)
    }

    fn clear(&self, table: Table) -> DbResult<()> {
        let sql = format!("DELETE FROM {}", table.name());
        self.conn.execute(&sql, [])?;
        Ok(())
    }
}
