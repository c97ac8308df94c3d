use std::fmt::Write;

use sea_orm::{DbBackend, Statement, Value};

/// Raw SQL text with positional bind values.
///
/// Values are only ever added through `push_bind`, which emits the backend's
/// placeholder (`$n` for Postgres, `?` otherwise).
#[derive(Debug)]
pub struct SqlBuilder {
    backend: DbBackend,
    sql: String,
    values: Vec<Value>,
}

impl SqlBuilder {
    pub fn new(backend: DbBackend, init: &str) -> Self {
        Self { backend, sql: init.to_string(), values: Vec::new() }
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.values.push(value.into());
        match self.backend {
            DbBackend::Postgres => {
                let _ = write!(self.sql, "${}", self.values.len());
            },
            _ => self.sql.push('?'),
        }
        self
    }

    /// Pushes `(p1, p2, ...)` with one bind per item.
    pub fn push_bind_list<V: Into<Value>>(
        &mut self,
        items: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.sql.push('(');
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_bind(item);
        }
        self.sql.push(')');
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn build(self) -> Statement {
        Statement::from_sql_and_values(self.backend, self.sql, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_uses_question_marks() {
        let mut q = SqlBuilder::new(DbBackend::Sqlite, "SELECT 1 WHERE a = ");
        q.push_bind(1).push(" AND b IN ").push_bind_list([2, 3]);
        assert_eq!(q.sql(), "SELECT 1 WHERE a = ? AND b IN (?, ?)");
        assert_eq!(q.values().len(), 3);
    }

    #[test]
    fn postgres_numbers_placeholders_in_order() {
        let mut q = SqlBuilder::new(DbBackend::Postgres, "SELECT 1 WHERE a = ");
        q.push_bind("x").push(" AND b IN ").push_bind_list([2, 3]).push(" LIMIT ").push_bind(10);
        assert_eq!(q.sql(), "SELECT 1 WHERE a = $1 AND b IN ($2, $3) LIMIT $4");
        assert_eq!(q.values()[0], Value::from("x"));
    }
}
