use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

mod ad_helpers;
mod category_helpers;
mod comment_helpers;
mod like_helpers;
mod user_helpers;

pub use ad_helpers::*;
pub use category_helpers::*;
pub use comment_helpers::*;
pub use like_helpers::*;
pub use user_helpers::*;

/// A bind value for SQL assembled at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Null,
}

/// Joins optional clauses with a separator, collecting bind values in
/// placeholder order. Clauses whose value is `None` are skipped.
struct QueryBuilder {
    query: String,
    params: Vec<SqlParam>,
    seperator: &'static str,
    counter: usize,
}

impl QueryBuilder {
    fn new(initial: &str, seperator: &'static str) -> Self {
        Self {
            query: initial.to_owned(),
            params: vec![],
            seperator,
            counter: 0,
        }
    }

    fn add_param(mut self, clause: &str, param: Option<SqlParam>) -> Self {
        if let Some(value) = param {
            self.query.push_str(clause);
            self.query.push_str(self.seperator);
            self.params.push(value);
            self.counter += 1;
        }
        self
    }

    /// Adds `wrap.0 (clause OR clause ...) wrap.1`, one `clause` per value.
    fn add_any(mut self, clause: &str, wrap: (&str, &str), values: Vec<SqlParam>) -> Self {
        if values.is_empty() {
            return self;
        }
        let alternatives = vec![clause; values.len()].join(" OR ");
        self.query
            .push_str(&format!("{}({}){}", wrap.0, alternatives, wrap.1));
        self.query.push_str(self.seperator);
        self.params.extend(values);
        self.counter += 1;
        self
    }

    fn trim(mut self) -> Self {
        self.query = self.query.trim_end_matches(self.seperator).to_string();
        self
    }

    /// Returns an empty query when no clause was added.
    fn build(mut self) -> (String, Vec<SqlParam>) {
        self = self.trim();
        if self.counter == 0 {
            self.query = String::new();
        }
        (self.query, self.params)
    }
}

/// `%needle%` for `LIKE ... ESCAPE '\'`, with the needle's own wildcards escaped.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ----------------- Helper Functions -----------------

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT id, username, password, first_name, last_name, created_at FROM users WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT id, username, password, first_name, last_name, created_at FROM users WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}
