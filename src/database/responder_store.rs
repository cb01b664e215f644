use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::responder::{
    NewResponder, ResponderChanges, ResponderField, ResponderPage, ResponderQuery, ResponderRow,
};

/// Persistence for the admin panel's relational `message_responder` table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponderStore: Send + Sync {
    async fn list(&self, query: &ResponderQuery) -> Result<ResponderPage>;
    /// Numeric columns expect `value` to already be a valid integer.
    async fn find_by(&self, field: ResponderField, value: &str) -> Result<Option<ResponderRow>>;
    async fn insert(&self, row: NewResponder) -> Result<i64>;
    /// Returns the number of affected rows.
    async fn update(&self, id: i64, changes: ResponderChanges) -> Result<u64>;
    async fn delete_many(&self, ids: &[i64]) -> Result<u64>;
    /// Comma-separated permission string of an admin user.
    async fn user_permission(&self, user_id: i64) -> Result<Option<String>>;
}

const COLUMNS: &str = "id, text_recieved, response_by_bot, botid, created_at, updated_at";

#[derive(Clone)]
pub struct PgResponderStore {
    pool: PgPool,
}

impl PgResponderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Equality predicate for a column against a text-bound parameter.
fn equals_param(field: ResponderField, idx: usize) -> String {
    match field {
        ResponderField::Id | ResponderField::BotId => {
            format!("{} = CAST(${} AS BIGINT)", field.column(), idx)
        }
        ResponderField::TextRecieved | ResponderField::ResponseByBot => {
            format!("{} = ${}", field.column(), idx)
        }
    }
}

/// Escapes `LIKE` wildcards so the search term matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Statements for one list call. Binds go in order: `args`, then the
/// allow-list array, then LIMIT and OFFSET (items only).
struct ListStatements {
    items: String,
    total: String,
    args: Vec<String>,
}

fn list_statements(query: &ResponderQuery) -> ListStatements {
    let mut filters = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(bot_id) = query.bot_id {
        filters.push(equals_param(ResponderField::BotId, args.len() + 1));
        args.push(bot_id.to_string());
    }
    if let Some((field, value)) = &query.field_filter {
        filters.push(equals_param(*field, args.len() + 1));
        args.push(value.clone());
    }
    if let Some(search) = &query.search {
        let idx = args.len() + 1;
        let matches = [
            "CAST(id AS TEXT)",
            "text_recieved",
            "response_by_bot",
            "CAST(botid AS TEXT)",
        ]
        .iter()
        .map(|column| format!(r"{column} ILIKE ${idx} ESCAPE '\'"))
        .collect::<Vec<_>>()
        .join(" OR ");
        filters.push(format!("({})", matches));
        args.push(format!("%{}%", escape_like(search)));
    }
    if query.allowed_texts.is_some() {
        filters.push(format!("text_recieved = ANY(${})", args.len() + 1));
    }

    let where_clause = if filters.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", filters.join(" AND "))
    };
    let next_param = args.len() + usize::from(query.allowed_texts.is_some()) + 1;
    let limit_clause = if query.limit.is_some() {
        format!(" LIMIT ${} OFFSET ${}", next_param, next_param + 1)
    } else {
        "".to_string()
    };

    let direction = query.direction.keyword();
    let mut order_clause = format!("{} {}", query.order_by.column(), direction);
    if query.order_by != ResponderField::Id {
        order_clause.push_str(&format!(", id {}", direction));
    }

    ListStatements {
        items: format!(
            "SELECT {} FROM message_responder {} ORDER BY {}{}",
            COLUMNS, where_clause, order_clause, limit_clause
        ),
        total: format!("SELECT COUNT(*) FROM message_responder {}", where_clause),
        args,
    }
}

#[async_trait]
impl ResponderStore for PgResponderStore {
    async fn list(&self, query: &ResponderQuery) -> Result<ResponderPage> {
        let statements = list_statements(query);

        let mut items_statement = sqlx::query_as::<_, ResponderRow>(&statements.items);
        for value in &statements.args {
            items_statement = items_statement.bind(value);
        }
        if let Some(allowed) = &query.allowed_texts {
            items_statement = items_statement.bind(allowed.clone());
        }
        if let Some(limit) = query.limit {
            items_statement = items_statement.bind(limit).bind(query.offset);
        }
        let rows = items_statement.fetch_all(&self.pool).await?;

        let mut total_statement = sqlx::query_scalar::<_, i64>(&statements.total);
        for value in &statements.args {
            total_statement = total_statement.bind(value);
        }
        if let Some(allowed) = &query.allowed_texts {
            total_statement = total_statement.bind(allowed.clone());
        }
        let total = total_statement.fetch_one(&self.pool).await?;

        Ok(ResponderPage { rows, total })
    }

    async fn find_by(&self, field: ResponderField, value: &str) -> Result<Option<ResponderRow>> {
        let statement = format!(
            "SELECT {} FROM message_responder WHERE {} LIMIT 1",
            COLUMNS,
            equals_param(field, 1)
        );
        let row = sqlx::query_as::<_, ResponderRow>(&statement)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert(&self, row: NewResponder) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO message_responder (text_recieved, response_by_bot, botid)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&row.text_recieved)
        .bind(&row.response_by_bot)
        .bind(row.botid)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(&self, id: i64, changes: ResponderChanges) -> Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE message_responder
            SET
                text_recieved = COALESCE($2, text_recieved),
                response_by_bot = COALESCE($3, response_by_bot),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.text_recieved)
        .bind(changes.response_by_bot)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        let res = sqlx::query("DELETE FROM message_responder WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }

    async fn user_permission(&self, user_id: i64) -> Result<Option<String>> {
        let permission = sqlx::query_scalar::<_, Option<String>>(
            "SELECT permission FROM user_info WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission.flatten())
    }
}
