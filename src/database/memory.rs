//! In-process stores used for local runs (`STORAGE_BACKEND=memory`) and the
//! router-level tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::message_store::MessageStore;
use crate::database::responder_store::ResponderStore;
use crate::error::{Error, Result};
use crate::models::message_record::{MessageRecord, MessageRecordChanges, NewMessageRecord};
use crate::models::responder::{
    NewResponder, ResponderChanges, ResponderField, ResponderPage, ResponderQuery, ResponderRow,
    SortDirection,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct MemoryMessageStore {
    records: Mutex<Vec<MessageRecord>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn list(&self) -> Result<Vec<MessageRecord>> {
        Ok(lock(&self.records)?.clone())
    }

    async fn insert(&self, record: NewMessageRecord) -> Result<MessageRecord> {
        let now = Utc::now();
        let created = MessageRecord {
            id: Uuid::new_v4(),
            text_received: record.text_received,
            response_by_bot: record.response_by_bot,
            bot_id: record.bot_id,
            created_at: now,
            updated_at: now,
        };
        lock(&self.records)?.push(created.clone());
        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<MessageRecord>> {
        Ok(lock(&self.records)?.iter().find(|r| r.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: MessageRecordChanges,
    ) -> Result<Option<MessageRecord>> {
        let mut records = lock(&self.records)?;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(text) = changes.text_received {
            record.text_received = text;
        }
        if let Some(response) = changes.response_by_bot {
            record.response_by_bot = response;
        }
        if let Some(bot_id) = changes.bot_id {
            record.bot_id = bot_id;
        }
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
struct ResponderTable {
    rows: Vec<ResponderRow>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryResponderStore {
    table: Mutex<ResponderTable>,
    permissions: Mutex<HashMap<i64, String>>,
}

impl MemoryResponderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the permission string `user_info` would hold for an admin user.
    pub fn set_permission(&self, user_id: i64, permission: impl Into<String>) -> Result<()> {
        lock(&self.permissions)?.insert(user_id, permission.into());
        Ok(())
    }
}

fn matches(row: &ResponderRow, query: &ResponderQuery) -> bool {
    if let Some(bot_id) = query.bot_id {
        if row.botid != bot_id {
            return false;
        }
    }
    if let Some((field, value)) = &query.field_filter {
        if field.value_of(row) != *value {
            return false;
        }
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let hit = ResponderField::ALL
            .iter()
            .any(|field| field.value_of(row).to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if let Some(allowed) = &query.allowed_texts {
        if !allowed.iter().any(|token| *token == row.text_recieved) {
            return false;
        }
    }
    true
}

fn compare(field: ResponderField, a: &ResponderRow, b: &ResponderRow) -> Ordering {
    match field {
        ResponderField::Id => a.id.cmp(&b.id),
        ResponderField::BotId => a.botid.cmp(&b.botid).then(a.id.cmp(&b.id)),
        ResponderField::TextRecieved => a
            .text_recieved
            .cmp(&b.text_recieved)
            .then(a.id.cmp(&b.id)),
        ResponderField::ResponseByBot => a
            .response_by_bot
            .cmp(&b.response_by_bot)
            .then(a.id.cmp(&b.id)),
    }
}

#[async_trait]
impl ResponderStore for MemoryResponderStore {
    async fn list(&self, query: &ResponderQuery) -> Result<ResponderPage> {
        let table = lock(&self.table)?;
        let mut rows: Vec<ResponderRow> = table
            .rows
            .iter()
            .filter(|row| matches(row, query))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let ord = compare(query.order_by, a, b);
            match query.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = rows.len() as i64;
        let offset = query.offset.max(0) as usize;
        let rows = match query.limit {
            Some(limit) => rows.into_iter().skip(offset).take(limit.max(0) as usize).collect(),
            None => rows,
        };
        Ok(ResponderPage { rows, total })
    }

    async fn find_by(&self, field: ResponderField, value: &str) -> Result<Option<ResponderRow>> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .iter()
            .find(|row| field.value_of(row) == value)
            .cloned())
    }

    async fn insert(&self, row: NewResponder) -> Result<i64> {
        let mut table = lock(&self.table)?;
        table.next_id += 1;
        let id = table.next_id;
        let now = Utc::now();
        table.rows.push(ResponderRow {
            id,
            text_recieved: row.text_recieved,
            response_by_bot: row.response_by_bot,
            botid: row.botid,
            created_at: Some(now),
            updated_at: Some(now),
        });
        Ok(id)
    }

    async fn update(&self, id: i64, changes: ResponderChanges) -> Result<u64> {
        let mut table = lock(&self.table)?;
        let Some(row) = table.rows.iter_mut().find(|row| row.id == id) else {
            return Ok(0);
        };
        if let Some(text) = changes.text_recieved {
            row.text_recieved = text;
        }
        if let Some(response) = changes.response_by_bot {
            row.response_by_bot = response;
        }
        row.updated_at = Some(Utc::now());
        Ok(1)
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        let mut table = lock(&self.table)?;
        let before = table.rows.len();
        table.rows.retain(|row| !ids.contains(&row.id));
        Ok((before - table.rows.len()) as u64)
    }

    async fn user_permission(&self, user_id: i64) -> Result<Option<String>> {
        Ok(lock(&self.permissions)?.get(&user_id).cloned())
    }
}
