//! SQLite-backed item store.
//!
//! # Responsibility
//! - Persist items and their ordered tags in the `items` / `item_tags` tables.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Item::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Item rows are never deleted; `seq` records insertion order.
//! - Updates run inside one IMMEDIATE transaction.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use crate::model::item::{Item, ItemId, ItemStatus, ItemType};
use crate::model::tag_set::TagSet;
use crate::store::{mutate_copy, ItemStore, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    type,
    content,
    summary,
    status,
    created_at,
    derived_from
FROM items";

/// Item store persisted in one SQLite connection.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Wraps a migrated connection.
    ///
    /// Rejects connections whose schema was not bootstrapped by `db::open_db`.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ItemStore for SqliteItemStore {
    fn append(&self, item: Item) -> StoreResult<ItemId> {
        item.validate()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_item(&tx, item.id)?.is_some() {
            return Err(StoreError::DuplicateId(item.id));
        }

        tx.execute(
            "INSERT INTO items (
                id,
                type,
                content,
                summary,
                status,
                created_at,
                derived_from
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.id.to_string(),
                item.kind.as_str(),
                item.content.as_str(),
                item.summary.as_deref(),
                item.status.as_str(),
                item.created_at.timestamp_millis(),
                item.derived_from.map(|id| id.to_string()),
            ],
        )?;
        write_tags(&tx, item.id, &item.tags)?;
        tx.commit()?;

        Ok(item.id)
    }

    fn get(&self, id: ItemId) -> StoreResult<Item> {
        let conn = self.lock()?;
        load_item(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    fn update<F, E>(&self, id: ItemId, mutator: F) -> Result<Item, E>
    where
        F: FnOnce(&mut Item) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut conn = self.lock().map_err(E::from)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| E::from(StoreError::from(err)))?;
        let original = load_item(&tx, id)
            .map_err(E::from)?
            .ok_or_else(|| E::from(StoreError::NotFound(id)))?;

        let updated = mutate_copy(&original, mutator)?;
        persist_mutable_fields(&tx, &original, &updated).map_err(E::from)?;
        tx.commit().map_err(|err| E::from(StoreError::from(err)))?;
        Ok(updated)
    }

    fn all(&self) -> StoreResult<Vec<Item>> {
        let conn = self.lock()?;
        let mut tags = load_all_tags(&conn)?;
        let mut stmt = conn.prepare(&format!(
            "{ITEM_SELECT_SQL} ORDER BY created_at DESC, seq ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let labels = tags.remove(&id_text).unwrap_or_default();
            items.push(parse_item_row(row, TagSet::from_labels(labels))?);
        }
        Ok(items)
    }

    fn len(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative item count `{count}`")))
    }
}

fn load_item(conn: &Connection, id: ItemId) -> StoreResult<Option<Item>> {
    let id_text = id.to_string();
    let labels = load_tags(conn, &id_text)?;
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id_text.as_str()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row, TagSet::from_labels(labels))?));
    }

    Ok(None)
}

fn persist_mutable_fields(conn: &Connection, original: &Item, updated: &Item) -> StoreResult<()> {
    conn.execute(
        "UPDATE items
         SET
            summary = ?1,
            status = ?2
         WHERE id = ?3;",
        params![
            updated.summary.as_deref(),
            updated.status.as_str(),
            updated.id.to_string(),
        ],
    )?;

    if original.tags != updated.tags {
        conn.execute(
            "DELETE FROM item_tags WHERE item_id = ?1;",
            [updated.id.to_string()],
        )?;
        write_tags(conn, updated.id, &updated.tags)?;
    }
    Ok(())
}

fn write_tags(conn: &Connection, id: ItemId, tags: &TagSet) -> StoreResult<()> {
    let id_text = id.to_string();
    let mut stmt = conn.prepare(
        "INSERT INTO item_tags (item_id, position, label) VALUES (?1, ?2, ?3);",
    )?;
    for (position, label) in tags.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| StoreError::InvalidData(format!("tag position overflow for {id}")))?;
        stmt.execute(params![id_text.as_str(), position, label])?;
    }
    Ok(())
}

fn load_tags(conn: &Connection, id_text: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT label
         FROM item_tags
         WHERE item_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id_text])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        labels.push(row.get::<_, String>(0)?);
    }
    Ok(labels)
}

fn load_all_tags(conn: &Connection) -> StoreResult<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, label
         FROM item_tags
         ORDER BY item_id ASC, position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tags: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let item_id: String = row.get(0)?;
        let label: String = row.get(1)?;
        tags.entry(item_id).or_default().push(label);
    }
    Ok(tags)
}

fn parse_item_row(row: &Row<'_>, tags: TagSet) -> StoreResult<Item> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "items.id")?;

    let type_text: String = row.get("type")?;
    let kind = type_text.parse::<ItemType>().map_err(|_| {
        StoreError::InvalidData(format!("invalid item type `{type_text}` in items.type"))
    })?;

    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ItemStatus>().map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid item status `{status_text}` in items.status"
        ))
    })?;

    let created_ms: i64 = row.get("created_at")?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid timestamp `{created_ms}` in items.created_at"
        ))
    })?;

    let derived_from = match row.get::<_, Option<String>>("derived_from")? {
        Some(value) => Some(parse_uuid(&value, "items.derived_from")?),
        None => None,
    };

    let item = Item {
        id,
        content: row.get("content")?,
        kind,
        summary: row.get("summary")?,
        tags,
        status,
        created_at,
        derived_from,
    };
    item.validate()?;
    Ok(item)
}

fn parse_uuid(value: &str, column: &str) -> StoreResult<ItemId> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["items", "item_tags"] {
        let found: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1;",
                [table],
                |row| row.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
