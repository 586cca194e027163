use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{parse_column, ChatMessage, ChatScope, MessageType};
use crate::utils::time::now_timestamp;

const MESSAGE_COLUMNS: &str = "c.id, c.scope, c.scope_id, c.user_id, u.username, c.message,
    c.message_type, c.is_pinned, c.created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        scope: parse_column(1, row.get(1)?)?,
        scope_id: row.get(2)?,
        user_id: row.get(3)?,
        username: row.get(4)?,
        message: row.get(5)?,
        message_type: parse_column(6, row.get(6)?)?,
        is_pinned: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub struct ChatRepo;

impl ChatRepo {
    pub fn insert(
        conn: &Connection,
        scope: ChatScope,
        scope_id: i64,
        user_id: i64,
        message: &str,
        message_type: MessageType,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO chat_messages (scope, scope_id, user_id, message, message_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                scope.as_str(),
                scope_id,
                user_id,
                message,
                message_type.as_str(),
                now_timestamp()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<ChatMessage>> {
        conn.query_row(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM chat_messages c JOIN users u ON u.id = c.user_id
                 WHERE c.id = ?1"
            ),
            params![id],
            message_from_row,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    /// The latest `limit` messages, returned oldest first.
    pub fn history(
        conn: &Connection,
        scope: ChatScope,
        scope_id: i64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM (
                 SELECT {MESSAGE_COLUMNS} FROM chat_messages c JOIN users u ON u.id = c.user_id
                 WHERE c.scope = ?1 AND c.scope_id = ?2
                 ORDER BY c.created_at DESC, c.id DESC LIMIT ?3
             ) ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![scope.as_str(), scope_id, limit as i64], message_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn set_pinned(conn: &Connection, id: i64, pinned: bool) -> Result<()> {
        conn.execute(
            "UPDATE chat_messages SET is_pinned = ?1 WHERE id = ?2",
            params![pinned, id],
        )?;
        Ok(())
    }

    /// Chat rows have no foreign key to their scope; clear them with it.
    pub fn delete_scope(conn: &Connection, scope: ChatScope, scope_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM chat_messages WHERE scope = ?1 AND scope_id = ?2",
            params![scope.as_str(), scope_id],
        )?;
        Ok(())
    }
}
