//! v002 -- Expression indexes for the hot filter fields.
//!
//! Camera status, live detection and history lookups all filter on
//! `groupId`; summaries filter detections on `userId`.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_documents_group_id
    ON documents(collection, json_extract(body, '$."groupId"'));

CREATE INDEX IF NOT EXISTS idx_documents_user_id
    ON documents(collection, json_extract(body, '$."userId"'));
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
