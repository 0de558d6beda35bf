use anyhow::Result;
use rusqlite::Connection;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(())
}

pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS analyses (
  id INTEGER PRIMARY KEY,
  username TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  acne_count INTEGER NOT NULL,
  face_found INTEGER NOT NULL DEFAULT 0,
  detail_json TEXT NOT NULL,
  advice_json TEXT NOT NULL,
  image_result TEXT
);

CREATE INDEX IF NOT EXISTS idx_analyses_user ON analyses(username, created_at);
"#,
    )?;

    // databases created before annotated images were kept lack the column
    if !has_column(conn, "analyses", "image_result")? {
        conn.execute("ALTER TABLE analyses ADD COLUMN image_result TEXT", [])?;
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in rows {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
