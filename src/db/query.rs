use anyhow::Result;
use rusqlite::{params, Connection, Row};

use crate::models::analysis::AnalysisRecord;

fn row_to_analysis(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let detail: String = row.get("detail_json")?;
    let advice: String = row.get("advice_json")?;
    Ok(AnalysisRecord {
        id: row.get("id")?,
        username: row.get("username")?,
        created_at: row.get("created_at")?,
        acne_count: row.get("acne_count")?,
        face_found: row.get("face_found")?,
        detail: serde_json::from_str(&detail).unwrap_or_default(),
        advice: serde_json::from_str(&advice).unwrap_or_default(),
        image_result: row.get("image_result")?,
    })
}

/// Newest first; ties on timestamp fall back to insertion order.
pub fn list_analyses(conn: &Connection, username: &str, limit: i64) -> Result<Vec<AnalysisRecord>> {
    let limit = limit.clamp(1, 500);
    let mut stmt = conn.prepare(
        "SELECT id, username, created_at, acne_count, face_found, detail_json, advice_json, image_result
         FROM analyses WHERE username = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![username, limit], row_to_analysis)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn count_analyses(conn: &Connection, username: &str) -> Result<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM analyses WHERE username = ?1", params![username], |r| r.get(0))?;
    Ok(n)
}
