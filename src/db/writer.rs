use anyhow::Result;
use rusqlite::{params, Connection};

use crate::models::analysis::NewAnalysis;

pub fn insert_analysis(conn: &Connection, a: &NewAnalysis) -> Result<i64> {
    let detail_json = serde_json::to_string(&a.detail)?;
    let advice_json = serde_json::to_string(&a.advice)?;
    conn.execute(
        "INSERT INTO analyses (username, created_at, acne_count, face_found, detail_json, advice_json, image_result)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![a.username, a.created_at, a.acne_count as i64, a.face_found, detail_json, advice_json, a.image_result],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_analyses_for_user(conn: &Connection, username: &str) -> Result<usize> {
    let n = conn.execute("DELETE FROM analyses WHERE username = ?1", params![username])?;
    Ok(n)
}
