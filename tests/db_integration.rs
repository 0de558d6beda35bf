use std::collections::BTreeMap;
use dermaface::advice::Advice;
use dermaface::db;
use dermaface::db::{query, writer};
use dermaface::models::analysis::NewAnalysis;
use tempfile::TempDir;

fn setup_test_db() -> (TempDir, rusqlite::Connection) {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");
    let conn = db::open_or_create(&db_path).unwrap();
    (tmp, conn)
}

fn analysis(user: &str, ts: i64) -> NewAnalysis {
    let mut detail = BTreeMap::new();
    detail.insert("pustula".to_string(), 2);
    detail.insert("komedo".to_string(), 1);
    NewAnalysis {
        username: user.to_string(),
        created_at: ts,
        acne_count: 3,
        face_found: true,
        detail,
        advice: vec![Advice {
            kind: "pustula".to_string(),
            treatment: "Benzoyl peroxide".to_string(),
            advice: "Jangan dipencet.".to_string(),
            known: true,
        }],
        image_result: Some("data:image/jpeg;base64,/9j/AA==".to_string()),
    }
}

#[test]
fn test_insert_and_read_back() {
    let (_tmp, conn) = setup_test_db();
    let id = writer::insert_analysis(&conn, &analysis("budi", 10)).unwrap();
    assert!(id > 0);

    let rows = query::list_analyses(&conn, "budi", 10).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, id);
    assert_eq!(row.acne_count, 3);
    assert!(row.face_found);
    assert_eq!(row.detail.get("pustula"), Some(&2));
    assert_eq!(row.advice[0].treatment, "Benzoyl peroxide");
    assert_eq!(row.image_result.as_deref(), Some("data:image/jpeg;base64,/9j/AA=="));
}

#[test]
fn test_missing_image_reads_back_as_none() {
    let (_tmp, conn) = setup_test_db();
    let mut a = analysis("budi", 1);
    a.image_result = None;
    writer::insert_analysis(&conn, &a).unwrap();
    let rows = query::list_analyses(&conn, "budi", 10).unwrap();
    assert!(rows[0].image_result.is_none());
}

#[test]
fn test_history_is_per_user() {
    let (_tmp, conn) = setup_test_db();
    writer::insert_analysis(&conn, &analysis("budi", 1)).unwrap();
    writer::insert_analysis(&conn, &analysis("ani", 2)).unwrap();
    writer::insert_analysis(&conn, &analysis("budi", 3)).unwrap();

    assert_eq!(query::count_analyses(&conn, "budi").unwrap(), 2);
    assert_eq!(query::count_analyses(&conn, "ani").unwrap(), 1);
    assert_eq!(writer::delete_analyses_for_user(&conn, "budi").unwrap(), 2);
    assert_eq!(query::count_analyses(&conn, "budi").unwrap(), 0);
    assert_eq!(query::count_analyses(&conn, "ani").unwrap(), 1);
}

#[test]
fn test_same_timestamp_orders_by_insertion() {
    let (_tmp, conn) = setup_test_db();
    let first = writer::insert_analysis(&conn, &analysis("budi", 5)).unwrap();
    let second = writer::insert_analysis(&conn, &analysis("budi", 5)).unwrap();
    let rows = query::list_analyses(&conn, "budi", 10).unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second, first]);
}

#[test]
fn test_limit_is_clamped() {
    let (_tmp, conn) = setup_test_db();
    for ts in 0..3 {
        writer::insert_analysis(&conn, &analysis("budi", ts)).unwrap();
    }
    assert_eq!(query::list_analyses(&conn, "budi", 0).unwrap().len(), 1);
    assert_eq!(query::list_analyses(&conn, "budi", -5).unwrap().len(), 1);
    assert_eq!(query::list_analyses(&conn, "budi", 10_000).unwrap().len(), 3);
}

#[test]
fn test_pool_creates_parent_dirs_and_reopens() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("db").join("derma.db");
    {
        let pool = db::create_pool(&path, 2).unwrap();
        let conn = pool.get().unwrap();
        writer::insert_analysis(&conn, &analysis("budi", 1)).unwrap();
    }
    let pool = db::create_pool(&path, 2).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!(query::count_analyses(&conn, "budi").unwrap(), 1);
}
