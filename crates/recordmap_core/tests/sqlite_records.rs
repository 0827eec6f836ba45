use recordmap_core::db::{open_db, open_db_in_memory};
use recordmap_core::{FinderArg, MapperError, RecordState, RecordType, Value};
use rusqlite::Connection;
use std::sync::Arc;

const CATEGORIES_SQL: &str = "CREATE TABLE categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    position INTEGER,
    created_at TEXT,
    updated_at TEXT
);";

fn categories_db() -> (Arc<Connection>, Arc<RecordType>) {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(CATEGORIES_SQL).unwrap();
    let conn = Arc::new(conn);
    let categories = RecordType::builder("categories")
        .build(conn.clone())
        .unwrap();
    (conn, categories)
}

fn insert_named(categories: &Arc<RecordType>, name: &str) -> i64 {
    let mut record = categories.new_record().unwrap().with("name", name).unwrap();
    record.save().unwrap();
    record.id().as_i64().unwrap()
}

#[test]
fn discovers_columns_in_table_order() {
    let (_conn, categories) = categories_db();

    assert_eq!(
        categories.columns().unwrap(),
        &["id", "name", "position", "created_at", "updated_at"]
    );
    assert_eq!(categories.quoter().quote_char(), '`');
}

#[test]
fn save_then_get_by_id_roundtrip() {
    let (_conn, categories) = categories_db();

    let mut record = categories.new_record().unwrap().with("name", "Books").unwrap();
    record.save().unwrap();
    let id = record.id().clone();
    assert_eq!(id, Value::Integer(1));

    let loaded = categories.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.get("name"), Some(&Value::from("Books")));
    assert_eq!(loaded.state(), RecordState::Fetched);

    let created_at = loaded.get("created_at").and_then(Value::as_str).unwrap();
    assert_eq!(created_at.len(), "YYYY-MM-DD HH:MM:SS".len());
    assert_eq!(loaded.get("updated_at"), loaded.get("created_at"));
}

#[test]
fn update_persists_changed_fields() {
    let (_conn, categories) = categories_db();
    let id = insert_named(&categories, "Books");

    let mut record = categories.get_by_id(id).unwrap().unwrap();
    record.set("name", "Comics").unwrap();
    record.set("position", 4).unwrap();
    record.save().unwrap();

    let loaded = categories.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.get("name"), Some(&Value::from("Comics")));
    assert_eq!(loaded.get("position"), Some(&Value::Integer(4)));
    assert_eq!(categories.count_where("", Vec::new()).unwrap(), 1);
}

#[test]
fn falsy_values_are_stored_as_null() {
    let (_conn, categories) = categories_db();

    let mut record = categories
        .new_record()
        .unwrap()
        .with("name", "0")
        .unwrap()
        .with("position", 0)
        .unwrap();
    record.save().unwrap();

    let loaded = categories.get_by_id(record.id().clone()).unwrap().unwrap();
    assert_eq!(loaded.get("name"), Some(&Value::Null));
    assert_eq!(loaded.get("position"), Some(&Value::Null));
}

#[test]
fn finders_match_single_values_and_lists() {
    let (_conn, categories) = categories_db();
    for name in ["Books", "Games", "Music", "Books"] {
        insert_named(&categories, name);
    }

    assert_eq!(categories.find_by("name", "Books").unwrap().len(), 2);
    assert_eq!(
        categories
            .count_by("name", FinderArg::list(["Books", "Games"]))
            .unwrap(),
        3
    );
    assert_eq!(categories.count_by("name", FinderArg::List(Vec::new())).unwrap(), 0);
    assert_eq!(categories.find(3).unwrap()[0].get("name"), Some(&Value::from("Music")));

    let rows = categories
        .fetch_all_where("`name` <> ? ORDER BY `id` DESC", vec![Value::from("Books")])
        .unwrap();
    let names = rows
        .iter()
        .map(|record| record.get("name").cloned().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec![Value::from("Music"), Value::from("Games")]);
}

#[test]
fn first_last_and_fetch_one_where() {
    let (_conn, categories) = categories_db();
    assert!(categories.first().unwrap().is_none());

    for name in ["a", "b", "c"] {
        insert_named(&categories, name);
    }

    assert_eq!(
        categories.first().unwrap().unwrap().get("name"),
        Some(&Value::from("a"))
    );
    assert_eq!(
        categories.last().unwrap().unwrap().get("name"),
        Some(&Value::from("c"))
    );
    let found = categories
        .fetch_one_where("`name` = ?", vec![Value::from("b")])
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), &Value::Integer(2));
}

#[test]
fn delete_and_delete_by_id_remove_rows() {
    let (_conn, categories) = categories_db();
    let first = insert_named(&categories, "a");
    let second = insert_named(&categories, "b");

    let mut record = categories.get_by_id(first).unwrap().unwrap();
    record.delete().unwrap();
    assert!(categories.get_by_id(first).unwrap().is_none());

    assert_eq!(categories.delete_by_id(second).unwrap(), 1);
    assert_eq!(categories.delete_by_id(second).unwrap(), 0);
    assert_eq!(categories.count_where("", Vec::new()).unwrap(), 0);
}

#[test]
fn to_map_serializes_every_column_in_order() {
    let (_conn, categories) = categories_db();
    let id = insert_named(&categories, "Books");
    let record = categories.get_by_id(id).unwrap().unwrap();

    let map = record.to_map();
    assert_eq!(
        map.keys().collect::<Vec<_>>(),
        vec!["id", "name", "position", "created_at", "updated_at"]
    );

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], serde_json::json!(id));
    assert_eq!(json["name"], serde_json::json!("Books"));
    assert!(json["position"].is_null());

    let mut cleared = record.clone();
    cleared.clear();
    assert!(cleared.to_map().iter().all(|(_, value)| value.is_null()));
    assert_eq!(record.get("name"), Some(&Value::from("Books")));
}

#[test]
fn non_finite_reals_are_saved() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE readings (id INTEGER PRIMARY KEY, value REAL);")
        .unwrap();
    let readings = RecordType::builder("readings")
        .build(Arc::new(conn))
        .unwrap();

    let mut ids = Vec::new();
    for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        let mut record = readings.new_record().unwrap().with("value", value).unwrap();
        record.save().unwrap();
        ids.push(record.id().clone());
    }

    let stored = ids
        .into_iter()
        .map(|id| readings.get_by_id(id).unwrap().unwrap().get("value").cloned())
        .collect::<Vec<_>>();
    assert_eq!(
        stored,
        vec![
            Some(Value::Real(f64::INFINITY)),
            Some(Value::Real(f64::NEG_INFINITY)),
            Some(Value::Null),
        ]
    );
}

#[test]
fn storage_errors_surface_unchanged() {
    let (_conn, categories) = categories_db();

    let err = categories
        .fetch_all_where("`no_such_column` = ?", vec![Value::Integer(1)])
        .unwrap_err();
    match err {
        MapperError::Storage {
            operation, source, ..
        } => {
            assert_eq!(operation, "fetch_all");
            assert!(source.to_string().contains("no_such_column"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_table_fails_schema_discovery() {
    let conn = Arc::new(open_db_in_memory().unwrap());
    let ghosts = RecordType::builder("ghosts").build(conn).unwrap();

    let err = ghosts.new_record().unwrap_err();
    assert!(matches!(err, MapperError::SchemaDiscovery { ref table, .. } if table == "ghosts"));
}

#[test]
fn file_database_persists_records_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch(CATEGORIES_SQL).unwrap();
        let categories = RecordType::builder("categories")
            .build(Arc::new(conn))
            .unwrap();
        insert_named(&categories, "Books");
    }

    let categories = RecordType::builder("categories")
        .build(Arc::new(open_db(&path).unwrap()))
        .unwrap();
    assert_eq!(categories.count_by("name", "Books").unwrap(), 1);
}
