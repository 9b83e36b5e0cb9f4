use std::{
  fs,
  path::{Path, PathBuf},
  time::{SystemTime, UNIX_EPOCH},
};

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::JsonPathSegment;

#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
  /// Path to SQLite file. If None, defaults to ~/.json-navigator/storage.sqlite
  /// (or %USERPROFILE% on Windows).
  pub sqlite_path: Option<PathBuf>,
}

/// Recently opened documents and user settings, kept in a small SQLite file.
#[derive(Clone)]
pub struct Storage {
  path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RecentDocument {
  pub path: String,
  pub display_name: String,
  pub last_opened_at_ms: i64,
  pub exists: bool,
  /// Navigation path the user was at when the document was last browsed.
  pub last_path: Vec<JsonPathSegment>,
}

impl Storage {
  pub fn new(opts: StorageOptions) -> Result<Self, String> {
    let path = opts.sqlite_path.unwrap_or_else(default_sqlite_path);

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let conn = Connection::open(&path).map_err(|e| e.to_string())?;
    migrate(&conn).map_err(|e| e.to_string())?;
    Ok(Self { path })
  }

  fn open(&self) -> Result<Connection, String> {
    Connection::open(&self.path).map_err(|e| e.to_string())
  }

  /// Add or refresh a recent document entry. The remembered navigation path is kept.
  pub fn touch_recent(&self, path: &str) -> Result<(), String> {
    let conn = self.open()?;
    let display_name = Path::new(path)
      .file_name()
      .and_then(|s| s.to_str())
      .unwrap_or(path)
      .to_string();
    let exists = Path::new(path).exists();

    conn
      .execute(
        r#"
INSERT INTO recent_documents(path, display_name, last_opened_at, exists_flag, last_path_json)
VALUES(?1, ?2, ?3, ?4, '[]')
ON CONFLICT(path) DO UPDATE SET
  display_name=excluded.display_name,
  last_opened_at=excluded.last_opened_at,
  exists_flag=excluded.exists_flag
        "#,
        params![path, display_name, now_ms(), exists as i32],
      )
      .map_err(|e| e.to_string())?;
    Ok(())
  }

  /// Remember where the user was inside `path`. No-op for documents never touched.
  pub fn remember_path(&self, path: &str, at: &[JsonPathSegment]) -> Result<(), String> {
    let conn = self.open()?;
    let json = serde_json::to_string(at).map_err(|e| e.to_string())?;
    conn
      .execute(
        "UPDATE recent_documents SET last_path_json=?2 WHERE path=?1",
        params![path, json],
      )
      .map_err(|e| e.to_string())?;
    Ok(())
  }

  pub fn last_path(&self, path: &str) -> Result<Vec<JsonPathSegment>, String> {
    let conn = self.open()?;
    let json: Option<String> = conn
      .query_row(
        "SELECT last_path_json FROM recent_documents WHERE path=?1",
        params![path],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| e.to_string())?;
    match json {
      Some(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
      None => Ok(vec![]),
    }
  }

  pub fn list_recent(&self, limit: usize) -> Result<Vec<RecentDocument>, String> {
    let conn = self.open()?;
    let mut stmt = conn
      .prepare(
        r#"
SELECT path, display_name, last_opened_at, exists_flag, last_path_json
FROM recent_documents
ORDER BY last_opened_at DESC, id DESC
LIMIT ?1
        "#,
      )
      .map_err(|e| e.to_string())?;

    let rows = stmt
      .query_map(params![limit as i64], |row| {
        let last_path_json: String = row.get(4)?;
        Ok(RecentDocument {
          path: row.get(0)?,
          display_name: row.get(1)?,
          last_opened_at_ms: row.get(2)?,
          exists: row.get::<_, i64>(3)? != 0,
          last_path: serde_json::from_str(&last_path_json).unwrap_or_default(),
        })
      })
      .map_err(|e| e.to_string())?;

    rows
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| e.to_string())
  }

  pub fn set_setting_json(&self, key: &str, value_json: &str) -> Result<(), String> {
    serde_json::from_str::<serde_json::Value>(value_json)
      .map_err(|e| format!("setting {key} is not valid json: {e}"))?;
    let conn = self.open()?;
    conn
      .execute(
        r#"
INSERT INTO settings(key, value_json)
VALUES(?1, ?2)
ON CONFLICT(key) DO UPDATE SET value_json=excluded.value_json
        "#,
        params![key, value_json],
      )
      .map_err(|e| e.to_string())?;
    Ok(())
  }

  pub fn get_setting_json(&self, key: &str) -> Result<Option<String>, String> {
    let conn = self.open()?;
    conn
      .query_row(
        "SELECT value_json FROM settings WHERE key=?1",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| e.to_string())
  }
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
  conn.execute_batch(
    r#"
CREATE TABLE IF NOT EXISTS recent_documents(
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  path TEXT NOT NULL UNIQUE,
  display_name TEXT NOT NULL,
  last_opened_at INTEGER NOT NULL,
  exists_flag INTEGER NOT NULL,
  last_path_json TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS settings(
  key TEXT PRIMARY KEY,
  value_json TEXT NOT NULL
);
    "#,
  )?;
  Ok(())
}

fn default_sqlite_path() -> PathBuf {
  let base = std::env::var_os("HOME")
    .or_else(|| std::env::var_os("USERPROFILE"))
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."));
  base.join(".json-navigator").join("storage.sqlite")
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}
