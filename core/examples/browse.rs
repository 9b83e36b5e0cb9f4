use std::path::PathBuf;

use jn_core::{CoreEngine, CoreOptions, NavCommand, StorageOptions};
use tracing_subscriber::EnvFilter;

/// Open a JSON file, walk into the first key at each level, and print what is on screen.
fn main() -> Result<(), String> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let path = std::env::args()
    .nth(1)
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("test.json"));

  let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
  let eng = CoreEngine::new(CoreOptions {
    storage: StorageOptions {
      sqlite_path: Some(dir.path().join("browse.sqlite")),
    },
    ..CoreOptions::default()
  })
  .map_err(|e| e.to_string())?;

  let (session, mut view) = eng.open_document(&path).map_err(|e| e.to_string())?;
  println!("session={}", session.session_id);
  while let Some(first) = view.keys.first().cloned() {
    let page = eng
      .visible_keys(&session.session_id, 0.0, 600.0)
      .map_err(|e| e.to_string())?;
    println!("{:?} keys={} visible={}", view.path, page.total, page.buttons.len());
    view = eng
      .navigate(&session.session_id, NavCommand::Enter(first))
      .map_err(|e| e.to_string())?;
  }
  println!("stopped at {:?} ({:?})", view.path, view.state);

  let text = eng
    .text_lines(&session.session_id, 0.0, 200.0)
    .map_err(|e| e.to_string())?;
  for line in text.lines {
    println!("{line}");
  }
  Ok(())
}
