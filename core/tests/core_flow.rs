use std::{path::PathBuf, thread, time::Duration};

use jn_core::{
  write_value, AppLayout, AppState, CoreEngine, CoreError, CoreOptions, InputEvent, JsonDocument,
  JsonPathSegment, Key, NavCommand, NavState, Navigator, Point, StorageOptions,
};
use serde_json::{json, Value};

fn engine_with_sqlite(sqlite_path: PathBuf) -> CoreEngine {
  CoreEngine::new(CoreOptions {
    storage: StorageOptions {
      sqlite_path: Some(sqlite_path),
    },
    ..CoreOptions::default()
  })
  .unwrap()
}

fn keys(names: &[&str]) -> Vec<JsonPathSegment> {
  names.iter().map(|k| JsonPathSegment::from(*k)).collect()
}

fn read_json(path: &std::path::Path) -> Value {
  serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn delete_selected_leaf_returns_to_parent() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a": {"b": 1, "c": 2}}"#).unwrap();

  let mut doc = JsonDocument::load(&file).unwrap();
  let mut nav = Navigator::new(&doc);

  assert!(nav.enter(&doc, "a").unwrap());
  assert_eq!(nav.keys(), keys(&["b", "c"]).as_slice());
  assert_eq!(nav.depth(), 1);

  assert!(!nav.enter(&doc, "b").unwrap());
  assert!(nav.keys().is_empty());
  assert_eq!(nav.depth(), 2);

  nav.delete_selected(&mut doc).unwrap();
  assert_eq!(nav.state(), NavState::AtDepth(1));
  assert_eq!(nav.keys(), keys(&["c"]).as_slice());
  assert_eq!(doc.root(), &json!({"a": {"c": 2}}));

  // on disk, and after a fresh load
  assert_eq!(read_json(&file), json!({"a": {"c": 2}}));
  let reloaded = JsonDocument::load(&file).unwrap();
  assert!(reloaded.get(&keys(&["a", "b"])).is_none());
}

#[test]
fn enter_then_back_restores_root_keys() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"x": {"y": {"z": [true, {"w": null}]}}, "k": 0}"#).unwrap();

  let doc = JsonDocument::load(&file).unwrap();
  let mut nav = Navigator::new(&doc);
  let root_keys = nav.keys().to_vec();

  let path = vec![
    JsonPathSegment::from("x"),
    JsonPathSegment::from("y"),
    JsonPathSegment::from("z"),
    JsonPathSegment::Index(1),
    JsonPathSegment::from("w"),
  ];
  for seg in &path {
    nav.enter(&doc, seg.clone()).unwrap();
  }
  assert_eq!(nav.state(), NavState::AtLeaf(5));
  assert_eq!(nav.path().segments(), path.as_slice());

  for _ in 0..path.len() {
    nav.back();
  }
  assert_eq!(nav.state(), NavState::AtRoot);
  assert_eq!(nav.keys(), root_keys.as_slice());
  nav.back();
  assert_eq!(nav.state(), NavState::AtRoot);
}

#[test]
fn write_value_coerces_and_rewrites_file() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a": {"c": 2}}"#).unwrap();

  write_value(&file, &keys(&["a", "c"]), "99").unwrap();
  assert_eq!(read_json(&file), json!({"a": {"c": 99}}));

  write_value(&file, &keys(&["a", "d"]), "3.14").unwrap();
  write_value(&file, &keys(&["a", "e"]), "true").unwrap();
  write_value(&file, &keys(&["a", "f"]), "hello").unwrap();
  assert_eq!(
    read_json(&file),
    json!({"a": {"c": 99, "d": 3.14, "e": true, "f": "hello"}})
  );

  let text = std::fs::read_to_string(&file).unwrap();
  assert!(text.starts_with("{\n    \"a\": {\n        \"c\": 99,"));
}

#[test]
fn write_value_reports_missing_paths() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a": {"c": 2}, "s": 1}"#).unwrap();

  assert!(matches!(
    write_value(&file, &keys(&["nope", "c"]), "1"),
    Err(CoreError::PathNotFound(_))
  ));
  assert!(matches!(
    write_value(&file, &keys(&["s", "c"]), "1"),
    Err(CoreError::PathNotFound(_))
  ));
  assert!(matches!(write_value(&file, &[], "1"), Err(CoreError::InvalidArg(_))));
  assert!(matches!(
    write_value(dir.path().join("missing.json"), &keys(&["a"]), "1"),
    Err(CoreError::Io(_))
  ));
  assert_eq!(read_json(&file), json!({"a": {"c": 2}, "s": 1}));
}

#[test]
fn malformed_document_fails_to_load() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("test.json");
  std::fs::write(&file, "{ not json").unwrap();
  assert!(matches!(JsonDocument::load(&file), Err(CoreError::Malformed(_))));
}

#[test]
fn load_then_save_round_trips() {
  let dir = tempfile::tempdir().unwrap();
  let file = dir.path().join("test.json");
  let original = "{\n    \"zeta\": [\n        1,\n        2.5,\n        \"x\"\n    ],\n    \"alpha\": {\n        \"nested\": null\n    }\n}";
  std::fs::write(&file, original).unwrap();

  let mut doc = JsonDocument::load(&file).unwrap();
  doc.save().unwrap();
  assert_eq!(std::fs::read_to_string(&file).unwrap(), original);
  assert_eq!(doc.lines().len(), original.lines().count());
}

#[test]
fn save_failure_keeps_in_memory_delete() {
  let dir = tempfile::tempdir().unwrap();
  let sub = dir.path().join("sub");
  std::fs::create_dir(&sub).unwrap();
  let file = sub.join("test.json");
  std::fs::write(&file, r#"{"a": 1, "b": 2}"#).unwrap();

  let mut doc = JsonDocument::load(&file).unwrap();
  let mut nav = Navigator::new(&doc);
  nav.enter(&doc, "a").unwrap();

  // Replacing the file with a directory makes the rewrite fail.
  std::fs::remove_file(&file).unwrap();
  std::fs::create_dir(&file).unwrap();

  let err = nav.delete_selected(&mut doc).unwrap_err();
  assert!(matches!(err, CoreError::Io(_)));
  assert_eq!(doc.root(), &json!({"b": 2}));
  assert_eq!(nav.state(), NavState::AtRoot);
  assert_eq!(nav.keys(), keys(&["b"]).as_slice());
}

#[test]
fn engine_navigates_and_pages_visible_keys() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  let many: serde_json::Map<String, Value> = (0..40).map(|i| (format!("k{i}"), json!(i))).collect();
  std::fs::write(&file, json!({"many": many, "one": {"x": 1}}).to_string()).unwrap();

  let eng = engine_with_sqlite(sqlite);
  let (session, root) = eng.open_document(&file).unwrap();
  assert_eq!(root.state, NavState::AtRoot);
  assert_eq!(root.keys, keys(&["many", "one"]));

  let sid = session.session_id.clone();
  let view = eng
    .navigate(&sid, NavCommand::Enter("many".into()))
    .unwrap();
  assert_eq!(view.keys.len(), 40);

  // 60px rows, 120px viewport: 3 rows of 5 are materialized.
  let page = eng.visible_keys(&sid, 0.0, 120.0).unwrap();
  assert_eq!(page.total, 40);
  assert_eq!(page.buttons.len(), 15);
  assert_eq!(page.buttons[0].key, JsonPathSegment::from("k0"));

  let page = eng.visible_keys(&sid, 10_000.0, 120.0).unwrap();
  assert_eq!(page.scroll_offset, 360.0);
  assert_eq!(page.buttons.first().unwrap().index, 30);
  assert_eq!(page.buttons.last().unwrap().index, 39);

  let lines = eng.text_lines(&sid, 0.0, 100.0).unwrap();
  assert_eq!(lines.first_line, 0);
  assert_eq!(lines.lines.len(), 6);
  assert_eq!(lines.lines[0], "{");

  assert!(matches!(
    eng.navigate(&sid, NavCommand::Enter("missing".into())),
    Err(CoreError::InvalidArg(_))
  ));
  assert!(matches!(
    eng.view("nope"),
    Err(CoreError::UnknownSession(_))
  ));
}

#[test]
fn stored_grid_columns_apply_to_new_engines() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  let items: Vec<Value> = (0..10).map(|i| json!(i)).collect();
  std::fs::write(&file, Value::Array(items).to_string()).unwrap();

  let first = engine_with_sqlite(sqlite.clone());
  assert_eq!(first.options().grid_columns, 5);
  assert!(matches!(first.save_grid_columns(0), Err(CoreError::InvalidArg(_))));
  first.save_grid_columns(3).unwrap();

  let eng = engine_with_sqlite(sqlite.clone());
  assert_eq!(eng.options().grid_columns, 3);
  let (session, _) = eng.open_document(&file).unwrap();
  // 60px rows, 60px viewport: 2 rows of 3.
  let page = eng.visible_keys(&session.session_id, 0.0, 60.0).unwrap();
  assert_eq!(page.buttons.len(), 6);

  // A garbage value is ignored in favour of the configured default.
  eng.storage().set_setting_json("grid_columns", r#""wide""#).unwrap();
  assert_eq!(engine_with_sqlite(sqlite).options().grid_columns, 5);
}

#[test]
fn engine_write_value_then_restore_last_path() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a": {"c": 2}}"#).unwrap();

  let eng = engine_with_sqlite(sqlite);
  let (session, _) = eng.open_document(&file).unwrap();
  let sid = session.session_id.clone();

  assert!(matches!(eng.write_value(&sid, "1"), Err(CoreError::InvalidArg(_))));

  eng.navigate(&sid, NavCommand::Enter("a".into())).unwrap();
  eng.navigate(&sid, NavCommand::Enter("c".into())).unwrap();
  let view = eng.write_value(&sid, "99").unwrap();
  assert_eq!(view.state, NavState::AtLeaf(2));
  assert_eq!(read_json(&file), json!({"a": {"c": 99}}));

  // Writing an object literal turns the leaf into a container.
  let view = eng.write_value(&sid, r#"{"deep": 1}"#).unwrap();
  assert_eq!(view.state, NavState::AtDepth(2));
  assert_eq!(view.keys, keys(&["deep"]));

  eng.close(&sid).unwrap();
  let (session, root) = eng.open_document(&file).unwrap();
  assert_eq!(root.state, NavState::AtRoot);
  let restored = eng.restore_last_path(&session.session_id).unwrap();
  assert_eq!(restored.path, keys(&["a", "c"]));
}

#[test]
fn background_save_writes_current_document() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a":1,"b":2}"#).unwrap();

  let eng = engine_with_sqlite(sqlite);
  let (session, _) = eng.open_document(&file).unwrap();
  let task = eng.save_in_background(&session.session_id).unwrap();
  assert!(!task.cancellable);

  for _ in 0..200 {
    let t = eng.get_task(&task.id).unwrap();
    if t.finished {
      assert!(t.error.is_none());
      break;
    }
    thread::sleep(Duration::from_millis(5));
  }
  assert_eq!(
    std::fs::read_to_string(&file).unwrap(),
    "{\n    \"a\": 1,\n    \"b\": 2\n}"
  );
}

#[test]
fn app_clicks_keys_types_and_deletes() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a": {"b": 1, "c": 2}}"#).unwrap();

  let layout = AppLayout::default();
  let mut app = AppState::open(engine_with_sqlite(sqlite), &file, layout.clone()).unwrap();

  let frame = app.frame().unwrap();
  assert_eq!(frame.caption, "root");
  assert!(frame.controls.is_empty());
  assert_eq!(frame.key_buttons.len(), 1);
  assert_eq!(frame.key_buttons[0].label, "a/");

  // Click "a", then "c".
  let click = |app: &mut AppState, rect: jn_core::Rect| {
    let pos = Point::new(rect.x + 1.0, rect.y + 1.0);
    app.handle_event(&InputEvent::MouseDown { pos }).unwrap();
  };
  click(&mut app, frame.key_buttons[0].rect);
  let frame = app.frame().unwrap();
  assert_eq!(frame.caption, "root / a");
  assert_eq!(frame.controls.len(), 2);
  let c = frame
    .key_buttons
    .iter()
    .find(|b| b.action == Some(NavCommand::Enter("c".into())))
    .unwrap()
    .rect;
  click(&mut app, c);
  assert_eq!(app.navigator_view().unwrap().state, NavState::AtLeaf(2));

  // Type a value and press Return.
  click(&mut app, layout.input);
  assert!(app.input().is_active());
  for ch in ["4", "2"] {
    app
      .handle_event(&InputEvent::KeyDown {
        key: Key::Char,
        text: ch.into(),
        ctrl: false,
      })
      .unwrap();
  }
  app
    .handle_event(&InputEvent::KeyDown {
      key: Key::Return,
      text: String::new(),
      ctrl: false,
    })
    .unwrap();
  assert!(app.input().shows_placeholder());
  assert_eq!(read_json(&file), json!({"a": {"b": 1, "c": 42}}));

  // Delete the selected key.
  click(&mut app, layout.delete_button);
  let view = app.navigator_view().unwrap();
  assert_eq!(view.state, NavState::AtDepth(1));
  assert_eq!(view.keys, keys(&["b"]));
  assert_eq!(read_json(&file), json!({"a": {"b": 1}}));

  app.handle_event(&InputEvent::Quit).unwrap();
  assert!(!app.is_running());
}

#[test]
fn app_held_backspace_repeats_after_delay() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  std::fs::write(&file, r#"{"a": 1}"#).unwrap();

  let layout = AppLayout::default();
  let mut app = AppState::open(engine_with_sqlite(sqlite), &file, layout.clone()).unwrap();
  app
    .handle_event(&InputEvent::MouseDown {
      pos: Point::new(layout.input.x + 5.0, layout.input.y + 5.0),
    })
    .unwrap();
  app
    .handle_event(&InputEvent::KeyDown {
      key: Key::Char,
      text: "abcdefghij".into(),
      ctrl: false,
    })
    .unwrap();

  app.tick(true, 0);
  app.tick(true, 300);
  assert_eq!(app.input().text(), "abcdefghij");
  app.tick(true, 600);
  assert_eq!(app.input().text(), "abcdefghi");
  app.tick(true, 650);
  assert_eq!(app.input().text(), "abcdefgh");
  app.tick(false, 660);
  app.tick(false, 2000);
  assert_eq!(app.input().text(), "abcdefgh");

  app.tick(true, 3000);
  app.tick(true, 3600);
  app.tick(true, 3650);
  app.tick(true, 3700);
  assert_eq!(app.input().text(), "abcde");
  app.tick(true, 3750);
  assert_eq!(app.input().text(), "");
}

#[test]
fn app_wheel_scrolls_text_view_within_bounds() {
  let dir = tempfile::tempdir().unwrap();
  let sqlite = dir.path().join("t.sqlite");
  let file = dir.path().join("test.json");
  let items: Vec<Value> = (0..100).map(|i| json!(i)).collect();
  std::fs::write(&file, json!({ "items": items }).to_string()).unwrap();

  let layout = AppLayout::default();
  let mut app = AppState::open(engine_with_sqlite(sqlite), &file, layout.clone()).unwrap();
  let inside_text = Point::new(layout.text_view.x + 10.0, layout.text_view.y + 10.0);
  app.handle_event(&InputEvent::MouseMove { pos: inside_text }).unwrap();

  let frame = app.frame().unwrap();
  assert_eq!(frame.lines[0].text, "{");
  assert_eq!(frame.scroll_bars.len(), 1);

  app.handle_event(&InputEvent::MouseWheel { dy: 1.0 }).unwrap();
  let frame = app.frame().unwrap();
  assert_eq!(frame.lines[0].index, 3);
  assert_eq!(frame.lines[0].y, layout.text_view.y);

  for _ in 0..100 {
    app.handle_event(&InputEvent::MouseWheel { dy: 1.0 }).unwrap();
  }
  let frame = app.frame().unwrap();
  // 104 lines * 20px, 600px viewport: last line sits at the bottom edge.
  assert_eq!(frame.lines.last().unwrap().index, 103);

  app.handle_event(&InputEvent::MouseWheel { dy: -1000.0 }).unwrap();
  let frame = app.frame().unwrap();
  assert_eq!(frame.lines[0].index, 0);
}
