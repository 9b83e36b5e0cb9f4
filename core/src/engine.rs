use std::{
  collections::HashMap,
  fs,
  path::Path,
  sync::Arc,
  time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  document::{self, JsonDocument},
  models::{
    JsonNodeKind, KeyButton, KeyGridPage, NavCommand, NavigatorView, SessionInfo, Task, TaskInfo,
    TaskKind, TextLinesPage,
  },
  navigator::Navigator,
  storage::{Storage, StorageOptions},
  tasks::{TaskManager, TaskManagerOptions},
  viewport::{
    clamp_scroll, visible_grid_range, visible_line_range, GRID_COLUMNS, MIN_SCROLL_BAR_EXTENT,
  },
};

/// Settings key holding the key-grid column count as a JSON number.
const GRID_COLUMNS_SETTING: &str = "grid_columns";

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("malformed document: {0}")]
  Malformed(String),
  #[error("path not found: {0}")]
  PathNotFound(String),
  #[error("invalid argument: {0}")]
  InvalidArg(String),
  #[error("unknown session: {0}")]
  UnknownSession(String),
  #[error("storage error: {0}")]
  Storage(String),
  #[error("task error: {0}")]
  Task(String),
}

#[derive(Debug, Clone)]
pub struct CoreOptions {
  /// Overridden by a stored `grid_columns` setting when one exists.
  pub grid_columns: usize,
  /// Height of one key-button row, including spacing.
  pub row_extent: f32,
  /// Height of one line in the JSON text view.
  pub line_extent: f32,
  pub scroll_bar_min_extent: f32,
  pub max_concurrent_tasks: usize,
  pub storage: StorageOptions,
}

impl Default for CoreOptions {
  fn default() -> Self {
    Self {
      grid_columns: GRID_COLUMNS,
      row_extent: 60.0,
      line_extent: 20.0,
      scroll_bar_min_extent: MIN_SCROLL_BAR_EXTENT,
      max_concurrent_tasks: 2,
      storage: StorageOptions::default(),
    }
  }
}

#[derive(Debug)]
struct SessionState {
  info: SessionInfo,
  document: JsonDocument,
  navigator: Navigator,
}

/// One open document. `write_lock` orders every file write for the session;
/// take it before `state`.
struct SessionSlot {
  state: Mutex<SessionState>,
  write_lock: Mutex<()>,
}

#[derive(Clone)]
pub struct CoreEngine {
  options: CoreOptions,
  sessions: Arc<Mutex<HashMap<String, Arc<SessionSlot>>>>,
  tasks: TaskManager,
  storage: Storage,
}

impl CoreEngine {
  pub fn new(mut options: CoreOptions) -> Result<Self, CoreError> {
    let storage = Storage::new(options.storage.clone()).map_err(CoreError::Storage)?;
    if let Some(columns) = stored_grid_columns(&storage) {
      options.grid_columns = columns;
    }
    let tasks = TaskManager::new(TaskManagerOptions {
      max_concurrent_tasks: options.max_concurrent_tasks,
    });
    Ok(Self {
      options,
      sessions: Arc::new(Mutex::new(HashMap::new())),
      tasks,
      storage,
    })
  }

  pub fn options(&self) -> &CoreOptions {
    &self.options
  }

  /// Store the key-grid column count; engines created afterwards use it.
  pub fn save_grid_columns(&self, columns: usize) -> Result<(), CoreError> {
    if columns == 0 {
      return Err(CoreError::InvalidArg("grid needs at least one column".into()));
    }
    self
      .storage
      .set_setting_json(GRID_COLUMNS_SETTING, &columns.to_string())
      .map_err(CoreError::Storage)
  }

  /// API: open_document(path) -> { session, root view }
  pub fn open_document(
    &self,
    path: impl AsRef<Path>,
  ) -> Result<(SessionInfo, NavigatorView), CoreError> {
    let path = path.as_ref();
    let document = JsonDocument::load(path)?;
    let navigator = Navigator::new(&document);
    let view = navigator.view();

    let info = SessionInfo {
      session_id: Uuid::new_v4().to_string(),
      path: path.to_string_lossy().to_string(),
      created_at_ms: now_ms(),
    };

    if let Err(e) = self.storage.touch_recent(&info.path) {
      warn!(path = %info.path, error = %e, "could not record recent document");
    }

    let slot = Arc::new(SessionSlot {
      state: Mutex::new(SessionState {
        info: info.clone(),
        document,
        navigator,
      }),
      write_lock: Mutex::new(()),
    });
    self.sessions.lock().insert(info.session_id.clone(), slot);
    info!(session = %info.session_id, path = %info.path, "opened document");
    Ok((info, view))
  }

  pub fn close(&self, session_id: &str) -> Result<(), CoreError> {
    self
      .sessions
      .lock()
      .remove(session_id)
      .map(|_| ())
      .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))
  }

  pub fn view(&self, session_id: &str) -> Result<NavigatorView, CoreError> {
    let slot = self.slot(session_id)?;
    let s = slot.state.lock();
    Ok(s.navigator.view())
  }

  /// API: navigate(session_id, command) -> NavigatorView
  ///
  /// `Delete` rewrites the file before returning.
  pub fn navigate(&self, session_id: &str, cmd: NavCommand) -> Result<NavigatorView, CoreError> {
    let slot = self.slot(session_id)?;
    let _write = slot.write_lock.lock();
    let mut s = slot.state.lock();
    let SessionState {
      info,
      document,
      navigator,
    } = &mut *s;

    debug!(session = %info.session_id, cmd = ?cmd, "navigate");
    let result = navigator.apply(document, cmd);
    self.remember(&info.path, navigator);
    result?;
    Ok(navigator.view())
  }

  /// API: write_value(session_id, raw) -> NavigatorView
  ///
  /// Stores `coerce(raw)` at the current navigation path, then reloads the document.
  pub fn write_value(&self, session_id: &str, raw: &str) -> Result<NavigatorView, CoreError> {
    let slot = self.slot(session_id)?;
    let _write = slot.write_lock.lock();
    let mut s = slot.state.lock();
    let SessionState {
      document,
      navigator,
      ..
    } = &mut *s;

    document::write_value(document.path(), navigator.path().segments(), raw)?;
    document.reload()?;
    navigator.refresh(document);
    Ok(navigator.view())
  }

  /// Re-read the file from disk and go back to the root.
  pub fn reload(&self, session_id: &str) -> Result<NavigatorView, CoreError> {
    let slot = self.slot(session_id)?;
    let _write = slot.write_lock.lock();
    let mut s = slot.state.lock();
    let SessionState {
      document,
      navigator,
      ..
    } = &mut *s;
    document.reload()?;
    navigator.reset(document);
    Ok(navigator.view())
  }

  /// Walk back to where the user was when the document was last browsed.
  ///
  /// Stops quietly at the first step that no longer exists.
  pub fn restore_last_path(&self, session_id: &str) -> Result<NavigatorView, CoreError> {
    let slot = self.slot(session_id)?;
    let mut s = slot.state.lock();
    let SessionState {
      info,
      document,
      navigator,
    } = &mut *s;

    let last = self.storage.last_path(&info.path).map_err(CoreError::Storage)?;
    navigator.reset(document);
    for seg in last {
      if !navigator.keys().contains(&seg) {
        break;
      }
      navigator.enter(document, seg)?;
    }
    Ok(navigator.view())
  }

  /// API: visible_keys(session_id, scroll_offset, viewport_extent) -> KeyGridPage
  ///
  /// Only the keys under the viewport (plus one row) are materialized.
  pub fn visible_keys(
    &self,
    session_id: &str,
    scroll_offset: f32,
    viewport_extent: f32,
  ) -> Result<KeyGridPage, CoreError> {
    let slot = self.slot(session_id)?;
    let s = slot.state.lock();
    let keys = s.navigator.keys();
    let total = keys.len();
    let columns = self.options.grid_columns.max(1);
    let content = total.div_ceil(columns) as f32 * self.options.row_extent;
    let scroll_offset = clamp_scroll(scroll_offset, content, viewport_extent);

    let range = visible_grid_range(
      scroll_offset,
      self.options.row_extent,
      viewport_extent,
      total,
      columns,
    );
    let here = s.navigator.path().segments();
    let buttons = range
      .map(|index| {
        let key = keys[index].clone();
        let mut at = here.to_vec();
        at.push(key.clone());
        let kind = s
          .document
          .get(&at)
          .map(JsonNodeKind::of)
          .unwrap_or(JsonNodeKind::Null);
        KeyButton { index, key, kind }
      })
      .collect();

    Ok(KeyGridPage {
      buttons,
      total,
      scroll_offset,
    })
  }

  /// API: text_lines(session_id, scroll_offset, viewport_extent) -> TextLinesPage
  pub fn text_lines(
    &self,
    session_id: &str,
    scroll_offset: f32,
    viewport_extent: f32,
  ) -> Result<TextLinesPage, CoreError> {
    let slot = self.slot(session_id)?;
    let s = slot.state.lock();
    let lines = s.document.lines();
    let total = lines.len();
    let content = total as f32 * self.options.line_extent;
    let scroll_offset = clamp_scroll(scroll_offset, content, viewport_extent);
    let range = visible_line_range(scroll_offset, self.options.line_extent, viewport_extent, total);

    Ok(TextLinesPage {
      first_line: range.start,
      lines: lines[range].to_vec(),
      total,
      scroll_offset,
    })
  }

  /// Rewrite the session's file on a background thread.
  ///
  /// The snapshot is taken under the session's write lock, so writes land in
  /// the same order as the edits that produced them.
  pub fn save_in_background(&self, session_id: &str) -> Result<TaskInfo, CoreError> {
    let slot = self.slot(session_id)?;
    let started = self.tasks.spawn(TaskKind::Save, move || {
      let _write = slot.write_lock.lock();
      let (path, text) = {
        let s = slot.state.lock();
        (s.document.path().to_path_buf(), s.document.to_pretty_string()?)
      };
      fs::write(&path, text.as_bytes())?;
      info!(path = %path.display(), "background save finished");
      Ok(())
    })?;
    Ok(TaskInfo {
      id: started.id,
      kind: TaskKind::Save,
      cancellable: false,
    })
  }

  /// Poll a background task status.
  pub fn get_task(&self, task_id: &str) -> Result<Task, CoreError> {
    self.tasks.get_task(task_id).map_err(CoreError::Task)
  }

  /// Drop bookkeeping for finished tasks.
  pub fn prune_finished_tasks(&self) -> usize {
    self.tasks.prune_finished()
  }

  pub fn storage(&self) -> &Storage {
    &self.storage
  }

  fn slot(&self, session_id: &str) -> Result<Arc<SessionSlot>, CoreError> {
    self
      .sessions
      .lock()
      .get(session_id)
      .cloned()
      .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))
  }

  fn remember(&self, path: &str, navigator: &Navigator) {
    if let Err(e) = self.storage.remember_path(path, navigator.path().segments()) {
      warn!(path, error = %e, "could not remember navigation path");
    }
  }
}

fn stored_grid_columns(storage: &Storage) -> Option<usize> {
  let json = match storage.get_setting_json(GRID_COLUMNS_SETTING) {
    Ok(json) => json?,
    Err(e) => {
      warn!(error = %e, "could not read grid column setting");
      return None;
    }
  };
  match serde_json::from_str::<usize>(&json) {
    Ok(columns) if columns > 0 => Some(columns),
    _ => {
      warn!(value = %json, "ignoring invalid grid column setting");
      None
    }
  }
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}
