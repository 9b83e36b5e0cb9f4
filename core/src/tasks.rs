use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  engine::CoreError,
  models::{Task, TaskKind},
};

#[derive(Debug, Clone)]
pub struct TaskManagerOptions {
  pub max_concurrent_tasks: usize,
}

/// Runs persistence jobs off the caller's thread and keeps their status for polling.
#[derive(Clone)]
pub struct TaskManager {
  opts: TaskManagerOptions,
  tasks: Arc<Mutex<HashMap<String, Arc<TaskState>>>>,
  running: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct TaskState {
  id: String,
  kind: TaskKind,
  started_at_ms: i64,
  progress: AtomicU8,
  finished: AtomicBool,
  error: Mutex<Option<String>>,
}

pub(crate) struct StartedTask {
  pub id: String,
}

impl TaskManager {
  pub fn new(opts: TaskManagerOptions) -> Self {
    Self {
      opts,
      tasks: Arc::new(Mutex::new(HashMap::new())),
      running: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// Start `job` on its own thread. Jobs are not cancellable; they finish or fail.
  pub(crate) fn spawn<F>(&self, kind: TaskKind, job: F) -> Result<StartedTask, CoreError>
  where
    F: FnOnce() -> Result<(), CoreError> + Send + 'static,
  {
    let now_running = self.running.load(Ordering::SeqCst);
    if now_running >= self.opts.max_concurrent_tasks {
      return Err(CoreError::Task(format!(
        "too many concurrent tasks (max {})",
        self.opts.max_concurrent_tasks
      )));
    }
    self.running.fetch_add(1, Ordering::SeqCst);

    let id = Uuid::new_v4().to_string();
    let state = Arc::new(TaskState {
      id: id.clone(),
      kind,
      started_at_ms: now_ms(),
      progress: AtomicU8::new(0),
      finished: AtomicBool::new(false),
      error: Mutex::new(None),
    });
    self.tasks.lock().insert(id.clone(), state.clone());

    let running = self.running.clone();
    thread::spawn(move || {
      if let Err(e) = job() {
        warn!(task = %state.id, error = %e, "task failed");
        *state.error.lock() = Some(e.to_string());
      }
      state.progress.store(100, Ordering::SeqCst);
      state.finished.store(true, Ordering::SeqCst);
      running.fetch_sub(1, Ordering::SeqCst);
      debug!(task = %state.id, "task finished");
    });

    Ok(StartedTask { id })
  }

  pub fn get_task(&self, task_id: &str) -> Result<Task, String> {
    let t = self
      .tasks
      .lock()
      .get(task_id)
      .cloned()
      .ok_or_else(|| format!("unknown task: {task_id}"))?;
    let error = t.error.lock().clone();
    Ok(Task {
      id: t.id.clone(),
      kind: t.kind.clone(),
      started_at_ms: t.started_at_ms,
      progress_0_100: t.progress.load(Ordering::SeqCst),
      cancellable: false,
      finished: t.finished.load(Ordering::SeqCst),
      error,
    })
  }

  /// Forget finished tasks. Returns how many were dropped.
  pub fn prune_finished(&self) -> usize {
    let mut tasks = self.tasks.lock();
    let before = tasks.len();
    tasks.retain(|_, t| !t.finished.load(Ordering::SeqCst));
    before - tasks.len()
  }
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}
