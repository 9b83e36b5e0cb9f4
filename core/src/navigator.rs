use tracing::{debug, info};

use crate::{
  document::{child_keys, JsonDocument},
  engine::CoreError,
  models::{JsonNodeKind, JsonPathSegment, NavCommand, NavState, NavigatorView},
  path::PathTracker,
};

/// What was on screen before an `enter`: the sibling keys and the key chosen.
///
/// The container itself is not copied; it is found again through the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationFrame {
  pub sibling_keys: Vec<JsonPathSegment>,
  pub selected: JsonPathSegment,
}

/// Walks into and out of nested containers of one [`JsonDocument`].
///
/// Invariant: `stack.len() == path.depth()`.
#[derive(Debug, Clone)]
pub struct Navigator {
  stack: Vec<NavigationFrame>,
  path: PathTracker,
  keys: Vec<JsonPathSegment>,
  at_leaf: bool,
}

impl Navigator {
  pub fn new(doc: &JsonDocument) -> Self {
    Self {
      stack: Vec::new(),
      path: PathTracker::new(),
      keys: child_keys(doc.root()),
      at_leaf: false,
    }
  }

  pub fn state(&self) -> NavState {
    match self.stack.len() {
      0 => NavState::AtRoot,
      n if self.at_leaf => NavState::AtLeaf(n),
      n => NavState::AtDepth(n),
    }
  }

  pub fn depth(&self) -> usize {
    self.stack.len()
  }

  pub fn is_root(&self) -> bool {
    self.stack.is_empty()
  }

  /// Keys offered at the current position, in document order.
  pub fn keys(&self) -> &[JsonPathSegment] {
    &self.keys
  }

  pub fn path(&self) -> &PathTracker {
    &self.path
  }

  pub fn frames(&self) -> &[NavigationFrame] {
    &self.stack
  }

  pub fn view(&self) -> NavigatorView {
    NavigatorView {
      state: self.state(),
      path: self.path.segments().to_vec(),
      keys: self.keys.clone(),
    }
  }

  /// Descend into `key`. Returns whether there is anything further to descend into.
  ///
  /// Entering a scalar still records the selection (so it can be deleted), with an
  /// empty key set.
  pub fn enter(
    &mut self,
    doc: &JsonDocument,
    key: impl Into<JsonPathSegment>,
  ) -> Result<bool, CoreError> {
    let key = key.into();
    if !self.keys.contains(&key) {
      return Err(CoreError::InvalidArg(format!(
        "key {key} is not offered at {}",
        self.path
      )));
    }

    self.path.push(key.clone());
    let Some(node) = doc.get(self.path.segments()) else {
      self.path.pop();
      return Err(CoreError::PathNotFound(format!(
        "{} / {key}",
        self.path
      )));
    };
    let kind = JsonNodeKind::of(node);
    let keys = child_keys(node);

    self.stack.push(NavigationFrame {
      sibling_keys: std::mem::replace(&mut self.keys, keys),
      selected: key,
    });
    self.at_leaf = !kind.is_container();
    debug!(path = %self.path, kind = ?kind, keys = self.keys.len(), "enter");
    Ok(!self.keys.is_empty())
  }

  /// Step up one level. Does nothing at the root.
  pub fn back(&mut self) {
    let Some(frame) = self.stack.pop() else {
      return;
    };
    self.path.pop();
    self.keys = frame.sibling_keys;
    self.at_leaf = false;
    debug!(path = %self.path, "back");
  }

  /// Delete the selected key from its direct parent, step back to that parent
  /// and rewrite the document file.
  ///
  /// If the write fails the error is returned but the in-memory deletion and the
  /// step back are kept; retry the save, not the delete.
  pub fn delete_selected(&mut self, doc: &mut JsonDocument) -> Result<(), CoreError> {
    if self.stack.is_empty() {
      return Err(CoreError::InvalidArg("nothing selected to delete at root".into()));
    }

    doc.remove(self.path.segments())?;
    let deleted = self.path.last().cloned();
    self.back();
    self.keys = doc.keys_at(self.path.segments());
    info!(parent = %self.path, key = ?deleted, "deleted key");

    doc.save()
  }

  /// Apply one widget command and report the resulting state.
  pub fn apply(&mut self, doc: &mut JsonDocument, cmd: NavCommand) -> Result<NavState, CoreError> {
    match cmd {
      NavCommand::Enter(key) => {
        self.enter(doc, key)?;
      }
      NavCommand::Back => self.back(),
      NavCommand::Delete => self.delete_selected(doc)?,
    }
    Ok(self.state())
  }

  /// Recompute the current key set after the document changed underneath.
  ///
  /// Falls back to the root when the current path no longer resolves.
  pub fn refresh(&mut self, doc: &JsonDocument) {
    match doc.get(self.path.segments()) {
      Some(node) => {
        self.keys = child_keys(node);
        self.at_leaf = !self.is_root() && !JsonNodeKind::of(node).is_container();
      }
      None => self.reset(doc),
    }
  }

  pub fn reset(&mut self, doc: &JsonDocument) {
    *self = Navigator::new(doc);
  }
}
