use std::{
  fs,
  path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Number, Value};
use tracing::{debug, info};

use crate::{engine::CoreError, models::JsonPathSegment, path::join_segments};

const INDENT: &[u8] = b"    ";

/// One JSON file held fully in memory.
///
/// Every mutation is followed by a full rewrite of the file; there is no
/// partial update. `lines` caches the pretty-printed text view and is kept in
/// step with `root`.
#[derive(Debug, Clone)]
pub struct JsonDocument {
  path: PathBuf,
  root: Value,
  lines: Vec<String>,
}

impl JsonDocument {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
    let path = path.as_ref().to_path_buf();
    let root = read_json_file(&path)?;
    let lines = render_lines(&root)?;
    debug!(path = %path.display(), lines = lines.len(), "loaded json document");
    Ok(Self { path, root, lines })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn root(&self) -> &Value {
    &self.root
  }

  /// Pretty-printed text of the whole document, one entry per line.
  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  pub fn get(&self, path: &[JsonPathSegment]) -> Option<&Value> {
    lookup(&self.root, path)
  }

  /// Child keys of the node at `path`; empty for scalars and missing nodes.
  pub fn keys_at(&self, path: &[JsonPathSegment]) -> Vec<JsonPathSegment> {
    self.get(path).map(child_keys).unwrap_or_default()
  }

  /// Remove the node at `path` from its direct parent and return it.
  ///
  /// Only the in-memory tree changes; call [`JsonDocument::save`] to persist.
  pub fn remove(&mut self, path: &[JsonPathSegment]) -> Result<Value, CoreError> {
    let (last, parents) = path
      .split_last()
      .ok_or_else(|| CoreError::InvalidArg("cannot remove the document root".into()))?;
    let parent = lookup_mut(&mut self.root, parents)
      .ok_or_else(|| CoreError::PathNotFound(join_segments(parents)))?;

    let removed = match (parent, last) {
      (Value::Object(map), JsonPathSegment::Key(k)) => map.shift_remove(k),
      (Value::Array(items), JsonPathSegment::Index(i)) => {
        let i = *i as usize;
        (i < items.len()).then(|| items.remove(i))
      }
      _ => None,
    };
    let removed = removed.ok_or_else(|| CoreError::PathNotFound(join_segments(path)))?;
    self.lines = render_lines(&self.root)?;
    Ok(removed)
  }

  /// Rewrite the whole file from the in-memory tree.
  pub fn save(&mut self) -> Result<(), CoreError> {
    let text = self.to_pretty_string()?;
    fs::write(&self.path, text.as_bytes())?;
    self.lines = text.lines().map(str::to_string).collect();
    info!(path = %self.path.display(), bytes = text.len(), "saved json document");
    Ok(())
  }

  /// Drop in-memory state and read the file again.
  pub fn reload(&mut self) -> Result<(), CoreError> {
    let root = read_json_file(&self.path)?;
    self.lines = render_lines(&root)?;
    self.root = root;
    debug!(path = %self.path.display(), "reloaded json document");
    Ok(())
  }

  pub fn to_pretty_string(&self) -> Result<String, CoreError> {
    to_pretty_string(&self.root)
  }
}

/// Set the value at `path` inside the JSON file `filename` to `coerce(raw)`.
///
/// Every segment but the last must resolve to an existing container. The last
/// segment may name a new object member; array positions must already exist.
/// Returns the value that was stored.
pub fn write_value(
  filename: impl AsRef<Path>,
  path: &[JsonPathSegment],
  raw: &str,
) -> Result<Value, CoreError> {
  let filename = filename.as_ref();
  let (last, parents) = path
    .split_last()
    .ok_or_else(|| CoreError::InvalidArg("cannot write a value at the document root".into()))?;

  let mut root = read_json_file(filename)?;
  let container = lookup_mut(&mut root, parents)
    .ok_or_else(|| CoreError::PathNotFound(join_segments(parents)))?;

  let value = coerce(raw);
  match (container, last) {
    (Value::Object(map), JsonPathSegment::Key(k)) => {
      map.insert(k.clone(), value.clone());
    }
    (Value::Array(items), JsonPathSegment::Index(i)) if (*i as usize) < items.len() => {
      items[*i as usize] = value.clone();
    }
    _ => return Err(CoreError::PathNotFound(join_segments(path))),
  }

  fs::write(filename, to_pretty_string(&root)?.as_bytes())?;
  info!(path = %filename.display(), at = %join_segments(path), "wrote value");
  Ok(value)
}

/// Best-effort conversion of typed text into a JSON value.
///
/// Tried in order: integer, finite float, JSON literal (`true`, `null`,
/// `[1, 2]`, `"quoted"`, ...). Anything else is kept verbatim as a string.
/// Integers wider than 64 bits stay exact.
pub fn coerce(raw: &str) -> Value {
  let t = raw.trim();
  if let Ok(i) = t.parse::<i64>() {
    return Value::from(i);
  }
  if let Ok(u) = t.parse::<u64>() {
    return Value::from(u);
  }
  if is_integer_text(t) {
    if let Ok(n) = t.parse::<Number>() {
      return Value::Number(n);
    }
  }
  if let Some(n) = t.parse::<f64>().ok().and_then(Number::from_f64) {
    return Value::Number(n);
  }
  if let Ok(v) = serde_json::from_str::<Value>(t) {
    return v;
  }
  Value::String(raw.to_string())
}

fn is_integer_text(t: &str) -> bool {
  let digits = t.strip_prefix('-').unwrap_or(t);
  !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn child_keys(node: &Value) -> Vec<JsonPathSegment> {
  match node {
    Value::Object(map) => map.keys().cloned().map(JsonPathSegment::Key).collect(),
    Value::Array(items) => (0..items.len() as u64).map(JsonPathSegment::Index).collect(),
    _ => vec![],
  }
}

pub(crate) fn lookup<'a>(root: &'a Value, path: &[JsonPathSegment]) -> Option<&'a Value> {
  path.iter().try_fold(root, |node, seg| match (node, seg) {
    (Value::Object(map), JsonPathSegment::Key(k)) => map.get(k),
    (Value::Array(items), JsonPathSegment::Index(i)) => items.get(*i as usize),
    _ => None,
  })
}

fn lookup_mut<'a>(root: &'a mut Value, path: &[JsonPathSegment]) -> Option<&'a mut Value> {
  path.iter().try_fold(root, |node, seg| match (node, seg) {
    (Value::Object(map), JsonPathSegment::Key(k)) => map.get_mut(k),
    (Value::Array(items), JsonPathSegment::Index(i)) => items.get_mut(*i as usize),
    _ => None,
  })
}

fn read_json_file(path: &Path) -> Result<Value, CoreError> {
  let bytes = fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| CoreError::Malformed(format!("{}: {e}", path.display())))
}

pub(crate) fn to_pretty_string(v: &Value) -> Result<String, CoreError> {
  let mut buf = Vec::new();
  let mut ser =
    serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
  v.serialize(&mut ser)
    .map_err(|e| CoreError::Malformed(e.to_string()))?;
  String::from_utf8(buf).map_err(|e| CoreError::Malformed(e.to_string()))
}

fn render_lines(v: &Value) -> Result<Vec<String>, CoreError> {
  Ok(to_pretty_string(v)?.lines().map(str::to_string).collect())
}
