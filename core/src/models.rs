use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
  pub session_id: String,
  pub path: String,
  pub created_at_ms: i64,
}

/// A JSON path segment: an object member name or an array position.
///
/// This is intentionally "untagged" so a path serializes as a simple
/// array like `["foo", 0, "bar"]`. Deserialization goes through [`Value`] so
/// indices still read back when numbers are kept as exact text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum JsonPathSegment {
  Key(String),
  Index(u64),
}

impl<'de> Deserialize<'de> for JsonPathSegment {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    match Value::deserialize(d)? {
      Value::String(k) => Ok(JsonPathSegment::Key(k)),
      Value::Number(n) => n
        .as_u64()
        .map(JsonPathSegment::Index)
        .ok_or_else(|| de::Error::custom(format!("invalid array index: {n}"))),
      other => Err(de::Error::custom(format!("expected a key or an index, got {other}"))),
    }
  }
}

impl From<&str> for JsonPathSegment {
  fn from(s: &str) -> Self {
    JsonPathSegment::Key(s.to_string())
  }
}

impl From<String> for JsonPathSegment {
  fn from(s: String) -> Self {
    JsonPathSegment::Key(s)
  }
}

impl From<u64> for JsonPathSegment {
  fn from(i: u64) -> Self {
    JsonPathSegment::Index(i)
  }
}

impl fmt::Display for JsonPathSegment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      JsonPathSegment::Key(k) => f.write_str(k),
      JsonPathSegment::Index(i) => write!(f, "{i}"),
    }
  }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JsonNodeKind {
  Object,
  Array,
  String,
  Number,
  Bool,
  Null,
}

impl JsonNodeKind {
  pub fn of(v: &Value) -> Self {
    match v {
      Value::Object(_) => JsonNodeKind::Object,
      Value::Array(_) => JsonNodeKind::Array,
      Value::String(_) => JsonNodeKind::String,
      Value::Number(_) => JsonNodeKind::Number,
      Value::Bool(_) => JsonNodeKind::Bool,
      Value::Null => JsonNodeKind::Null,
    }
  }

  pub fn is_container(self) -> bool {
    matches!(self, JsonNodeKind::Object | JsonNodeKind::Array)
  }
}

/// Where the navigator currently stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state", content = "depth")]
pub enum NavState {
  AtRoot,
  /// Inside a container, `n` levels below the root.
  AtDepth(usize),
  /// A scalar was selected `n` levels below the root; nothing left to descend into.
  AtLeaf(usize),
}

/// A navigation request produced by the widget layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "key")]
pub enum NavCommand {
  Enter(JsonPathSegment),
  Back,
  Delete,
}

/// Snapshot of the navigator, as returned over the engine API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorView {
  pub state: NavState,
  pub path: Vec<JsonPathSegment>,
  pub keys: Vec<JsonPathSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyButton {
  pub index: usize,
  pub key: JsonPathSegment,
  pub kind: JsonNodeKind,
}

/// The on-screen slice of the key grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyGridPage {
  pub buttons: Vec<KeyButton>,
  pub total: usize,
  pub scroll_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLinesPage {
  pub first_line: usize,
  pub lines: Vec<String>,
  pub total: usize,
  pub scroll_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
  Save,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
  pub id: String,
  pub kind: TaskKind,
  pub cancellable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub kind: TaskKind,
  pub started_at_ms: i64,
  pub progress_0_100: u8,
  pub cancellable: bool,
  pub finished: bool,
  pub error: Option<String>,
}
