use super::{read_document, write_atomic, DocumentStore, RecoveryPolicy, Roster};
use crate::error::{FileRole, Result, StoreError};
use crate::model::{FormatKind, User, UserView};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Map, Value};
use std::path::Path;

const USERS_KEY: &str = "usuarios";
const INDENT: &[u8] = b"    ";

/// A parsed JSON document. The whole value is kept so unknown keys survive
/// a save.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    root: Value,
}

impl JsonDocument {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    fn users_array(&self) -> Option<&Vec<Value>> {
        self.root.get(USERS_KEY)?.as_array()
    }

    fn users_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.root.get_mut(USERS_KEY)?.as_array_mut()
    }

    /// Serializes with 4-space indentation. Non-ASCII is written as is.
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.root.serialize(&mut ser)?;
        Ok(buf)
    }
}

fn id_matches(record: &Value, id: i64) -> bool {
    match record.get("id") {
        Some(Value::Number(n)) => {
            n.as_i64() == Some(id) || (n.is_f64() && n.as_f64() == Some(id as f64))
        }
        _ => false,
    }
}

fn render_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

impl Roster for JsonDocument {
    fn users(&self) -> Option<Vec<UserView>> {
        let users = self.users_array()?;
        Some(
            users
                .iter()
                .map(|u| UserView {
                    id: render_field(u.get("id")),
                    nombre: render_field(u.get("nombre")),
                    edad: render_field(u.get("edad")),
                })
                .collect(),
        )
    }

    fn update_age(&mut self, id: i64, edad: i64) -> bool {
        let Some(users) = self.users_array_mut() else {
            return false;
        };
        let Some(record) = users.iter_mut().find(|u| id_matches(u, id)) else {
            return false;
        };
        match record.as_object_mut() {
            Some(obj) => {
                obj.insert("edad".to_string(), Value::from(edad));
                true
            }
            None => false,
        }
    }

    fn append(&mut self, user: &User) -> bool {
        let Some(root) = self.root.as_object_mut() else {
            tracing::warn!("document root is not an object, cannot append");
            return false;
        };
        let entry = root
            .entry(USERS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry.as_array_mut() {
            Some(users) => {
                users.push(json!({
                    "id": user.id,
                    "nombre": user.nombre,
                    "edad": user.edad,
                }));
                true
            }
            None => {
                tracing::warn!("'{}' is not an array, cannot append", USERS_KEY);
                false
            }
        }
    }

    fn remove(&mut self, id: i64) -> usize {
        let Some(users) = self.users_array_mut() else {
            return 0;
        };
        let before = users.len();
        users.retain(|u| !id_matches(u, id));
        before - users.len()
    }
}

/// JSON document store. Initialization re-serializes the origin and a failed
/// init or load aborts the session.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonStore;

impl JsonStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for JsonStore {
    type Document = JsonDocument;

    fn kind(&self) -> FormatKind {
        FormatKind::Json
    }

    fn recovery(&self) -> RecoveryPolicy {
        RecoveryPolicy::Abort
    }

    fn load(&self, path: &Path) -> Result<JsonDocument> {
        let bytes = read_document(path)?;
        let root: Value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::malformed(path, FileRole::Working, FormatKind::Json, e))?;
        tracing::debug!(path = %path.display(), "json document loaded");
        Ok(JsonDocument::from_value(root))
    }

    fn save(&self, path: &Path, doc: &JsonDocument) -> Result<()> {
        let content = doc.to_pretty_bytes()?;
        write_atomic(path, &content)
    }

    fn initialize(&self, origin: &Path, destination: &Path) -> Result<()> {
        let doc = self.load(origin).map_err(StoreError::as_origin)?;
        self.save(destination, &doc)?;
        tracing::info!(
            origin = %origin.display(),
            destination = %destination.display(),
            "json working file initialized"
        );
        Ok(())
    }

    fn empty_document(&self) -> JsonDocument {
        let mut root = Map::new();
        root.insert(USERS_KEY.to_string(), Value::Array(Vec::new()));
        JsonDocument::from_value(Value::Object(root))
    }
}
