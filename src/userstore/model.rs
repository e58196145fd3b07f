use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk format of a user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Json,
    Xml,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Json => write!(f, "JSON"),
            FormatKind::Xml => write!(f, "XML"),
        }
    }
}

/// A single user record. Field names follow the persisted documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub nombre: String,
    pub edad: i64,
}

impl User {
    pub fn new(id: i64, nombre: impl Into<String>, edad: i64) -> Self {
        Self {
            id,
            nombre: nombre.into(),
            edad,
        }
    }
}

/// A record as read back from a document, with every field already rendered
/// as text. Documents carry fields the tool does not validate, so a listing
/// cannot assume they are well typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub nombre: String,
    pub edad: String,
}

impl fmt::Display for UserView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Nombre: {}, Edad: {}",
            self.id, self.nombre, self.edad
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_line_format() {
        let view = UserView {
            id: "1".into(),
            nombre: "Ana".into(),
            edad: "30".into(),
        };
        assert_eq!(view.to_string(), "ID: 1, Nombre: Ana, Edad: 30");
    }

    #[test]
    fn format_kind_display() {
        assert_eq!(FormatKind::Json.to_string(), "JSON");
        assert_eq!(FormatKind::Xml.to_string(), "XML");
    }
}
