use crate::commands::{CmdMessage, CmdResult};
use crate::store::Roster;

/// Removes records with `id`. How many go depends on the document format:
/// JSON drops every match, XML only the first.
pub fn run<D: Roster>(doc: &mut D, id: i64) -> CmdResult {
    let removed = doc.remove(id);
    if removed == 0 {
        tracing::debug!(id, "remove target not found");
        return CmdResult::default();
    }

    let mut result = CmdResult::default().with_affected(removed);
    result.add_message(CmdMessage::success(format!(
        "Usuario con ID {} eliminado.",
        id
    )));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::json::JsonDocument;
    use crate::store::xml::XmlDocument;
    use serde_json::json;

    fn names<D: Roster>(doc: &D) -> Vec<String> {
        doc.users()
            .unwrap()
            .into_iter()
            .map(|u| u.nombre)
            .collect()
    }

    #[test]
    fn json_removes_all_matches_keeping_order() {
        let mut doc = JsonDocument::from_value(json!({
            "usuarios": [
                {"id": 1, "nombre": "Ana", "edad": 31},
                {"id": 2, "nombre": "Luis", "edad": 25},
                {"id": 3, "nombre": "Pedro", "edad": 40},
                {"id": 2, "nombre": "Otro", "edad": 60}
            ]
        }));

        let result = run(&mut doc, 2);

        assert_eq!(result.affected, 2);
        assert_eq!(
            result.messages,
            vec![CmdMessage::success("Usuario con ID 2 eliminado.")]
        );
        assert_eq!(names(&doc), vec!["Ana", "Pedro"]);
    }

    #[test]
    fn xml_removes_first_match_only() {
        let mut doc = XmlDocument::parse(
            b"<usuarios>\
              <usuario><id>2</id><nombre>Luis</nombre></usuario>\
              <usuario><id>3</id><nombre>Pedro</nombre></usuario>\
              <usuario><id>2</id><nombre>Otro</nombre></usuario>\
              </usuarios>",
        )
        .unwrap();

        let result = run(&mut doc, 2);

        assert_eq!(result.affected, 1);
        assert_eq!(names(&doc), vec!["Pedro", "Otro"]);
    }

    #[test]
    fn unknown_id_is_silent() {
        let mut doc = JsonDocument::from_value(json!({"usuarios": []}));

        let result = run(&mut doc, 2);

        assert_eq!(result.affected, 0);
        assert!(result.messages.is_empty());
    }
}
