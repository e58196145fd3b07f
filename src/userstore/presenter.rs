//! Listing of a document's users as banner-delimited lines.

use crate::commands::CmdMessage;
use crate::model::FormatKind;
use crate::store::Roster;

const FOOTER: &str = "--- Fin del Contenido ---";

fn empty_notice(kind: FormatKind) -> &'static str {
    match kind {
        FormatKind::Json => "El archivo JSON no contiene usuarios!",
        FormatKind::Xml => "No hay usuarios en el archivo XML.",
    }
}

/// Renders the listing for `doc`. An absent document, a document without a
/// user collection and an empty collection all produce the same notice.
pub fn render<D: Roster>(doc: Option<&D>, kind: FormatKind) -> Vec<CmdMessage> {
    let mut lines = vec![
        CmdMessage::info(""),
        CmdMessage::info(format!("--- Contenido Actual del {} ---", kind)),
    ];

    match doc.and_then(|d| d.users()) {
        Some(users) if !users.is_empty() => {
            lines.extend(users.iter().map(|u| CmdMessage::info(u.to_string())));
        }
        _ => lines.push(CmdMessage::error(empty_notice(kind))),
    }

    lines.push(CmdMessage::info(FOOTER));
    lines.push(CmdMessage::info(""));
    lines
}
