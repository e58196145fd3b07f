use crate::commands::{CmdMessage, CmdResult};
use crate::store::Roster;

/// Sets `edad` on the first record whose id is `id`.
pub fn run<D: Roster>(doc: &mut D, id: i64, edad: i64) -> CmdResult {
    if !doc.update_age(id, edad) {
        tracing::debug!(id, "update target not found");
        return CmdResult::default();
    }

    let mut result = CmdResult::default().with_affected(1);
    result.add_message(CmdMessage::success(format!(
        "Usuario con ID {} actualizado.",
        id
    )));
    result
}
