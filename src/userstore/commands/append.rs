use crate::commands::{CmdMessage, CmdResult};
use crate::model::User;
use crate::store::Roster;

pub fn run<D: Roster>(doc: &mut D, user: &User) -> CmdResult {
    let mut result = CmdResult::default();

    if doc.append(user) {
        result.affected = 1;
        result.add_message(CmdMessage::success(format!(
            "Usuario {} añadido con éxito.",
            user.nombre
        )));
    } else {
        result.add_message(CmdMessage::warning(format!(
            "No se pudo añadir al usuario {}: el documento no tiene lista de usuarios.",
            user.nombre
        )));
    }

    result
}
