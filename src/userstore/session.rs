//! # Session Driver
//!
//! One linear pass over a working file:
//!
//! ```text
//! Init -> Loaded -> Shown1 -> Updated -> Shown2 -> Appended -> Shown3
//!      -> Removed -> Shown4 -> Saved -> Done
//! ```
//!
//! Every `Shown*` state is followed by a pause on the terminal. Failures in
//! `Init` or loading follow the store's [`RecoveryPolicy`]: JSON stops in
//! `Aborted`, XML carries on with the working file or an empty document. A
//! failed save also ends in `Aborted`.
//!
//! The driver is generic over the [`DocumentStore`], so both formats share
//! this sequencing, and over the [`Terminal`], so tests can run it without a
//! real console.

use crate::commands::{append, remove, update, CmdMessage};
use crate::error::StoreError;
use crate::model::User;
use crate::presenter;
use crate::store::{DocumentStore, RecoveryPolicy};
use crate::terminal::Terminal;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Loaded,
    Shown1,
    Updated,
    Shown2,
    Appended,
    Shown3,
    Removed,
    Shown4,
    Saved,
    Done,
    Aborted,
}

/// Origin and working file of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub origin: PathBuf,
    pub working: PathBuf,
}

/// The edits a session applies, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub update_id: i64,
    pub update_edad: i64,
    pub append: User,
    pub remove_id: i64,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            update_id: 1,
            update_edad: 31,
            append: User::new(3, "Pedro", 40),
            remove_id: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub state: SessionState,
    pub visited: Vec<SessionState>,
}

impl SessionOutcome {
    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }
}

struct Tracker {
    visited: Vec<SessionState>,
}

impl Tracker {
    fn new() -> Self {
        Self {
            visited: vec![SessionState::Init],
        }
    }

    fn enter(&mut self, state: SessionState) {
        tracing::debug!(?state, "session state");
        self.visited.push(state);
    }

    fn finish(mut self, state: SessionState) -> SessionOutcome {
        self.enter(state);
        SessionOutcome {
            state,
            visited: self.visited,
        }
    }
}

fn report<T: Terminal>(terminal: &mut T, error: &StoreError) {
    tracing::debug!("{:?}", error);
    terminal.emit(&CmdMessage::error(error.to_string()));
}

fn show<S: DocumentStore, T: Terminal>(store: &S, doc: &S::Document, terminal: &mut T) {
    terminal.emit_all(&presenter::render(Some(doc), store.kind()));
}

pub fn run<S: DocumentStore, T: Terminal>(
    store: &S,
    paths: &SessionPaths,
    plan: &SessionPlan,
    terminal: &mut T,
) -> SessionOutcome {
    let kind = store.kind();
    tracing::info!(%kind, working = %paths.working.display(), "session started");
    let mut tracker = Tracker::new();

    terminal.clear();

    match store.initialize(&paths.origin, &paths.working) {
        Ok(()) => terminal.emit(&CmdMessage::info(format!(
            "Datos inicializados desde '{}' a '{}'.",
            paths.origin.display(),
            paths.working.display()
        ))),
        Err(e) => {
            report(terminal, &e);
            if store.recovery() == RecoveryPolicy::Abort {
                return tracker.finish(SessionState::Aborted);
            }
        }
    }

    let mut doc = match store.load(&paths.working) {
        Ok(doc) => doc,
        Err(e) => {
            report(terminal, &e);
            match store.recovery() {
                RecoveryPolicy::Abort => return tracker.finish(SessionState::Aborted),
                RecoveryPolicy::FallBackToEmpty => {
                    tracing::info!(%kind, "continuing with an empty document");
                    store.empty_document()
                }
            }
        }
    };
    tracker.enter(SessionState::Loaded);

    show(store, &doc, terminal);
    tracker.enter(SessionState::Shown1);
    terminal.pause();

    let result = update::run(&mut doc, plan.update_id, plan.update_edad);
    terminal.emit_all(&result.messages);
    tracker.enter(SessionState::Updated);

    show(store, &doc, terminal);
    tracker.enter(SessionState::Shown2);
    terminal.pause();

    let result = append::run(&mut doc, &plan.append);
    terminal.emit_all(&result.messages);
    tracker.enter(SessionState::Appended);

    show(store, &doc, terminal);
    tracker.enter(SessionState::Shown3);
    terminal.pause();

    let result = remove::run(&mut doc, plan.remove_id);
    terminal.emit_all(&result.messages);
    tracker.enter(SessionState::Removed);

    show(store, &doc, terminal);
    tracker.enter(SessionState::Shown4);
    terminal.pause();

    if let Err(e) = store.save(&paths.working, &doc) {
        report(terminal, &e);
        return tracker.finish(SessionState::Aborted);
    }
    tracker.enter(SessionState::Saved);
    terminal.emit(&CmdMessage::info(
        "Operaciones completadas. Archivo actualizado.",
    ));

    tracing::info!(%kind, "session finished");
    tracker.finish(SessionState::Done)
}
