//! Note session controller.
//!
//! Owns all client-side session state (note list, selection, detail, form,
//! pending flag, error text), turns user intents into backend calls, and
//! reconciles responses back into the state. A presentation layer reads the
//! state through [`NoteSession::snapshot`] or [`NoteSession::subscribe`] and
//! drives the controller through the intent methods; it never mutates state
//! directly.

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, SessionErrorKind};
use jotter_core::{Note, NoteDraft, NoteId};
use tokio::sync::watch;

/// What the form pane is doing. "Viewing" is not a mode of its own: it is
/// `Browsing` with a selection whose detail has loaded (see
/// [`NoteSession::is_viewing`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Creating,
    Editing,
}

/// Form field addressed by [`NoteSession::edit_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Content,
}

/// Snapshot of the session state handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Note summaries, newest-first. Source of truth for the list pane.
    pub notes: Vec<Note>,
    pub selected_id: Option<NoteId>,
    /// Fully loaded note for `selected_id`, once its fetch has succeeded.
    pub detail: Option<Note>,
    pub mode: Mode,
    pub form_title: String,
    pub form_content: String,
    /// True while a request is in flight. Mutating intents are ignored
    /// until it clears.
    pub pending: bool,
    /// Last user-visible error, empty when none.
    pub error_message: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            selected_id: None,
            detail: None,
            mode: Mode::Browsing,
            form_title: String::new(),
            form_content: String::new(),
            pending: false,
            error_message: String::new(),
        }
    }

    /// Replace the entry with the same id in place, or insert at the front
    /// when the id is new. The list never holds two entries with one id.
    pub fn upsert(&mut self, note: Note) {
        if let Some(existing) = self.notes.iter_mut().find(|n| n.id == note.id) {
            *existing = note;
        } else {
            self.notes.insert(0, note);
        }
    }

    pub fn remove(&mut self, id: NoteId) {
        self.notes.retain(|n| n.id != id);
    }

    fn clear_form(&mut self) {
        self.form_title.clear();
        self.form_content.clear();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NoteSession {
    api: ApiClient,
    state: SessionState,
    /// Bumped on every selection change; a detail response whose epoch is
    /// stale was superseded and is discarded.
    detail_epoch: u64,
    snapshot_tx: watch::Sender<SessionState>,
}

impl NoteSession {
    pub fn new(api: ApiClient) -> Self {
        let state = SessionState::new();
        let (snapshot_tx, _) = watch::channel(state.clone());
        Self {
            api,
            state,
            detail_epoch: 0,
            snapshot_tx,
        }
    }

    /// Build a session from the on-disk client configuration.
    pub fn from_config() -> Result<Self, ClientError> {
        let config = ClientConfig::load()?;
        let api = ApiClient::new(&config)?;
        Ok(Self::new(api))
    }

    /// Read-only copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    /// Watch channel delivering a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshot_tx.subscribe()
    }

    /// `Browsing` with a loaded detail for the current selection.
    pub fn is_viewing(&self) -> bool {
        self.state.mode == Mode::Browsing
            && self.state.selected_id.is_some()
            && self.state.detail.is_some()
    }

    /// Id of the note after the current selection, wrapping at the end of
    /// the list; the first note when nothing is selected. Pure: feed the
    /// result into [`select_note`](Self::select_note) to navigate.
    pub fn next_note_id(&self) -> Option<NoteId> {
        next_id(&self.state.notes, self.state.selected_id)
    }

    /// Id of the note before the current selection, wrapping at the front.
    pub fn previous_note_id(&self) -> Option<NoteId> {
        prev_id(&self.state.notes, self.state.selected_id)
    }

    /// Session start (and explicit reload): fetch the note list.
    ///
    /// The backend returns oldest-first; the list is stored reversed so the
    /// newest note leads. Ends in `Browsing` with no selection.
    pub async fn load_notes(&mut self) {
        if self.state.pending {
            return;
        }
        self.state.selected_id = None;
        self.state.detail = None;
        self.state.mode = Mode::Browsing;
        self.state.clear_form();
        self.state.pending = true;
        self.publish();

        let result = self.api.list_notes().await;
        self.state.pending = false;
        match result {
            Ok(mut notes) => {
                notes.reverse();
                self.state.notes = notes;
                self.state.error_message.clear();
            }
            Err(err) => {
                tracing::warn!(error = %err, "note list fetch failed");
                self.fail(SessionErrorKind::LoadListFailed);
            }
        }
        self.publish();
    }

    /// Select a note and fetch its detail. Not gated by `pending`;
    /// re-selecting the same id always re-fetches.
    ///
    /// The selection keeps showing the requested id even when the fetch
    /// fails; `detail` stays empty in that case. A response that arrives
    /// after a newer selection is discarded wholesale.
    pub async fn select_note(&mut self, id: NoteId) {
        self.state.selected_id = Some(id);
        self.state.detail = None;
        self.state.clear_form();
        self.state.error_message.clear();
        self.detail_epoch += 1;
        let epoch = self.detail_epoch;
        self.state.pending = true;
        self.publish();

        let result = self.api.get_note(id).await;
        if epoch != self.detail_epoch {
            // Superseded by a newer selection.
            return;
        }
        self.state.pending = false;
        match result {
            Ok(note) => {
                self.state.detail = Some(note);
                // A successful load cancels any edit that was in progress.
                self.state.mode = Mode::Browsing;
                self.state.error_message.clear();
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "note detail fetch failed");
                self.fail(SessionErrorKind::LoadDetailFailed);
            }
        }
        self.publish();
    }

    /// Open a blank form for a new note.
    pub fn start_create(&mut self) {
        if self.state.pending {
            return;
        }
        self.state.selected_id = None;
        self.state.detail = None;
        self.state.mode = Mode::Creating;
        self.state.clear_form();
        self.state.error_message.clear();
        self.publish();
    }

    /// Open the form pre-filled from the loaded detail. No-op without one.
    pub fn start_edit(&mut self) {
        if self.state.pending {
            return;
        }
        let Some(detail) = self.state.detail.as_ref() else {
            return;
        };
        self.state.form_title = detail.title.clone();
        self.state.form_content = detail.content.clone();
        self.state.mode = Mode::Editing;
        self.state.error_message.clear();
        self.publish();
    }

    /// Update one form field. Never gated by `pending`.
    pub fn edit_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Title => self.state.form_title = value,
            FormField::Content => self.state.form_content = value,
        }
        self.publish();
    }

    /// Submit the form: update in `Editing`, create in `Creating`.
    ///
    /// Validates locally first; an empty (trimmed) title or content aborts
    /// without any request. On failure the form and mode survive so the
    /// user can retry.
    pub async fn submit(&mut self) {
        if self.state.pending {
            return;
        }
        let target = match self.state.mode {
            Mode::Browsing => return,
            Mode::Creating => None,
            Mode::Editing => match self.state.detail.as_ref() {
                Some(detail) => Some(detail.id),
                // Editing without a loaded detail cannot arise from the
                // intent flow; treat as a no-op.
                None => return,
            },
        };
        if self.state.form_title.trim().is_empty() || self.state.form_content.trim().is_empty() {
            self.fail(SessionErrorKind::ValidationFailed);
            self.publish();
            return;
        }
        let draft = NoteDraft::new(self.state.form_title.clone(), self.state.form_content.clone());
        self.state.pending = true;
        self.publish();

        let result = match target {
            Some(id) => self.api.update_note(id, &draft).await,
            None => self.api.create_note(&draft).await,
        };
        self.state.pending = false;
        match result {
            Ok(note) => {
                self.state.upsert(note.clone());
                self.state.selected_id = Some(note.id);
                self.state.detail = Some(note);
                self.state.clear_form();
                self.state.mode = Mode::Browsing;
                self.state.error_message.clear();
            }
            Err(err) => {
                tracing::warn!(error = %err, "note save failed");
                self.fail(SessionErrorKind::SaveFailed);
            }
        }
        self.publish();
    }

    /// Leave the form and return to browsing. When there was no prior
    /// detail (a create was in progress) the form is blanked too.
    pub fn cancel(&mut self) {
        if self.state.pending {
            return;
        }
        if self.state.mode == Mode::Browsing {
            return;
        }
        if self.state.detail.is_none() {
            self.state.clear_form();
        }
        self.state.mode = Mode::Browsing;
        self.state.error_message.clear();
        self.publish();
    }

    /// Delete the note whose detail is loaded. The presentation layer asks
    /// the user for confirmation before firing this intent.
    pub async fn delete(&mut self) {
        if self.state.pending {
            return;
        }
        let Some(id) = self.state.detail.as_ref().map(|d| d.id) else {
            return;
        };
        self.state.pending = true;
        self.publish();

        let result = self.api.delete_note(id).await;
        self.state.pending = false;
        match result {
            Ok(()) => {
                self.state.remove(id);
                self.state.selected_id = None;
                self.state.detail = None;
                self.state.mode = Mode::Browsing;
                self.state.error_message.clear();
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "note delete failed");
                self.fail(SessionErrorKind::DeleteFailed);
            }
        }
        self.publish();
    }

    fn fail(&mut self, kind: SessionErrorKind) {
        self.state.error_message = kind.user_message().to_string();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
    }
}

fn next_id(notes: &[Note], selected: Option<NoteId>) -> Option<NoteId> {
    if notes.is_empty() {
        return None;
    }
    let index = selected.and_then(|id| notes.iter().position(|n| n.id == id));
    let next = match index {
        Some(i) => (i + 1) % notes.len(),
        None => 0,
    };
    Some(notes[next].id)
}

fn prev_id(notes: &[Note], selected: Option<NoteId>) -> Option<NoteId> {
    if notes.is_empty() {
        return None;
    }
    let index = selected
        .and_then(|id| notes.iter().position(|n| n.id == id))
        .unwrap_or(0);
    let prev = if index == 0 { notes.len() - 1 } else { index - 1 };
    Some(notes[prev].id)
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn arb_note() -> impl Strategy<Value = Note> {
        (0i64..20, "[a-zA-Z0-9 ]{0,16}").prop_map(|(id, title)| Note {
            id: NoteId::new(id),
            title,
            content: "content".to_string(),
            extra: serde_json::Map::new(),
        })
    }

    #[derive(Debug, Clone)]
    enum Op {
        Upsert(Note),
        Remove(i64),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            arb_note().prop_map(Op::Upsert),
            (0i64..20).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: any sequence of upserts and removes leaves the list
        /// without duplicate ids.
        #[test]
        fn prop_reconciliation_never_duplicates_ids(ops in prop::collection::vec(arb_op(), 0..40)) {
            let mut state = SessionState::new();
            for op in ops {
                match op {
                    Op::Upsert(note) => state.upsert(note),
                    Op::Remove(id) => state.remove(NoteId::new(id)),
                }
            }
            let mut seen = HashSet::new();
            for note in &state.notes {
                prop_assert!(seen.insert(note.id), "duplicate id {}", note.id);
            }
        }

        /// Property: upserting an id already present keeps its position.
        #[test]
        fn prop_upsert_existing_preserves_position(
            notes in prop::collection::vec(arb_note(), 1..10),
            pick in any::<prop::sample::Index>(),
            new_title in "[a-z]{1,8}",
        ) {
            let mut state = SessionState::new();
            for note in notes {
                state.upsert(note);
            }
            let index = pick.index(state.notes.len());
            let id = state.notes[index].id;

            let mut replacement = state.notes[index].clone();
            replacement.title = new_title;
            state.upsert(replacement);

            prop_assert_eq!(state.notes[index].id, id);
        }

        /// Property: neighbour navigation never panics and always returns an
        /// id that is in the list (or None on an empty list).
        #[test]
        fn prop_navigation_stays_in_list(
            notes in prop::collection::vec(arb_note(), 0..10),
            selected in prop::option::of(0i64..20),
            forward in any::<bool>(),
        ) {
            let mut state = SessionState::new();
            for note in notes {
                state.upsert(note);
            }
            let selected = selected.map(NoteId::new);
            let result = if forward {
                next_id(&state.notes, selected)
            } else {
                prev_id(&state.notes, selected)
            };
            match result {
                Some(id) => prop_assert!(state.notes.iter().any(|n| n.id == id)),
                None => prop_assert!(state.notes.is_empty()),
            }
        }
    }
}
