//! Notifications from the editor to its host.

use tw_ir::Sample;

/// Opaque per-entry data a host stores alongside each undo snapshot
/// (e.g. the visible waveform window).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UndoUserData(pub Vec<u8>);

/// Host callbacks. Every method defaults to doing nothing.
pub trait EditorListener {
    /// A different sample was attached.
    fn reload(&mut self) {}

    /// An edit is about to be committed; the host may still adjust the sample.
    fn changes_validate(&mut self, _sample: &mut Sample) {}

    /// An edit was committed.
    fn changes(&mut self, _size_changed: bool) {}

    /// Something informational happened that did not modify the sample.
    fn update_no_changes(&mut self) {}

    /// A long-running operation starts.
    fn prepare_lengthy(&mut self) {}

    /// The long-running operation finished.
    fn unprepare_lengthy(&mut self) {}

    /// Data to store with the undo snapshot being captured.
    fn feed_undo_data(&mut self) -> UndoUserData {
        UndoUserData::default()
    }

    /// An undo snapshot carrying `data` was restored.
    fn fetch_undo_data(&mut self, _data: &UndoUserData) {}
}

/// Listener that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl EditorListener for NullListener {}

/// A notification, as recorded by `EventLog`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    Reload,
    ChangesValidate,
    Changes { size_changed: bool },
    UpdateNoChanges,
    PrepareLengthy,
    UnprepareLengthy,
    FetchUndoData(UndoUserData),
}

/// Listener that records every notification, for hosts that poll instead
/// of reacting inline.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub events: Vec<EditorEvent>,
    /// Handed out by `feed_undo_data`
    pub user_data: UndoUserData,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of committed edits seen.
    pub fn commits(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, EditorEvent::Changes { .. }))
            .count()
    }
}

impl EditorListener for EventLog {
    fn reload(&mut self) {
        self.events.push(EditorEvent::Reload);
    }

    fn changes_validate(&mut self, _sample: &mut Sample) {
        self.events.push(EditorEvent::ChangesValidate);
    }

    fn changes(&mut self, size_changed: bool) {
        self.events.push(EditorEvent::Changes { size_changed });
    }

    fn update_no_changes(&mut self) {
        self.events.push(EditorEvent::UpdateNoChanges);
    }

    fn prepare_lengthy(&mut self) {
        self.events.push(EditorEvent::PrepareLengthy);
    }

    fn unprepare_lengthy(&mut self) {
        self.events.push(EditorEvent::UnprepareLengthy);
    }

    fn feed_undo_data(&mut self) -> UndoUserData {
        self.user_data.clone()
    }

    fn fetch_undo_data(&mut self, data: &UndoUserData) {
        self.events.push(EditorEvent::FetchUndoData(data.clone()));
    }
}
