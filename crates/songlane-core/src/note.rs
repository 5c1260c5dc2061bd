use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{error::SongError, ids::IdCounter, search, time::Tick};

pub type NoteId = i32;

pub const MAX_PITCH: i32 = 127;
pub const MAX_VELOCITY: i32 = 127;

/// Result of a mutation whose target may not survive it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    Updated,
    Unchanged,
    /// The entity was removed from its owner as a side effect.
    Deleted,
    NotFound,
}

#[must_use]
pub fn is_valid_pitch(pitch: i32) -> bool {
    (0..=MAX_PITCH).contains(&pitch)
}

#[must_use]
pub fn is_valid_velocity(velocity: i32) -> bool {
    (0..=MAX_VELOCITY).contains(&velocity)
}

#[must_use]
pub fn is_valid_note_range(start_tick: Tick, end_tick: Tick) -> bool {
    end_tick >= 0 && start_tick <= end_tick
}

/// Whether a note sounds inside `[clip_start, clip_end)`.
///
/// A note must have positive length and start inside the clip. Notes that
/// start before the origin count as starting at 0 when the clip starts there.
#[must_use]
pub fn is_note_in_clip(note_start: Tick, note_end: Tick, clip_start: Tick, clip_end: Tick) -> bool {
    note_end > note_start
        && (note_start >= clip_start || (clip_start == 0 && note_start <= 0))
        && note_start < clip_end
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    id: NoteId,
    pitch: u8,
    velocity: u8,
    start_tick: Tick,
    end_tick: Tick,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clip_id: Option<Uuid>,
}

impl Note {
    #[must_use]
    pub fn id(&self) -> NoteId {
        self.id
    }

    #[must_use]
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    #[must_use]
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    #[must_use]
    pub fn start_tick(&self) -> Tick {
        self.start_tick
    }

    #[must_use]
    pub fn end_tick(&self) -> Tick {
        self.end_tick
    }

    /// Owning clip, or `None` once the note has been removed from it.
    #[must_use]
    pub fn clip_id(&self) -> Option<Uuid> {
        self.clip_id
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_note_range(self.start_tick, self.end_tick)
    }

    /// Same sound regardless of id and owner.
    #[must_use]
    pub fn sounds_like(&self, other: &Self) -> bool {
        self.pitch == other.pitch
            && self.velocity == other.velocity
            && self.start_tick == other.start_tick
            && self.end_tick == other.end_tick
    }

    // The tick mutators below only touch this note. Notes inside a clip are
    // edited through `NoteSequence`, which keeps the sequence sorted.

    pub fn move_by(&mut self, offset: Tick) {
        self.start_tick = (self.start_tick + offset).max(0);
        self.end_tick += offset;
    }

    /// The start may go before the origin; such a note still sounds from
    /// tick 0 in a clip that starts there.
    pub fn adjust_left_to(&mut self, tick: Tick) {
        self.start_tick = tick;
    }

    pub fn adjust_right_to(&mut self, tick: Tick) {
        self.end_tick = tick;
    }

    pub fn set_pitch(&mut self, pitch: i32) -> bool {
        match u8::try_from(pitch) {
            Ok(value) if is_valid_pitch(pitch) => {
                self.pitch = value;
                true
            }
            _ => false,
        }
    }

    pub fn adjust_pitch(&mut self, offset: i32) -> bool {
        self.set_pitch(i32::from(self.pitch) + offset)
    }

    pub fn set_velocity(&mut self, velocity: i32) -> bool {
        match u8::try_from(velocity) {
            Ok(value) if is_valid_velocity(velocity) => {
                self.velocity = value;
                true
            }
            _ => false,
        }
    }
}

/// The notes of one clip, sorted by start tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NoteSequence {
    notes: Vec<Note>,
    #[serde(default)]
    note_ids: IdCounter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<Uuid>,
}

impl NoteSequence {
    pub(crate) fn new(owner: Uuid) -> Self {
        Self {
            notes: Vec::new(),
            note_ids: IdCounter::default(),
            owner: Some(owner),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Every note, including those outside the owning clip's bounds.
    #[must_use]
    pub fn raw_notes(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    #[must_use]
    pub fn note_at(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    #[must_use]
    pub fn index_of(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    /// Notes audible within `[start, end)` per [`is_note_in_clip`].
    pub fn notes_in_range(&self, start: Tick, end: Tick) -> impl Iterator<Item = &Note> {
        let from = if start <= 0 {
            0
        } else {
            search::first_ge(&self.notes, &start, |note| note.start_tick)
        };
        let to = search::first_ge(&self.notes, &end, |note| note.start_tick).max(from);
        self.notes[from..to]
            .iter()
            .filter(move |note| is_note_in_clip(note.start_tick, note.end_tick, start, end))
    }

    /// Creates a note, or returns `None` when pitch, velocity or range is
    /// invalid.
    pub fn create_note(
        &mut self,
        pitch: i32,
        velocity: i32,
        start_tick: Tick,
        end_tick: Tick,
    ) -> Option<NoteId> {
        if !is_valid_pitch(pitch)
            || !is_valid_velocity(velocity)
            || !is_valid_note_range(start_tick, end_tick)
        {
            debug!(pitch, velocity, start_tick, end_tick, "note rejected");
            return None;
        }
        let used: Vec<NoteId> = self.notes.iter().map(|note| note.id).collect();
        let id = self.note_ids.allocate(&used);
        self.insert(Note {
            id,
            pitch: u8::try_from(pitch).ok()?,
            velocity: u8::try_from(velocity).ok()?,
            start_tick: start_tick.max(0),
            end_tick,
            clip_id: None,
        });
        Some(id)
    }

    /// Removes a note and hands it back detached.
    pub fn delete_note(&mut self, id: NoteId) -> Option<Note> {
        let index = self.index_of(id)?;
        self.delete_note_at(index)
    }

    pub fn delete_note_at(&mut self, index: usize) -> Option<Note> {
        if index >= self.notes.len() {
            return None;
        }
        let mut note = self.notes.remove(index);
        note.clip_id = None;
        Some(note)
    }

    pub fn move_note(&mut self, id: NoteId, offset: Tick) -> EditOutcome {
        self.reposition(id, |note| note.move_by(offset))
    }

    pub fn adjust_note_left_to(&mut self, id: NoteId, tick: Tick) -> EditOutcome {
        self.reposition(id, |note| note.adjust_left_to(tick))
    }

    pub fn adjust_note_right_to(&mut self, id: NoteId, tick: Tick) -> EditOutcome {
        let Some(index) = self.index_of(id) else {
            return EditOutcome::NotFound;
        };
        self.notes[index].end_tick = tick;
        if self.notes[index].is_valid() {
            EditOutcome::Updated
        } else {
            self.delete_note_at(index);
            EditOutcome::Deleted
        }
    }

    /// Shifts the pitch; a note pushed outside the MIDI range is deleted.
    pub fn adjust_note_pitch(&mut self, id: NoteId, offset: i32) -> EditOutcome {
        let Some(index) = self.index_of(id) else {
            return EditOutcome::NotFound;
        };
        if self.notes[index].adjust_pitch(offset) {
            EditOutcome::Updated
        } else {
            self.delete_note_at(index);
            EditOutcome::Deleted
        }
    }

    pub fn set_note_pitch(&mut self, id: NoteId, pitch: i32) -> bool {
        self.notes
            .iter_mut()
            .find(|note| note.id == id)
            .is_some_and(|note| note.set_pitch(pitch))
    }

    pub fn set_note_velocity(&mut self, id: NoteId, velocity: i32) -> bool {
        self.notes
            .iter_mut()
            .find(|note| note.id == id)
            .is_some_and(|note| note.set_velocity(velocity))
    }

    pub(crate) fn insert(&mut self, mut note: Note) {
        note.clip_id = self.owner;
        let index = search::first_ge(&self.notes, &note.start_tick, |note| note.start_tick);
        self.notes.insert(index, note);
    }

    /// Remove, mutate, then ordered re-insert. Invalid results stay removed.
    fn reposition(&mut self, id: NoteId, edit: impl FnOnce(&mut Note)) -> EditOutcome {
        let Some(mut note) = self.delete_note(id) else {
            return EditOutcome::NotFound;
        };
        edit(&mut note);
        if note.is_valid() {
            self.insert(note);
            EditOutcome::Updated
        } else {
            debug!(note_id = id, "note left the valid range and was deleted");
            EditOutcome::Deleted
        }
    }

    /// Shifts every note, dropping the ones pushed entirely before 0.
    pub(crate) fn shift_all(&mut self, offset: Tick) {
        for note in &mut self.notes {
            note.move_by(offset);
        }
        self.notes.retain(Note::is_valid);
    }

    /// Scales note ticks around `reference`.
    pub(crate) fn rescale(&mut self, reference: Tick, stretch: f64) {
        let scale = |tick: Tick| (reference as f64 - (reference - tick) as f64 * stretch).round() as Tick;
        for note in &mut self.notes {
            note.start_tick = scale(note.start_tick).max(0);
            note.end_tick = scale(note.end_tick);
        }
        self.notes.retain(Note::is_valid);
        self.notes.sort_by_key(|note| note.start_tick);
    }

    /// Moves every note starting at or after `tick` into a new sequence
    /// owned by `owner`. Ids are kept.
    pub(crate) fn split_off_from(&mut self, tick: Tick, owner: Uuid) -> Self {
        let index = search::first_ge(&self.notes, &tick, |note| note.start_tick);
        let mut moved = Self::new(owner);
        for note in self.notes.split_off(index) {
            moved.insert(note);
        }
        moved
    }

    /// Rejects notes a deserialized sequence could carry but `create_note`
    /// never produces, then restores start order.
    pub(crate) fn validate(&mut self) -> Result<(), SongError> {
        let mut seen = HashSet::with_capacity(self.notes.len());
        for note in &self.notes {
            if !is_valid_pitch(i32::from(note.pitch))
                || !is_valid_velocity(i32::from(note.velocity))
                || !note.is_valid()
                || !seen.insert(note.id)
            {
                return Err(SongError::InvalidNote(note.id));
            }
        }
        self.notes.sort_by_key(|note| note.start_tick);
        Ok(())
    }

    pub(crate) fn set_owner(&mut self, owner: Uuid) {
        self.owner = Some(owner);
        for note in &mut self.notes {
            note.clip_id = Some(owner);
        }
    }
}
