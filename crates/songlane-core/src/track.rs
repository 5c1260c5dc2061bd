use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    automation::AutomationData,
    clip::{AudioClipData, Clip, ClipKind, MAX_SPEED_RATIO, MIN_SPEED_RATIO, check_bounds},
    error::SongError,
    note::EditOutcome,
    plugin::AudioPlugin,
    search,
    time::{Tick, TimeMap},
};

pub const MIN_PAN: i32 = -64;
pub const MAX_PAN: i32 = 63;
const SILENCE_DB: f64 = -100.0;

/// Maps decibels to a fader position in `[0, 1]`, where 1 is +6 dB.
#[must_use]
pub fn db_to_volume_value(db: f64) -> f64 {
    if db > SILENCE_DB {
        ((db - 6.0) / 20.0).exp()
    } else {
        0.0
    }
}

#[must_use]
pub fn volume_value_to_db(volume: f64) -> f64 {
    if volume > 0.0 {
        20.0 * volume.ln() + 6.0
    } else {
        SILENCE_DB
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Midi,
    Audio,
    Aux,
    Master,
}

/// General MIDI program (0 is the acoustic grand piano) plus drum flag.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub program: u8,
    pub is_drum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    id: Uuid,
    kind: TrackKind,
    volume: f64,
    #[serde(default)]
    pan: i32,
    #[serde(default)]
    solo: bool,
    #[serde(default)]
    muted: bool,
    #[serde(default)]
    rank: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instrument: Option<InstrumentInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    suggested_instruments: Vec<InstrumentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sampler_plugin: Option<AudioPlugin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    audio_plugins: Vec<AudioPlugin>,
    #[serde(default)]
    clips: Vec<Clip>,
    #[serde(default)]
    automation: AutomationData,
}

impl Track {
    pub(crate) fn new(kind: TrackKind, rank: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            volume: db_to_volume_value(0.0),
            pan: 0,
            solo: false,
            muted: false,
            rank,
            instrument: (kind == TrackKind::Midi).then(InstrumentInfo::default),
            suggested_instruments: Vec::new(),
            sampler_plugin: None,
            audio_plugins: Vec::new(),
            clips: Vec::new(),
            automation: AutomationData::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Fader position in `[0, 1]`.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    #[must_use]
    pub fn volume_db(&self) -> f64 {
        volume_value_to_db(self.volume)
    }

    pub fn set_volume_db(&mut self, db: f64) {
        self.set_volume(db_to_volume_value(db));
    }

    #[must_use]
    pub fn pan(&self) -> i32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: i32) {
        self.pan = pan.clamp(MIN_PAN, MAX_PAN);
    }

    #[must_use]
    pub fn solo(&self) -> bool {
        self.solo
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    #[must_use]
    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    #[must_use]
    pub fn instrument(&self) -> Option<&InstrumentInfo> {
        self.instrument.as_ref()
    }

    /// Only MIDI tracks carry an instrument; returns whether it was set.
    pub fn set_instrument(&mut self, program: u8, is_drum: bool) -> bool {
        if self.kind != TrackKind::Midi {
            warn!(track_id = %self.id, "instrument ignored on non-midi track");
            return false;
        }
        self.instrument = Some(InstrumentInfo { program, is_drum });
        true
    }

    #[must_use]
    pub fn suggested_instruments(&self) -> &[InstrumentInfo] {
        &self.suggested_instruments
    }

    pub fn create_suggested_instrument(&mut self, program: u8, is_drum: bool) -> Option<&InstrumentInfo> {
        if self.kind != TrackKind::Midi {
            warn!(track_id = %self.id, "suggested instrument ignored on non-midi track");
            return None;
        }
        self.suggested_instruments
            .push(InstrumentInfo { program, is_drum });
        self.suggested_instruments.last()
    }

    pub fn clear_suggested_instruments(&mut self) {
        self.suggested_instruments.clear();
    }

    #[must_use]
    pub fn sampler_plugin(&self) -> Option<&AudioPlugin> {
        self.sampler_plugin.as_ref()
    }

    /// Replaces the sampler of a MIDI track. When the plugin type changes and
    /// `clear_automation` is set, automation of the old instance is dropped.
    pub fn set_sampler_plugin(&mut self, plugin: Option<AudioPlugin>, clear_automation: bool) -> bool {
        if self.kind != TrackKind::Midi {
            warn!(track_id = %self.id, "sampler plugin ignored on non-midi track");
            return false;
        }
        let type_changed = match (&self.sampler_plugin, &plugin) {
            (None, None) => false,
            (Some(old), Some(new)) => !new.matches(old.tf_id()),
            _ => true,
        };
        let old = std::mem::replace(&mut self.sampler_plugin, plugin);
        if let (true, true, Some(old)) = (type_changed, clear_automation, old) {
            self.automation
                .remove_automation_of_plugin(old.instance_id());
        }
        true
    }

    #[must_use]
    pub fn audio_plugins(&self) -> &[AudioPlugin] {
        &self.audio_plugins
    }

    pub fn audio_plugin_mut(&mut self, instance_id: &str) -> Option<&mut AudioPlugin> {
        self.audio_plugins
            .iter_mut()
            .find(|plugin| plugin.instance_id() == instance_id)
    }

    pub fn add_audio_plugin(&mut self, plugin: AudioPlugin) -> usize {
        self.audio_plugins.push(plugin);
        self.audio_plugins.len() - 1
    }

    pub fn remove_audio_plugin(&mut self, instance_id: &str, clear_automation: bool) -> Option<AudioPlugin> {
        let index = self
            .audio_plugins
            .iter()
            .position(|plugin| plugin.instance_id() == instance_id)?;
        let removed = self.audio_plugins.remove(index);
        if clear_automation {
            self.automation.remove_automation_of_plugin(instance_id);
        }
        Some(removed)
    }

    #[must_use]
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id == id)
    }

    #[must_use]
    pub fn clip_at(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    #[must_use]
    pub fn clip_index(&self, id: Uuid) -> Option<usize> {
        self.clips.iter().position(|clip| clip.id == id)
    }

    /// Note and audio pitch access. Clip ranges only change through
    /// [`TrackEditor`].
    pub fn clip_mut(&mut self, id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id == id)
    }

    /// Clips intersecting `[start, end]`, both ends inclusive.
    pub fn clips_overlapping_with(&self, start: Tick, end: Tick) -> impl Iterator<Item = &Clip> {
        let from = search::last_lt(&self.clips, &start, |clip| clip.start_tick).unwrap_or(0);
        self.clips[from..]
            .iter()
            .skip_while(move |clip| clip.end_tick < start)
            .take_while(move |clip| clip.start_tick <= end)
    }

    #[must_use]
    pub fn start_tick(&self) -> Tick {
        self.clips.first().map_or(0, |clip| clip.start_tick)
    }

    #[must_use]
    pub fn end_tick(&self) -> Tick {
        self.clips
            .iter()
            .map(|clip| clip.end_tick)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn automation(&self) -> &AutomationData {
        &self.automation
    }

    pub fn automation_mut(&mut self) -> &mut AutomationData {
        &mut self.automation
    }

    fn insert_sorted(&mut self, clip: Clip) -> usize {
        let index = search::first_ge(&self.clips, &clip.start_tick, |clip| clip.start_tick);
        self.clips.insert(index, clip);
        index
    }

    fn reposition(&mut self, index: usize) {
        let clip = self.clips.remove(index);
        self.insert_sorted(clip);
    }

    pub(crate) fn take_clip(&mut self, id: Uuid) -> Option<Clip> {
        let index = self.clip_index(id)?;
        let mut clip = self.clips.remove(index);
        clip.set_track(None);
        Some(clip)
    }

    /// Checks clip ordering, audio parameters and notes of a deserialized
    /// track, re-links clip and note back-references and normalizes
    /// automation.
    pub(crate) fn validate(&mut self) -> Result<(), SongError> {
        let mut previous_end: Option<Tick> = None;
        for clip in &mut self.clips {
            if clip.start_tick < 0
                || clip.end_tick < clip.start_tick
                || previous_end.is_some_and(|end| clip.start_tick <= end)
            {
                return Err(SongError::InvalidClipRange {
                    start: clip.start_tick,
                    end: clip.end_tick,
                });
            }
            if let Some(audio) = &clip.audio {
                audio.validate()?;
            }
            clip.notes.validate()?;
            previous_end = Some(clip.end_tick);
            clip.set_track(Some(self.id));
            clip.notes.set_owner(clip.id);
        }
        self.automation.normalize();
        Ok(())
    }
}

/// Range editing for one track, borrowing the song's time map so audio clips
/// can convert between ticks and seconds.
///
/// Every method leaves the clip list sorted by start tick and free of overlap.
/// The clip that triggers an edit keeps its requested range; neighbours lose
/// the intersecting ticks, split in two when the edit lands strictly inside
/// them. Clip ids must be re-resolved after any call since an edit can delete
/// or split other clips.
pub struct TrackEditor<'a> {
    time_map: &'a TimeMap,
    track: &'a mut Track,
}

impl Deref for TrackEditor<'_> {
    type Target = Track;

    fn deref(&self) -> &Track {
        self.track
    }
}

impl DerefMut for TrackEditor<'_> {
    fn deref_mut(&mut self) -> &mut Track {
        self.track
    }
}

impl<'a> TrackEditor<'a> {
    pub fn new(time_map: &'a TimeMap, track: &'a mut Track) -> Self {
        Self { time_map, track }
    }

    /// Creates and inserts a MIDI clip. `end_tick` defaults to one tick past
    /// the start.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn create_midi_clip(&mut self, start_tick: Tick, end_tick: Option<Tick>) -> Result<Uuid, SongError> {
        let end_tick = end_tick.unwrap_or_else(|| start_tick.saturating_add(1));
        if start_tick < 0 || end_tick < start_tick {
            return Err(SongError::InvalidClipRange {
                start: start_tick,
                end: end_tick,
            });
        }
        let id = self.insert_clip(Clip::new_midi(start_tick, end_tick));
        info!(clip_id = %id, "midi clip created");
        Ok(id)
    }

    /// Creates and inserts an audio clip. The range is clamped to the span
    /// the audio covers and `end_tick` defaults to the audio end.
    #[instrument(skip(self, audio), fields(track_id = %self.track.id, audio_start = audio.start_tick))]
    pub fn create_audio_clip(
        &mut self,
        start_tick: Tick,
        audio: AudioClipData,
        end_tick: Option<Tick>,
    ) -> Result<Uuid, SongError> {
        audio.validate()?;
        let audio_end = audio.end_tick(self.time_map);
        let start = start_tick.max(audio.start_tick).max(0);
        let end = end_tick.unwrap_or(audio_end).min(audio_end);
        if end < start {
            return Err(SongError::InvalidClipRange { start, end });
        }
        let id = self.insert_clip(Clip::new_audio(start, end, audio));
        info!(clip_id = %id, start, end, "audio clip created");
        Ok(id)
    }

    /// Inserts a detached clip, trimming whatever it overlaps. A clip whose
    /// id is already used on this track gets a fresh id.
    #[instrument(skip(self, clip), fields(track_id = %self.track.id, clip_id = %clip.id))]
    pub fn insert_clip(&mut self, mut clip: Clip) -> Uuid {
        if self.track.clip_index(clip.id).is_some() {
            clip.reassign_id();
            debug!(clip_id = %clip.id, "clip id reassigned on insert");
        }
        clip.set_track(Some(self.track.id));
        self.resolve_clip_conflict(clip.id, clip.start_tick, clip.end_tick);
        let id = clip.id;
        self.track.insert_sorted(clip);
        id
    }

    /// Detaches a clip without touching automation.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn remove_clip(&mut self, clip_id: Uuid) -> Option<Clip> {
        self.delete_clip(clip_id, false)
    }

    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn delete_clip(&mut self, clip_id: Uuid, delete_associated_automation: bool) -> Option<Clip> {
        let index = self.track.clip_index(clip_id)?;
        self.delete_clip_at(index, delete_associated_automation)
    }

    /// Removes the clip at `index`, optionally with the track automation
    /// points inside its range.
    pub fn delete_clip_at(&mut self, index: usize, delete_associated_automation: bool) -> Option<Clip> {
        if index >= self.track.clips.len() {
            return None;
        }
        let mut clip = self.track.clips.remove(index);
        if delete_associated_automation {
            self.track
                .automation
                .remove_points_in_range(clip.start_tick, clip.end_tick);
        }
        clip.set_track(None);
        info!(clip_id = %clip.id, "clip deleted");
        Some(clip)
    }

    /// Moves the left edge to `tick`, clamped to the origin and for audio
    /// clips to the audio start. Crossing the right edge deletes the clip
    /// along with its automation.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn adjust_clip_left(&mut self, clip_id: Uuid, tick: Tick, resolve_conflict: bool) -> EditOutcome {
        let Some(index) = self.track.clip_index(clip_id) else {
            return EditOutcome::NotFound;
        };
        let clip = &self.track.clips[index];
        let (start, end) = (clip.start_tick, clip.end_tick);
        let new_start = tick.max(clip.left_limit());
        if new_start == start {
            return EditOutcome::Unchanged;
        }
        if new_start > end {
            self.delete_clip_at(index, true);
            return EditOutcome::Deleted;
        }
        if resolve_conflict && new_start < start {
            self.resolve_clip_conflict(clip_id, new_start, end);
        }
        let Some(index) = self.track.clip_index(clip_id) else {
            return EditOutcome::NotFound;
        };
        self.track.clips[index].start_tick = new_start;
        self.track.reposition(index);
        info!(new_start, "clip left edge adjusted");
        EditOutcome::Updated
    }

    /// Moves the right edge to `tick`, clamped for audio clips to the audio
    /// end. Crossing the left edge deletes the clip along with its
    /// automation.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn adjust_clip_right(&mut self, clip_id: Uuid, tick: Tick, resolve_conflict: bool) -> EditOutcome {
        let Some(index) = self.track.clip_index(clip_id) else {
            return EditOutcome::NotFound;
        };
        let clip = &self.track.clips[index];
        let (start, end) = (clip.start_tick, clip.end_tick);
        let new_end = clip
            .right_limit(self.time_map)
            .map_or(tick, |limit| tick.min(limit));
        if new_end == end {
            return EditOutcome::Unchanged;
        }
        if new_end < start {
            self.delete_clip_at(index, true);
            return EditOutcome::Deleted;
        }
        if resolve_conflict && new_end > end {
            self.resolve_clip_conflict(clip_id, start, new_end);
        }
        let Some(index) = self.track.clip_index(clip_id) else {
            return EditOutcome::NotFound;
        };
        self.track.clips[index].end_tick = new_end;
        info!(new_end, "clip right edge adjusted");
        EditOutcome::Updated
    }

    /// Shifts a clip by `offset` ticks. A clip pushed entirely before the
    /// origin is deleted.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        offset: Tick,
        move_associated_automation: bool,
    ) -> Result<EditOutcome, SongError> {
        let Some(index) = self.track.clip_index(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        if offset == 0 {
            return Ok(EditOutcome::Unchanged);
        }
        if self.track.clips[index].kind == ClipKind::Audio {
            self.track.clips[index].require_audio()?;
        }

        let mut clip = self.track.clips.remove(index);
        let (old_start, old_end) = (clip.start_tick, clip.end_tick);
        let keep = match clip.shift(offset, self.time_map) {
            Ok(keep) => keep,
            Err(error) => {
                self.track.insert_sorted(clip);
                return Err(error);
            }
        };
        if !keep {
            if move_associated_automation {
                self.track
                    .automation
                    .remove_points_in_range(old_start, old_end);
            }
            clip.set_track(None);
            info!("clip moved past the origin and was deleted");
            return Ok(EditOutcome::Deleted);
        }
        if move_associated_automation {
            self.track
                .automation
                .move_points_in_range(old_start, old_end, offset);
        }

        self.resolve_clip_conflict(clip.id, clip.start_tick, clip.end_tick);
        let new_start = clip.start_tick;
        self.track.insert_sorted(clip);
        info!(new_start, "clip moved");
        Ok(EditOutcome::Updated)
    }

    pub fn move_clip_to(
        &mut self,
        clip_id: Uuid,
        tick: Tick,
        move_associated_automation: bool,
    ) -> Result<EditOutcome, SongError> {
        let Some(clip) = self.track.clip(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        let offset = tick - clip.start_tick;
        self.move_clip(clip_id, offset, move_associated_automation)
    }

    /// Moves the left edge while scaling content around the right edge.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn time_stretch_from_left(&mut self, clip_id: Uuid, new_start: Tick) -> Result<EditOutcome, SongError> {
        let Some(index) = self.track.clip_index(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        let (start, end) = {
            let clip = &self.track.clips[index];
            (clip.start_tick, clip.end_tick)
        };
        let new_start = new_start.max(0);
        if new_start == start || new_start >= end || start == end {
            return Ok(EditOutcome::Unchanged);
        }
        self.stretch(index, end, start, end, new_start, end)?;

        if new_start < start {
            self.resolve_clip_conflict(clip_id, new_start, end);
        }
        let Some(index) = self.track.clip_index(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        self.track.clips[index].start_tick = new_start;
        self.track.reposition(index);
        info!(new_start, "clip stretched from the left");
        Ok(EditOutcome::Updated)
    }

    /// Moves the right edge while scaling content around the left edge.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn time_stretch_from_right(&mut self, clip_id: Uuid, new_end: Tick) -> Result<EditOutcome, SongError> {
        let Some(index) = self.track.clip_index(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        let (start, end) = {
            let clip = &self.track.clips[index];
            (clip.start_tick, clip.end_tick)
        };
        if new_end == end || new_end <= start || start == end {
            return Ok(EditOutcome::Unchanged);
        }
        self.stretch(index, start, start, end, start, new_end)?;

        if new_end > end {
            self.resolve_clip_conflict(clip_id, start, new_end);
        }
        let Some(index) = self.track.clip_index(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        self.track.clips[index].end_tick = new_end;
        info!(new_end, "clip stretched from the right");
        Ok(EditOutcome::Updated)
    }

    /// Changes the playback speed of an audio clip, pulling the right edge
    /// in when the audio no longer reaches it.
    #[instrument(skip(self), fields(track_id = %self.track.id))]
    pub fn set_audio_speed_ratio(&mut self, clip_id: Uuid, speed_ratio: f64) -> Result<EditOutcome, SongError> {
        let Some(index) = self.track.clip_index(clip_id) else {
            return Ok(EditOutcome::NotFound);
        };
        let clip = &mut self.track.clips[index];
        clip.require_audio()?;
        let Some(audio) = clip.audio.as_mut() else {
            return Err(SongError::MissingAudioData(clip_id));
        };
        audio.set_speed_ratio(speed_ratio)?;
        let audio_end = audio.end_tick(self.time_map);
        if clip.end_tick > audio_end {
            if audio_end < clip.start_tick {
                self.delete_clip_at(index, true);
                return Ok(EditOutcome::Deleted);
            }
            clip.end_tick = audio_end;
        }
        info!(speed_ratio, "audio speed ratio updated");
        Ok(EditOutcome::Updated)
    }

    /// Rescales clip content for a range change from `[old_start, old_end]`
    /// to `[new_start, new_end]` with `reference` held in place.
    fn stretch(
        &mut self,
        index: usize,
        reference: Tick,
        old_start: Tick,
        old_end: Tick,
        new_start: Tick,
        new_end: Tick,
    ) -> Result<(), SongError> {
        let time_map = self.time_map;
        let clip = &mut self.track.clips[index];
        match clip.kind {
            ClipKind::Midi => {
                let stretch = (new_end - new_start) as f64 / (old_end - old_start) as f64;
                clip.notes.rescale(reference, stretch);
            }
            ClipKind::Audio => {
                let clip_id = clip.id;
                let audio = clip.require_audio()?;
                let seconds = |tick: Tick| time_map.tick_to_seconds(tick);
                let old_seconds = seconds(old_end) - seconds(old_start);
                let new_seconds = seconds(new_end) - seconds(new_start);
                if old_seconds <= 0.0 {
                    return Ok(());
                }
                let new_speed = audio.speed_ratio() / (new_seconds / old_seconds);
                check_bounds("speed_ratio", new_speed, MIN_SPEED_RATIO, MAX_SPEED_RATIO)?;

                let reference_seconds = seconds(reference);
                let content_before_reference =
                    (reference_seconds - seconds(audio.start_tick)) * audio.speed_ratio();
                let new_audio_start =
                    time_map.seconds_to_tick(reference_seconds - content_before_reference / new_speed);
                let Some(audio) = clip.audio.as_mut() else {
                    return Err(SongError::MissingAudioData(clip_id));
                };
                audio.set_speed_ratio(new_speed)?;
                audio.start_tick = new_audio_start;
            }
        }
        Ok(())
    }

    /// Trims every other clip intersecting `[start, end]`.
    fn resolve_clip_conflict(&mut self, excluded: Uuid, start: Tick, end: Tick) {
        let conflicting: Vec<Uuid> = self
            .track
            .clips_overlapping_with(start, end)
            .map(|clip| clip.id)
            .filter(|id| *id != excluded)
            .collect();
        for id in conflicting {
            if let Some(index) = self.track.clip_index(id) {
                self.trim_conflict_part(index, start, end);
            }
        }
    }

    fn trim_conflict_part(&mut self, index: usize, start: Tick, end: Tick) {
        let track_id = self.track.id;
        let clip = &mut self.track.clips[index];
        if clip.start_tick >= start && clip.end_tick <= end {
            let mut removed = self.track.clips.remove(index);
            removed.set_track(None);
            debug!(clip_id = %removed.id, "clip covered by conflicting range removed");
        } else if clip.start_tick < start && clip.end_tick > end {
            let mut right = clip.split_off_right(end + 1);
            clip.end_tick = start - 1;
            right.set_track(Some(track_id));
            debug!(clip_id = %clip.id, split_id = %right.id, "clip split around conflicting range");
            self.track.insert_sorted(right);
        } else if clip.start_tick >= start {
            clip.start_tick = end + 1;
            debug!(clip_id = %clip.id, "clip left edge trimmed by conflict");
        } else {
            clip.end_tick = start - 1;
            debug!(clip_id = %clip.id, "clip right edge trimmed by conflict");
        }
    }
}
