use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::SongError,
    note::{Note, NoteId, NoteSequence},
    time::{Tick, TimeMap},
};

pub const MIN_SPEED_RATIO: f64 = 0.05;
pub const MAX_SPEED_RATIO: f64 = 20.0;
pub const MIN_PITCH_OFFSET: f64 = -24.0;
pub const MAX_PITCH_OFFSET: f64 = 24.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClipKind {
    Midi,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioSource {
    File { path: String },
    /// Encoded audio carried inline until the host stores it somewhere.
    Inline { format: String, data: Vec<u8> },
}

/// Audio reference of an audio clip.
///
/// `start_tick` is absolute: trimming the clip never moves the audio, moving
/// the clip moves it along.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioClipData {
    pub source: AudioSource,
    pub start_tick: Tick,
    /// Length of the raw audio content in seconds.
    pub duration: f64,
    #[serde(default = "default_speed_ratio")]
    speed_ratio: f64,
    #[serde(default)]
    pitch_offset: f64,
}

fn default_speed_ratio() -> f64 {
    1.0
}

impl AudioClipData {
    #[must_use]
    pub fn from_file(path: impl Into<String>, start_tick: Tick, duration: f64) -> Self {
        Self {
            source: AudioSource::File { path: path.into() },
            start_tick,
            duration,
            speed_ratio: default_speed_ratio(),
            pitch_offset: 0.0,
        }
    }

    #[must_use]
    pub fn inline(format: impl Into<String>, data: Vec<u8>, start_tick: Tick, duration: f64) -> Self {
        Self {
            source: AudioSource::Inline {
                format: format.into(),
                data,
            },
            start_tick,
            duration,
            speed_ratio: default_speed_ratio(),
            pitch_offset: 0.0,
        }
    }

    pub fn with_speed_ratio(mut self, speed_ratio: f64) -> Result<Self, SongError> {
        self.set_speed_ratio(speed_ratio)?;
        Ok(self)
    }

    pub fn with_pitch_offset(mut self, pitch_offset: f64) -> Result<Self, SongError> {
        self.set_pitch_offset(pitch_offset)?;
        Ok(self)
    }

    #[must_use]
    pub fn speed_ratio(&self) -> f64 {
        self.speed_ratio
    }

    #[must_use]
    pub fn pitch_offset(&self) -> f64 {
        self.pitch_offset
    }

    /// Seconds the audio takes to play at the current speed ratio.
    #[must_use]
    pub fn playback_duration(&self) -> f64 {
        self.duration / self.speed_ratio
    }

    #[must_use]
    pub fn end_tick(&self, time_map: &TimeMap) -> Tick {
        time_map.seconds_to_tick(time_map.tick_to_seconds(self.start_tick) + self.playback_duration())
    }

    pub fn set_pitch_offset(&mut self, pitch_offset: f64) -> Result<(), SongError> {
        check_bounds("pitch_offset", pitch_offset, MIN_PITCH_OFFSET, MAX_PITCH_OFFSET)?;
        self.pitch_offset = pitch_offset;
        Ok(())
    }

    pub(crate) fn set_speed_ratio(&mut self, speed_ratio: f64) -> Result<(), SongError> {
        check_bounds("speed_ratio", speed_ratio, MIN_SPEED_RATIO, MAX_SPEED_RATIO)?;
        self.speed_ratio = speed_ratio;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<(), SongError> {
        check_bounds("speed_ratio", self.speed_ratio, MIN_SPEED_RATIO, MAX_SPEED_RATIO)?;
        check_bounds("pitch_offset", self.pitch_offset, MIN_PITCH_OFFSET, MAX_PITCH_OFFSET)?;
        check_bounds("duration", self.duration, 0.0, f64::MAX)
    }
}

pub(crate) fn check_bounds(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), SongError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SongError::InvalidAudioParameter {
            name,
            value,
            min,
            max,
        })
    }
}

/// A bounded region of a track holding either notes or an audio reference.
///
/// Range-changing operations live on [`crate::track::TrackEditor`] so the
/// owning track's ordering can never be bypassed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub(crate) id: Uuid,
    pub(crate) kind: ClipKind,
    pub(crate) start_tick: Tick,
    pub(crate) end_tick: Tick,
    #[serde(default)]
    pub(crate) notes: NoteSequence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) audio: Option<AudioClipData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) track_id: Option<Uuid>,
}

impl Clip {
    pub(crate) fn new_midi(start_tick: Tick, end_tick: Tick) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            kind: ClipKind::Midi,
            start_tick,
            end_tick,
            notes: NoteSequence::new(id),
            audio: None,
            track_id: None,
        }
    }

    pub(crate) fn new_audio(start_tick: Tick, end_tick: Tick, audio: AudioClipData) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            kind: ClipKind::Audio,
            start_tick,
            end_tick,
            notes: NoteSequence::new(id),
            audio: Some(audio),
            track_id: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    #[must_use]
    pub fn start_tick(&self) -> Tick {
        self.start_tick
    }

    #[must_use]
    pub fn end_tick(&self) -> Tick {
        self.end_tick
    }

    #[must_use]
    pub fn track_id(&self) -> Option<Uuid> {
        self.track_id
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn overlaps(&self, start: Tick, end: Tick) -> bool {
        self.end_tick >= start && self.start_tick <= end
    }

    /// Notes audible within the clip bounds.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.notes_in_range(self.start_tick, self.end_tick)
    }

    #[must_use]
    pub fn raw_notes(&self) -> &[Note] {
        self.notes.raw_notes()
    }

    #[must_use]
    pub fn note_sequence(&self) -> &NoteSequence {
        &self.notes
    }

    /// Mutable note access; `None` for audio clips.
    pub fn notes_mut(&mut self) -> Option<&mut NoteSequence> {
        match self.kind {
            ClipKind::Midi => Some(&mut self.notes),
            ClipKind::Audio => None,
        }
    }

    /// Creates a note. Audio clips and invalid notes yield `None`.
    pub fn create_note(
        &mut self,
        pitch: i32,
        velocity: i32,
        start_tick: Tick,
        end_tick: Tick,
    ) -> Option<NoteId> {
        self.notes_mut()?
            .create_note(pitch, velocity, start_tick, end_tick)
    }

    #[must_use]
    pub fn audio(&self) -> Option<&AudioClipData> {
        self.audio.as_ref()
    }

    pub fn set_audio_pitch_offset(&mut self, pitch_offset: f64) -> Result<(), SongError> {
        self.audio
            .as_mut()
            .ok_or(SongError::MissingAudioData(self.id))?
            .set_pitch_offset(pitch_offset)
    }

    #[must_use]
    pub fn audio_end_tick(&self, time_map: &TimeMap) -> Option<Tick> {
        self.audio.as_ref().map(|audio| audio.end_tick(time_map))
    }

    /// Playback length of the referenced audio in seconds.
    #[must_use]
    pub fn audio_duration(&self) -> Option<f64> {
        self.audio.as_ref().map(AudioClipData::playback_duration)
    }

    /// Clip length in seconds.
    #[must_use]
    pub fn duration(&self, time_map: &TimeMap) -> f64 {
        time_map.tick_to_seconds(self.end_tick) - time_map.tick_to_seconds(self.start_tick)
    }

    pub(crate) fn require_audio(&self) -> Result<&AudioClipData, SongError> {
        match (self.kind, self.audio.as_ref()) {
            (ClipKind::Audio, Some(audio)) => Ok(audio),
            _ => Err(SongError::MissingAudioData(self.id)),
        }
    }

    /// Earliest start the clip may take: the audio start for audio clips.
    pub(crate) fn left_limit(&self) -> Tick {
        self.audio
            .as_ref()
            .map_or(0, |audio| audio.start_tick.max(0))
    }

    pub(crate) fn right_limit(&self, time_map: &TimeMap) -> Option<Tick> {
        self.audio_end_tick(time_map)
    }

    /// Shifts the clip by `offset` ticks. Returns `false` when the clip ends
    /// before the origin and should be dropped.
    ///
    /// Audio clips keep the content aligned with their left edge and keep
    /// their playable length in seconds, so tempo changes crossed by the
    /// move do not distort playback.
    pub(crate) fn shift(&mut self, offset: Tick, time_map: &TimeMap) -> Result<bool, SongError> {
        match self.kind {
            ClipKind::Midi => {
                self.start_tick += offset;
                self.end_tick += offset;
                self.notes.shift_all(offset);
            }
            ClipKind::Audio => {
                let audio_start_tick = self.require_audio()?.start_tick;
                let old_start_seconds = time_map.tick_to_seconds(self.start_tick);
                let clip_seconds = time_map.tick_to_seconds(self.end_tick) - old_start_seconds;
                let audio_offset_seconds =
                    time_map.tick_to_seconds(audio_start_tick) - old_start_seconds;

                let new_start = self.start_tick + offset;
                let new_start_seconds = time_map.tick_to_seconds(new_start);
                self.start_tick = new_start;
                self.end_tick = time_map.seconds_to_tick(new_start_seconds + clip_seconds);
                if let Some(audio) = self.audio.as_mut() {
                    audio.start_tick =
                        time_map.seconds_to_tick(new_start_seconds + audio_offset_seconds);
                }
            }
        }
        if self.end_tick < 0 {
            return Ok(false);
        }
        self.start_tick = self.start_tick.max(0);
        Ok(true)
    }

    /// Splits off everything after `split_tick` into a new clip covering
    /// `[split_tick, end]`. The caller truncates this clip.
    pub(crate) fn split_off_right(&mut self, split_tick: Tick) -> Self {
        let mut right = match self.audio.clone() {
            Some(audio) => Self::new_audio(split_tick, self.end_tick, audio),
            None => Self::new_midi(split_tick, self.end_tick),
        };
        if self.kind == ClipKind::Midi {
            right.notes = self.notes.split_off_from(split_tick, right.id);
        }
        right
    }

    pub(crate) fn set_track(&mut self, track_id: Option<Uuid>) {
        self.track_id = track_id;
    }

    pub(crate) fn reassign_id(&mut self) {
        self.id = Uuid::new_v4();
        self.notes.set_owner(self.id);
    }
}
