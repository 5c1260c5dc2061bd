use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    config::SongConfig,
    error::SongError,
    lyrics::Lyrics,
    marker::{StructureKind, StructureMarker, Structures},
    time::{TempoEvent, Tick, TimeMap, TimeSignatureEvent},
    track::{Track, TrackEditor, TrackKind},
};

/// Root of the document: time map, tracks, lyrics and section markers.
///
/// Mutation is single-writer. Nothing here synchronizes, so a song shared
/// across threads needs an outer lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Song {
    pub(crate) id: Uuid,
    #[serde(default)]
    time_map: TimeMap,
    #[serde(default)]
    tracks: Vec<Track>,
    master_track: Track,
    #[serde(default)]
    lyrics: Lyrics,
    #[serde(default)]
    structures: Structures,
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}

impl Song {
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_map(TimeMap::default(), Lyrics::default())
    }

    fn with_time_map(time_map: TimeMap, lyrics: Lyrics) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_map,
            tracks: Vec::new(),
            master_track: Track::new(TrackKind::Master, 0),
            lyrics,
            structures: Structures::default(),
        }
    }

    /// Builds an empty song from configured defaults.
    pub fn from_config(config: &SongConfig) -> Result<Self, SongError> {
        let mut time_map = TimeMap::new(config.ppq, config.bpm);
        time_map.overwrite_time_signature_changes(vec![TimeSignatureEvent::new(
            0,
            config.time_signature_numerator,
            config.time_signature_denominator,
        )])?;
        Ok(Self::with_time_map(
            time_map,
            Lyrics::with_line_length(config.lyric_line_length),
        ))
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn time_map(&self) -> &TimeMap {
        &self.time_map
    }

    #[must_use]
    pub fn ppq(&self) -> u32 {
        self.time_map.ppq()
    }

    #[must_use]
    pub fn tick_to_seconds(&self, tick: Tick) -> f64 {
        self.time_map.tick_to_seconds(tick)
    }

    #[must_use]
    pub fn seconds_to_tick(&self, seconds: f64) -> Tick {
        self.time_map.seconds_to_tick(seconds)
    }

    #[must_use]
    pub fn tempo_events(&self) -> &[TempoEvent] {
        self.time_map.tempo_events()
    }

    pub fn create_tempo_change(&mut self, ticks: Tick, bpm: f64) -> Result<usize, SongError> {
        self.time_map.create_tempo_change(ticks, bpm)
    }

    pub fn set_tempo_bpm(&mut self, index: usize, bpm: f64) -> Result<(), SongError> {
        self.time_map.set_tempo_bpm(index, bpm)
    }

    pub fn move_tempo(&mut self, index: usize, tick: Tick) -> Result<usize, SongError> {
        self.time_map.move_tempo(index, tick)
    }

    pub fn remove_tempo_change_at(&mut self, index: usize) -> Result<TempoEvent, SongError> {
        self.time_map.remove_tempo_change_at(index)
    }

    pub fn overwrite_tempo_changes(&mut self, events: &[(Tick, f64)]) -> Result<(), SongError> {
        self.time_map.overwrite_tempo_changes(events)
    }

    #[must_use]
    pub fn time_signatures(&self) -> &[TimeSignatureEvent] {
        self.time_map.time_signatures()
    }

    pub fn create_time_signature(
        &mut self,
        ticks: Tick,
        numerator: u8,
        denominator: u8,
    ) -> Result<usize, SongError> {
        self.time_map
            .create_time_signature(ticks, numerator, denominator)
    }

    pub fn remove_time_signature_at(&mut self, index: usize) -> Result<TimeSignatureEvent, SongError> {
        self.time_map.remove_time_signature_at(index)
    }

    pub fn overwrite_time_signature_changes(
        &mut self,
        events: Vec<TimeSignatureEvent>,
    ) -> Result<(), SongError> {
        self.time_map.overwrite_time_signature_changes(events)
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id() == id)
    }

    #[must_use]
    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    #[must_use]
    pub fn track_index(&self, id: Uuid) -> Option<usize> {
        self.tracks.iter().position(|track| track.id() == id)
    }

    /// Mixer, instrument, plugin and automation access. Clip ranges are
    /// edited through [`Self::track_editor`].
    pub fn track_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|track| track.id() == id)
    }

    #[must_use]
    pub fn master_track(&self) -> &Track {
        &self.master_track
    }

    pub fn master_track_mut(&mut self) -> &mut Track {
        &mut self.master_track
    }

    pub fn track_editor(&mut self, id: Uuid) -> Option<TrackEditor<'_>> {
        let track = self.tracks.iter_mut().find(|track| track.id() == id)?;
        Some(TrackEditor::new(&self.time_map, track))
    }

    pub fn track_editor_at(&mut self, index: usize) -> Option<TrackEditor<'_>> {
        let track = self.tracks.get_mut(index)?;
        Some(TrackEditor::new(&self.time_map, track))
    }

    #[must_use]
    pub fn next_track_rank(&self) -> u32 {
        self.tracks
            .iter()
            .map(Track::rank)
            .max()
            .map_or(1, |rank| rank + 1)
    }

    /// Inserts a new track at `index` (appended when `None` or past the end).
    #[instrument(skip(self), fields(song_id = %self.id))]
    pub fn create_track(&mut self, kind: TrackKind, index: Option<usize>, rank: Option<u32>) -> Uuid {
        let rank = rank.unwrap_or_else(|| self.next_track_rank());
        let track = Track::new(kind, rank);
        let id = track.id();
        let index = index.map_or(self.tracks.len(), |index| index.min(self.tracks.len()));
        self.tracks.insert(index, track);
        info!(track_id = %id, index, rank, "track created");
        id
    }

    #[instrument(skip(self), fields(song_id = %self.id))]
    pub fn remove_track(&mut self, id: Uuid) -> Option<Track> {
        let index = self.track_index(id)?;
        let track = self.tracks.remove(index);
        info!(index, "track removed");
        Some(track)
    }

    /// Moves a clip between tracks, resolving conflicts on the destination.
    /// Returns the clip's id on the destination, which changes only when the
    /// original id is already taken there.
    #[instrument(skip(self), fields(song_id = %self.id))]
    pub fn move_clip_to_track(&mut self, clip_id: Uuid, from_track: Uuid, to_track: Uuid) -> Option<Uuid> {
        if from_track == to_track {
            return self.track(from_track)?.clip(clip_id).map(|clip| clip.id());
        }
        self.track_index(to_track)?;
        let clip = self.track_mut(from_track)?.take_clip(clip_id)?;
        let mut editor = self.track_editor(to_track)?;
        let new_id = editor.insert_clip(clip);
        info!(clip_id = %new_id, "clip moved to another track");
        Some(new_id)
    }

    /// End tick of the latest clip across all tracks.
    #[must_use]
    pub fn last_tick(&self) -> Tick {
        self.tracks
            .iter()
            .map(Track::end_tick)
            .max()
            .unwrap_or(0)
    }

    /// Seconds up to [`Self::last_tick`].
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.tick_to_seconds(self.last_tick())
    }

    #[must_use]
    pub fn lyrics(&self) -> &Lyrics {
        &self.lyrics
    }

    pub fn lyrics_mut(&mut self) -> &mut Lyrics {
        &mut self.lyrics
    }

    #[must_use]
    pub fn structures(&self) -> &[StructureMarker] {
        self.structures.markers()
    }

    pub fn create_structure(&mut self, tick: Tick, kind: StructureKind, custom_name: Option<&str>) -> usize {
        let index = self.structures.create(tick, kind, custom_name);
        debug!(index, ?kind, "structure created");
        index
    }

    #[must_use]
    pub fn structure_at_index(&self, index: usize) -> Option<&StructureMarker> {
        self.structures.at_index(index)
    }

    pub fn structure_at_index_mut(&mut self, index: usize) -> Option<&mut StructureMarker> {
        self.structures.at_index_mut(index)
    }

    #[must_use]
    pub fn structure_at_tick(&self, tick: Tick) -> Option<&StructureMarker> {
        self.structures.at_tick(tick)
    }

    pub fn move_structure(&mut self, index: usize, tick: Tick) -> bool {
        self.structures.move_to(index, tick)
    }

    pub fn remove_structure(&mut self, index: usize) -> Option<StructureMarker> {
        self.structures.remove(index)
    }

    /// Checks a song that was assembled outside the mutators, such as one
    /// read from disk, and repairs derived fields.
    pub fn validate(&mut self) -> Result<(), SongError> {
        self.time_map.normalize()?;
        for track in self
            .tracks
            .iter_mut()
            .chain(std::iter::once(&mut self.master_track))
        {
            track.validate()?;
        }
        self.lyrics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_song_has_only_a_master_track() {
        let song = Song::new();
        assert_eq!(song.track_count(), 0);
        assert_eq!(song.master_track().kind(), TrackKind::Master);
        assert_eq!(song.next_track_rank(), 1);
        assert_eq!(song.last_tick(), 0);
    }

    #[test]
    fn tracks_insert_at_index_and_rank_upward() {
        let mut song = Song::new();
        let first = song.create_track(TrackKind::Midi, None, None);
        let second = song.create_track(TrackKind::Audio, Some(0), None);
        let third = song.create_track(TrackKind::Aux, Some(99), Some(10));
        let order: Vec<Uuid> = song.tracks().iter().map(Track::id).collect();
        assert_eq!(order, vec![second, first, third]);
        assert_eq!(song.track(first).map(Track::rank), Some(1));
        assert_eq!(song.track(second).map(Track::rank), Some(2));
        assert_eq!(song.next_track_rank(), 11);
    }

    #[test]
    fn from_config_applies_meter() {
        let config = SongConfig {
            ppq: 960,
            bpm: 90.0,
            time_signature_numerator: 6,
            time_signature_denominator: 8,
            lyric_line_length: 960,
        };
        let song = Song::from_config(&config).expect("config values should be valid");
        assert_eq!(song.ppq(), 960);
        assert_eq!(song.tempo_events()[0].bpm(), 90.0);
        assert_eq!(song.time_signatures()[0], TimeSignatureEvent::new(0, 6, 8));

        let broken = SongConfig {
            time_signature_denominator: 3,
            ..config
        };
        assert!(matches!(
            Song::from_config(&broken),
            Err(SongError::InvalidTimeMap(_))
        ));
    }
}
