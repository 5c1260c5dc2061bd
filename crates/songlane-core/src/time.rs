use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{error::SongError, search};

/// Universal timeline unit. Signed so move arithmetic can dip below zero
/// before it is clamped.
pub type Tick = i64;

pub const DEFAULT_PPQ: u32 = 480;
pub const DEFAULT_BPM: f64 = 120.0;

#[must_use]
pub fn ticks_per_second(bpm: f64, ppq: u32) -> f64 {
    bpm * f64::from(ppq) / 60.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TempoEvent {
    ticks: Tick,
    bpm: f64,
    /// Seconds from the song origin; recomputed whenever the map changes.
    time: f64,
}

impl TempoEvent {
    #[must_use]
    pub fn ticks(&self) -> Tick {
        self.ticks
    }

    #[must_use]
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSignatureEvent {
    pub ticks: Tick,
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignatureEvent {
    #[must_use]
    pub fn new(ticks: Tick, numerator: u8, denominator: u8) -> Self {
        Self {
            ticks,
            numerator,
            denominator,
        }
    }
}

/// Tempo and meter changes of a song.
///
/// The tempo list is never empty and its first event sits at tick 0, so every
/// tick has a well-defined tempo segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeMap {
    ppq: u32,
    tempos: Vec<TempoEvent>,
    time_signatures: Vec<TimeSignatureEvent>,
}

impl Default for TimeMap {
    fn default() -> Self {
        Self::new(DEFAULT_PPQ, DEFAULT_BPM)
    }
}

impl TimeMap {
    #[must_use]
    pub fn new(ppq: u32, bpm: f64) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            DEFAULT_BPM
        };
        Self {
            ppq: ppq.max(1),
            tempos: vec![TempoEvent {
                ticks: 0,
                bpm,
                time: 0.0,
            }],
            time_signatures: vec![TimeSignatureEvent::new(0, 4, 4)],
        }
    }

    #[must_use]
    pub fn ppq(&self) -> u32 {
        self.ppq
    }

    #[must_use]
    pub fn tempo_events(&self) -> &[TempoEvent] {
        &self.tempos
    }

    #[must_use]
    pub fn tempo_event_count(&self) -> usize {
        self.tempos.len()
    }

    #[must_use]
    pub fn tempo_event_at(&self, index: usize) -> Option<&TempoEvent> {
        self.tempos.get(index)
    }

    /// Tempo in effect at `tick`; ticks before the first event report it.
    #[must_use]
    pub fn tempo_event_at_tick(&self, tick: Tick) -> Option<&TempoEvent> {
        search::last_le(&self.tempos, &tick, |event| event.ticks)
            .and_then(|index| self.tempos.get(index))
            .or_else(|| self.tempos.first())
    }

    #[must_use]
    pub fn tick_to_seconds(&self, tick: Tick) -> f64 {
        let base = search::last_lt(&self.tempos, &tick, |event| event.ticks)
            .and_then(|index| self.tempos.get(index))
            .or_else(|| self.tempos.first());
        match base {
            Some(event) => {
                event.time + (tick - event.ticks) as f64 / ticks_per_second(event.bpm, self.ppq)
            }
            None => tick as f64 / ticks_per_second(DEFAULT_BPM, self.ppq),
        }
    }

    #[must_use]
    pub fn seconds_to_tick(&self, seconds: f64) -> Tick {
        let base = search::last_lt(&self.tempos, &seconds, |event| event.time)
            .and_then(|index| self.tempos.get(index))
            .or_else(|| self.tempos.first());
        match base {
            Some(event) => {
                event.ticks
                    + ((seconds - event.time) * ticks_per_second(event.bpm, self.ppq)).round()
                        as Tick
            }
            None => (seconds * ticks_per_second(DEFAULT_BPM, self.ppq)).round() as Tick,
        }
    }

    /// Inserts a tempo change, replacing any event already at `ticks`.
    /// Returns the index of the event after retiming.
    #[instrument(skip(self))]
    pub fn create_tempo_change(&mut self, ticks: Tick, bpm: f64) -> Result<usize, SongError> {
        validate_bpm(bpm)?;
        if ticks < 0 {
            return Err(SongError::InvalidTimeMap(format!(
                "tempo change at negative tick {ticks}"
            )));
        }
        if self.tempos.is_empty() && ticks != 0 {
            return Err(SongError::InvalidTimeMap(
                "the first tempo change must be at tick 0".to_string(),
            ));
        }

        if let Some(index) = search::exact(&self.tempos, &ticks, |event| event.ticks) {
            self.tempos[index].bpm = bpm;
            debug!(index, "existing tempo change replaced");
        } else {
            let time = self.tick_to_seconds(ticks);
            let index = search::first_ge(&self.tempos, &ticks, |event| event.ticks);
            self.tempos.insert(index, TempoEvent { ticks, bpm, time });
        }
        self.retime();
        info!("tempo change created");
        Ok(search::first_ge(&self.tempos, &ticks, |event| event.ticks))
    }

    #[instrument(skip(self))]
    pub fn set_tempo_bpm(&mut self, index: usize, bpm: f64) -> Result<(), SongError> {
        validate_bpm(bpm)?;
        let event = self
            .tempos
            .get_mut(index)
            .ok_or_else(|| tempo_index_error(index))?;
        event.bpm = bpm;
        self.retime();
        info!("tempo updated");
        Ok(())
    }

    /// Moves a non-initial tempo event. An event already sitting at the
    /// destination tick is replaced by the moved one.
    #[instrument(skip(self))]
    pub fn move_tempo(&mut self, index: usize, tick: Tick) -> Result<usize, SongError> {
        if index == 0 {
            return Err(SongError::InvalidTimeMap(
                "the first tempo change cannot be moved".to_string(),
            ));
        }
        if tick <= 0 {
            return Err(SongError::InvalidTimeMap(format!(
                "tempo change cannot move to tick {tick}"
            )));
        }
        if index >= self.tempos.len() {
            return Err(tempo_index_error(index));
        }

        let mut event = self.tempos.remove(index);
        if let Some(existing) = search::exact(&self.tempos, &tick, |event| event.ticks) {
            self.tempos.remove(existing);
            debug!(existing, "tempo change overwritten by move");
        }
        event.ticks = tick;
        let insert_at = search::first_ge(&self.tempos, &tick, |event| event.ticks);
        self.tempos.insert(insert_at, event);
        self.retime();
        info!(new_index = insert_at, "tempo change moved");
        Ok(insert_at)
    }

    #[instrument(skip(self))]
    pub fn remove_tempo_change_at(&mut self, index: usize) -> Result<TempoEvent, SongError> {
        if index == 0 {
            return Err(SongError::InvalidTimeMap(
                "the first tempo change cannot be removed".to_string(),
            ));
        }
        if index >= self.tempos.len() {
            return Err(tempo_index_error(index));
        }
        let removed = self.tempos.remove(index);
        self.retime();
        info!(ticks = removed.ticks, "tempo change removed");
        Ok(removed)
    }

    /// Replaces the whole tempo list with `(ticks, bpm)` pairs.
    #[instrument(skip(self, events), fields(count = events.len()))]
    pub fn overwrite_tempo_changes(&mut self, events: &[(Tick, f64)]) -> Result<(), SongError> {
        if events.is_empty() {
            return Err(SongError::InvalidTimeMap(
                "tempo changes cannot be empty".to_string(),
            ));
        }
        let mut sorted = events.to_vec();
        sorted.sort_by_key(|(ticks, _)| *ticks);
        if sorted[0].0 != 0 {
            return Err(SongError::InvalidTimeMap(format!(
                "the first tempo change must be at tick 0, found {}",
                sorted[0].0
            )));
        }
        for (_, bpm) in &sorted {
            validate_bpm(*bpm)?;
        }

        self.tempos = sorted
            .into_iter()
            .map(|(ticks, bpm)| TempoEvent {
                ticks,
                bpm,
                time: 0.0,
            })
            .collect();
        self.retime();
        info!("tempo changes overwritten");
        Ok(())
    }

    #[must_use]
    pub fn time_signatures(&self) -> &[TimeSignatureEvent] {
        &self.time_signatures
    }

    #[must_use]
    pub fn time_signature_event_count(&self) -> usize {
        self.time_signatures.len()
    }

    #[must_use]
    pub fn time_signature_at(&self, index: usize) -> Option<&TimeSignatureEvent> {
        self.time_signatures.get(index)
    }

    #[must_use]
    pub fn time_signature_at_tick(&self, tick: Tick) -> Option<&TimeSignatureEvent> {
        search::last_le(&self.time_signatures, &tick, |event| event.ticks)
            .and_then(|index| self.time_signatures.get(index))
            .or_else(|| self.time_signatures.first())
    }

    #[instrument(skip(self))]
    pub fn create_time_signature(
        &mut self,
        ticks: Tick,
        numerator: u8,
        denominator: u8,
    ) -> Result<usize, SongError> {
        let event = TimeSignatureEvent::new(ticks, numerator, denominator);
        validate_time_signature(&event)?;
        if let Some(index) = search::exact(&self.time_signatures, &ticks, |event| event.ticks) {
            self.time_signatures[index] = event;
            debug!(index, "existing time signature replaced");
            return Ok(index);
        }
        let index = search::first_ge(&self.time_signatures, &ticks, |event| event.ticks);
        self.time_signatures.insert(index, event);
        info!(index, "time signature created");
        Ok(index)
    }

    #[instrument(skip(self))]
    pub fn remove_time_signature_at(
        &mut self,
        index: usize,
    ) -> Result<TimeSignatureEvent, SongError> {
        if self.time_signatures.len() <= 1 {
            return Err(SongError::InvalidTimeMap(
                "at least one time signature is required".to_string(),
            ));
        }
        if index >= self.time_signatures.len() {
            return Err(SongError::InvalidTimeMap(format!(
                "time signature index {index} out of range"
            )));
        }
        let removed = self.time_signatures.remove(index);
        info!(ticks = removed.ticks, "time signature removed");
        Ok(removed)
    }

    #[instrument(skip(self, events), fields(count = events.len()))]
    pub fn overwrite_time_signature_changes(
        &mut self,
        mut events: Vec<TimeSignatureEvent>,
    ) -> Result<(), SongError> {
        if events.is_empty() {
            return Err(SongError::InvalidTimeMap(
                "time signatures cannot be empty".to_string(),
            ));
        }
        for event in &events {
            validate_time_signature(event)?;
        }
        events.sort_by_key(|event| event.ticks);
        self.time_signatures = events;
        info!("time signatures overwritten");
        Ok(())
    }

    /// Checks a map that did not go through the mutators, e.g. one read from
    /// disk, and recomputes its event times.
    pub(crate) fn normalize(&mut self) -> Result<(), SongError> {
        if self.ppq == 0 {
            return Err(SongError::InvalidTimeMap("ppq must be positive".to_string()));
        }
        match self.tempos.iter().map(|event| event.ticks).min() {
            Some(0) => {}
            Some(first) => {
                return Err(SongError::InvalidTimeMap(format!(
                    "the first tempo change must be at tick 0, found {first}"
                )));
            }
            None => {
                return Err(SongError::InvalidTimeMap(
                    "tempo changes cannot be empty".to_string(),
                ));
            }
        }
        for event in &self.tempos {
            validate_bpm(event.bpm)?;
        }
        if self.time_signatures.is_empty() {
            return Err(SongError::InvalidTimeMap(
                "at least one time signature is required".to_string(),
            ));
        }
        for event in &self.time_signatures {
            validate_time_signature(event)?;
        }
        self.time_signatures.sort_by_key(|event| event.ticks);
        self.retime();
        Ok(())
    }

    /// Re-sorts tempo events and recomputes every `time` in tick order.
    fn retime(&mut self) {
        self.tempos.sort_by_key(|event| event.ticks);
        let ppq = self.ppq;
        let mut previous: Option<TempoEvent> = None;
        for event in &mut self.tempos {
            event.time = match previous {
                Some(prev) => {
                    prev.time + (event.ticks - prev.ticks) as f64 / ticks_per_second(prev.bpm, ppq)
                }
                None => event.ticks as f64 / ticks_per_second(event.bpm, ppq),
            };
            previous = Some(*event);
        }
    }
}

fn validate_bpm(bpm: f64) -> Result<(), SongError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(SongError::InvalidTimeMap(format!("invalid bpm {bpm}")))
    }
}

fn validate_time_signature(event: &TimeSignatureEvent) -> Result<(), SongError> {
    if event.ticks < 0 {
        return Err(SongError::InvalidTimeMap(format!(
            "time signature at negative tick {}",
            event.ticks
        )));
    }
    if event.numerator == 0 || !event.denominator.is_power_of_two() {
        return Err(SongError::InvalidTimeMap(format!(
            "invalid time signature {}/{}",
            event.numerator, event.denominator
        )));
    }
    Ok(())
}

fn tempo_index_error(index: usize) -> SongError {
    SongError::InvalidTimeMap(format!("tempo index {index} out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_map_is_120_bpm_four_four() {
        let map = TimeMap::default();
        assert_eq!(map.ppq(), 480);
        assert_eq!(map.tempo_event_count(), 1);
        assert_close(map.tempo_events()[0].bpm(), 120.0);
        assert_eq!(map.time_signatures()[0], TimeSignatureEvent::new(0, 4, 4));
    }

    #[test]
    fn tick_round_trip_is_stable_across_segments() {
        let mut map = TimeMap::default();
        map.create_tempo_change(1_440, 60.0)
            .expect("tempo change should succeed");
        for tick in [0, 1, 479, 1_440, 1_441, 9_876] {
            assert_eq!(map.seconds_to_tick(map.tick_to_seconds(tick)), tick);
        }
    }

    #[test]
    fn negative_ticks_extrapolate_with_first_tempo() {
        let map = TimeMap::default();
        assert_close(map.tick_to_seconds(-240), -0.25);
        assert_eq!(map.seconds_to_tick(-0.25), -240);
    }

    #[test]
    fn same_tick_tempo_change_replaces_bpm() {
        let mut map = TimeMap::default();
        map.create_tempo_change(960, 90.0)
            .expect("tempo change should succeed");
        map.create_tempo_change(960, 100.0)
            .expect("tempo change should succeed");
        assert_eq!(map.tempo_event_count(), 2);
        assert_close(map.tempo_events()[1].bpm(), 100.0);
    }

    #[test]
    fn rejects_invalid_bpm_and_meter() {
        let mut map = TimeMap::default();
        assert!(map.create_tempo_change(480, 0.0).is_err());
        assert!(map.create_tempo_change(-1, 90.0).is_err());
        assert!(map.create_time_signature(0, 3, 3).is_err());
        assert!(map.create_time_signature(0, 0, 4).is_err());
    }

    #[test]
    fn keeps_at_least_one_time_signature() {
        let mut map = TimeMap::default();
        assert!(map.remove_time_signature_at(0).is_err());
        map.create_time_signature(1_920, 3, 4)
            .expect("time signature should be created");
        let removed = map
            .remove_time_signature_at(1)
            .expect("second time signature should be removable");
        assert_eq!(removed.numerator, 3);
    }
}
