use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{search, time::Tick};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    #[default]
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Interlude,
    Solo,
    Outro,
    Custom,
}

/// Start of a song section. Only custom markers carry a name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructureMarker {
    tick: Tick,
    kind: StructureKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    custom_name: String,
}

impl StructureMarker {
    fn new(tick: Tick, kind: StructureKind, custom_name: Option<&str>) -> Self {
        let custom_name = match kind {
            StructureKind::Custom => custom_name.unwrap_or_default().to_string(),
            _ => String::new(),
        };
        Self {
            tick,
            kind,
            custom_name,
        }
    }

    #[must_use]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: StructureKind) {
        self.kind = kind;
    }

    #[must_use]
    pub fn custom_name(&self) -> &str {
        &self.custom_name
    }

    pub fn set_custom_name(&mut self, name: impl Into<String>) {
        self.custom_name = name.into();
    }
}

/// Section markers sorted by tick. Once any marker exists, one sits at tick
/// 0 and no two share a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Structures {
    markers: Vec<StructureMarker>,
}

impl Structures {
    #[must_use]
    pub fn markers(&self) -> &[StructureMarker] {
        &self.markers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn at_index(&self, index: usize) -> Option<&StructureMarker> {
        self.markers.get(index)
    }

    pub fn at_index_mut(&mut self, index: usize) -> Option<&mut StructureMarker> {
        self.markers.get_mut(index)
    }

    /// Latest marker at or before `tick`, falling back to the first marker.
    #[must_use]
    pub fn at_tick(&self, tick: Tick) -> Option<&StructureMarker> {
        search::last_le(&self.markers, &tick, StructureMarker::tick)
            .and_then(|index| self.markers.get(index))
            .or_else(|| self.markers.first())
    }

    /// Adds a marker and returns its index. The first marker of a song is
    /// pinned to tick 0 and a marker already at `tick` is replaced.
    pub fn create(&mut self, tick: Tick, kind: StructureKind, custom_name: Option<&str>) -> usize {
        let tick = if self.markers.is_empty() { 0 } else { tick.max(0) };
        self.place(StructureMarker::new(tick, kind, custom_name))
    }

    /// Moves a marker, overwriting any marker at the destination. The marker
    /// at tick 0 stays put unless another one takes its place.
    pub fn move_to(&mut self, index: usize, tick: Tick) -> bool {
        if index == 0 || index >= self.markers.len() {
            debug!(index, "structure move ignored");
            return false;
        }
        let mut marker = self.markers.remove(index);
        marker.tick = tick.max(0);
        let new_index = self.place(marker);
        info!(index, new_index, tick, "structure moved");
        true
    }

    /// Out of range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<StructureMarker> {
        if index >= self.markers.len() {
            return None;
        }
        let removed = self.markers.remove(index);
        if index == 0 {
            if let Some(first) = self.markers.first_mut() {
                first.tick = 0;
            }
        }
        Some(removed)
    }

    fn place(&mut self, marker: StructureMarker) -> usize {
        if let Some(existing) = search::exact(&self.markers, &marker.tick, StructureMarker::tick) {
            self.markers[existing] = marker;
            return existing;
        }
        let index = search::first_ge(&self.markers, &marker.tick, StructureMarker::tick);
        self.markers.insert(index, marker);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_sections() -> Structures {
        let mut structures = Structures::default();
        structures.create(0, StructureKind::Intro, None);
        structures.create(480, StructureKind::Verse, None);
        structures.create(960, StructureKind::Chorus, None);
        structures
    }

    fn layout(structures: &Structures) -> Vec<(Tick, StructureKind)> {
        structures
            .markers()
            .iter()
            .map(|marker| (marker.tick(), marker.kind()))
            .collect()
    }

    #[test]
    fn first_marker_is_pinned_to_origin() {
        let mut structures = Structures::default();
        assert!(structures.at_tick(0).is_none());
        structures.create(480, StructureKind::Intro, None);
        structures.create(960, StructureKind::Verse, None);
        structures.create(480, StructureKind::Outro, None);
        assert_eq!(
            layout(&structures),
            vec![
                (0, StructureKind::Intro),
                (480, StructureKind::Outro),
                (960, StructureKind::Verse)
            ]
        );
    }

    #[test]
    fn lookup_by_tick_falls_back_to_first() {
        let structures = three_sections();
        let kind_at = |tick| structures.at_tick(tick).map(StructureMarker::kind);
        assert_eq!(kind_at(-1), Some(StructureKind::Intro));
        assert_eq!(kind_at(240), Some(StructureKind::Intro));
        assert_eq!(kind_at(480), Some(StructureKind::Verse));
        assert_eq!(kind_at(5_000), Some(StructureKind::Chorus));
    }

    #[test]
    fn moving_onto_another_marker_overwrites_it() {
        let mut structures = three_sections();
        assert!(structures.move_to(1, 1_920));
        assert_eq!(
            layout(&structures),
            vec![
                (0, StructureKind::Intro),
                (960, StructureKind::Chorus),
                (1_920, StructureKind::Verse)
            ]
        );

        let mut structures = three_sections();
        assert!(structures.move_to(1, 0));
        assert_eq!(
            layout(&structures),
            vec![(0, StructureKind::Verse), (960, StructureKind::Chorus)]
        );
    }

    #[test]
    fn custom_names_only_stick_to_custom_markers() {
        let mut structures = Structures::default();
        structures.create(0, StructureKind::Intro, None);
        structures.create(480, StructureKind::Custom, Some("breakdown"));
        structures.create(960, StructureKind::Outro, Some("ignored"));
        assert_eq!(structures.at_index(1).map(StructureMarker::custom_name), Some("breakdown"));
        assert_eq!(structures.at_index(2).map(StructureMarker::custom_name), Some(""));
    }

    #[test]
    fn removal_ignores_bad_indices() {
        let mut structures = three_sections();
        assert!(structures.remove(7).is_none());
        assert_eq!(structures.remove(0).map(|marker| marker.kind()), Some(StructureKind::Intro));
        assert_eq!(structures.at_index(0).map(StructureMarker::tick), Some(0));
    }
}
