use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::SongError, ids::IdCounter, search, time::Tick};

pub type PointId = i32;

const TARGET_SEPARATOR: &str = "^^";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AutomationTargetType {
    Volume,
    Pan,
    AudioPlugin,
}

impl AutomationTargetType {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Volume => 1,
            Self::Pan => 2,
            Self::AudioPlugin => 3,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Volume),
            2 => Some(Self::Pan),
            3 => Some(Self::AudioPlugin),
            _ => None,
        }
    }
}

/// What an automation curve drives. Identity is the encoded string, so two
/// targets are equal exactly when they encode the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationTarget {
    kind: AutomationTargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plugin_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    param_id: Option<String>,
}

impl PartialEq for AutomationTarget {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for AutomationTarget {}

impl AutomationTarget {
    #[must_use]
    pub fn volume() -> Self {
        Self::mixer(AutomationTargetType::Volume)
    }

    #[must_use]
    pub fn pan() -> Self {
        Self::mixer(AutomationTargetType::Pan)
    }

    #[must_use]
    pub fn plugin_param(plugin_instance_id: impl Into<String>, param_id: impl Into<String>) -> Self {
        Self {
            kind: AutomationTargetType::AudioPlugin,
            plugin_instance_id: Some(plugin_instance_id.into()),
            param_id: Some(param_id.into()),
        }
    }

    fn mixer(kind: AutomationTargetType) -> Self {
        Self {
            kind,
            plugin_instance_id: None,
            param_id: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AutomationTargetType {
        self.kind
    }

    #[must_use]
    pub fn plugin_instance_id(&self) -> Option<&str> {
        self.plugin_instance_id.as_deref()
    }

    #[must_use]
    pub fn param_id(&self) -> Option<&str> {
        self.param_id.as_deref()
    }

    /// `"1"` for volume, `"3^^<plugin>^^<param>"` for plugin parameters.
    #[must_use]
    pub fn encode(&self) -> String {
        match self.kind {
            AutomationTargetType::AudioPlugin => format!(
                "{}{TARGET_SEPARATOR}{}{TARGET_SEPARATOR}{}",
                self.kind.code(),
                self.plugin_instance_id.as_deref().unwrap_or_default(),
                self.param_id.as_deref().unwrap_or_default(),
            ),
            _ => self.kind.code().to_string(),
        }
    }

    pub fn decode(encoded: &str) -> Result<Self, SongError> {
        let malformed = || SongError::MalformedIdentifier(encoded.to_string());
        let parts: Vec<&str> = encoded.split(TARGET_SEPARATOR).collect();
        let kind = parts
            .first()
            .and_then(|code| code.parse::<u8>().ok())
            .and_then(AutomationTargetType::from_code)
            .ok_or_else(malformed)?;
        match (kind, parts.as_slice()) {
            (AutomationTargetType::AudioPlugin, [_, plugin, param]) => {
                Ok(Self::plugin_param(*plugin, *param))
            }
            (AutomationTargetType::Volume | AutomationTargetType::Pan, [_]) => Ok(Self::mixer(kind)),
            _ => Err(malformed()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AutomationPoint {
    pub id: PointId,
    pub tick: Tick,
    pub value: f64,
}

/// One automation curve: points sorted by tick, values in `[0, 1]`.
///
/// Points sharing a tick form a contiguous run with the most recently added
/// one first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationValue {
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    points: Vec<AutomationPoint>,
    #[serde(default)]
    point_ids: IdCounter,
}

impl AutomationValue {
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    #[must_use]
    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    /// Adds a point, clamping `value` into `[0, 1]`. With `overwrite` every
    /// point already at `tick` is removed first.
    pub fn add_point(&mut self, tick: Tick, value: f64, overwrite: bool) -> PointId {
        let tick = tick.max(0);
        if overwrite {
            self.points.retain(|point| point.tick != tick);
        }
        let used: Vec<PointId> = self.points.iter().map(|point| point.id).collect();
        let id = self.point_ids.allocate(&used);
        let index = search::first_ge(&self.points, &tick, |point| point.tick);
        self.points.insert(
            index,
            AutomationPoint {
                id,
                tick,
                value: clamp_value(value),
            },
        );
        id
    }

    /// Points with `start <= tick <= end`.
    #[must_use]
    pub fn points_in_range(&self, start: Tick, end: Tick) -> &[AutomationPoint] {
        let (from, to) = self.range_bounds(start, end);
        &self.points[from..to]
    }

    pub fn remove_points(&mut self, ids: &[PointId]) {
        let ids: HashSet<PointId> = ids.iter().copied().collect();
        self.points.retain(|point| !ids.contains(&point.id));
    }

    pub fn remove_points_in_range(&mut self, start: Tick, end: Tick) {
        let (from, to) = self.range_bounds(start, end);
        self.points.drain(from..to);
    }

    /// Moves the selected points by a tick and value delta.
    ///
    /// With `overwrite_in_drag_area`, unselected points between the selection's
    /// old outer edge and its new position on the side of travel are removed
    /// first, computed from the positions before the move.
    pub fn move_points(
        &mut self,
        ids: &[PointId],
        offset_tick: Tick,
        offset_value: f64,
        overwrite_in_drag_area: bool,
    ) {
        let selected: HashSet<PointId> = ids.iter().copied().collect();
        let mut touched = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, point)| selected.contains(&point.id))
            .map(|(index, _)| index);
        let Some(first) = touched.next() else {
            return;
        };
        let last = touched.last().unwrap_or(first);

        if overwrite_in_drag_area && offset_tick != 0 {
            if offset_tick < 0 {
                let landing = self.points[first].tick + offset_tick;
                let mut from = first;
                while from > 0 && self.points[from - 1].tick >= landing {
                    from -= 1;
                }
                self.points.drain(from..first);
            } else {
                let landing = self.points[last].tick + offset_tick;
                let mut to = last + 1;
                while to < self.points.len() && self.points[to].tick < landing {
                    to += 1;
                }
                self.points.drain(last + 1..to);
            }
        }

        let mut moved = false;
        for point in self.points.iter_mut().filter(|point| selected.contains(&point.id)) {
            let tick = (point.tick + offset_tick).max(0);
            moved |= tick != point.tick;
            point.tick = tick;
            point.value = clamp_value(point.value + offset_value);
        }
        if moved {
            self.points.sort_by_key(|point| point.tick);
        }
        debug!(count = selected.len(), offset_tick, moved, "automation points moved");
    }

    pub fn move_points_in_range(
        &mut self,
        start: Tick,
        end: Tick,
        offset_tick: Tick,
        offset_value: f64,
        overwrite_in_drag_area: bool,
    ) {
        let ids: Vec<PointId> = self
            .points_in_range(start, end)
            .iter()
            .map(|point| point.id)
            .collect();
        self.move_points(&ids, offset_tick, offset_value, overwrite_in_drag_area);
    }

    /// Restores tick order and value bounds on a deserialized curve.
    pub(crate) fn normalize(&mut self) {
        for point in &mut self.points {
            point.tick = point.tick.max(0);
            point.value = clamp_value(point.value);
        }
        self.points.sort_by_key(|point| point.tick);
    }

    fn range_bounds(&self, start: Tick, end: Tick) -> (usize, usize) {
        if start > end {
            return (0, 0);
        }
        let from = search::first_ge(&self.points, &start, |point| point.tick);
        let to = search::first_gt(&self.points, &end, |point| point.tick);
        (from, to.max(from))
    }
}

fn clamp_value(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Automation curves of one track, keyed by encoded target.
///
/// The target list may hold the same target more than once; duplicates share
/// a single curve.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    targets: Vec<AutomationTarget>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    values: BTreeMap<String, AutomationValue>,
}

impl AutomationData {
    #[must_use]
    pub fn targets(&self) -> &[AutomationTarget] {
        &self.targets
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &AutomationValue)> {
        self.values.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn add_automation(&mut self, target: AutomationTarget) -> &mut AutomationValue {
        let id = target.encode();
        self.targets.push(target);
        self.values.entry(id).or_default()
    }

    /// Removes every copy of `target` and its curve.
    pub fn remove_automation(&mut self, target: &AutomationTarget) {
        self.targets.retain(|existing| existing != target);
        self.values.remove(&target.encode());
    }

    pub fn remove_automation_of_plugin(&mut self, plugin_instance_id: &str) {
        let doomed: Vec<AutomationTarget> = self
            .targets
            .iter()
            .filter(|target| target.plugin_instance_id() == Some(plugin_instance_id))
            .cloned()
            .collect();
        for target in &doomed {
            self.remove_automation(target);
        }
    }

    #[must_use]
    pub fn value_by_target(&self, target: &AutomationTarget) -> Option<&AutomationValue> {
        self.values.get(&target.encode())
    }

    pub fn value_by_target_mut(&mut self, target: &AutomationTarget) -> Option<&mut AutomationValue> {
        self.values.get_mut(&target.encode())
    }

    #[must_use]
    pub fn value_by_id(&self, encoded_target: &str) -> Option<&AutomationValue> {
        self.values.get(encoded_target)
    }

    pub fn value_by_id_mut(&mut self, encoded_target: &str) -> Option<&mut AutomationValue> {
        self.values.get_mut(encoded_target)
    }

    pub fn remove_points_in_range(&mut self, start: Tick, end: Tick) {
        for value in self.values.values_mut() {
            value.remove_points_in_range(start, end);
        }
    }

    pub fn move_points_in_range(&mut self, start: Tick, end: Tick, offset_tick: Tick) {
        for value in self.values.values_mut() {
            value.move_points_in_range(start, end, offset_tick, 0.0, true);
        }
    }

    pub(crate) fn normalize(&mut self) {
        for value in self.values.values_mut() {
            value.normalize();
        }
    }
}
