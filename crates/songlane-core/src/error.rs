use thiserror::Error;
use uuid::Uuid;

use crate::time::Tick;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SongError {
    #[error("invalid time map: {0}")]
    InvalidTimeMap(String),
    #[error("invalid audio parameter {name}: {value} is outside [{min}, {max}]")]
    InvalidAudioParameter {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("clip has no audio data attached: {0}")]
    MissingAudioData(Uuid),
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
    #[error("invalid clip range {start}..={end}")]
    InvalidClipRange { start: Tick, end: Tick },
    #[error("invalid note {0}: pitch, velocity, range or id out of bounds")]
    InvalidNote(i32),
    #[error("invalid lyric line {0}: no words or a word ends before it starts")]
    InvalidLyricLine(usize),
}
