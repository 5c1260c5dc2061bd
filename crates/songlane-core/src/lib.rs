pub mod automation;
pub mod clip;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fixtures;
pub mod ids;
pub mod lyrics;
pub mod marker;
pub mod note;
pub mod persistence;
pub mod plugin;
pub mod search;
pub mod song;
pub mod time;
pub mod track;

pub use automation::{
    AutomationData, AutomationPoint, AutomationTarget, AutomationTargetType, AutomationValue,
    PointId,
};
pub use clip::{AudioClipData, AudioSource, Clip, ClipKind};
pub use config::{DiagnosticsConfig, PathsConfig, SongConfig, SonglaneConfig};
pub use diagnostics::{
    TelemetryGuard, init_tracing, init_tracing_from_config, log_file_name, song_span,
};
pub use error::SongError;
pub use lyrics::{LyricLine, LyricTokenizer, LyricWord, Lyrics, default_lyric_tokenizer};
pub use marker::{StructureKind, StructureMarker, Structures};
pub use note::{EditOutcome, Note, NoteId, NoteSequence, is_note_in_clip};
pub use persistence::{autosave_song, load_song, save_song, song_from_json};
pub use plugin::{AudioPlugin, PluginIdentity, decode_plugin_id, plugin_id};
pub use song::Song;
pub use time::{TempoEvent, Tick, TimeMap, TimeSignatureEvent};
pub use track::{InstrumentInfo, Track, TrackEditor, TrackKind};
