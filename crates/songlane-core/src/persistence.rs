use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::song::Song;

pub const SONG_FILE_EXTENSION: &str = "songlane.json";

/// Writes the song as pretty JSON through a sibling temp file, so a crash
/// mid-write leaves the previous file intact.
#[instrument(skip(song), fields(song_id = %song.id(), path = %path.display()))]
pub fn save_song(path: &Path, song: &Song) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let json = serde_json::to_vec_pretty(song).context("failed to serialize song")?;
    let mut temp_file =
        tempfile::NamedTempFile::new_in(&parent).context("failed to create temp song file")?;
    temp_file
        .write_all(&json)
        .context("failed to write temp song file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist song: {}", path.display()))?;

    info!(bytes = json.len(), "song saved");
    Ok(())
}

/// Reads a song and checks the invariants the editing API would otherwise
/// guarantee.
#[instrument(fields(path = %path.display()))]
pub fn load_song(path: &Path) -> Result<Song> {
    let content =
        fs::read(path).with_context(|| format!("failed to read song: {}", path.display()))?;
    song_from_json(&content)
}

pub fn song_from_json(content: &[u8]) -> Result<Song> {
    let mut song: Song = serde_json::from_slice(content).context("invalid song json")?;
    song.validate().context("song failed validation")?;
    info!(song_id = %song.id(), tracks = song.track_count(), "song loaded");
    Ok(song)
}

#[instrument(skip(song), fields(song_id = %song.id(), autosave_dir = %autosave_dir.display()))]
pub fn autosave_song(song: &Song, autosave_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(autosave_dir).with_context(|| {
        format!(
            "failed to create autosave directory: {}",
            autosave_dir.display()
        )
    })?;

    let file_name = format!("{}.autosave.{SONG_FILE_EXTENSION}", song.id());
    let autosave_path = autosave_dir.join(file_name);
    save_song(&autosave_path, song)?;

    debug!(path = %autosave_path.display(), "autosave complete");
    Ok(autosave_path)
}
