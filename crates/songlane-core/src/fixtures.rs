use uuid::Uuid;

use crate::{
    automation::AutomationTarget,
    clip::AudioClipData,
    marker::StructureKind,
    song::Song,
    track::TrackKind,
};

/// A small deterministic arrangement for demos and smoke tests: a tempo
/// change, one MIDI and one audio track, a volume ramp, two lyric lines and
/// three sections.
#[must_use]
pub fn demo_song() -> Song {
    let mut song = Song::new();
    song.id = Uuid::parse_str("5b0e4f2c-7d1a-4c3e-9a64-2f8d61c0b7e5")
        .expect("fixture song id should be valid");
    song.create_tempo_change(7_680, 96.0)
        .expect("fixture tempo change should be valid");
    song.create_time_signature(15_360, 3, 4)
        .expect("fixture time signature should be valid");

    let lead = song.create_track(TrackKind::Midi, None, None);
    {
        let mut editor = song
            .track_editor(lead)
            .expect("fixture lead track should exist");
        let phrase = editor
            .create_midi_clip(0, Some(1_919))
            .expect("fixture lead clip range should be valid");
        if let Some(notes) = editor.clip_mut(phrase).and_then(|clip| clip.notes_mut()) {
            for (pitch, start) in [(72, 0), (74, 240), (79, 480), (81, 1_200)] {
                notes.create_note(pitch, 110, start, start + 239);
            }
        }
        editor.create_midi_clip(1_920, Some(3_839))
            .expect("fixture second lead clip range should be valid");

        let volume = editor.automation_mut().add_automation(AutomationTarget::volume());
        volume.add_point(0, 0.4, true);
        volume.add_point(3_840, 0.9, true);
    }

    let vocals = song.create_track(TrackKind::Audio, None, None);
    song.track_editor(vocals)
        .expect("fixture vocal track should exist")
        .create_audio_clip(960, AudioClipData::from_file("vocals/take-1.wav", 960, 4.0), None)
        .expect("fixture audio clip should be valid");

    let lyrics = song.lyrics_mut();
    lyrics.create_line_from_string("Hold the line", 960, 1_919, None);
    lyrics.create_line_from_string("光 に 向 かって", 1_920, 3_839, None);

    song.create_structure(0, StructureKind::Intro, None);
    song.create_structure(1_920, StructureKind::Verse, None);
    song.create_structure(3_840, StructureKind::Custom, Some("drop"));
    song
}
