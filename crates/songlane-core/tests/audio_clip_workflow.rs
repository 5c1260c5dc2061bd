use songlane_core::{AudioClipData, EditOutcome, Song, SongError, Tick, TrackKind};
use uuid::Uuid;

fn song_with_audio_track() -> (Song, Uuid) {
    let mut song = Song::new();
    song.create_tempo_change(1_440, 60.0)
        .expect("tempo change should succeed");
    let track = song.create_track(TrackKind::Audio, None, None);
    (song, track)
}

fn add_clip(song: &mut Song, track: Uuid, start: Tick, end: Option<Tick>, audio: AudioClipData) -> Uuid {
    song.track_editor(track)
        .expect("track should exist")
        .create_audio_clip(start, audio, end)
        .expect("audio clip should be created")
}

fn range_of(song: &Song, track: Uuid, clip: Uuid) -> Option<(Tick, Tick)> {
    song.track(track)?
        .clip(clip)
        .map(|clip| (clip.start_tick(), clip.end_tick()))
}

fn ranges(song: &Song, track: Uuid) -> Vec<(Tick, Tick)> {
    song.track(track)
        .expect("track should exist")
        .clips()
        .iter()
        .map(|clip| (clip.start_tick(), clip.end_tick()))
        .collect()
}

#[test]
fn creation_clamps_to_audio_span() {
    let (mut song, track) = song_with_audio_track();
    let default_end = add_clip(&mut song, track, 480, None, AudioClipData::from_file("file1", 480, 1.0));
    assert_eq!(range_of(&song, track, default_end), Some((480, 1_440)));

    let (mut song, track) = song_with_audio_track();
    let clamped = add_clip(
        &mut song,
        track,
        120,
        Some(9_000),
        AudioClipData::from_file("file1", 480, 1.0),
    );
    assert_eq!(range_of(&song, track, clamped), Some((480, 1_440)));
}

#[test]
fn edges_stay_inside_audio_content() {
    let (mut song, track) = song_with_audio_track();
    let clip = add_clip(
        &mut song,
        track,
        960,
        Some(1_000),
        AudioClipData::from_file("file1", 480, 1.0),
    );
    let mut editor = song.track_editor(track).expect("track should exist");
    assert_eq!(editor.adjust_clip_left(clip, -100, true), EditOutcome::Updated);
    assert_eq!(editor.adjust_clip_right(clip, 2_000, true), EditOutcome::Updated);
    assert_eq!(range_of(&song, track, clip), Some((480, 1_440)));

    let mut editor = song.track_editor(track).expect("track should exist");
    editor.adjust_clip_left(clip, 600, true);
    editor.adjust_clip_right(clip, 980, true);
    assert_eq!(range_of(&song, track, clip), Some((600, 980)));
}

#[test]
fn moves_keep_audio_aligned_across_tempo_changes() {
    // (clip start, clip end, audio start, offset, new range, new audio start, audio end)
    let cases: [(Tick, Tick, Tick, Tick, (Tick, Tick), Tick, Tick); 5] = [
        (960, 1_200, 480, -480, (480, 720), 0, 960),
        (960, 1_200, 480, 480, (1_440, 1_560), 960, 1_680),
        (1_320, 1_560, 1_200, -120, (1_200, 1_500), 1_080, 1_740),
        (1_320, 1_560, 1_200, -1_440, (0, 240), -240, 720),
        (1_920, 2_040, 1_680, -2_040, (0, 120), -600, 360),
    ];
    for (start, end, audio_start, offset, expected, expected_audio_start, expected_audio_end) in cases {
        let (mut song, track) = song_with_audio_track();
        let clip = add_clip(
            &mut song,
            track,
            start,
            Some(end),
            AudioClipData::from_file("file1", audio_start, 1.0),
        );
        let outcome = song
            .track_editor(track)
            .expect("track should exist")
            .move_clip(clip, offset, true)
            .expect("audio move should succeed");
        assert_eq!(outcome, EditOutcome::Updated, "move {start} by {offset}");
        assert_eq!(range_of(&song, track, clip), Some(expected), "move {start} by {offset}");

        let moved = song
            .track(track)
            .and_then(|track| track.clip(clip))
            .expect("moved clip should exist");
        let audio = moved.audio().expect("audio clip keeps its data");
        assert_eq!(audio.start_tick, expected_audio_start);
        assert_eq!(moved.audio_end_tick(song.time_map()), Some(expected_audio_end));
    }
}

#[test]
fn inserting_inside_an_audio_clip_splits_it() {
    let cases: [((Tick, Tick), Vec<(Tick, Tick)>); 3] = [
        ((240, 720), vec![(0, 239), (240, 720), (721, 960)]),
        ((0, 240), vec![(0, 240), (241, 960)]),
        ((720, 960), vec![(0, 719), (720, 960)]),
    ];
    for ((start, end), expected) in cases {
        let (mut song, track) = song_with_audio_track();
        add_clip(&mut song, track, 0, Some(960), AudioClipData::from_file("file1", 0, 1.0));
        add_clip(&mut song, track, start, Some(end), AudioClipData::from_file("file2", 0, 1.0));
        assert_eq!(ranges(&song, track), expected, "insert {start}..={end}");
        for clip in song.track(track).expect("track should exist").clips() {
            let audio = clip.audio().expect("every clip is audio");
            assert_eq!(audio.start_tick, 0);
        }
    }
}

#[test]
fn left_adjust_respects_audio_start_and_trims_neighbour() {
    let (mut song, track) = song_with_audio_track();
    let clip1 = add_clip(&mut song, track, 0, Some(480), AudioClipData::from_file("file1", 0, 0.5));
    let clip2 = add_clip(&mut song, track, 720, Some(960), AudioClipData::from_file("file1", 360, 1.0));
    song.track_editor(track)
        .expect("track should exist")
        .adjust_clip_left(clip2, 240, true);
    assert_eq!(range_of(&song, track, clip2), Some((360, 960)));
    assert_eq!(range_of(&song, track, clip1), Some((0, 359)));
}

#[test]
fn right_adjust_respects_audio_end_and_trims_neighbour() {
    let (mut song, track) = song_with_audio_track();
    let clip1 = add_clip(&mut song, track, 0, Some(240), AudioClipData::from_file("file1", 0, 0.75));
    let clip2 = add_clip(&mut song, track, 480, Some(960), AudioClipData::from_file("file1", 360, 1.0));
    song.track_editor(track)
        .expect("track should exist")
        .adjust_clip_right(clip1, 800, true);
    assert_eq!(range_of(&song, track, clip1), Some((0, 720)));
    assert_eq!(range_of(&song, track, clip2), Some((721, 960)));
}

#[test]
fn speed_ratio_changes_pull_in_the_right_edge() {
    let (mut song, track) = song_with_audio_track();
    let clip = add_clip(&mut song, track, 0, None, AudioClipData::from_file("file1", 0, 1.0));
    let mut editor = song.track_editor(track).expect("track should exist");
    assert_eq!(
        editor.set_audio_speed_ratio(clip, 2.0).expect("ratio within bounds"),
        EditOutcome::Updated
    );
    assert!(matches!(
        editor.set_audio_speed_ratio(clip, 50.0),
        Err(SongError::InvalidAudioParameter { name: "speed_ratio", .. })
    ));
    assert_eq!(range_of(&song, track, clip), Some((0, 480)));
}

#[test]
fn stretching_audio_adjusts_speed() {
    let (mut song, track) = song_with_audio_track();
    let clip = add_clip(&mut song, track, 0, Some(960), AudioClipData::from_file("file1", 0, 1.0));
    let outcome = song
        .track_editor(track)
        .expect("track should exist")
        .time_stretch_from_right(clip, 480)
        .expect("stretch within speed bounds");
    assert_eq!(outcome, EditOutcome::Updated);
    let stretched = song
        .track(track)
        .and_then(|track| track.clip(clip))
        .expect("clip should exist");
    let audio = stretched.audio().expect("audio clip keeps its data");
    assert!((audio.speed_ratio() - 2.0).abs() < 1e-9);
    assert_eq!(audio.start_tick, 0);
    assert_eq!(stretched.end_tick(), 480);
}

#[test]
fn midi_clips_refuse_audio_operations() {
    let mut song = Song::new();
    let track = song.create_track(TrackKind::Midi, None, None);
    let mut editor = song.track_editor(track).expect("track should exist");
    let clip = editor
        .create_midi_clip(0, Some(480))
        .expect("midi clip should be created");
    assert!(matches!(
        editor.set_audio_speed_ratio(clip, 1.5),
        Err(SongError::MissingAudioData(id)) if id == clip
    ));
}

fn audio_of(song: &Song, track: Uuid, clip: Uuid) -> (f64, Tick) {
    let audio = song
        .track(track)
        .and_then(|track| track.clip(clip))
        .and_then(|clip| clip.audio())
        .expect("audio clip keeps its data");
    (audio.speed_ratio(), audio.start_tick)
}

#[test]
fn shrinking_from_the_left_speeds_audio_up() {
    let mut song = Song::new();
    let track = song.create_track(TrackKind::Audio, None, None);
    let clip = add_clip(&mut song, track, 0, Some(1_920), AudioClipData::from_file("file1", 0, 2.0));
    song.track_editor(track)
        .expect("track should exist")
        .adjust_clip_left(clip, 960, true);
    song.track_editor(track)
        .expect("track should exist")
        .time_stretch_from_left(clip, 1_440)
        .expect("stretch within speed bounds");
    assert_eq!(range_of(&song, track, clip), Some((1_440, 1_920)));
    let (speed, audio_start) = audio_of(&song, track, clip);
    assert!((speed - 2.0).abs() < 1e-9);
    assert_eq!(audio_start, 960);
}

#[test]
fn widening_from_the_left_slows_audio_and_trims_neighbours() {
    let mut song = Song::new();
    let track = song.create_track(TrackKind::Audio, None, None);
    let neighbour = add_clip(&mut song, track, 0, Some(720), AudioClipData::from_file("file0", 0, 1.0));
    let clip = add_clip(&mut song, track, 960, None, AudioClipData::from_file("file1", 960, 1.0));
    assert_eq!(range_of(&song, track, clip), Some((960, 1_920)));

    song.track_editor(track)
        .expect("track should exist")
        .time_stretch_from_left(clip, 480)
        .expect("stretch within speed bounds");
    assert_eq!(ranges(&song, track), vec![(0, 479), (480, 1_920)]);
    let (speed, audio_start) = audio_of(&song, track, clip);
    assert!((speed - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(audio_start, 480);

    song.track_editor(track)
        .expect("track should exist")
        .time_stretch_from_left(clip, -480)
        .expect("stretch within speed bounds");
    assert_eq!(ranges(&song, track), vec![(0, 1_920)]);
    assert!(range_of(&song, track, neighbour).is_none());
    let (speed, audio_start) = audio_of(&song, track, clip);
    assert!((speed - 0.5).abs() < 1e-9);
    assert_eq!(audio_start, 0);
}
