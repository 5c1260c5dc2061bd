use songlane_core::{EditOutcome, Song, Tick, TrackKind};
use uuid::Uuid;

struct Fixture {
    song: Song,
    track: Uuid,
    clip1: Uuid,
    clip2: Uuid,
    clip3: Uuid,
}

fn fixture() -> Fixture {
    let mut song = Song::new();
    song.create_tempo_change(1_440, 60.0)
        .expect("tempo change should succeed");
    let track = song.create_track(TrackKind::Midi, None, None);
    let mut editor = song.track_editor(track).expect("track should exist");

    let mut clip_with = |start: Tick, end: Tick, notes: &[(i32, Tick, Tick)]| {
        let id = editor
            .create_midi_clip(start, None)
            .expect("clip creation should succeed");
        let sequence = editor
            .clip_mut(id)
            .and_then(|clip| clip.notes_mut())
            .expect("midi clip should expose notes");
        for &(pitch, note_start, note_end) in notes {
            sequence
                .create_note(pitch, 80, note_start, note_end)
                .expect("note should be valid");
        }
        assert_eq!(editor.adjust_clip_right(id, end, true), EditOutcome::Updated);
        id
    };
    let clip1 = clip_with(0, 15, &[(64, 0, 10), (66, 15, 20), (68, 14, 20)]);
    let clip2 = clip_with(21, 30, &[(66, 25, 30), (64, 18, 35), (68, 24, 35)]);
    let clip3 = clip_with(40, 65, &[(71, 55, 65), (69, 45, 50), (67, 40, 45)]);

    Fixture {
        song,
        track,
        clip1,
        clip2,
        clip3,
    }
}

fn ranges(song: &Song, track: Uuid) -> Vec<(Tick, Tick)> {
    song.track(track)
        .expect("track should exist")
        .clips()
        .iter()
        .map(|clip| (clip.start_tick(), clip.end_tick()))
        .collect()
}

fn move_to(fixture: &mut Fixture, clip: Uuid, tick: Tick) -> EditOutcome {
    fixture
        .song
        .track_editor(fixture.track)
        .expect("track should exist")
        .move_clip_to(clip, tick, true)
        .expect("midi move should succeed")
}

#[test]
fn moving_into_free_space_keeps_neighbours() {
    let mut f = fixture();
    let clip1 = f.clip1;
    assert_eq!(move_to(&mut f, clip1, 70), EditOutcome::Updated);
    assert_eq!(ranges(&f.song, f.track), vec![(21, 30), (40, 65), (70, 85)]);
    let clip = f.song.track(f.track).and_then(|t| t.clip(f.clip1)).expect("clip1 should survive");
    let starts: Vec<Tick> = clip.raw_notes().iter().map(|note| note.start_tick()).collect();
    assert_eq!(starts, vec![70, 84, 85]);
    assert_eq!(clip.notes().count(), 2);
}

#[test]
fn moving_over_a_neighbour_trims_it() {
    let mut f = fixture();
    let clip1 = f.clip1;
    move_to(&mut f, clip1, 10);
    assert_eq!(ranges(&f.song, f.track), vec![(10, 25), (26, 30), (40, 65)]);

    let mut f = fixture();
    let clip1 = f.clip1;
    move_to(&mut f, clip1, 60);
    assert_eq!(ranges(&f.song, f.track), vec![(21, 30), (40, 59), (60, 75)]);
    let track = f.song.track(f.track).expect("track should exist");
    assert_eq!(track.clip(f.clip3).map(|clip| clip.end_tick()), Some(59));
}

#[test]
fn moving_between_two_clips_trims_both() {
    let mut f = fixture();
    let clip1 = f.clip1;
    move_to(&mut f, clip1, 28);
    assert_eq!(ranges(&f.song, f.track), vec![(21, 27), (28, 43), (44, 65)]);
}

#[test]
fn moving_inside_a_clip_splits_it() {
    let mut f = fixture();
    let clip2 = f.clip2;
    move_to(&mut f, clip2, 42);
    assert_eq!(
        ranges(&f.song, f.track),
        vec![(0, 15), (40, 41), (42, 51), (52, 65)]
    );
    let track = f.song.track(f.track).expect("track should exist");
    let tail = track.clip_at(3).expect("split tail should exist");
    assert_ne!(tail.id(), f.clip3);
    let pitches: Vec<u8> = tail.notes().map(|note| note.pitch()).collect();
    assert_eq!(pitches, vec![71]);
}

#[test]
fn moving_past_the_origin_deletes_the_clip() {
    let mut f = fixture();
    let outcome = f
        .song
        .track_editor(f.track)
        .expect("track should exist")
        .move_clip(f.clip1, -99_999, true)
        .expect("midi move should succeed");
    assert_eq!(outcome, EditOutcome::Deleted);
    assert_eq!(ranges(&f.song, f.track), vec![(21, 30), (40, 65)]);
}

#[test]
fn left_adjustments_resolve_conflicts() {
    let cases: [(Tick, Vec<(Tick, Tick)>); 4] = [
        (35, vec![(0, 15), (21, 30), (35, 65)]),
        (25, vec![(0, 15), (21, 24), (25, 65)]),
        (10, vec![(0, 9), (10, 65)]),
        (-10, vec![(0, 65)]),
    ];
    for (tick, expected) in cases {
        let mut f = fixture();
        f.song
            .track_editor(f.track)
            .expect("track should exist")
            .adjust_clip_left(f.clip3, tick, true);
        assert_eq!(ranges(&f.song, f.track), expected, "left edge to {tick}");
    }
}

#[test]
fn right_adjustments_resolve_conflicts() {
    let cases: [(Tick, Vec<(Tick, Tick)>); 3] = [
        (25, vec![(0, 25), (26, 30), (40, 65)]),
        (50, vec![(0, 50), (51, 65)]),
        (1_000, vec![(0, 1_000)]),
    ];
    for (tick, expected) in cases {
        let mut f = fixture();
        f.song
            .track_editor(f.track)
            .expect("track should exist")
            .adjust_clip_right(f.clip1, tick, true);
        assert_eq!(ranges(&f.song, f.track), expected, "right edge to {tick}");
    }
}

#[test]
fn adjusting_without_conflict_resolution_only_touches_the_target() {
    let mut f = fixture();
    let mut editor = f.song.track_editor(f.track).expect("track should exist");
    assert_eq!(editor.adjust_clip_right(f.clip1, 25, false), EditOutcome::Updated);
    assert_eq!(editor.adjust_clip_right(f.clip1, 25, false), EditOutcome::Unchanged);
    assert_eq!(ranges(&f.song, f.track), vec![(0, 25), (21, 30), (40, 65)]);
}

#[test]
fn inserted_clips_carve_out_their_range() {
    let cases: [((Tick, Tick), Vec<(Tick, Tick)>); 3] = [
        ((32, 38), vec![(0, 15), (21, 30), (32, 38), (40, 65)]),
        ((25, 45), vec![(0, 15), (21, 24), (25, 45), (46, 65)]),
        ((21, 65), vec![(0, 15), (21, 65)]),
    ];
    for ((start, end), expected) in cases {
        let mut f = fixture();
        f.song
            .track_editor(f.track)
            .expect("track should exist")
            .create_midi_clip(start, Some(end))
            .expect("clip creation should succeed");
        assert_eq!(ranges(&f.song, f.track), expected, "insert {start}..={end}");
    }
}

#[test]
fn stretching_from_the_right_scales_notes() {
    let mut f = fixture();
    let outcome = f
        .song
        .track_editor(f.track)
        .expect("track should exist")
        .time_stretch_from_right(f.clip3, 90)
        .expect("midi stretch should succeed");
    assert_eq!(outcome, EditOutcome::Updated);
    let track = f.song.track(f.track).expect("track should exist");
    let clip = track.clip(f.clip3).expect("clip3 should survive");
    assert_eq!((clip.start_tick(), clip.end_tick()), (40, 90));
    let first = clip.raw_notes().first().expect("notes should survive");
    assert_eq!((first.start_tick(), first.end_tick()), (40, 50));
}

#[test]
fn clips_move_between_tracks() {
    let mut f = fixture();
    let other = f.song.create_track(TrackKind::Midi, None, None);
    let moved = f
        .song
        .move_clip_to_track(f.clip2, f.track, other)
        .expect("clip should move");
    assert_eq!(moved, f.clip2);
    assert_eq!(ranges(&f.song, f.track), vec![(0, 15), (40, 65)]);
    assert_eq!(ranges(&f.song, other), vec![(21, 30)]);
    let clip = f.song.track(other).and_then(|t| t.clip(moved)).expect("clip should be on target");
    assert_eq!(clip.track_id(), Some(other));
    assert!(f.song.move_clip_to_track(f.clip1, f.track, Uuid::new_v4()).is_none());
    assert_eq!(ranges(&f.song, f.track), vec![(0, 15), (40, 65)]);
}

fn note_layout(song: &Song, track: Uuid, clip: Uuid) -> Vec<(u8, Tick, Tick)> {
    song.track(track)
        .and_then(|track| track.clip(clip))
        .expect("clip should exist")
        .raw_notes()
        .iter()
        .map(|note| (note.pitch(), note.start_tick(), note.end_tick()))
        .collect()
}

#[test]
fn stretching_from_the_left_scales_around_the_right_edge() {
    let mut f = fixture();
    let outcome = f
        .song
        .track_editor(f.track)
        .expect("track should exist")
        .time_stretch_from_left(f.clip3, 20)
        .expect("midi stretch should succeed");
    assert_eq!(outcome, EditOutcome::Updated);
    assert_eq!(ranges(&f.song, f.track), vec![(0, 15), (20, 65)]);
    assert!(f.song.track(f.track).and_then(|t| t.clip(f.clip2)).is_none());
    assert_eq!(
        note_layout(&f.song, f.track, f.clip3),
        vec![(67, 20, 29), (69, 29, 38), (71, 47, 65)]
    );
}

#[test]
fn stretching_from_the_left_stops_at_the_origin() {
    let mut f = fixture();
    f.song
        .track_editor(f.track)
        .expect("track should exist")
        .time_stretch_from_left(f.clip3, -30)
        .expect("midi stretch should succeed");
    assert_eq!(ranges(&f.song, f.track), vec![(0, 65)]);
    assert_eq!(
        note_layout(&f.song, f.track, f.clip3),
        vec![(67, 0, 13), (69, 13, 26), (71, 39, 65)]
    );
}

#[test]
fn stretching_from_the_left_trims_a_partial_neighbour() {
    let mut song = Song::new();
    let track = song.create_track(TrackKind::Midi, None, None);
    let mut editor = song.track_editor(track).expect("track should exist");
    editor
        .create_midi_clip(0, Some(150))
        .expect("clip creation should succeed");
    let clip = editor
        .create_midi_clip(200, Some(400))
        .expect("clip creation should succeed");
    editor
        .clip_mut(clip)
        .and_then(|clip| clip.create_note(60, 90, 200, 300))
        .expect("note should be valid");
    editor
        .time_stretch_from_left(clip, 50)
        .expect("midi stretch should succeed");
    assert_eq!(ranges(&song, track), vec![(0, 49), (50, 400)]);
    assert_eq!(note_layout(&song, track, clip), vec![(60, 50, 225)]);
}
