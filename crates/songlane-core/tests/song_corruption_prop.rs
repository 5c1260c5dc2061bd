use proptest::prelude::*;
use songlane_core::{
    fixtures::demo_song,
    persistence::{load_song, save_song},
};

fn no_panic_load(path: &std::path::Path) -> bool {
    std::panic::catch_unwind(|| {
        let _ = load_song(path);
    })
    .is_ok()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn random_song_bytes_do_not_panic(raw in prop::collection::vec(any::<u8>(), 0..4096)) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_random.songlane.json");
        std::fs::write(&path, raw).expect("writing random payload should work");
        prop_assert!(no_panic_load(&path));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn truncated_song_payloads_do_not_panic(prefix_len in 0usize..16384usize) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_truncated.songlane.json");
        save_song(&path, &demo_song()).expect("saving fixture song should work");

        let mut payload = std::fs::read(&path).expect("reading saved song should work");
        payload.truncate(prefix_len.min(payload.len()));
        std::fs::write(&path, payload).expect("writing truncated payload should work");

        prop_assert!(no_panic_load(&path));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn mutated_song_payloads_do_not_panic(index in 0usize..16384usize, delta in any::<u8>()) {
        let temp = tempfile::tempdir().expect("tempdir should be creatable");
        let path = temp.path().join("corrupt_mutated.songlane.json");
        save_song(&path, &demo_song()).expect("saving fixture song should work");

        let mut payload = std::fs::read(&path).expect("reading saved song should work");
        if !payload.is_empty() {
            let target = index % payload.len();
            payload[target] ^= delta.max(1);
        }
        std::fs::write(&path, payload).expect("writing mutated payload should work");

        prop_assert!(no_panic_load(&path));
    }
}
