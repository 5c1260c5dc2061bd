use serde::{Deserialize, Serialize};

/// Per-container allocator for the small integer ids carried by notes and
/// automation points.
///
/// The counter is seeded lazily from `max(existing) + 1` and wraps back to 1
/// after `i32::MAX`. Ids still held by a live entity are skipped, so an id is
/// never handed out twice while its owner exists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdCounter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<i32>,
}

impl IdCounter {
    pub fn allocate(&mut self, in_use: &[i32]) -> i32 {
        let mut candidate = self.next.unwrap_or_else(|| {
            in_use
                .iter()
                .copied()
                .max()
                .map_or(1, successor)
        });
        while in_use.contains(&candidate) {
            candidate = successor(candidate);
        }
        self.next = Some(successor(candidate));
        candidate
    }
}

fn successor(id: i32) -> i32 {
    if id < 1 || id == i32::MAX { 1 } else { id + 1 }
}
