//! The playback queue: an ordered track list with a forward-only cursor

use super::types::TrackDescriptor;

/// Ordered sequence of tracks plus a cursor.
///
/// The cursor starts at -1 (nothing started) and only moves forward, one
/// step per `advance`. A cursor at or past the end means the queue is
/// exhausted. Queues are rebuilt wholesale on each new genre/artist
/// request, never appended to.
#[derive(Clone, Debug, Default)]
pub struct Queue {
    tracks: Vec<TrackDescriptor>,
    cursor: isize,
}

impl Queue {
    pub fn new(tracks: Vec<TrackDescriptor>) -> Self {
        Self { tracks, cursor: -1 }
    }

    pub fn empty() -> Self {
        Self { tracks: Vec::new(), cursor: -1 }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Track under the cursor, if the cursor is on a valid entry.
    pub fn current(&self) -> Option<&TrackDescriptor> {
        if self.cursor < 0 {
            return None;
        }
        self.tracks.get(self.cursor as usize)
    }

    /// Move the cursor forward by one and return the track it lands on.
    /// Returns None once the queue is exhausted; further calls keep
    /// returning None without moving past `len`.
    pub fn advance(&mut self) -> Option<&TrackDescriptor> {
        if self.is_exhausted() {
            return None;
        }
        self.cursor += 1;
        self.tracks.get(self.cursor as usize)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= 0 && self.cursor as usize >= self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::TrackDescriptor;

    fn tracks(n: usize) -> Vec<TrackDescriptor> {
        (0..n)
            .map(|i| TrackDescriptor {
                title: format!("t{i}"),
                artist: "a".to_string(),
                preview_url: format!("https://cdn.example/{i}.mp3"),
                art_url: None,
            })
            .collect()
    }

    #[test]
    fn starts_unstarted() {
        let q = Queue::new(tracks(3));
        assert_eq!(q.cursor(), -1);
        assert!(q.current().is_none());
        assert!(!q.is_exhausted());
    }

    #[test]
    fn advance_walks_in_order() {
        let mut q = Queue::new(tracks(3));
        assert_eq!(q.advance().unwrap().title, "t0");
        assert_eq!(q.advance().unwrap().title, "t1");
        assert_eq!(q.advance().unwrap().title, "t2");
        assert_eq!(q.cursor(), 2);
    }

    #[test]
    fn exhausts_after_len_advances_and_stays_exhausted() {
        let mut q = Queue::new(tracks(2));
        assert!(q.advance().is_some());
        assert!(q.advance().is_some());
        // n-th + 1 advance signals end of queue, not an error
        assert!(q.advance().is_none());
        assert!(q.is_exhausted());
        let at_end = q.cursor();
        // further advances are no-ops
        assert!(q.advance().is_none());
        assert_eq!(q.cursor(), at_end);
    }

    #[test]
    fn empty_queue_is_immediately_exhausted_on_first_advance() {
        let mut q = Queue::empty();
        assert!(q.advance().is_none());
        assert!(q.is_exhausted());
    }
}
