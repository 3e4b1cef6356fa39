//! Fixed-capacity ring of meteor trail samples.

use glam::Vec2;

/// One recorded point of a meteor's path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrailSample {
    pub position: Vec2,
    /// Shrink factor at the time the sample was taken.
    pub scale: f32,
}

/// Ring buffer ordered most-recent-first.
///
/// Pushing at the head of a full ring overwrites the oldest sample, so the
/// length never exceeds the capacity and nothing is reallocated after
/// construction.
#[derive(Debug, Clone)]
pub struct TrailRing {
    slots: Vec<TrailSample>,
    head: usize,
    len: usize,
}

impl TrailRing {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![TrailSample::default(); capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert at the head, evicting the oldest sample when full.
    pub fn push_front(&mut self, sample: TrailSample) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        self.head = (self.head + cap - 1) % cap;
        self.slots[self.head] = sample;
        self.len = (self.len + 1).min(cap);
    }

    /// Remove and return the oldest sample.
    pub fn pop_back(&mut self) -> Option<TrailSample> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.len - 1) % self.capacity();
        self.len -= 1;
        Some(self.slots[idx])
    }

    /// Sample `index` steps back from the most recent one.
    pub fn get(&self, index: usize) -> Option<&TrailSample> {
        if index >= self.len {
            return None;
        }
        Some(&self.slots[(self.head + index) % self.capacity()])
    }

    pub fn front(&self) -> Option<&TrailSample> {
        self.get(0)
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Iterate from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &TrailSample> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: f32) -> TrailSample {
        TrailSample {
            position: Vec2::new(n, -n),
            scale: 1.0,
        }
    }

    #[test]
    fn test_newest_first_and_eviction() {
        let mut ring = TrailRing::with_capacity(3);
        for n in 0..5 {
            ring.push_front(sample(n as f32));
            assert!(ring.len() <= ring.capacity());
        }
        let xs: Vec<f32> = ring.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_pop_back_removes_oldest() {
        let mut ring = TrailRing::with_capacity(4);
        ring.push_front(sample(1.0));
        ring.push_front(sample(2.0));
        ring.push_front(sample(3.0));
        assert_eq!(ring.pop_back().map(|s| s.position.x), Some(1.0));
        assert_eq!(ring.front().map(|s| s.position.x), Some(3.0));
        assert_eq!(ring.len(), 2);
        ring.pop_back();
        ring.pop_back();
        assert!(ring.pop_back().is_none());
        assert!(ring.is_empty());
    }

    #[test]
    fn test_push_after_pop_wraps() {
        let mut ring = TrailRing::with_capacity(2);
        ring.push_front(sample(1.0));
        ring.push_front(sample(2.0));
        ring.pop_back();
        ring.push_front(sample(3.0));
        let xs: Vec<f32> = ring.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![3.0, 2.0]);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut ring = TrailRing::with_capacity(0);
        ring.push_front(sample(1.0));
        assert!(ring.is_empty());
        assert!(ring.get(0).is_none());
    }

    #[test]
    fn test_clear() {
        let mut ring = TrailRing::with_capacity(3);
        ring.push_front(sample(1.0));
        ring.clear();
        assert!(ring.is_empty());
        assert!(ring.front().is_none());
    }
}
