// src/scheduler/chunks.rs

//! The fixed chunk partition and its two-state queue.

use std::collections::VecDeque;

use crate::raster::Rect;

pub type ChunkId = usize;

/// One cell of the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub id: ChunkId,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Unprocessed,
    Processed,
}

/// A queued chunk and the generation it was queued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    id: ChunkId,
    generation: u64,
}

/// Every chunk of the partition, each either waiting in the FIFO
/// `unprocessed` queue or sitting in `processed`.
#[derive(Debug, Clone)]
pub struct ChunkQueue {
    chunks: Vec<Chunk>,
    states: Vec<ChunkState>,
    unprocessed: VecDeque<Pending>,
    processed: Vec<ChunkId>,
}

impl ChunkQueue {
    /// Tiles a `width × height` raster with `chunk_width × chunk_height`
    /// chunks in row-major order. Chunks on the right and bottom edges are
    /// clipped to the raster. Every chunk starts unprocessed under
    /// `generation`.
    pub fn partition(width: u32, height: u32, chunk_width: u32, chunk_height: u32, generation: u64) -> Self {
        let (cw, ch) = (chunk_width.max(1), chunk_height.max(1));
        let mut chunks = Vec::new();
        for y in (0..height).step_by(ch as usize) {
            for x in (0..width).step_by(cw as usize) {
                chunks.push(Chunk {
                    id: chunks.len(),
                    rect: Rect::new(x, y, cw.min(width - x), ch.min(height - y)),
                });
            }
        }
        let unprocessed = chunks
            .iter()
            .map(|c| Pending {
                id: c.id,
                generation,
            })
            .collect();
        Self {
            states: vec![ChunkState::Unprocessed; chunks.len()],
            chunks,
            unprocessed,
            processed: Vec::new(),
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn unprocessed_len(&self) -> usize {
        self.unprocessed.len()
    }

    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    pub fn state(&self, id: ChunkId) -> Option<ChunkState> {
        self.states.get(id).copied()
    }

    /// Ids waiting to be rendered, front first.
    pub fn unprocessed_ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.unprocessed.iter().map(|p| p.id)
    }

    /// Moves the front of the queue to `processed` and returns it along
    /// with the generation it was queued under.
    pub fn pop_front(&mut self) -> Option<(Chunk, u64)> {
        let pending = self.unprocessed.pop_front()?;
        self.states[pending.id] = ChunkState::Processed;
        self.processed.push(pending.id);
        Some((self.chunks[pending.id], pending.generation))
    }

    /// Appends every processed chunk to the tail of the queue in the order
    /// it was processed. Chunks already queued keep their place; everything
    /// queued ends up tagged with `generation`.
    pub fn invalidate_all(&mut self, generation: u64) {
        for pending in self.unprocessed.iter_mut() {
            pending.generation = generation;
        }
        for id in self.processed.drain(..) {
            self.states[id] = ChunkState::Unprocessed;
            self.unprocessed.push_back(Pending { id, generation });
        }
    }

    /// Moves every queued chunk to `processed` without rendering it.
    pub fn stop_processing(&mut self) {
        for pending in self.unprocessed.drain(..) {
            self.states[pending.id] = ChunkState::Processed;
            self.processed.push(pending.id);
        }
    }

    /// `processed ∪ unprocessed` is exactly the partition, with no chunk in
    /// both and none repeated.
    pub fn is_consistent(&self) -> bool {
        let mut seen = vec![false; self.chunks.len()];
        let queued = self.unprocessed.iter().map(|p| (p.id, ChunkState::Unprocessed));
        let done = self.processed.iter().map(|&id| (id, ChunkState::Processed));
        for (id, state) in queued.chain(done) {
            match seen.get_mut(id) {
                Some(flag) if !*flag && self.states[id] == state => *flag = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_raster_with_clipped_edges() {
        let queue = ChunkQueue::partition(300, 100, 128, 64, 0);
        assert_eq!(queue.len(), 6);
        let rects: Vec<Rect> = queue.chunks().iter().map(|c| c.rect).collect();
        assert_eq!(rects[0], Rect::new(0, 0, 128, 64));
        assert_eq!(rects[2], Rect::new(256, 0, 44, 64));
        assert_eq!(rects[5], Rect::new(256, 64, 44, 36));
        let area: usize = rects.iter().map(|r| r.width as usize * r.height as usize).sum();
        assert_eq!(area, 300 * 100);
        assert!(queue.is_consistent());
    }

    #[test]
    fn pop_is_fifo_and_moves_to_processed() {
        let mut queue = ChunkQueue::partition(512, 100, 256, 100, 3);
        let (first, generation) = queue.pop_front().unwrap();
        assert_eq!((first.id, generation), (0, 3));
        assert_eq!(queue.state(0), Some(ChunkState::Processed));
        assert_eq!(queue.state(1), Some(ChunkState::Unprocessed));
        assert!(queue.is_consistent());
        assert_eq!(queue.pop_front().map(|(c, _)| c.id), Some(1));
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn invalidation_appends_in_processing_order() {
        let mut queue = ChunkQueue::partition(400, 100, 100, 100, 0);
        queue.pop_front();
        queue.pop_front();
        queue.invalidate_all(1);
        assert_eq!(queue.unprocessed_ids().collect::<Vec<_>>(), vec![2, 3, 0, 1]);
        assert_eq!(queue.processed_len(), 0);
        assert!(queue.is_consistent());
        assert!(queue.pop_front().iter().all(|(_, g)| *g == 1));
    }

    #[test]
    fn stop_after_invalidate_leaves_nothing_pending() {
        let mut queue = ChunkQueue::partition(400, 200, 100, 100, 0);
        queue.pop_front();
        queue.invalidate_all(1);
        queue.stop_processing();
        assert_eq!(queue.unprocessed_len(), 0);
        assert_eq!(queue.processed_len(), 8);
        assert!((0..8).all(|id| queue.state(id) == Some(ChunkState::Processed)));
        assert!(queue.is_consistent());
    }
}
