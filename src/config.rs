use std::thread;

/// Initial size of each reader buffer.
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;
/// Largest buffer a reader may grow to while looking for a newline.
pub const DEFAULT_MAX_BUFFER: usize = 16 * 1024 * 1024;
pub const DEFAULT_READERS: usize = 2;
/// Batches allowed in flight per worker.
const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Tunables for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub readers: usize,
    pub workers: usize,
    pub block_size: usize,
    pub max_buffer: usize,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        let workers = cores.saturating_sub(DEFAULT_READERS).max(1);
        Self {
            readers: DEFAULT_READERS,
            workers,
            block_size: DEFAULT_BLOCK_SIZE,
            max_buffer: DEFAULT_MAX_BUFFER,
            queue_capacity: workers * QUEUE_DEPTH_PER_WORKER,
        }
    }
}

impl Config {
    pub fn with_readers(mut self, readers: usize) -> Self {
        self.readers = readers;
        self
    }

    /// Also resizes the queue to keep the same depth per worker.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_capacity = workers.max(1) * QUEUE_DEPTH_PER_WORKER;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Clamps zeros to 1 and keeps `max_buffer >= block_size`.
    pub fn normalized(mut self) -> Self {
        self.readers = self.readers.max(1);
        self.workers = self.workers.max(1);
        self.block_size = self.block_size.max(1);
        self.max_buffer = self.max_buffer.max(self.block_size);
        self.queue_capacity = self.queue_capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaves_room_for_readers() {
        let config = Config::default();
        assert_eq!(config.readers, DEFAULT_READERS);
        assert!(config.workers >= 1);
        assert_eq!(config.queue_capacity, config.workers * QUEUE_DEPTH_PER_WORKER);
    }

    #[test]
    fn normalized_clamps() {
        let config = Config::default()
            .with_readers(0)
            .with_workers(0)
            .with_block_size(64)
            .with_max_buffer(8)
            .with_queue_capacity(0)
            .normalized();
        assert_eq!(config.readers, 1);
        assert_eq!(config.workers, 1);
        assert_eq!(config.max_buffer, 64);
        assert_eq!(config.queue_capacity, 1);
    }
}
