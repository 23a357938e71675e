//! Hand-off between readers and workers.
//!
//! Readers push whole [`Batch`]es into a bounded crossbeam channel and any
//! idle worker takes the next one. Completion needs no extra signal: once
//! every [`Producer`] clone is dropped and the queue is drained, `pop`
//! returns `None`. A second channel runs the other way and carries emptied
//! buffers back to the readers.

use crossbeam_channel::{Receiver, Sender};

/// A run of complete records cut from one reader buffer.
///
/// `data` is the whole buffer. Bytes past the last entry of `ends` are stale
/// and never read, so the buffer can be recycled without clearing it.
#[derive(Debug)]
pub struct Batch {
    data: Vec<u8>,
    ends: Vec<usize>,
    offset: u64,
}

impl Batch {
    /// `ends` holds the index of each record terminator in `data`; for a final
    /// record without a newline the last entry is where its bytes stop.
    /// `offset` is the file position of `data[0]`.
    pub fn new(data: Vec<u8>, ends: Vec<usize>, offset: u64) -> Self {
        debug_assert!(ends.last().map_or(true, |&end| end <= data.len()));
        Self { data, ends, offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Yields `(absolute offset, record bytes)` without terminators.
    pub fn records(&self) -> impl Iterator<Item = (u64, &[u8])> + '_ {
        let mut start = 0;
        self.ends.iter().map(move |&end| {
            let record = (self.offset + start as u64, &self.data[start..end]);
            start = end + 1;
            record
        })
    }

    /// Gives up the backing buffer so it can be reused.
    pub fn into_buffer(self) -> Vec<u8> {
        self.data
    }
}

/// Where a reader sends finished batches.
pub trait BatchSink {
    /// Returns `false` once nobody is left to take batches.
    fn submit(&mut self, batch: Batch) -> bool;

    /// A buffer handed back by a consumer, if one is waiting.
    fn reclaim(&mut self) -> Option<Vec<u8>> {
        None
    }
}

impl BatchSink for Vec<Batch> {
    fn submit(&mut self, batch: Batch) -> bool {
        self.push(batch);
        true
    }
}

/// Reader side of the queue. Clone one per reader.
#[derive(Clone)]
pub struct Producer {
    batches: Sender<Batch>,
    free: Receiver<Vec<u8>>,
}

/// Worker side of the queue. Clone one per worker.
#[derive(Clone)]
pub struct Consumer {
    batches: Receiver<Batch>,
    free: Sender<Vec<u8>>,
}

/// Creates a queue holding at most `capacity` batches in flight.
pub fn channel(capacity: usize) -> (Producer, Consumer) {
    let capacity = capacity.max(1);
    let (batch_tx, batch_rx) = crossbeam_channel::bounded(capacity);
    let (free_tx, free_rx) = crossbeam_channel::bounded(capacity);
    (
        Producer {
            batches: batch_tx,
            free: free_rx,
        },
        Consumer {
            batches: batch_rx,
            free: free_tx,
        },
    )
}

impl Producer {
    /// Blocks while the queue is full. Fails only when every consumer is gone.
    pub fn push(&self, batch: Batch) -> bool {
        self.batches.send(batch).is_ok()
    }
}

impl BatchSink for Producer {
    fn submit(&mut self, batch: Batch) -> bool {
        self.push(batch)
    }

    fn reclaim(&mut self) -> Option<Vec<u8>> {
        self.free.try_recv().ok()
    }
}

impl Consumer {
    /// Blocks until a batch is available, or returns `None` when all
    /// producers are finished and nothing is left.
    pub fn pop(&self) -> Option<Batch> {
        self.batches.recv().ok()
    }

    /// Offers a spent buffer back to the readers; dropped if nobody wants it.
    pub fn recycle(&self, buffer: Vec<u8>) {
        let _ = self.free.try_send(buffer);
    }
}
