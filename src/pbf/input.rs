//! Adapts a queue of byte chunks into a "read exactly N bytes" interface.
//!
//! The upstream side of the pipeline delivers whatever chunk sizes it
//! likes; the framing code needs exact byte counts. [`InputQueueReader`]
//! buffers the residue in between. An empty chunk is the EOF sentinel; a
//! disconnected channel counts as EOF too.

use std::io::Read;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

/// Chunk size used by [`spawn_feeder`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

const FEEDER_QUEUE_DEPTH: usize = 32;

/// Blocking adapter from a chunk queue to exact-size reads.
#[derive(Debug)]
pub struct InputQueueReader {
    queue: Receiver<Vec<u8>>,
    residue: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl InputQueueReader {
    /// Wraps a chunk receiver.
    pub fn new(queue: Receiver<Vec<u8>>) -> Self {
        Self {
            queue,
            residue: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    /// Fills `dst` completely, blocking on the queue as needed.
    ///
    /// Returns `false` iff EOF is reached before `dst.len()` bytes are
    /// available; in that case `dst` is untouched, the reader never
    /// partially fills.
    pub fn read_exact(&mut self, dst: &mut [u8]) -> bool {
        while self.available() < dst.len() {
            if self.eof {
                return false;
            }
            // Compact before growing so the residue does not creep.
            if self.pos > 0 {
                self.residue.drain(..self.pos);
                self.pos = 0;
            }
            match self.queue.recv() {
                Ok(chunk) if chunk.is_empty() => self.eof = true,
                Ok(chunk) => self.residue.extend_from_slice(&chunk),
                Err(_) => self.eof = true,
            }
        }
        dst.copy_from_slice(&self.residue[self.pos..self.pos + dst.len()]);
        self.pos += dst.len();
        true
    }

    fn available(&self) -> usize {
        self.residue.len() - self.pos
    }
}

/// Spawns a thread pumping `source` into a chunk channel, ending with the
/// EOF sentinel. Convenience for feeding [`PbfReader`] from any byte
/// stream.
///
/// A read error on `source` is logged and treated as EOF; if it cut a
/// frame short, the framing layer reports the truncation.
///
/// [`PbfReader`]: crate::pbf::PbfReader
pub fn spawn_feeder<R>(mut source: R) -> Receiver<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = bounded(FEEDER_QUEUE_DEPTH);
    let spawned = thread::Builder::new()
        .name("osmarena-feeder".into())
        .spawn(move || loop {
            let mut chunk = vec![0u8; DEFAULT_CHUNK_SIZE];
            match source.read(&mut chunk) {
                Ok(0) => {
                    let _ = tx.send(Vec::new());
                    return;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    if tx.send(chunk).is_err() {
                        // Receiver gone; the pipeline shut down.
                        return;
                    }
                }
                Err(e) => {
                    debug!("feeder read error, treating as EOF: {e}");
                    let _ = tx.send(Vec::new());
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        // Out of threads; the closed channel reads as an empty stream.
        debug!("failed to spawn feeder thread: {e}");
    }
    rx
}
