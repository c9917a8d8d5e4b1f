//! The pipeline coordinator: one reader thread, a decode pool, and an
//! ordered queue of buffer futures.
//!
//! The reader thread frames blobs off the input queue serially and
//! submits each decode to the worker pool; the future for every decode is
//! pushed into the output queue at submit time, so the consumer always
//! receives buffers in file order no matter how the workers interleave.
//!
//! Back-pressure comes from two sides: the output queue is a bounded
//! channel whose push blocks once `max_buffer_queue` futures are waiting,
//! and the reader additionally sleeps while more than `max_work_queue`
//! decodes are in flight. Both waits re-check the `done` flag every
//! ~10 ms so shutdown stays prompt.
//!
//! Cancellation is cooperative: dropping the [`PbfReader`] sets `done`
//! and joins the reader thread. Decode tasks already running just finish
//! against dropped one-shot receivers and their buffers are discarded, so
//! after the drop no worker writes to memory the caller can reach.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use tracing::{debug, span, Level};

use crate::arena::Buffer;
use crate::error::{OsmarenaError, Result};
use crate::osm::{EntityKinds, Header};
use crate::pbf::blob::{
    parse_blob_payload, read_blob, read_blob_header, OSM_DATA_TYPE, OSM_HEADER_TYPE,
};
use crate::pbf::block::parse_primitive_block;
use crate::pbf::header::parse_header_block;
use crate::pbf::input::{spawn_feeder, InputQueueReader};

const BACKPRESSURE_INTERVAL: Duration = Duration::from_millis(10);

/// One-shot future resolving to a decoded buffer.
type BufferFuture = Receiver<Result<Buffer>>;

/// Tuning knobs for a [`PbfReader`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Which entity kinds to decode. With nothing requested, the reader
    /// thread is never spawned and `read()` reports end of stream.
    pub kinds: EntityKinds,
    /// Decode inline on the reader thread instead of the pool. Useful for
    /// debugging; throughput drops to a single core.
    pub serial: bool,
    /// The pool decode tasks run on. `None` uses rayon's global pool.
    pub pool: Option<Arc<rayon::ThreadPool>>,
    /// Sleep once more than this many decodes are in flight.
    pub max_work_queue: usize,
    /// Capacity of the ordered future queue.
    pub max_buffer_queue: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            kinds: EntityKinds::ALL,
            serial: false,
            pool: None,
            max_work_queue: 10,
            max_buffer_queue: 20,
        }
    }
}

impl ReadOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the entity kinds to decode.
    pub fn kinds(mut self, kinds: EntityKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Switches to inline serial decoding.
    pub fn serial(mut self, serial: bool) -> Self {
        self.serial = serial;
        self
    }

    /// Injects a worker pool. Tests inject a single-threaded pool for
    /// determinism.
    pub fn pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Adjusts both queue limits.
    pub fn queue_limits(mut self, max_work_queue: usize, max_buffer_queue: usize) -> Self {
        self.max_work_queue = max_work_queue;
        self.max_buffer_queue = max_buffer_queue.max(1);
        self
    }
}

/// Streaming PBF reader.
///
/// Created with [`PbfReader::open`] from a chunk queue (or
/// [`PbfReader::from_read`] from any byte stream). Each [`read`] returns
/// the next buffer of decoded objects in file order; an empty buffer
/// signals the end of the stream.
///
/// [`read`]: PbfReader::read
#[derive(Debug)]
pub struct PbfReader {
    header: Header,
    output: Receiver<BufferFuture>,
    done: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl PbfReader {
    /// Opens a PBF stream delivered as byte chunks.
    ///
    /// Reads and decodes the `OSMHeader` blob synchronously, then spawns
    /// the reader thread (unless no entity kind was requested). An empty
    /// input is not an error: the header comes back default and the
    /// stream is immediately at its end.
    pub fn open(input: Receiver<Vec<u8>>, options: ReadOptions) -> Result<Self> {
        let mut input = InputQueueReader::new(input);

        let header = match read_blob_header(&mut input, OSM_HEADER_TYPE)? {
            Some(size) => {
                let raw = read_blob(&mut input, size)?;
                parse_header_block(&parse_blob_payload(&raw)?)?
            }
            None => Header::default(),
        };

        let (out_tx, out_rx) = bounded(options.max_buffer_queue.max(1));
        let done = Arc::new(AtomicBool::new(false));

        let reader = if options.kinds.is_empty() {
            // Nothing requested: leave the output queue closed so read()
            // reports end of stream right away.
            drop(out_tx);
            None
        } else {
            let done = Arc::clone(&done);
            let handle = thread::Builder::new()
                .name("osmarena-pbf-reader".into())
                .spawn(move || run_reader(input, out_tx, &done, &options))
                .map_err(OsmarenaError::from)?;
            Some(handle)
        };

        Ok(Self {
            header,
            output: out_rx,
            done,
            reader,
        })
    }

    /// Opens a PBF stream from any byte source via an internal feeder
    /// thread.
    pub fn from_read<R>(source: R, options: ReadOptions) -> Result<Self>
    where
        R: std::io::Read + Send + 'static,
    {
        Self::open(spawn_feeder(source), options)
    }

    /// The file header decoded during open.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the next buffer of decoded objects, blocking until it is
    /// ready. An empty buffer signals the end of the stream; any decode
    /// or framing error ends the stream with that error.
    pub fn read(&mut self) -> Result<Buffer> {
        loop {
            match self.output.recv() {
                Ok(future) => match future.recv() {
                    // A block whose entities were all filtered out decodes
                    // to nothing; the empty buffer stays reserved for end
                    // of stream.
                    Ok(Ok(buffer)) if buffer.is_empty() => continue,
                    Ok(result) => return result,
                    Err(_) => {
                        return Err(OsmarenaError::Internal(
                            "decode task dropped its result".into(),
                        ))
                    }
                },
                // Reader finished and the queue is drained.
                Err(_) => return Ok(Buffer::default()),
            }
        }
    }
}

impl Drop for PbfReader {
    fn drop(&mut self) {
        self.done.store(true, Ordering::SeqCst);
        // Unblock a reader stuck on a full output queue.
        while self.output.try_recv().is_ok() {}
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

fn run_reader(
    mut input: InputQueueReader,
    out_tx: Sender<BufferFuture>,
    done: &AtomicBool,
    options: &ReadOptions,
) {
    let span = span!(Level::DEBUG, "pbf_reader");
    let _guard = span.enter();
    let pending = Arc::new(AtomicUsize::new(0));
    let mut blob_num = 0u64;

    loop {
        if done.load(Ordering::Relaxed) {
            return;
        }

        let size = match read_blob_header(&mut input, OSM_DATA_TYPE) {
            Ok(Some(size)) => size,
            Ok(None) => {
                debug!(blobs = blob_num, "end of stream");
                return;
            }
            Err(e) => {
                push_error(&out_tx, done, e);
                return;
            }
        };
        let raw = match read_blob(&mut input, size) {
            Ok(raw) => raw,
            Err(e) => {
                push_error(&out_tx, done, e);
                return;
            }
        };

        let (tx, rx) = bounded::<Result<Buffer>>(1);
        let kinds = options.kinds;
        if options.serial {
            if !push_future(&out_tx, done, rx) {
                return;
            }
            let _ = tx.send(decode_blob(&raw, kinds));
        } else {
            pending.fetch_add(1, Ordering::SeqCst);
            let task_pending = Arc::clone(&pending);
            let task = move || {
                let result = decode_blob(&raw, kinds);
                // The receiver may be gone after shutdown; the buffer is
                // simply discarded.
                let _ = tx.send(result);
                task_pending.fetch_sub(1, Ordering::SeqCst);
            };
            match &options.pool {
                Some(pool) => pool.spawn(task),
                None => rayon::spawn(task),
            }
            if !push_future(&out_tx, done, rx) {
                return;
            }
            while pending.load(Ordering::SeqCst) > options.max_work_queue {
                if done.load(Ordering::Relaxed) {
                    return;
                }
                thread::sleep(BACKPRESSURE_INTERVAL);
            }
        }
        blob_num += 1;
    }
}

fn decode_blob(raw: &[u8], kinds: EntityKinds) -> Result<Buffer> {
    let payload = parse_blob_payload(raw)?;
    parse_primitive_block(&payload, kinds)
}

/// Pushes a future into the bounded output queue, re-checking `done`
/// every timeout so a blocked reader shuts down promptly.
fn push_future(out_tx: &Sender<BufferFuture>, done: &AtomicBool, future: BufferFuture) -> bool {
    let mut future = future;
    loop {
        match out_tx.send_timeout(future, BACKPRESSURE_INTERVAL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(returned)) => {
                if done.load(Ordering::Relaxed) {
                    return false;
                }
                future = returned;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

/// Surfaces a fatal reader-side error as an already-resolved future.
fn push_error(out_tx: &Sender<BufferFuture>, done: &AtomicBool, error: OsmarenaError) {
    debug!(%error, "reader thread failed");
    let (tx, rx) = bounded(1);
    let _ = tx.send(Err(error));
    push_future(out_tx, done, rx);
}
