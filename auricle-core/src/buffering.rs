//! Lock-free SPSC ring buffer for PCM16 samples.
//!
//! Uses `ringbuf::HeapRb<i16>` whose wait-free `push_slice` is safe to call
//! from a real-time capture callback.

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Producer};

/// Type alias for the producer half — held by the external capture layer.
pub type SampleProducer = ringbuf::HeapProd<i16>;

/// Type alias for the consumer half — held by the pipeline thread.
pub type SampleConsumer = ringbuf::HeapCons<i16>;

/// Buffer capacity: 2^21 = 2 097 152 i16 samples ≈ 131 s at 16 kHz.
/// Large enough that a stalled pipeline iteration never drops capture data.
pub const RING_CAPACITY: usize = 1 << 21;

/// Create a matched producer/consumer pair backed by a heap-allocated ring.
pub fn create_sample_ring() -> (SampleProducer, SampleConsumer) {
    HeapRb::<i16>::new(RING_CAPACITY).split()
}
