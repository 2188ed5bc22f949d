pub mod clock;
pub mod ring_buffer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ring_buffer::RingBuffer;
