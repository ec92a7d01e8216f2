#![no_std]

pub mod color;
pub mod registry;
pub mod resource;
pub mod ring;
pub mod stream;
pub mod waveform;

pub use color::{Rgb, rainbow_color};
pub use registry::{CHANNEL_COUNT, ChannelClaim, ChannelId, ChannelRegistry, RegistryError};
pub use resource::{DOTS, ModeReport, ModeRequest, ResourceError, RingMode, RingResource};
pub use ring::{AnimationState, FRAME_INTERVAL, LedRing, RingError};
pub use stream::{PulseChannel, StreamError, TxPhase};
pub use waveform::PulseItem;

pub use embassy_time::Duration;

/// Abstract pulse generator trait
///
/// Implement this trait to bind the driver to one hardware output channel
/// (e.g. an RMT transmitter). The streaming engine is generic over it.
///
/// `write` and `start` are called with interrupts masked, from both task
/// and interrupt context; implementations must not block.
pub trait PulsePeripheral {
    /// Capacity of the hardware pulse buffer, in items.
    fn capacity(&self) -> usize;

    /// Write one item into the hardware buffer at the given offset.
    fn write(&mut self, offset: usize, item: PulseItem);

    /// Begin transmitting from the start of the hardware buffer.
    ///
    /// `half_threshold` enables the half-consumed event each time that many
    /// items have been sent; `None` disables it for trains that fit in a
    /// single load.
    fn start(&mut self, half_threshold: Option<usize>);
}
