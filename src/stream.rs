//! Double-buffered pulse streaming
//!
//! Turns a color sequence into one uninterrupted pulse train on a hardware
//! channel whose item buffer may be smaller than the full train. The first
//! buffer load happens in the calling context; after that the hardware's
//! half-consumed event refills the just-emptied half from interrupt context
//! while the other half is still on the wire, until the train (reset gap
//! included) has been sent and the blocked caller is released.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;
use log::{debug, error};

use crate::PulsePeripheral;
use crate::color::Rgb;
use crate::waveform::{self, ITEMS_PER_COLOR, PulseItem};

const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// Errors reported by [`PulseChannel::transmit`]. All of them are rejected
/// before any hardware side effect begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The color sequence was empty.
    NoColors,
    /// `led_count` was zero.
    NoLeds,
    /// `led_count` exceeds the channel's compile-time color capacity.
    ChannelTooSmall,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColors => write!(f, "empty color sequence"),
            Self::NoLeds => write!(f, "led count is zero"),
            Self::ChannelTooSmall => write!(f, "led count exceeds channel capacity"),
        }
    }
}

/// Per-channel transmission phase.
///
/// `Loading` covers the initial synchronous buffer fill, `Streaming` the
/// double-buffered refill period, and `Draining` the tail where every item
/// is already in the hardware buffer and the channel is waiting for the
/// end-of-transmission event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxPhase {
    #[default]
    Idle,
    Loading,
    Streaming,
    Draining,
}

/// Progress of one in-flight transmission: how far into the pixel sequence
/// the encoder has advanced and which buffer window is being filled.
struct StreamCursor<const N: usize> {
    colors: Vec<Rgb, N>,
    led_count: usize,
    repeat: bool,
    /// Next item to encode, counted over the whole train.
    item_offset: usize,
    total_items: usize,
    /// Write window within the hardware buffer.
    buffer_offset: usize,
    buffer_limit: usize,
}

impl<const N: usize> StreamCursor<N> {
    fn new(colors: &[Rgb], led_count: usize, repeat: bool) -> Result<Self, StreamError> {
        let colors = Vec::from_slice(colors).map_err(|()| StreamError::ChannelTooSmall)?;
        Ok(Self {
            colors,
            led_count,
            repeat,
            item_offset: 0,
            total_items: led_count * ITEMS_PER_COLOR + 1,
            buffer_offset: 0,
            buffer_limit: 0,
        })
    }

    fn item_at(&self, offset: usize) -> PulseItem {
        if offset + 1 == self.total_items {
            return waveform::RESET;
        }
        let led = offset / ITEMS_PER_COLOR;
        let bit = offset % ITEMS_PER_COLOR;
        let color = if led < self.colors.len() {
            self.colors[led]
        } else if self.repeat {
            self.colors[led % self.colors.len()]
        } else {
            // Non-repeating patterns drive the trailing pixels dark instead
            // of leaving stale peripheral state on the wire.
            BLACK
        };
        waveform::encode_color_bit(color, bit)
    }

    /// Encode items into the current buffer window until either the window
    /// or the train is exhausted. Bounded, non-blocking; runs from both the
    /// caller context (initial load) and interrupt context (refills).
    fn fill<P: PulsePeripheral>(&mut self, peripheral: &mut P) {
        while self.item_offset < self.total_items && self.buffer_offset < self.buffer_limit {
            let item = self.item_at(self.item_offset);
            peripheral.write(self.buffer_offset, item);
            self.buffer_offset += 1;
            self.item_offset += 1;
        }
    }

    fn is_complete(&self) -> bool {
        self.item_offset == self.total_items
    }
}

struct TxState<P, const N: usize> {
    peripheral: P,
    phase: TxPhase,
    cursor: Option<StreamCursor<N>>,
}

/// One hardware output channel with double-buffered streaming.
///
/// `N` is the maximum number of colors one transmission may carry. The
/// cursor and peripheral are only ever touched with interrupts masked; the
/// blocked caller just waits on the completion signal. Transmissions are
/// serialized per channel by an async permit, so a second caller blocks
/// until the first train's reset gap is on the wire.
pub struct PulseChannel<P: PulsePeripheral, const N: usize> {
    state: Mutex<RefCell<TxState<P, N>>>,
    done: Signal<CriticalSectionRawMutex, ()>,
    permit: AsyncMutex<CriticalSectionRawMutex, ()>,
}

impl<P: PulsePeripheral, const N: usize> PulseChannel<P, N> {
    pub const fn new(peripheral: P) -> Self {
        Self {
            state: Mutex::new(RefCell::new(TxState {
                peripheral,
                phase: TxPhase::Idle,
                cursor: None,
            })),
            done: Signal::new(),
            permit: AsyncMutex::new(()),
        }
    }

    /// Transmit `led_count` pixels drawn from `colors` as one pulse train,
    /// reset gap included.
    ///
    /// A sequence shorter than `led_count` is tiled across the ring when
    /// `repeat` is set, and padded with dark pixels otherwise. A longer
    /// sequence is truncated to `led_count`. On return the full train has
    /// been physically transmitted and the channel is idle again.
    pub async fn transmit(
        &self,
        colors: &[Rgb],
        led_count: usize,
        repeat: bool,
    ) -> Result<(), StreamError> {
        let _permit = self.permit.lock().await;

        if colors.is_empty() {
            error!("rejecting transmission of empty color sequence");
            return Err(StreamError::NoColors);
        }
        if led_count == 0 {
            error!("rejecting transmission with led count 0");
            return Err(StreamError::NoLeds);
        }
        if led_count > N {
            error!("led count {led_count} exceeds channel capacity {N}");
            return Err(StreamError::ChannelTooSmall);
        }

        let color_count = colors.len().min(led_count);
        let mut cursor = StreamCursor::new(&colors[..color_count], led_count, repeat)?;
        debug!(
            "transmitting {} items ({color_count} colors over {led_count} leds)",
            cursor.total_items
        );

        self.done.reset();
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            let state = &mut *state;

            state.phase = TxPhase::Loading;
            let capacity = state.peripheral.capacity();
            cursor.buffer_limit = capacity;
            cursor.fill(&mut state.peripheral);

            if cursor.is_complete() {
                state.phase = TxPhase::Draining;
                state.peripheral.start(None);
            } else {
                state.phase = TxPhase::Streaming;
                state.peripheral.start(Some(capacity / 2));
            }
            state.cursor = Some(cursor);
        });

        self.done.wait().await;
        debug!("transmission complete");
        Ok(())
    }

    /// Current phase of the channel's transmission state machine.
    pub fn phase(&self) -> TxPhase {
        critical_section::with(|cs| self.state.borrow(cs).borrow().phase)
    }

    /// Half-consumed event, delivered from interrupt context.
    ///
    /// Refills the buffer half that just finished transmitting, alternating
    /// between the two halves. Spurious events outside the streaming phase
    /// are ignored.
    pub fn on_half_transmitted(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            let state = &mut *state;

            if state.phase != TxPhase::Streaming {
                return;
            }
            let Some(cursor) = state.cursor.as_mut() else {
                return;
            };

            let capacity = state.peripheral.capacity();
            let half = capacity / 2;
            if cursor.buffer_limit == capacity {
                // Just finished the first half; refill it while the second
                // half transmits.
                cursor.buffer_offset = 0;
                cursor.buffer_limit = half;
            } else {
                cursor.buffer_offset = half;
                cursor.buffer_limit = capacity;
            }
            cursor.fill(&mut state.peripheral);

            if cursor.is_complete() {
                state.phase = TxPhase::Draining;
            }
        });
    }

    /// End-of-transmission event, delivered from interrupt context after
    /// the reset gap has been sent. Clears the cursor and releases the
    /// waiting caller.
    pub fn on_transmit_end(&self) {
        let finished = critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            if state.phase == TxPhase::Idle {
                return false;
            }
            state.cursor = None;
            state.phase = TxPhase::Idle;
            true
        });
        if finished {
            self.done.signal(());
        }
    }
}
