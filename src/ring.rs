//! LED ring animation engine
//!
//! Owns the pixel buffer for one ring and the animation state driving it.
//! On-demand commands mutate the buffer and retransmit; a dedicated loop
//! task produces the continuous spin/strobe animations and parks itself on
//! a wake signal whenever the ring is idle.
//!
//! The pixel buffer has exactly one writer at a time: every `set_*` call
//! forces the loop back to idle before touching the buffer, so a command
//! never races the loop task's rotation step.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use log::{error, info};

use crate::PulsePeripheral;
use crate::color::{Rgb, rainbow_color};
use crate::registry::{ChannelClaim, ChannelId};
use crate::stream::{PulseChannel, StreamError};

/// Interval between animation frames while a loop is active.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// What the animation loop is currently producing. At most one of the
/// animated states is active at a time; transitions go through the
/// `start_*`/`stop_loop` operations only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Idle,
    Spinning,
    Strobing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// LED count is zero or exceeds the ring's compile-time capacity.
    InvalidLedCount,
    /// An explicit color list did not match the ring's LED count.
    WrongColorCount,
    /// An empty pattern cannot be tiled.
    EmptyPattern,
    /// The streaming engine rejected the transmission.
    Stream(StreamError),
}

impl From<StreamError> for RingError {
    fn from(err: StreamError) -> Self {
        Self::Stream(err)
    }
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLedCount => write!(f, "invalid led count"),
            Self::WrongColorCount => write!(f, "color list does not match led count"),
            Self::EmptyPattern => write!(f, "pattern is empty"),
            Self::Stream(err) => write!(f, "transmission rejected: {err}"),
        }
    }
}

struct RingState<const N: usize> {
    pixels: Vec<Rgb, N>,
    animation: AnimationState,
}

/// One LED ring bound to a claimed output channel.
///
/// `N` is the compile-time pixel capacity; the runtime `led_count` may be
/// anything up to it. All operations take `&self`: the pixel buffer and
/// animation state live behind a critical-section mutex so the command
/// context and the loop task can share the ring.
pub struct LedRing<'a, P: PulsePeripheral, const N: usize> {
    channel: &'a PulseChannel<P, N>,
    claim: ChannelClaim<'a>,
    state: Mutex<RefCell<RingState<N>>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
    led_count: usize,
}

impl<'a, P: PulsePeripheral, const N: usize> LedRing<'a, P, N> {
    /// Create a ring with `led_count` LEDs on a claimed channel.
    pub fn new(
        claim: ChannelClaim<'a>,
        channel: &'a PulseChannel<P, N>,
        led_count: usize,
    ) -> Result<Self, RingError> {
        if led_count == 0 || led_count > N {
            error!("invalid led count {led_count} (capacity {N})");
            return Err(RingError::InvalidLedCount);
        }
        info!(
            "initializing LED ring with {led_count} LEDs on channel {}",
            claim.id()
        );

        let mut pixels = Vec::new();
        pixels
            .resize(led_count, Rgb::default())
            .map_err(|()| RingError::InvalidLedCount)?;

        Ok(Self {
            channel,
            claim,
            state: Mutex::new(RefCell::new(RingState {
                pixels,
                animation: AnimationState::Idle,
            })),
            wake: Signal::new(),
            led_count,
        })
    }

    pub const fn led_count(&self) -> usize {
        self.led_count
    }

    /// The output channel this ring is claimed on.
    pub const fn channel_id(&self) -> ChannelId {
        self.claim.id()
    }

    /// Copy of the current pixel buffer.
    pub fn snapshot(&self) -> Vec<Rgb, N> {
        critical_section::with(|cs| self.state.borrow(cs).borrow().pixels.clone())
    }

    pub fn animation_state(&self) -> AnimationState {
        critical_section::with(|cs| self.state.borrow(cs).borrow().animation)
    }

    /// Stop the animation loop. Cooperative: an in-flight transmission is
    /// never aborted, the loop just produces no further frames and parks.
    pub fn stop_loop(&self) {
        critical_section::with(|cs| {
            self.state.borrow(cs).borrow_mut().animation = AnimationState::Idle;
        });
    }

    /// Spin the current pattern around the ring, one step per frame.
    pub fn start_spinner_loop(&self) {
        info!("starting spinner loop");
        self.start_loop(AnimationState::Spinning);
    }

    /// Flash every LED with the color at the head of the buffer.
    pub fn start_strobing_loop(&self) {
        info!("starting strobing loop");
        self.start_loop(AnimationState::Strobing);
    }

    fn start_loop(&self, animation: AnimationState) {
        critical_section::with(|cs| {
            self.state.borrow(cs).borrow_mut().animation = animation;
        });
        self.wake.signal(());
    }

    /// Fill the whole ring with one color and transmit it.
    pub async fn set_one_color(&self, color: Rgb) -> Result<(), RingError> {
        self.stop_loop();
        self.fill_pixels(|_| color);
        // A single-entry pattern repeated across the ring.
        self.channel.transmit(&[color], self.led_count, true).await?;
        Ok(())
    }

    /// Set an explicit color for every pixel and transmit. The list length
    /// must equal the ring's LED count.
    pub async fn set_colors(&self, colors: &[Rgb]) -> Result<(), RingError> {
        if colors.len() != self.led_count {
            error!(
                "got {} colors for a ring of {} LEDs",
                colors.len(),
                self.led_count
            );
            return Err(RingError::WrongColorCount);
        }
        self.stop_loop();
        self.fill_pixels(|i| colors[i]);
        self.update().await
    }

    /// Tile a pattern across the ring (pixel `i` gets `pattern[i % len]`)
    /// and transmit.
    pub async fn set_pattern(&self, pattern: &[Rgb]) -> Result<(), RingError> {
        if pattern.is_empty() {
            error!("cannot tile an empty pattern");
            return Err(RingError::EmptyPattern);
        }
        self.stop_loop();
        self.fill_pixels(|i| pattern[i % pattern.len()]);
        self.update().await
    }

    /// Fill the ring with a 6-section hue sweep and transmit.
    pub async fn set_rainbow(&self, max_brightness: u8) -> Result<(), RingError> {
        self.stop_loop();
        self.fill_pixels(|i| rainbow_color(i, self.led_count, max_brightness));
        self.update().await
    }

    /// Retransmit the current pixel buffer.
    pub async fn update(&self) -> Result<(), RingError> {
        let frame = self.snapshot();
        self.channel.transmit(&frame, self.led_count, true).await?;
        Ok(())
    }

    fn fill_pixels(&self, mut color_at: impl FnMut(usize) -> Rgb) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            for (i, pixel) in state.pixels.iter_mut().enumerate() {
                *pixel = color_at(i);
            }
        });
    }

    /// The animation loop task body. Spawn this once per ring; it parks on
    /// the wake signal while idle and otherwise produces one frame per
    /// [`FRAME_INTERVAL`].
    pub async fn run(&self) -> ! {
        info!("animation loop running");
        loop {
            if self.animation_state() == AnimationState::Idle {
                self.wake.wait().await;
                continue;
            }
            self.run_frame().await;
            Timer::after(FRAME_INTERVAL).await;
        }
    }

    /// Produce one animation frame.
    ///
    /// Strobing transmits the head pixel's color repeated over the whole
    /// ring without touching the buffer. Spinning transmits the full buffer
    /// and then rotates it left by one, so a full revolution takes
    /// `led_count` frames.
    pub async fn run_frame(&self) {
        let (animation, frame) = critical_section::with(|cs| {
            let state = self.state.borrow(cs).borrow();
            (state.animation, state.pixels.clone())
        });

        let result = match animation {
            AnimationState::Idle => Ok(()),
            AnimationState::Strobing => {
                self.channel
                    .transmit(&frame[..1], self.led_count, true)
                    .await
            }
            AnimationState::Spinning => {
                let result = self.channel.transmit(&frame, self.led_count, true).await;
                self.rotate();
                result
            }
        };
        if let Err(err) = result {
            error!("animation frame dropped: {err}");
        }
    }

    fn rotate(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            state.pixels.rotate_left(1);
        });
    }
}
