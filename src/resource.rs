//! Remote control contract for one LED ring
//!
//! The transport (request/response server, message codec, network bring-up)
//! lives outside this crate; whatever it is, it decodes a request into a
//! [`ModeRequest`] and applies it here. A malformed or unknown request is
//! rejected with a distinct error and leaves both the stored mode and the
//! engine untouched.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use log::{error, info};

use crate::PulsePeripheral;
use crate::color::Rgb;
use crate::ring::{LedRing, RingError};

const MODE_NAME_SOLID_COLOR: &str = "solid_color";
const MODE_NAME_STATIC_RAINBOW: &str = "static_rainbow";
const MODE_NAME_SPINNING_RAINBOW: &str = "spinning_rainbow";
const MODE_NAME_STROBING_RAINBOW: &str = "strobing_rainbow";
const MODE_NAME_STATIC_DOTS: &str = "static_dots";
const MODE_NAME_SPINNING_DOTS: &str = "spinning_dots";
const MODE_NAME_STROBING_DOTS: &str = "strobing_dots";

/// Brightness used by all rainbow modes.
pub const RAINBOW_BRIGHTNESS: u8 = 64;

/// The dots pattern: one lit pixel out of every three.
pub const DOTS: [Rgb; 3] = [
    Rgb {
        r: 64,
        g: 64,
        b: 64,
    },
    Rgb { r: 0, g: 0, b: 0 },
    Rgb { r: 0, g: 0, b: 0 },
];

/// Lighting modes the resource accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingMode {
    SolidColor,
    StaticRainbow,
    SpinningRainbow,
    StrobingRainbow,
    StaticDots,
    SpinningDots,
    StrobingDots,
}

impl RingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SolidColor => MODE_NAME_SOLID_COLOR,
            Self::StaticRainbow => MODE_NAME_STATIC_RAINBOW,
            Self::SpinningRainbow => MODE_NAME_SPINNING_RAINBOW,
            Self::StrobingRainbow => MODE_NAME_STROBING_RAINBOW,
            Self::StaticDots => MODE_NAME_STATIC_DOTS,
            Self::SpinningDots => MODE_NAME_SPINNING_DOTS,
            Self::StrobingDots => MODE_NAME_STROBING_DOTS,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            MODE_NAME_SOLID_COLOR => Some(Self::SolidColor),
            MODE_NAME_STATIC_RAINBOW => Some(Self::StaticRainbow),
            MODE_NAME_SPINNING_RAINBOW => Some(Self::SpinningRainbow),
            MODE_NAME_STROBING_RAINBOW => Some(Self::StrobingRainbow),
            MODE_NAME_STATIC_DOTS => Some(Self::StaticDots),
            MODE_NAME_SPINNING_DOTS => Some(Self::SpinningDots),
            MODE_NAME_STROBING_DOTS => Some(Self::StrobingDots),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// The mode name is not one of the recognized modes.
    UnknownMode,
    /// `solid_color` was requested without its three color components.
    MissingColor,
    /// The engine rejected the resulting operation.
    Ring(RingError),
}

impl From<RingError> for ResourceError {
    fn from(err: RingError) -> Self {
        Self::Ring(err)
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMode => write!(f, "unknown mode"),
            Self::MissingColor => write!(f, "solid_color requires color components"),
            Self::Ring(err) => write!(f, "{err}"),
        }
    }
}

/// A decoded write request: the mode name from the wire, plus the color
/// components when the transport received any.
#[derive(Debug, Clone, Copy)]
pub struct ModeRequest<'a> {
    pub mode: &'a str,
    pub color: Option<Rgb>,
}

/// Snapshot returned by a read: the active mode, with the solid color's
/// components when the mode is `solid_color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeReport {
    pub mode: RingMode,
    pub color: Option<Rgb>,
}

struct ResourceState {
    mode: RingMode,
    solid_color: Rgb,
}

/// One addressable resource controlling one ring.
pub struct RingResource<'a, P: PulsePeripheral, const N: usize> {
    ring: &'a LedRing<'a, P, N>,
    state: Mutex<RefCell<ResourceState>>,
}

impl<'a, P: PulsePeripheral, const N: usize> RingResource<'a, P, N> {
    /// Create the resource. The startup mode is `strobing_rainbow`; call
    /// [`Self::activate_default`] once the loop task is running to bring
    /// the ring up in that mode.
    pub const fn new(ring: &'a LedRing<'a, P, N>) -> Self {
        Self {
            ring,
            state: Mutex::new(RefCell::new(ResourceState {
                mode: RingMode::StrobingRainbow,
                solid_color: Rgb { r: 0, g: 0, b: 0 },
            })),
        }
    }

    /// Report the active mode.
    pub fn read(&self) -> ModeReport {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs).borrow();
            ModeReport {
                mode: state.mode,
                color: match state.mode {
                    RingMode::SolidColor => Some(state.solid_color),
                    _ => None,
                },
            }
        })
    }

    /// Apply a write request. The stored mode only changes once the engine
    /// has accepted the new state.
    pub async fn apply(&self, request: ModeRequest<'_>) -> Result<(), ResourceError> {
        let Some(mode) = RingMode::parse(request.mode) else {
            error!("rejecting unknown ring mode {:?}", request.mode);
            return Err(ResourceError::UnknownMode);
        };
        let color = match mode {
            RingMode::SolidColor => Some(request.color.ok_or(ResourceError::MissingColor)?),
            _ => None,
        };

        info!("switching ring mode to {}", mode.as_str());
        self.activate(mode, color).await?;

        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            state.mode = mode;
            if let Some(color) = color {
                state.solid_color = color;
            }
        });
        Ok(())
    }

    /// Drive the ring into the stored mode. Used at startup to bring the
    /// ring up in the default mode.
    pub async fn activate_default(&self) -> Result<(), ResourceError> {
        let mode = critical_section::with(|cs| self.state.borrow(cs).borrow().mode);
        self.activate(mode, None).await
    }

    async fn activate(&self, mode: RingMode, color: Option<Rgb>) -> Result<(), ResourceError> {
        self.ring.stop_loop();
        match mode {
            RingMode::SolidColor => {
                let color = color.unwrap_or_else(|| self.solid_color());
                self.ring.set_one_color(color).await?;
            }
            RingMode::StaticRainbow => {
                self.ring.set_rainbow(RAINBOW_BRIGHTNESS).await?;
            }
            RingMode::SpinningRainbow => {
                self.ring.set_rainbow(RAINBOW_BRIGHTNESS).await?;
                self.ring.start_spinner_loop();
            }
            RingMode::StrobingRainbow => {
                self.ring.set_rainbow(RAINBOW_BRIGHTNESS).await?;
                self.ring.start_strobing_loop();
            }
            RingMode::StaticDots => {
                self.ring.set_pattern(&DOTS).await?;
            }
            RingMode::SpinningDots => {
                self.ring.set_pattern(&DOTS).await?;
                self.ring.start_spinner_loop();
            }
            RingMode::StrobingDots => {
                self.ring.set_pattern(&DOTS).await?;
                self.ring.start_strobing_loop();
            }
        }
        Ok(())
    }

    fn solid_color(&self) -> Rgb {
        critical_section::with(|cs| self.state.borrow(cs).borrow().solid_color)
    }
}
