//! WS2812B waveform encoding
//!
//! Maps color bytes onto the pulse timings the LED chain expects. The
//! peripheral clock runs at 80 MHz, so one tick is 12.5 ns:
//!
//! * zero  = 0.40 us high, 0.80 us low (32 / 64 ticks)
//! * one   = 0.85 us high, 0.45 us low (68 / 36 ticks)
//! * reset = 50 us low (4000 ticks)
//!
//! Everything here is pure and allocation-free, so it is safe to call from
//! interrupt context while a buffer half is being refilled.

use crate::color::Rgb;

/// One physical transition pair on the output line: high for `high_ticks`,
/// then low for `low_ticks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseItem {
    pub high_ticks: u16,
    pub low_ticks: u16,
}

/// Canonical "zero" bit pulse.
pub const ZERO: PulseItem = PulseItem {
    high_ticks: 32,
    low_ticks: 64,
};

/// Canonical "one" bit pulse.
pub const ONE: PulseItem = PulseItem {
    high_ticks: 68,
    low_ticks: 36,
};

/// End-of-frame gap: a single long low period latching the chain.
pub const RESET: PulseItem = PulseItem {
    high_ticks: 0,
    low_ticks: 4000,
};

/// Items needed to encode one color (three bytes, one item per bit).
pub const ITEMS_PER_COLOR: usize = 24;

/// Encode a single bit as its canonical pulse.
pub const fn encode_bit(bit: bool) -> PulseItem {
    if bit { ONE } else { ZERO }
}

/// Encode one byte as 8 pulses, most significant bit first.
pub fn encode_byte(value: u8) -> [PulseItem; 8] {
    let mut items = [ZERO; 8];
    let mut mask = 0x80_u8;
    let mut index = 0;
    while mask > 0 {
        items[index] = encode_bit(value & mask != 0);
        mask >>= 1;
        index += 1;
    }
    items
}

/// Encode one color as 24 pulses.
///
/// Components go out in green, red, blue order. That is the wire order the
/// LED chain expects; it must not be rearranged to r, g, b.
pub fn encode_color(color: Rgb) -> [PulseItem; ITEMS_PER_COLOR] {
    let mut items = [ZERO; ITEMS_PER_COLOR];
    items[..8].copy_from_slice(&encode_byte(color.g));
    items[8..16].copy_from_slice(&encode_byte(color.r));
    items[16..].copy_from_slice(&encode_byte(color.b));
    items
}

/// Encode a single bit of a color's 24-bit wire representation.
///
/// `bit_index` counts from 0 (green MSB) to 23 (blue LSB). This is the
/// random-access form the stream cursor uses to resume mid-color after a
/// buffer half fills up.
pub const fn encode_color_bit(color: Rgb, bit_index: usize) -> PulseItem {
    let component = match bit_index / 8 {
        0 => color.g,
        1 => color.r,
        _ => color.b,
    };
    let mask = 0x80_u8 >> (bit_index % 8);
    encode_bit(component & mask != 0)
}
