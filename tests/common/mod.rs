//! Shared test infrastructure: a mock pulse peripheral plus helpers for
//! driving async transmissions without an executor.

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use ws2812_ring::waveform::{ONE, RESET, ZERO};
use ws2812_ring::{PulseChannel, PulseItem, PulsePeripheral, Rgb, TxPhase};

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
pub const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
pub const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};

/// Everything the mock peripheral saw, in call order.
#[derive(Debug, Default)]
pub struct PeripheralLog {
    /// `(buffer_offset, item)` per write call.
    pub writes: Vec<(usize, PulseItem)>,
    /// Half threshold per start call.
    pub starts: Vec<Option<usize>>,
}

impl PeripheralLog {
    /// The logical pulse train in the order it was produced, regardless of
    /// which buffer half each item landed in.
    pub fn stream(&self) -> Vec<PulseItem> {
        self.writes.iter().map(|&(_, item)| item).collect()
    }
}

/// Records writes and starts into a shared log; the test fires the
/// half-consumed and end events that real hardware would deliver.
#[derive(Clone)]
pub struct MockPeripheral {
    capacity: usize,
    log: Arc<Mutex<PeripheralLog>>,
}

impl MockPeripheral {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            log: Arc::new(Mutex::new(PeripheralLog::default())),
        }
    }

    /// Shared handle to the call log; stays valid after the peripheral
    /// moves into a channel.
    pub fn log(&self) -> Arc<Mutex<PeripheralLog>> {
        Arc::clone(&self.log)
    }
}

impl PulsePeripheral for MockPeripheral {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn write(&mut self, offset: usize, item: PulseItem) {
        self.log.lock().unwrap().writes.push((offset, item));
    }

    fn start(&mut self, half_threshold: Option<usize>) {
        self.log.lock().unwrap().starts.push(half_threshold);
    }
}

/// Poll a future once with a no-op waker.
pub fn poll_once<F: Future>(fut: Pin<&mut F>) -> Poll<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    fut.poll(&mut cx)
}

/// Drive a future to completion, playing the hardware events an in-flight
/// transmission on `channel` is waiting for.
pub fn drive<F, P, const N: usize>(mut fut: Pin<&mut F>, channel: &PulseChannel<P, N>) -> F::Output
where
    F: Future,
    P: PulsePeripheral,
{
    loop {
        if let Poll::Ready(output) = poll_once(fut.as_mut()) {
            return output;
        }
        match channel.phase() {
            TxPhase::Streaming => channel.on_half_transmitted(),
            TxPhase::Loading | TxPhase::Draining => channel.on_transmit_end(),
            TxPhase::Idle => panic!("future pending with no transmission in flight"),
        }
    }
}

/// Decode a pulse train back into colors, checking the trailing reset gap.
pub fn decode_stream(items: &[PulseItem]) -> Vec<Rgb> {
    assert_eq!(
        items.last(),
        Some(&RESET),
        "stream must end with the reset gap"
    );
    let bits = &items[..items.len() - 1];
    assert_eq!(bits.len() % 24, 0);
    bits.chunks(24)
        .map(|pixel| {
            let mut bytes = [0u8; 3];
            for (i, item) in pixel.iter().enumerate() {
                let bit = if *item == ONE {
                    1
                } else {
                    assert_eq!(*item, ZERO);
                    0
                };
                bytes[i / 8] = (bytes[i / 8] << 1) | bit;
            }
            // Wire order is green, red, blue.
            Rgb {
                r: bytes[1],
                g: bytes[0],
                b: bytes[2],
            }
        })
        .collect()
}
