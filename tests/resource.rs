//! Remote control resource tests

mod common;

use std::pin::pin;

use common::{MockPeripheral, RED, drive};
use ws2812_ring::{
    AnimationState, ChannelId, ChannelRegistry, DOTS, LedRing, ModeRequest, PulseChannel,
    ResourceError, Rgb, RingMode, RingResource,
};

const CAPACITY: usize = 32;

#[test]
fn default_mode_is_strobing_rainbow() {
    let registry = ChannelRegistry::new();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(MockPeripheral::new(1024));
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 6).unwrap();
    let resource = RingResource::new(&ring);

    let report = resource.read();
    assert_eq!(report.mode, RingMode::StrobingRainbow);
    assert_eq!(report.color, None);
}

#[test]
fn activate_default_brings_up_strobing_rainbow() {
    let registry = ChannelRegistry::new();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(MockPeripheral::new(1024));
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 6).unwrap();
    let resource = RingResource::new(&ring);

    let mut fut = pin!(resource.activate_default());
    drive(fut.as_mut(), &channel).unwrap();

    assert_eq!(ring.animation_state(), AnimationState::Strobing);
    assert_eq!(ring.snapshot()[0], Rgb { r: 64, g: 0, b: 0 });
}

#[test]
fn solid_color_round_trip() {
    let registry = ChannelRegistry::new();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(MockPeripheral::new(1024));
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 6).unwrap();
    let resource = RingResource::new(&ring);

    let request = ModeRequest {
        mode: "solid_color",
        color: Some(RED),
    };
    let mut fut = pin!(resource.apply(request));
    drive(fut.as_mut(), &channel).unwrap();

    assert_eq!(ring.animation_state(), AnimationState::Idle);
    assert_eq!(ring.snapshot().to_vec(), vec![RED; 6]);

    let report = resource.read();
    assert_eq!(report.mode, RingMode::SolidColor);
    assert_eq!(report.color, Some(RED));
}

#[test]
fn solid_color_without_components_is_rejected() {
    let registry = ChannelRegistry::new();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(MockPeripheral::new(1024));
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 6).unwrap();
    let resource = RingResource::new(&ring);

    let request = ModeRequest {
        mode: "solid_color",
        color: None,
    };
    let mut fut = pin!(resource.apply(request));
    let result = drive(fut.as_mut(), &channel);
    assert_eq!(result, Err(ResourceError::MissingColor));
    assert_eq!(resource.read().mode, RingMode::StrobingRainbow);
}

#[test]
fn unknown_mode_leaves_everything_untouched() {
    let registry = ChannelRegistry::new();
    let mock = MockPeripheral::new(1024);
    let log = mock.log();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(mock);
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 6).unwrap();
    let resource = RingResource::new(&ring);

    let request = ModeRequest {
        mode: "disco",
        color: None,
    };
    let mut fut = pin!(resource.apply(request));
    let result = drive(fut.as_mut(), &channel);
    assert_eq!(result, Err(ResourceError::UnknownMode));

    assert_eq!(resource.read().mode, RingMode::StrobingRainbow);
    assert_eq!(ring.animation_state(), AnimationState::Idle);
    assert!(log.lock().unwrap().writes.is_empty());
}

#[test]
fn dots_modes_tile_the_dots_pattern() {
    let registry = ChannelRegistry::new();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(MockPeripheral::new(1024));
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 7).unwrap();
    let resource = RingResource::new(&ring);

    let request = ModeRequest {
        mode: "spinning_dots",
        color: None,
    };
    let mut fut = pin!(resource.apply(request));
    drive(fut.as_mut(), &channel).unwrap();

    assert_eq!(ring.animation_state(), AnimationState::Spinning);
    let expected: Vec<Rgb> = (0..7).map(|i| DOTS[i % 3]).collect();
    assert_eq!(ring.snapshot().to_vec(), expected);

    let request = ModeRequest {
        mode: "static_dots",
        color: None,
    };
    let mut fut = pin!(resource.apply(request));
    drive(fut.as_mut(), &channel).unwrap();
    assert_eq!(ring.animation_state(), AnimationState::Idle);
    assert_eq!(resource.read().mode, RingMode::StaticDots);
}

#[test]
fn strobing_modes_start_the_strobe_loop() {
    let registry = ChannelRegistry::new();
    let channel: PulseChannel<_, CAPACITY> = PulseChannel::new(MockPeripheral::new(1024));
    let claim = registry.claim(ChannelId::new(0).unwrap()).unwrap();
    let ring = LedRing::new(claim, &channel, 6).unwrap();
    let resource = RingResource::new(&ring);

    let mut fut = pin!(resource.apply(ModeRequest {
        mode: "strobing_dots",
        color: None,
    }));
    drive(fut.as_mut(), &channel).unwrap();
    assert_eq!(ring.animation_state(), AnimationState::Strobing);

    let mut fut = pin!(resource.apply(ModeRequest {
        mode: "static_rainbow",
        color: None,
    }));
    drive(fut.as_mut(), &channel).unwrap();
    assert_eq!(ring.animation_state(), AnimationState::Idle);
    assert_eq!(resource.read().mode, RingMode::StaticRainbow);
}

#[test]
fn mode_names_round_trip() {
    let modes = [
        RingMode::SolidColor,
        RingMode::StaticRainbow,
        RingMode::SpinningRainbow,
        RingMode::StrobingRainbow,
        RingMode::StaticDots,
        RingMode::SpinningDots,
        RingMode::StrobingDots,
    ];
    for mode in modes {
        assert_eq!(RingMode::parse(mode.as_str()), Some(mode));
    }
    assert_eq!(RingMode::parse("off"), None);
}
