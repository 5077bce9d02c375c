use std::time::Duration;

use grainfield::{
    windows::hann, EngineEvent, EngineOptions, Error, GrainEngine, GrainScheduler,
    GrainWindowMode, GranularSettings, OperatingMode, SampleBuffer, ScheduledEvent,
};

mod common;
use common::{create_logger, render_blocks};

// -------------------------------------------------------------------------------------------------

const BLOCK_LEN: usize = 64;

fn unit_event(start_sample: u64) -> ScheduledEvent {
    ScheduledEvent::new(start_sample, 1, 0.5).with_window(GrainWindowMode::Rectangular)
}

#[test]
fn grain_voice_lifetime() -> Result<(), Error> {
    create_logger();
    let (mut engine, mut handle) = GrainEngine::new(EngineOptions::default())?;
    handle.set_buffer(SampleBuffer::mono(vec![1.0; 1000]))?;
    handle.schedule(vec![ScheduledEvent::new(0, 100, 0.5)])?;

    let (left, right) = render_blocks(&mut engine, 1, BLOCK_LEN);
    assert_eq!(engine.active_voices(), 1);
    for (index, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let expected = hann(index as f32 / 100.0);
        assert!((l - expected).abs() < 1e-6, "{index}: {l} != {expected}");
        assert!((r - expected).abs() < 1e-6, "{index}: {r} != {expected}");
    }

    let (left, _) = render_blocks(&mut engine, 1, BLOCK_LEN);
    for (index, l) in left.iter().enumerate().take(36) {
        let expected = hann((BLOCK_LEN + index) as f32 / 100.0);
        assert!((l - expected).abs() < 1e-6, "{index}: {l} != {expected}");
    }
    // freed in the call where it reached its duration
    assert!(left[36..].iter().all(|v| *v == 0.0));
    assert_eq!(engine.active_voices(), 0);

    let (left, right) = render_blocks(&mut engine, 4, BLOCK_LEN);
    assert!(left.iter().chain(right.iter()).all(|v| *v == 0.0));
    Ok(())
}

#[test]
fn events_activate_exactly_once() -> Result<(), Error> {
    let (mut engine, mut handle) =
        GrainEngine::new(EngineOptions::default().max_grains(8))?;
    handle.set_buffer(SampleBuffer::mono(vec![1.0; 100]))?;

    // a shuffled unit grain at every third sample
    let count = 200;
    let start_times = (0..count)
        .map(|index| (index * 37 % count) * 3 + 1)
        .collect::<Vec<u64>>();
    handle.schedule(start_times.iter().map(|time| unit_event(*time)).collect())?;

    let mut output = Vec::new();
    let (left, _) = render_blocks(&mut engine, 2, BLOCK_LEN);
    output.extend(left);

    // a second batch doubles all grains which did not start yet
    let rendered = (2 * BLOCK_LEN) as u64;
    handle.schedule(
        start_times
            .iter()
            .filter(|time| **time >= rendered)
            .map(|time| unit_event(*time))
            .collect(),
    )?;
    let (left, _) = render_blocks(&mut engine, 10, BLOCK_LEN);
    output.extend(left);

    for (time, value) in output.iter().enumerate() {
        let time = time as u64;
        let expected = match time {
            _ if time % 3 != 1 || time >= count * 3 => 0.0,
            _ if time < rendered => 1.0,
            _ => 2.0,
        };
        assert_eq!(*value, expected, "at sample {time}");
    }
    assert_eq!(engine.pending_events(), 0);
    assert_eq!(engine.active_voices(), 0);
    assert_eq!(engine.dropped_grains(), 0);
    Ok(())
}

#[test]
fn large_batches_stay_ordered() -> Result<(), Error> {
    let (mut engine, mut handle) = GrainEngine::new(EngineOptions::default())?;
    handle.set_buffer(SampleBuffer::mono(vec![1.0; 100]))?;

    // 1025 events, in reverse order, one every other sample
    let batch = (0..1025u64).rev().map(|i| unit_event(i * 2)).collect();
    handle.schedule(batch)?;

    let (left, _) = render_blocks(&mut engine, 2050 / BLOCK_LEN + 1, BLOCK_LEN);
    for (time, value) in left.iter().enumerate() {
        let expected = if time % 2 == 0 && time < 2050 { 1.0 } else { 0.0 };
        assert_eq!(*value, expected, "at sample {time}");
    }
    assert_eq!(engine.pending_events(), 0);

    // keep streaming batches past the compaction threshold
    let mut next = engine.clock();
    for _ in 0..50 {
        let batch = (0..100).map(|i| unit_event(next + i)).collect();
        handle.schedule(batch)?;
        let (left, _) = render_blocks(&mut engine, 2, BLOCK_LEN);
        assert!(left[..100].iter().all(|v| *v == 1.0));
        next += (2 * BLOCK_LEN) as u64;
    }
    assert_eq!(engine.pending_events(), 0);
    assert_eq!(engine.dropped_grains(), 0);
    Ok(())
}

#[test]
fn voice_pool_exhaustion() -> Result<(), Error> {
    let (mut engine, mut handle) = GrainEngine::new(EngineOptions::default().max_grains(4))?;
    handle.set_buffer(SampleBuffer::mono(vec![1.0; 1000]))?;
    let batch = (0..10)
        .map(|_| ScheduledEvent::new(0, 50, 0.0).with_window(GrainWindowMode::Rectangular))
        .collect();
    handle.schedule(batch)?;

    let (left, _) = render_blocks(&mut engine, 1, BLOCK_LEN);
    assert!(left[..50].iter().all(|v| *v == 4.0));
    assert!(left[50..].iter().all(|v| *v == 0.0));
    assert_eq!(engine.dropped_grains(), 6);
    assert_eq!(engine.active_voices(), 0);

    // freed voices get reused
    handle.schedule(vec![
        ScheduledEvent::new(BLOCK_LEN as u64, 10, 0.0).with_window(GrainWindowMode::Rectangular)
    ])?;
    let (left, _) = render_blocks(&mut engine, 1, BLOCK_LEN);
    assert!(left[..10].iter().all(|v| *v == 1.0));
    assert_eq!(engine.dropped_grains(), 6);
    Ok(())
}

#[test]
fn silent_without_buffer() -> Result<(), Error> {
    let (mut engine, mut handle) = GrainEngine::new(EngineOptions::default())?;
    let mut scheduler = GrainScheduler::new(&GranularSettings::default(), engine.sample_rate());
    handle.schedule(scheduler.schedule_until(48000))?;
    for block in 1..=100 {
        let (left, right) = render_blocks(&mut engine, 1, BLOCK_LEN);
        assert!(left.iter().chain(right.iter()).all(|v| *v == 0.0));
        assert_eq!(engine.clock(), (block * BLOCK_LEN) as u64);
    }
    Ok(())
}

#[test]
fn scheduled_clouds() -> Result<(), Error> {
    create_logger();
    let sample_rate = 48000;
    let (mut engine, mut handle) = GrainEngine::new(
        EngineOptions::default()
            .sample_rate(sample_rate)
            .max_grains(32),
    )?;

    let left = (0..sample_rate)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin())
        .collect();
    let right = (0..sample_rate)
        .map(|i| (i as f32 * 220.0 * std::f32::consts::TAU / sample_rate as f32).sin())
        .collect();
    handle.set_buffer(SampleBuffer::stereo(left, right)?)?;
    handle.clock_start(Duration::from_millis(100))?;

    let settings = GranularSettings {
        mode: OperatingMode::Design,
        density_hz: 50.0,
        spray: 0.2,
        pitch_random_semitones: 3.0,
        stereo_spread: 0.7,
        ..GranularSettings::default()
    };
    let mut scheduler = GrainScheduler::new(&settings, sample_rate);

    let block_len = 256;
    let mut peak = 0.0f32;
    let mut clock_ticks = 0;
    let mut buffer_loaded = false;
    for _ in 0..(sample_rate as usize / block_len) {
        // schedule a block ahead
        let lookahead = engine.clock() + 2 * block_len as u64;
        handle.schedule(scheduler.schedule_until(lookahead))?;

        let (left, right) = render_blocks(&mut engine, 1, block_len);
        peak = left.iter().chain(right.iter()).fold(peak, |p, v| p.max(v.abs()));
        assert!(left.iter().chain(right.iter()).all(|v| v.is_finite()));

        while let Some(event) = handle.try_recv_event() {
            match event {
                EngineEvent::BufferInfo { length } => {
                    assert_eq!(length, sample_rate as usize);
                    buffer_loaded = true;
                }
                EngineEvent::Clock { position } => {
                    assert_eq!(position, engine.clock());
                    clock_ticks += 1;
                }
            }
        }
    }
    assert!(buffer_loaded);
    assert!(peak > 0.1, "peak: {peak}");
    // 100 ms intervals over 0.99 seconds of 256 sample blocks
    assert_eq!(clock_ticks, 9);
    assert_eq!(engine.dropped_grains(), 0);
    Ok(())
}
