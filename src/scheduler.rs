//! Control side spawn event generation.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    settings::{commit, GranularSettings},
    utils::{
        panning_factors, speed_from_semitones,
        time::{milliseconds_to_samples, SampleTime},
    },
    ScheduledEvent,
};

// -------------------------------------------------------------------------------------------------

/// Turns [`GranularSettings`] into batches of [`ScheduledEvent`]s for a
/// [GrainEngine](crate::GrainEngine).
///
/// Grains are spawned `sample_rate / density_hz` samples apart. Fractional spawn intervals
/// accumulate, so no drift builds up over time. Per grain, spray, pitch randomization, stereo
/// spread and amplitude variance get drawn from a small, seeded random number generator: the
/// same settings and seed always produce the same events.
///
/// The scheduler runs on the control thread, usually a bit ahead of the engine's clock:
/// ```rust,no_run
/// # use grainfield::*;
/// # fn run(handle: &mut GrainEngineHandle, engine: &GrainEngine) -> Result<(), Error> {
/// let mut scheduler = GrainScheduler::new(&GranularSettings::default(), engine.sample_rate());
/// let lookahead = engine.sample_rate() as u64 / 10;
/// handle.schedule(scheduler.schedule_until(engine.clock() + lookahead))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GrainScheduler {
    settings: GranularSettings,
    sample_rate: u32,
    rng: SmallRng,
    next_spawn: f64,
    last_spawn: f64,
    scan_offset: f64,
}

impl GrainScheduler {
    /// Create a new scheduler starting at sample time 0. Settings get committed first.
    pub fn new(settings: &GranularSettings, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        let settings = commit(settings);
        let rng = SmallRng::seed_from_u64(settings.seed);
        Self {
            settings,
            sample_rate,
            rng,
            next_spawn: 0.0,
            last_spawn: 0.0,
            scan_offset: 0.0,
        }
    }

    /// The committed settings, grains are derived from.
    pub fn settings(&self) -> &GranularSettings {
        &self.settings
    }

    /// Sample rate of the generated events.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Sample time of the next grain spawn.
    pub fn next_spawn_sample(&self) -> SampleTime {
        self.next_spawn as SampleTime
    }

    /// Apply new settings. Settings get committed first. Already planned spawn times are kept,
    /// the random number generator gets re-seeded when the seed changed.
    pub fn set_settings(&mut self, settings: &GranularSettings) {
        let settings = commit(settings);
        if settings.seed != self.settings.seed {
            self.rng = SmallRng::seed_from_u64(settings.seed);
        }
        self.settings = settings;
    }

    /// Restart spawn timing and scanning at the given sample time and re-seed the random
    /// number generator.
    pub fn reset(&mut self, start: SampleTime) {
        self.rng = SmallRng::seed_from_u64(self.settings.seed);
        self.next_spawn = start as f64;
        self.last_spawn = start as f64;
        self.scan_offset = 0.0;
    }

    /// Generate all grain spawns with a start time before `until_sample`, which were not
    /// generated yet.
    pub fn schedule_until(&mut self, until_sample: SampleTime) -> Vec<ScheduledEvent> {
        let interval = self.sample_rate as f64 / self.settings.density_hz as f64;
        let capacity = ((until_sample as f64 - self.next_spawn) / interval).ceil().max(0.0);
        let mut events = Vec::with_capacity(capacity as usize);
        while self.next_spawn < until_sample as f64 {
            let spawn = self.next_spawn;
            events.push(self.next_event(spawn));
            self.next_spawn += interval;
        }
        events
    }

    fn next_event(&mut self, spawn: f64) -> ScheduledEvent {
        let settings = &self.settings;

        // scan
        let elapsed_seconds = (spawn - self.last_spawn) / self.sample_rate as f64;
        self.scan_offset =
            (self.scan_offset + settings.scan_speed as f64 * elapsed_seconds).rem_euclid(1.0);
        self.last_spawn = spawn;

        // position
        let spray = settings.spray as f64 * (self.rng.random::<f64>() * 2.0 - 1.0);
        let mut position = settings.position as f64 + self.scan_offset + spray;
        if !(0.0..=1.0).contains(&position) {
            position = position.rem_euclid(1.0);
        }

        // pitch
        let pitch_random = settings.pitch_random_semitones * (self.rng.random::<f32>() * 2.0 - 1.0);
        let rate = speed_from_semitones(settings.pitch_semitones + pitch_random);

        // stereo spread
        let panning = settings.stereo_spread * (self.rng.random::<f32>() * 2.0 - 1.0);
        let (pan_left, pan_right) = panning_factors(panning.clamp(-1.0, 1.0));

        // amplitude
        let amplitude =
            settings.output_gain * (1.0 - settings.amplitude_variance * self.rng.random::<f32>());

        let duration = milliseconds_to_samples(settings.grain_size_ms, self.sample_rate)
            .round()
            .max(1.0) as u32;

        ScheduledEvent::new(spawn as SampleTime, duration, position as f32)
            .with_rate(rate)
            .with_gain(amplitude * pan_left, amplitude * pan_right)
            .with_window(settings.window)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GrainWindowMode, OperatingMode};

    fn static_settings() -> GranularSettings {
        GranularSettings {
            grain_size_ms: 100.0,
            density_hz: 10.0,
            position: 0.25,
            spray: 0.0,
            scan_speed: 0.0,
            pitch_semitones: 0.0,
            pitch_random_semitones: 0.0,
            stereo_spread: 0.0,
            amplitude_variance: 0.0,
            output_gain: 1.0,
            ..GranularSettings::default()
        }
    }

    #[test]
    fn spawn_timing() {
        let mut scheduler = GrainScheduler::new(&static_settings(), 48000);
        let events = scheduler.schedule_until(24000);
        let starts = events.iter().map(|e| e.start_sample).collect::<Vec<_>>();
        assert_eq!(starts, vec![0, 4800, 9600, 14400, 19200]);
        assert_eq!(scheduler.next_spawn_sample(), 24000);

        // continues where it left off
        let events = scheduler.schedule_until(24001);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_sample, 24000);
        assert!(scheduler.schedule_until(24001).is_empty());
    }

    #[test]
    fn fractional_intervals_accumulate() {
        let settings = GranularSettings {
            density_hz: 30.0,
            ..static_settings()
        };
        // 44100 / 30 = 1470
        let mut scheduler = GrainScheduler::new(&settings, 44100);
        assert_eq!(scheduler.schedule_until(44100).len(), 30);

        let settings = GranularSettings {
            density_hz: 7.0,
            ..static_settings()
        };
        // 48000 / 7 = 6857.142...
        let mut scheduler = GrainScheduler::new(&settings, 48000);
        let events = scheduler.schedule_until(47000);
        let starts = events.iter().map(|e| e.start_sample).collect::<Vec<_>>();
        assert_eq!(starts, vec![0, 6857, 13714, 20571, 27428, 34285, 41142]);

        let settings = GranularSettings {
            mode: OperatingMode::Design,
            density_hz: 0.75,
            ..static_settings()
        };
        // 48000 / 0.75 = 64000
        let mut scheduler = GrainScheduler::new(&settings, 48000);
        let events = scheduler.schedule_until(200000);
        let starts = events.iter().map(|e| e.start_sample).collect::<Vec<_>>();
        assert_eq!(starts, vec![0, 64000, 128000, 192000]);
    }

    #[test]
    fn static_grains() {
        let settings = GranularSettings {
            window: GrainWindowMode::Gaussian,
            ..static_settings()
        };
        let mut scheduler = GrainScheduler::new(&settings, 48000);
        for event in scheduler.schedule_until(48000) {
            assert!(event.validate().is_ok());
            assert_eq!(event.duration_samples, 4800);
            assert_eq!(event.start_position, 0.25);
            assert_eq!(event.rate, 1.0);
            assert!((event.gain_left - event.gain_right).abs() < 1e-6);
            assert!((event.gain_left - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
            assert_eq!(event.window, Some(GrainWindowMode::Gaussian));
        }
    }

    #[test]
    fn randomized_grains_stay_in_bounds() {
        let settings = GranularSettings {
            mode: OperatingMode::Design,
            spray: 1.0,
            scan_speed: 3.0,
            pitch_semitones: 12.0,
            pitch_random_semitones: 12.0,
            stereo_spread: 1.0,
            amplitude_variance: 0.5,
            output_gain: 2.0,
            density_hz: 100.0,
            ..static_settings()
        };
        let mut scheduler = GrainScheduler::new(&settings, 48000);
        let events = scheduler.schedule_until(48000 * 4);
        assert_eq!(events.len(), 400);
        for event in events {
            assert!(event.validate().is_ok());
            assert!((1.0..=4.0).contains(&event.rate));
            let power = event.gain_left.powi(2) + event.gain_right.powi(2);
            // amplitude in 1.0..=2.0
            assert!((1.0 - 1e-4..=4.0 + 1e-4).contains(&power));
        }
    }

    #[test]
    fn scanning_moves_the_position() {
        let settings = GranularSettings {
            position: 0.0,
            scan_speed: 0.5,
            ..static_settings()
        };
        let mut scheduler = GrainScheduler::new(&settings, 1000);
        let events = scheduler.schedule_until(3000);
        let positions = events.iter().map(|e| e.start_position).collect::<Vec<_>>();
        // 10 Hz: one grain every 100 samples, 0.05 position units apart
        assert_eq!(positions.len(), 30);
        assert!((positions[1] - 0.05).abs() < 1e-5);
        assert!((positions[10] - 0.5).abs() < 1e-5);
        // wraps around
        assert!((positions[21] - 0.05).abs() < 1e-5);
    }

    #[test]
    fn deterministic_per_seed() {
        let settings = GranularSettings {
            spray: 0.3,
            pitch_random_semitones: 5.0,
            stereo_spread: 0.8,
            amplitude_variance: 0.4,
            seed: 1234,
            ..static_settings()
        };
        let mut a = GrainScheduler::new(&settings, 48000);
        let mut b = GrainScheduler::new(&settings, 48000);
        assert_eq!(a.schedule_until(96000), b.schedule_until(96000));

        let mut c = GrainScheduler::new(
            &GranularSettings {
                seed: 4321,
                ..settings.clone()
            },
            48000,
        );
        let mut a = GrainScheduler::new(&settings, 48000);
        assert_ne!(a.schedule_until(96000), c.schedule_until(96000));

        // reset replays the same sequence
        a.reset(0);
        let first = a.schedule_until(50000);
        a.reset(0);
        assert_eq!(a.schedule_until(50000), first);
    }

    #[test]
    fn settings_get_committed() {
        let settings = GranularSettings {
            grain_size_ms: 10.0,
            density_hz: 1000.0,
            ..static_settings()
        };
        let mut scheduler = GrainScheduler::new(&settings, 48000);
        // cinematic: grain size >= 20 ms, buzz cap at 30 Hz
        assert_eq!(scheduler.settings().grain_size_ms, 20.0);
        assert_eq!(scheduler.settings().density_hz, 30.0);
        assert_eq!(scheduler.schedule_until(48000).len(), 30);

        scheduler.set_settings(&GranularSettings {
            density_hz: 2.0,
            ..static_settings()
        });
        assert_eq!(scheduler.settings().density_hz, 2.0);
        // the already planned spawn is kept
        let events = scheduler.schedule_until(96000);
        assert_eq!(events[0].start_sample, 48000);
        assert_eq!(events.len(), 2);
    }
}
