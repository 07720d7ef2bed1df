//! Builders for synthetic `.frames` files used across the crate's tests.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Write;
use tempfile::NamedTempFile;

use super::loader::FRAME_MAGIC;
use super::radar_data::RadarVariant;

pub(crate) struct FrameFixture {
    pub radar_specifier: i32,
    pub num_frames: i32,
    pub num_samplers: i32,
    pub frame_rate: i32,
    pub dac_min: i32,
    pub dac_max: i32,
    pub samples: Vec<u32>,
}

impl FrameFixture {
    pub fn from_fn(
        num_frames: usize,
        num_samplers: usize,
        frame_rate: i32,
        mut sample: impl FnMut(usize, usize) -> u32,
    ) -> Self {
        let mut samples = Vec::with_capacity(num_frames * num_samplers);
        for frame in 0..num_frames {
            for sampler in 0..num_samplers {
                samples.push(sample(frame, sampler));
            }
        }
        Self {
            radar_specifier: RadarVariant::X2_SPECIFIER,
            num_frames: num_frames as i32,
            num_samplers: num_samplers as i32,
            frame_rate,
            dac_min: 0,
            dac_max: 8191,
            samples,
        }
    }

    /// Uniform samples across the default DAC sweep.
    pub fn random(num_frames: usize, num_samplers: usize, frame_rate: i32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let samples: Vec<u32> = (0..num_frames * num_samplers)
            .map(|_| rng.gen_range(0..=8191))
            .collect();
        let mut fixture = Self::from_fn(0, 0, frame_rate, |_, _| 0);
        fixture.num_frames = num_frames as i32;
        fixture.num_samplers = num_samplers as i32;
        fixture.samples = samples;
        fixture
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&FRAME_MAGIC.to_le_bytes());
        for value in [10, 1, self.dac_min, self.dac_max, 1, self.radar_specifier] {
            out.extend_from_slice(&value.to_le_bytes());
        }

        if self.radar_specifier == RadarVariant::X2_SPECIFIER {
            out.extend_from_slice(&3.9e10_f32.to_le_bytes());
            out.extend_from_slice(&0i32.to_le_bytes());
            out.extend_from_slice(&0.0f32.to_le_bytes());
            out.extend_from_slice(&0.0f32.to_le_bytes());
        } else {
            out.extend_from_slice(&3.9e10_f64.to_le_bytes());
            out.extend_from_slice(&0i32.to_le_bytes());
            out.extend_from_slice(&0i32.to_le_bytes());
            out.extend_from_slice(&1i32.to_le_bytes());
        }

        for value in [self.num_samplers, self.num_frames, 1, self.frame_rate] {
            out.extend_from_slice(&value.to_le_bytes());
        }

        for frame in 0..self.num_frames.max(0) {
            let t = frame as f64 / self.frame_rate as f64;
            out.extend_from_slice(&t.to_le_bytes());
        }
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out.extend_from_slice(&(self.frame_rate as f32).to_le_bytes());
        out
    }

    pub fn write(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.to_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
