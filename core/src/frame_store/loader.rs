use ndarray::Array2;
use std::fs;
use std::path::Path;

use super::radar_data::{FrameHeader, RadarData, RadarVariant, X1Timing, X2Timing};

/// Leading word of every `.frames` file.
pub const FRAME_MAGIC: u32 = 0xFEFE_00A2;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("unable to read capture: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad magic number {found:#010x}")]
    BadMagic { found: u32 },
    #[error("file ends inside `{field}`")]
    Truncated { field: &'static str },
    #[error("invalid capture geometry: {0}")]
    InvalidGeometry(String),
    #[error("unsupported radar specifier {0}")]
    UnsupportedRadar(i32),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Anything that can produce a parsed capture for a path.
pub trait FrameSource {
    fn load(&self, path: &Path) -> LoadResult<RadarData>;
}

/// Reads `.frames` files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameFileLoader;

impl FrameSource for FrameFileLoader {
    fn load(&self, path: &Path) -> LoadResult<RadarData> {
        let bytes = fs::read(path)?;
        parse_frames(&bytes)
    }
}

/// Loads a capture, collapsing every failure into `None`.
pub fn load_frames<P: AsRef<Path>>(path: P) -> Option<RadarData> {
    FrameFileLoader.load(path.as_ref()).ok()
}

/// Little-endian cursor that fails on any short read.
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> LoadResult<[u8; N]> {
        let end = self
            .offset
            .checked_add(N)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(LoadError::Truncated { field })?;
        let mut word = [0u8; N];
        word.copy_from_slice(&self.bytes[self.offset..end]);
        self.offset = end;
        Ok(word)
    }

    fn u32(&mut self, field: &'static str) -> LoadResult<u32> {
        self.take::<4>(field).map(u32::from_le_bytes)
    }

    fn i32(&mut self, field: &'static str) -> LoadResult<i32> {
        self.take::<4>(field).map(i32::from_le_bytes)
    }

    fn f32(&mut self, field: &'static str) -> LoadResult<f32> {
        self.take::<4>(field).map(f32::from_le_bytes)
    }

    fn f64(&mut self, field: &'static str) -> LoadResult<f64> {
        self.take::<8>(field).map(f64::from_le_bytes)
    }
}

fn read_variant(reader: &mut ByteReader<'_>, specifier: i32) -> LoadResult<RadarVariant> {
    match specifier {
        RadarVariant::X2_SPECIFIER => Ok(RadarVariant::X2(X2Timing {
            samples_per_second: reader.f32("samplesPerSecond")?,
            pg_select: reader.i32("pgSelect")?,
            offset_distance: reader.f32("offsetDistance")?,
            sample_delay_to_reference: reader.f32("sampleDelayToReference")?,
        })),
        RadarVariant::X1_CAYENNE_SPECIFIER | RadarVariant::X1_CHIPOTLE_SPECIFIER => {
            let timing = X1Timing {
                samples_per_second: reader.f64("samplesPerSecond")?,
                pulse_gen_fine_tune: reader.i32("pulseGenFineTune")?,
                sampling_rate: reader.i32("samplingRate")?,
                clk_divider: reader.i32("clkDivider")?,
            };
            if specifier == RadarVariant::X1_CAYENNE_SPECIFIER {
                Ok(RadarVariant::X1Cayenne(timing))
            } else {
                Ok(RadarVariant::X1Chipotle(timing))
            }
        }
        other => Err(LoadError::UnsupportedRadar(other)),
    }
}

fn positive(value: i32, name: &str) -> LoadResult<usize> {
    if value > 0 {
        Ok(value as usize)
    } else {
        Err(LoadError::InvalidGeometry(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

/// Parses an in-memory `.frames` image.
pub fn parse_frames(bytes: &[u8]) -> LoadResult<RadarData> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.u32("magic")?;
    if magic != FRAME_MAGIC {
        return Err(LoadError::BadMagic { found: magic });
    }

    let iterations = reader.i32("iterations")?;
    let pps = reader.i32("pps")?;
    let dac_min = reader.i32("dacMin")?;
    let dac_max = reader.i32("dacMax")?;
    let dac_step = reader.i32("dacStep")?;
    let specifier = reader.i32("radarSpecifier")?;
    let variant = read_variant(&mut reader, specifier)?;

    let num_samplers = reader.i32("numSamplers")?;
    let num_frames = reader.i32("numFrames")?;
    let num_runs = reader.i32("numRuns")?;
    let frame_rate = reader.i32("frameRate")?;

    let num_samplers = positive(num_samplers, "numSamplers")?;
    let num_frames = positive(num_frames, "numFrames")?;
    positive(frame_rate, "frameRate")?;
    let sample_count = num_frames
        .checked_mul(num_samplers)
        .ok_or_else(|| LoadError::InvalidGeometry("frame matrix size overflows".into()))?;

    // Size the payload against the file before allocating anything.
    if reader.remaining() / 8 < num_frames {
        return Err(LoadError::Truncated { field: "times" });
    }
    let times = (0..num_frames)
        .map(|_| reader.f64("times"))
        .collect::<LoadResult<Vec<_>>>()?;

    if reader.remaining() / 4 < sample_count {
        return Err(LoadError::Truncated { field: "frameTot" });
    }
    let samples = (0..sample_count)
        .map(|_| reader.u32("frameTot").map(f64::from))
        .collect::<LoadResult<Vec<_>>>()?;

    let fps_est = reader.f32("fpsEst")?;

    let frame_tot = Array2::from_shape_vec((num_frames, num_samplers), samples)
        .map_err(|err| LoadError::InvalidGeometry(err.to_string()))?;

    let header = FrameHeader {
        iterations,
        pps,
        dac_min,
        dac_max,
        dac_step,
        variant,
        num_runs,
        fps_est,
    };

    Ok(RadarData::new(header, frame_rate, times, frame_tot))
}
