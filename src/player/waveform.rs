//! Synthetic waveform generation.
//!
//! Bar heights are cosmetic: they are produced from trigonometric and seeded
//! pseudo-random formulas, never from the audio samples. The seed comes from the
//! source URI so the same file always shows the same shape, and a new shape is
//! generated only when the source changes.

use super::error::PlayerError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One discrete bar of the waveform strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub index: usize,
    pub height: f64,
}

/// One sinusoidal component: `amplitude * sin(frequency * i)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub frequency: f64,
    pub amplitude: f64,
}

impl Harmonic {
    pub const fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// A position band of the [`ShapeProfile::Segmented`] shape.
///
/// Bars whose relative position lies strictly inside `(start, end)` get a height
/// drawn from `[base, base + span)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub start: f64,
    pub end: f64,
    pub base: f64,
    pub span: f64,
}

/// How bar heights are produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeProfile {
    /// Independent random heights in `[min, max)`.
    Uniform { min: f64, max: f64 },
    /// `base + Σ harmonics + noise + decay`, clamped to `[min, max]`.
    Layered {
        base: f64,
        harmonics: Vec<Harmonic>,
        /// Noise is drawn from `[noise.0, noise.1)`.
        noise: (f64, f64),
        /// Optional `amplitude * e^(-rate * i)` term, as `(rate, amplitude)`.
        decay: Option<(f64, f64)>,
        min: f64,
        max: f64,
    },
    /// Position bands with their own ranges, plus occasional random spikes.
    Segmented {
        bands: Vec<Band>,
        /// Range used for bars that fall in no band.
        fallback: (f64, f64),
        spike_chance: f64,
        spike_height: f64,
        min: f64,
        max: f64,
    },
    /// A fixed repeating cycle of heights.
    Alternating { cycle: Vec<f64> },
}

impl ShapeProfile {
    /// Documented `(min, max)` range every generated height falls into.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Uniform { min, max } => (*min, *max),
            Self::Layered { min, max, .. } | Self::Segmented { min, max, .. } => (*min, *max),
            Self::Alternating { cycle } => {
                let min = cycle.iter().copied().fold(f64::INFINITY, f64::min);
                let max = cycle.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if cycle.is_empty() {
                    (0.0, 0.0)
                } else {
                    (min, max)
                }
            }
        }
    }

    fn height(&self, index: usize, bar_count: usize, rng: &mut StdRng) -> f64 {
        let i = index as f64;
        match self {
            Self::Uniform { min, max } => min + rng.random::<f64>() * (max - min),
            Self::Layered {
                base,
                harmonics,
                noise,
                decay,
                min,
                max,
            } => {
                let wave: f64 = harmonics
                    .iter()
                    .map(|h| (i * h.frequency).sin() * h.amplitude)
                    .sum();
                let jitter = noise.0 + rng.random::<f64>() * (noise.1 - noise.0);
                let falloff = decay.map_or(0.0, |(rate, amplitude)| (-i * rate).exp() * amplitude);
                (base + wave + jitter + falloff).clamp(*min, *max)
            }
            Self::Segmented {
                bands,
                fallback,
                spike_chance,
                spike_height,
                min,
                max,
            } => {
                let position = i / bar_count as f64;
                let (low, span) = bands
                    .iter()
                    .find(|b| position > b.start && position < b.end)
                    .map_or(*fallback, |b| (b.base, b.span));
                let mut height = low + rng.random::<f64>() * span;
                if rng.random_bool(spike_chance.clamp(0.0, 1.0)) {
                    height += rng.random::<f64>() * spike_height;
                }
                height.clamp(*min, *max)
            }
            Self::Alternating { cycle } => cycle.get(index % cycle.len().max(1)).copied().unwrap_or(0.0),
        }
    }
}

/// Immutable bar heights for one loaded source.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformModel {
    bars: Vec<Bar>,
}

impl WaveformModel {
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Generates `bar_count` bars using `shape`.
///
/// # Errors
/// - `InvalidArgument` if `bar_count` is zero or an alternating cycle is empty
pub fn generate(bar_count: usize, shape: &ShapeProfile, seed: u64) -> Result<WaveformModel, PlayerError> {
    if bar_count == 0 {
        return Err(PlayerError::InvalidArgument(
            "bar count must be greater than zero".to_string(),
        ));
    }
    if let ShapeProfile::Alternating { cycle } = shape {
        if cycle.is_empty() {
            return Err(PlayerError::InvalidArgument(
                "alternating shape needs at least one height".to_string(),
            ));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let bars = (0..bar_count)
        .map(|index| Bar {
            index,
            height: shape.height(index, bar_count, &mut rng),
        })
        .collect();

    Ok(WaveformModel { bars })
}

/// Derives a stable seed from a source URI (64-bit FNV-1a).
///
/// `std`'s hasher is not guaranteed stable across releases, and the shape of a
/// given file should not change when the binary is rebuilt.
pub fn seed_for_source(source: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    source
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered() -> ShapeProfile {
        ShapeProfile::Layered {
            base: 30.0,
            harmonics: vec![Harmonic::new(0.1, 20.0), Harmonic::new(0.3, 15.0)],
            noise: (-5.0, 5.0),
            decay: Some((0.02, 20.0)),
            min: 15.0,
            max: 85.0,
        }
    }

    #[test]
    fn test_zero_bars_is_rejected() {
        let err = generate(0, &ShapeProfile::Uniform { min: 20.0, max: 80.0 }, 1).unwrap_err();
        assert!(matches!(err, PlayerError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_cycle_is_rejected() {
        let shape = ShapeProfile::Alternating { cycle: vec![] };
        assert!(generate(10, &shape, 1).is_err());
    }

    #[test]
    fn test_heights_stay_in_bounds() {
        let shapes = [
            ShapeProfile::Uniform { min: 20.0, max: 80.0 },
            layered(),
            ShapeProfile::Segmented {
                bands: vec![Band {
                    start: 0.25,
                    end: 0.35,
                    base: 15.0,
                    span: 20.0,
                }],
                fallback: (3.0, 8.0),
                spike_chance: 0.5,
                spike_height: 50.0,
                min: 2.0,
                max: 40.0,
            },
        ];
        for shape in &shapes {
            let (min, max) = shape.bounds();
            let model = generate(200, shape, 7).unwrap();
            assert_eq!(model.len(), 200);
            for bar in model.bars() {
                assert!(bar.height >= min && bar.height <= max, "{} outside {min}..{max}", bar.height);
            }
        }
    }

    #[test]
    fn test_same_seed_same_shape() {
        let seed = seed_for_source("file:///music/track.wav");
        let a = generate(60, &layered(), seed).unwrap();
        let b = generate(60, &layered(), seed).unwrap();
        assert_eq!(a, b);

        let other = generate(60, &layered(), seed_for_source("file:///music/other.wav")).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_alternating_cycle_repeats() {
        let shape = ShapeProfile::Alternating {
            cycle: vec![6.0, 10.0, 14.0, 20.0, 14.0, 10.0],
        };
        let model = generate(42, &shape, 0).unwrap();
        let heights: Vec<f64> = model.bars().iter().map(|b| b.height).collect();
        assert_eq!(&heights[..7], &[6.0, 10.0, 14.0, 20.0, 14.0, 10.0, 6.0]);
        assert_eq!(shape.bounds(), (6.0, 20.0));
    }

    #[test]
    fn test_bar_indices_are_sequential() {
        let model = generate(12, &layered(), 3).unwrap();
        for (i, bar) in model.bars().iter().enumerate() {
            assert_eq!(bar.index, i);
        }
    }

    #[test]
    fn test_seed_is_stable() {
        assert_eq!(seed_for_source(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(seed_for_source("a"), seed_for_source("a"));
    }
}
