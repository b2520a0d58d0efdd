//! Visual profiles: one preset per player variant.
//!
//! Every variant runs the same playback contract; a profile only changes what
//! the bars look like and how the strip follows the playhead.

use super::animation::AnimationStyle;
use super::position::IndexPolicy;
use super::scroll::ScrollPolicy;
use super::waveform::{Band, Harmonic, ShapeProfile};
use serde::{Deserialize, Serialize};

/// Selectable profile names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileName {
    /// Random bars, no scrolling, no animation
    Baseline,
    /// 100 bars, proportional scroll
    Advanced,
    /// 80 layered bars, centered scroll
    Smooth,
    /// Symmetric bars with a breathing animation
    #[default]
    UltraSmooth,
    /// 120 bars with volume controls
    Professional,
    /// Compact, banded bars
    ScreenshotMatch,
    /// Repeating stepped bars
    Beautiful,
}

impl ProfileName {
    pub const ALL: [ProfileName; 7] = [
        Self::Baseline,
        Self::Advanced,
        Self::Smooth,
        Self::UltraSmooth,
        Self::Professional,
        Self::ScreenshotMatch,
        Self::Beautiful,
    ];

    pub fn profile(self) -> VisualProfile {
        VisualProfile::preset(self)
    }
}

impl std::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Baseline => "baseline",
            Self::Advanced => "advanced",
            Self::Smooth => "smooth",
            Self::UltraSmooth => "ultra-smooth",
            Self::Professional => "professional",
            Self::ScreenshotMatch => "screenshot-match",
            Self::Beautiful => "beautiful",
        };
        write!(f, "{name}")
    }
}

/// 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub played: Rgb,
    pub active: Rgb,
    pub upcoming: Rgb,
    pub background: Rgb,
    pub accent: Rgb,
}

/// How a bar is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarStyle {
    /// Grows up from the baseline.
    Bottom,
    /// Mirrored above and below a centre line.
    Symmetric,
}

/// Everything that distinguishes one player variant from another.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProfile {
    pub name: ProfileName,
    pub description: &'static str,
    pub bar_count: usize,
    pub shape: ShapeProfile,
    pub bar_style: BarStyle,
    /// Terminal columns per bar, gap included.
    pub bar_pitch: u16,
    pub palette: Palette,
    /// `None` squeezes the whole strip into the viewport.
    pub scroll: Option<ScrollPolicy>,
    pub animation: Option<AnimationStyle>,
    /// Show volume and mute in the footer.
    pub volume_controls: bool,
}

const CYAN: Rgb = Rgb(34, 211, 238);
const CYAN_LIGHT: Rgb = Rgb(103, 232, 249);
const DIM: Rgb = Rgb(75, 85, 99);
const BLACK: Rgb = Rgb(0, 0, 0);

impl VisualProfile {
    /// The active-bar policy shared by every profile.
    pub const INDEX_POLICY: IndexPolicy = IndexPolicy::Round;

    pub fn preset(name: ProfileName) -> Self {
        match name {
            ProfileName::Baseline => Self {
                name,
                description: "random bars, whole track in view",
                bar_count: 60,
                shape: ShapeProfile::Uniform {
                    min: 20.0,
                    max: 80.0,
                },
                bar_style: BarStyle::Bottom,
                bar_pitch: 1,
                palette: Palette {
                    played: Rgb(59, 130, 246),
                    active: Rgb(96, 165, 250),
                    upcoming: DIM,
                    background: BLACK,
                    accent: Rgb(59, 130, 246),
                },
                scroll: None,
                animation: None,
                volume_controls: false,
            },
            ProfileName::Advanced => Self {
                name,
                description: "dense bars, proportional scrolling",
                bar_count: 100,
                shape: ShapeProfile::Layered {
                    base: 25.0,
                    harmonics: vec![Harmonic::new(0.1, 15.0), Harmonic::new(0.05, 20.0)],
                    noise: (0.0, 40.0),
                    decay: None,
                    min: 15.0,
                    max: 85.0,
                },
                bar_style: BarStyle::Bottom,
                bar_pitch: 2,
                palette: Palette {
                    played: Rgb(168, 85, 247),
                    active: Rgb(236, 72, 153),
                    upcoming: DIM,
                    background: BLACK,
                    accent: Rgb(168, 85, 247),
                },
                scroll: Some(ScrollPolicy::StartAligned),
                animation: None,
                volume_controls: false,
            },
            ProfileName::Smooth => Self {
                name,
                description: "layered spectrum, centered scrolling",
                bar_count: 80,
                shape: ShapeProfile::Layered {
                    base: 30.0,
                    harmonics: vec![
                        Harmonic::new(0.1, 20.0),
                        Harmonic::new(0.3, 15.0),
                        Harmonic::new(0.8, 10.0),
                    ],
                    noise: (-5.0, 5.0),
                    decay: None,
                    min: 15.0,
                    max: 85.0,
                },
                bar_style: BarStyle::Bottom,
                bar_pitch: 2,
                palette: Palette {
                    played: CYAN,
                    active: CYAN_LIGHT,
                    upcoming: DIM,
                    background: BLACK,
                    accent: CYAN,
                },
                scroll: Some(ScrollPolicy::CenterAligned),
                animation: Some(AnimationStyle {
                    rate: 0.002,
                    wave_amplitude: 3.0,
                    wave_spread: 0.5,
                    breathing_amplitude: 0.0,
                    floor: 15.0,
                }),
                volume_controls: false,
            },
            ProfileName::UltraSmooth => Self {
                name,
                description: "symmetric bars with a breathing animation",
                bar_count: 60,
                shape: ShapeProfile::Layered {
                    base: 25.0,
                    harmonics: vec![
                        Harmonic::new(0.05, 25.0),
                        Harmonic::new(0.15, 15.0),
                        Harmonic::new(0.4, 8.0),
                    ],
                    noise: (-5.0, 5.0),
                    decay: Some((0.02, 20.0)),
                    min: 12.0,
                    max: 80.0,
                },
                bar_style: BarStyle::Symmetric,
                bar_pitch: 2,
                palette: Palette {
                    played: CYAN,
                    active: CYAN_LIGHT,
                    upcoming: Rgb(90, 90, 90),
                    background: Rgb(15, 23, 42),
                    accent: CYAN,
                },
                scroll: Some(ScrollPolicy::CenterAligned),
                animation: Some(AnimationStyle {
                    rate: 0.002,
                    wave_amplitude: 2.0,
                    wave_spread: 0.2,
                    breathing_amplitude: 1.5,
                    floor: 10.0,
                }),
                volume_controls: false,
            },
            ProfileName::Professional => Self {
                name,
                description: "wide dynamic range, volume and mute controls",
                bar_count: 120,
                shape: ShapeProfile::Layered {
                    base: 30.0,
                    harmonics: vec![
                        Harmonic::new(0.15, 25.0),
                        Harmonic::new(0.08, 15.0),
                        Harmonic::new(0.3, 10.0),
                        Harmonic::new(0.02, 30.0),
                    ],
                    noise: (-10.0, 10.0),
                    decay: None,
                    min: 10.0,
                    max: 90.0,
                },
                bar_style: BarStyle::Bottom,
                bar_pitch: 1,
                palette: Palette {
                    played: Rgb(16, 185, 129),
                    active: Rgb(52, 211, 153),
                    upcoming: DIM,
                    background: Rgb(17, 24, 39),
                    accent: Rgb(16, 185, 129),
                },
                scroll: Some(ScrollPolicy::CenterAligned),
                animation: None,
                volume_controls: true,
            },
            ProfileName::ScreenshotMatch => Self {
                name,
                description: "compact banded bars",
                bar_count: 85,
                shape: ShapeProfile::Segmented {
                    bands: vec![
                        Band {
                            start: f64::NEG_INFINITY,
                            end: 0.2,
                            base: 8.0,
                            span: 12.0,
                        },
                        Band {
                            start: 0.25,
                            end: 0.35,
                            base: 15.0,
                            span: 20.0,
                        },
                        Band {
                            start: 0.4,
                            end: 0.5,
                            base: 10.0,
                            span: 15.0,
                        },
                        Band {
                            start: 0.6,
                            end: 0.8,
                            base: 12.0,
                            span: 18.0,
                        },
                        Band {
                            start: 0.85,
                            end: f64::INFINITY,
                            base: 6.0,
                            span: 10.0,
                        },
                    ],
                    fallback: (3.0, 8.0),
                    spike_chance: 0.1,
                    spike_height: 15.0,
                    min: 2.0,
                    max: 40.0,
                },
                bar_style: BarStyle::Bottom,
                bar_pitch: 1,
                palette: Palette {
                    played: Rgb(249, 115, 22),
                    active: Rgb(251, 146, 60),
                    upcoming: Rgb(120, 120, 120),
                    background: BLACK,
                    accent: Rgb(249, 115, 22),
                },
                scroll: None,
                animation: None,
                volume_controls: false,
            },
            ProfileName::Beautiful => Self {
                name,
                description: "stepped symmetric bars",
                bar_count: 42,
                shape: ShapeProfile::Alternating {
                    cycle: vec![6.0, 10.0, 14.0, 20.0, 14.0, 10.0],
                },
                bar_style: BarStyle::Symmetric,
                bar_pitch: 2,
                palette: Palette {
                    played: Rgb(244, 114, 182),
                    active: Rgb(251, 207, 232),
                    upcoming: Rgb(100, 100, 100),
                    background: BLACK,
                    accent: Rgb(244, 114, 182),
                },
                scroll: None,
                animation: Some(AnimationStyle {
                    rate: 0.002,
                    wave_amplitude: 1.0,
                    wave_spread: 0.2,
                    breathing_amplitude: 1.0,
                    floor: 6.0,
                }),
                volume_controls: false,
            },
        }
    }

    /// Width of the whole strip in terminal columns.
    pub fn content_width(&self) -> u16 {
        let width = self.bar_count.saturating_mul(usize::from(self.bar_pitch));
        u16::try_from(width).unwrap_or(u16::MAX)
    }
}
