//! Affinity score → multiplier → bubble color
//!
//! A slot's raw affinity score becomes a multiplier `score / 100 + 1`
//! (unset for missing, non-finite or non-positive scores). The multiplier
//! is normalized against [`MULTIPLIER_RANGE`] and painted on a straight
//! per-channel RGB gradient: red at the low end, green at the high end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalization range for bubble colors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierRange {
    pub low: f64,
    pub high: f64,
}

/// Deployment-wide bubble normalization range
///
/// Multipliers at or below 1.0 render fully red, at or above 4.0 fully
/// green (a score of 300 saturates).
pub const MULTIPLIER_RANGE: MultiplierRange = MultiplierRange { low: 1.0, high: 4.0 };

/// Color for slots without a multiplier; not reachable on the gradient
/// since the gradient's blue channel is fixed at 70
pub const NEUTRAL_COLOR: Rgb = Rgb::new(150, 150, 150);

/// Text shown for an unset multiplier
pub const UNSET_LABEL: &str = "x0.00";

const RED: (f64, f64) = (220.0, 80.0);
const GREEN: (f64, f64) = (70.0, 200.0);
const BLUE: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// `score / 100 + 1`, or `None` when the score carries no affinity
pub fn score_to_multiplier(score: Option<f64>) -> Option<f64> {
    match score {
        Some(s) if s.is_finite() && s > 0.0 => Some(s / 100.0 + 1.0),
        _ => None,
    }
}

/// Position of `multiplier` within `range`, clamped to `[0, 1]`
fn normalize(multiplier: f64, range: MultiplierRange) -> f64 {
    let span = range.high - range.low;
    if span <= 0.0 {
        return if multiplier >= range.high { 1.0 } else { 0.0 };
    }
    ((multiplier - range.low) / span).clamp(0.0, 1.0)
}

fn lerp_channel((from, to): (f64, f64), t: f64) -> u8 {
    (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
}

pub fn multiplier_to_color(multiplier: Option<f64>, range: MultiplierRange) -> Rgb {
    match multiplier {
        Some(m) if m.is_finite() => {
            let t = normalize(m, range);
            Rgb::new(lerp_channel(RED, t), lerp_channel(GREEN, t), BLUE)
        }
        _ => NEUTRAL_COLOR,
    }
}

pub fn multiplier_label(multiplier: Option<f64>) -> String {
    match multiplier {
        Some(m) if m.is_finite() => format!("x{:.2}", m),
        _ => UNSET_LABEL.to_string(),
    }
}

/// Everything the presentation layer needs to draw one slot's bubble
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub multiplier: Option<f64>,
    pub color: Rgb,
    pub label: String,
}

impl Bubble {
    pub fn from_score(score: Option<f64>) -> Self {
        Self::from_multiplier(score_to_multiplier(score))
    }

    pub fn from_multiplier(multiplier: Option<f64>) -> Self {
        Self {
            multiplier,
            color: multiplier_to_color(multiplier, MULTIPLIER_RANGE),
            label: multiplier_label(multiplier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_unset_inputs() {
        assert_eq!(score_to_multiplier(None), None);
        assert_eq!(score_to_multiplier(Some(0.0)), None);
        assert_eq!(score_to_multiplier(Some(-25.0)), None);
        assert_eq!(score_to_multiplier(Some(f64::NAN)), None);
        assert_eq!(score_to_multiplier(Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_multiplier_positive_scores() {
        assert_eq!(score_to_multiplier(Some(50.0)), Some(1.5));
        assert_eq!(score_to_multiplier(Some(150.0)), Some(2.5));
        assert_eq!(score_to_multiplier(Some(200.0)), Some(3.0));
    }

    #[test]
    fn test_color_endpoints_and_midpoint() {
        assert_eq!(multiplier_to_color(Some(1.0), MULTIPLIER_RANGE), Rgb::new(220, 70, 70));
        assert_eq!(multiplier_to_color(Some(4.0), MULTIPLIER_RANGE), Rgb::new(80, 200, 70));
        assert_eq!(multiplier_to_color(Some(2.5), MULTIPLIER_RANGE), Rgb::new(150, 135, 70));
    }

    #[test]
    fn test_color_clamps_outside_range() {
        assert_eq!(
            multiplier_to_color(Some(0.2), MULTIPLIER_RANGE),
            multiplier_to_color(Some(1.0), MULTIPLIER_RANGE)
        );
        assert_eq!(
            multiplier_to_color(Some(9.0), MULTIPLIER_RANGE),
            multiplier_to_color(Some(4.0), MULTIPLIER_RANGE)
        );
    }

    #[test]
    fn test_color_with_narrow_range() {
        let narrow = MultiplierRange { low: 1.0, high: 1.5 };
        assert_eq!(multiplier_to_color(Some(1.25), narrow), Rgb::new(150, 135, 70));
        assert_eq!(multiplier_to_color(Some(3.0), narrow), Rgb::new(80, 200, 70));
    }

    #[test]
    fn test_unset_renders_neutral() {
        let bubble = Bubble::from_score(None);
        assert_eq!(bubble.multiplier, None);
        assert_eq!(bubble.color, NEUTRAL_COLOR);
        assert_eq!(bubble.label, "x0.00");
        assert_ne!(NEUTRAL_COLOR.b, BLUE);
    }

    #[test]
    fn test_bubble_label_two_decimals() {
        assert_eq!(Bubble::from_score(Some(150.0)).label, "x2.50");
        assert_eq!(Bubble::from_score(Some(12.345)).label, "x1.12");
    }

    #[test]
    fn test_rgb_hex_display() {
        assert_eq!(Rgb::new(220, 70, 70).to_string(), "#dc4646");
    }
}
