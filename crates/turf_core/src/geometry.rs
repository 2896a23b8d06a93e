//! Pitch geometry
//!
//! Positions live in percentage pitch-space (`0..=100` on both axes) and are
//! always stored home-relative. The away side is drawn through [`PitchPos::mirror`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of both pitch axes.
pub const PITCH_MAX: f64 = 100.0;

/// Coordinates are snapped to this many steps per unit so that
/// `PITCH_MAX - (PITCH_MAX - v)` is exact in binary floating point.
const STEPS_PER_UNIT: f64 = 1024.0;

// =============================================================================
// Team
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

/// Which side(s) the pitch view is focused on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamView {
    Home,
    Away,
    #[default]
    Both,
}

impl TeamView {
    pub fn shows(self, team: Team) -> bool {
        match self {
            TeamView::Both => true,
            TeamView::Home => team == Team::Home,
            TeamView::Away => team == Team::Away,
        }
    }
}

// =============================================================================
// PitchPos
// =============================================================================

/// A point in percentage pitch-space.
///
/// Every constructor clamps to `[0, 100]` and snaps to a 1/1024 grid, which
/// makes [`mirror`](PitchPos::mirror) an exact involution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(from = "RawPitchPos")]
pub struct PitchPos {
    x: f64,
    y: f64,
}

#[derive(Deserialize, JsonSchema)]
struct RawPitchPos {
    x: f64,
    y: f64,
}

impl From<RawPitchPos> for PitchPos {
    fn from(raw: RawPitchPos) -> Self {
        PitchPos::new(raw.x, raw.y)
    }
}

impl Default for PitchPos {
    fn default() -> Self {
        PitchPos::CENTER
    }
}

fn snap(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    let clamped = v.clamp(0.0, PITCH_MAX);
    (clamped * STEPS_PER_UNIT).round() / STEPS_PER_UNIT
}

impl PitchPos {
    pub const CENTER: PitchPos = PitchPos { x: 50.0, y: 50.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x: snap(x), y: snap(y) }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Reflect through the pitch centre: `(100 - x, 100 - y)`.
    pub fn mirror(self) -> Self {
        Self { x: PITCH_MAX - self.x, y: PITCH_MAX - self.y }
    }

    /// Home-relative storage to view space for `team`.
    pub fn for_team(self, team: Team) -> Self {
        match team {
            Team::Home => self,
            Team::Away => self.mirror(),
        }
    }

    pub fn distance(&self, other: &PitchPos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`.
    pub fn lerp(&self, other: &PitchPos, t: f64) -> PitchPos {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        PitchPos::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// `samples` evenly spaced points from `from` to `to`, both ends included.
pub fn polyline_samples(from: PitchPos, to: PitchPos, samples: usize) -> Vec<PitchPos> {
    match samples {
        0 => Vec::new(),
        1 => vec![to],
        n => (0..n).map(|i| from.lerp(&to, i as f64 / (n - 1) as f64)).collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_clamps_and_sanitizes() {
        let p = PitchPos::new(-5.0, 130.0);
        assert_eq!(p, PitchPos::new(0.0, 100.0));

        let nan = PitchPos::new(f64::NAN, f64::INFINITY);
        assert_eq!(nan, PitchPos::new(0.0, 0.0));
    }

    #[test]
    fn test_mirror_reflects_through_center() {
        let p = PitchPos::new(8.0, 50.0);
        assert_eq!(p.mirror(), PitchPos::new(92.0, 50.0));
        assert_eq!(PitchPos::CENTER.mirror(), PitchPos::CENTER);
        assert_eq!(p.for_team(Team::Home), p);
        assert_eq!(p.for_team(Team::Away), p.mirror());
    }

    #[test]
    fn test_deserialize_goes_through_constructor() {
        let p: PitchPos = serde_json::from_str(r#"{"x": 101.5, "y": 33.3333333}"#).unwrap();
        assert_eq!(p.x(), 100.0);
        assert_eq!(p.y(), PitchPos::new(0.0, 33.3333333).y());
        assert_eq!(p.y() * 1024.0, (p.y() * 1024.0).round());
    }

    #[test]
    fn test_polyline_samples_include_both_ends() {
        let a = PitchPos::new(10.0, 10.0);
        let b = PitchPos::new(20.0, 30.0);
        let pts = polyline_samples(a, b, 5);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], a);
        assert_eq!(pts[4], b);
        assert_eq!(pts[2], PitchPos::new(15.0, 20.0));
        assert!(polyline_samples(a, b, 0).is_empty());
    }

    proptest! {
        /// Property: mirroring twice gives back the exact same position
        #[test]
        fn prop_mirror_is_exact_involution(x in -1.0e6f64..1.0e6, y in -1.0e6f64..1.0e6) {
            let p = PitchPos::new(x, y);
            prop_assert_eq!(p.mirror().mirror(), p);
        }

        /// Property: mirroring preserves pairwise distance
        #[test]
        fn prop_mirror_preserves_distance(
            ax in 0.0f64..100.0, ay in 0.0f64..100.0,
            bx in 0.0f64..100.0, by in 0.0f64..100.0,
        ) {
            let a = PitchPos::new(ax, ay);
            let b = PitchPos::new(bx, by);
            prop_assert!((a.distance(&b) - a.mirror().distance(&b.mirror())).abs() < 1e-9);
        }

        /// Property: constructed positions stay on the pitch
        #[test]
        fn prop_new_stays_on_pitch(x in proptest::num::f64::ANY, y in proptest::num::f64::ANY) {
            let p = PitchPos::new(x, y);
            prop_assert!((0.0..=PITCH_MAX).contains(&p.x()));
            prop_assert!((0.0..=PITCH_MAX).contains(&p.y()));
        }
    }
}
