//! Motion trails between two consecutive steps

use std::hash::{Hash, Hasher};

use fxhash::FxHasher;

use crate::geometry::polyline_samples;
use crate::models::{PlaybookStep, Trail};

/// Points per straight-line trail.
pub const TRAIL_SAMPLES: usize = 8;

const TRAIL_PALETTE: [&str; 8] = [
    "#f87171", "#fb923c", "#facc15", "#4ade80", "#2dd4bf", "#60a5fa", "#a78bfa", "#f472b6",
];

/// Stable per-player colour. FxHasher keeps it identical across builds.
pub fn trail_color(player_id: &str) -> &'static str {
    let mut hasher = FxHasher::default();
    player_id.hash(&mut hasher);
    TRAIL_PALETTE[(hasher.finish() % TRAIL_PALETTE.len() as u64) as usize]
}

/// Trails for every player whose position differs between `prev` and `next`.
///
/// A run drawn on `next` is used as the path; otherwise the straight line is sampled.
pub fn compute_trails(prev: &PlaybookStep, next: &PlaybookStep) -> Vec<Trail> {
    next.player_positions
        .iter()
        .filter_map(|(player_id, &to)| {
            let &from = prev.player_positions.get(player_id)?;
            if from == to {
                return None;
            }
            let points = match next.run_for(player_id) {
                Some(run) if !run.points.is_empty() => {
                    let mut pts = Vec::with_capacity(run.points.len() + 2);
                    pts.push(from);
                    pts.extend(run.points.iter().copied());
                    if pts.last() != Some(&to) {
                        pts.push(to);
                    }
                    pts
                }
                _ => polyline_samples(from, to, TRAIL_SAMPLES),
            };
            Some(Trail { player_id: player_id.clone(), points, color: trail_color(player_id).to_string() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PitchPos;
    use crate::models::PlayerRun;

    fn step(positions: &[(&str, f64, f64)]) -> PlaybookStep {
        PlaybookStep {
            id: "s".into(),
            player_positions: positions.iter().map(|(id, x, y)| (id.to_string(), PitchPos::new(*x, *y))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_only_moving_players_get_trails() {
        let prev = step(&[("p1", 10.0, 10.0), ("p2", 20.0, 20.0)]);
        let next = step(&[("p1", 10.0, 10.0), ("p2", 40.0, 20.0), ("p3", 5.0, 5.0)]);
        let trails = compute_trails(&prev, &next);
        assert_eq!(trails.len(), 1);
        assert_eq!(trails[0].player_id, "p2");
        assert_eq!(trails[0].points.len(), TRAIL_SAMPLES);
        assert_eq!(trails[0].points.first(), Some(&PitchPos::new(20.0, 20.0)));
        assert_eq!(trails[0].points.last(), Some(&PitchPos::new(40.0, 20.0)));
    }

    #[test]
    fn test_run_path_is_followed() {
        let prev = step(&[("p2", 20.0, 20.0)]);
        let mut next = step(&[("p2", 40.0, 20.0)]);
        next.player_runs.push(PlayerRun { player_id: "p2".into(), points: vec![PitchPos::new(30.0, 30.0)] });
        let trails = compute_trails(&prev, &next);
        assert_eq!(
            trails[0].points,
            vec![PitchPos::new(20.0, 20.0), PitchPos::new(30.0, 30.0), PitchPos::new(40.0, 20.0)]
        );
    }

    #[test]
    fn test_color_is_stable_per_player() {
        assert_eq!(trail_color("p7"), trail_color("p7"));
        assert!(TRAIL_PALETTE.contains(&trail_color("anyone")));
    }
}
