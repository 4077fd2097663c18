use crate::net::{GameData, PlayerData};

/// Interpolates from `initial` toward `target` at playback time
/// `simulation_time`, where snapshot `time - start_time` is on the playback
/// clock. Players missing from `initial` are placed at their target position.
pub fn interpolate(
    initial: &GameData,
    target: &GameData,
    start_time: f64,
    simulation_time: f64,
) -> GameData {
    if target.time == initial.time {
        return target.clone();
    }

    let initial_relative = initial.time as f64 - start_time;
    let span = target.time as f64 - initial.time as f64;
    let t = ((simulation_time - initial_relative) / span).clamp(0.0, 1.0) as f32;

    let players = target
        .players
        .iter()
        .map(|end| {
            let position = match initial.player(end.player_id) {
                Some(start) => start.position.lerp(end.position, t),
                None => end.position,
            };
            PlayerData::new(end.player_id, position)
        })
        .collect();

    GameData::with_players(simulation_time as f32, players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn snapshot(time: f32, players: &[(i32, f32, f32)]) -> GameData {
        GameData::with_players(
            time,
            players
                .iter()
                .map(|&(id, x, y)| PlayerData::new(id, Vec2::new(x, y)))
                .collect(),
        )
    }

    #[test]
    fn test_lerp_midpoint() {
        let initial = snapshot(0.0, &[(1, 0.0, 0.0)]);
        let target = snapshot(1.0, &[(1, 10.0, 0.0)]);

        let result = interpolate(&initial, &target, 0.0, 0.5);

        assert_eq!(result.time, 0.5);
        assert_eq!(result.player(1).unwrap().position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_start_time_offset() {
        let initial = snapshot(100.0, &[(1, 0.0, 0.0)]);
        let target = snapshot(102.0, &[(1, 0.0, 8.0)]);

        let result = interpolate(&initial, &target, 100.0, 1.5);

        assert!((result.player(1).unwrap().position.y - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_new_player_at_target() {
        let initial = snapshot(0.0, &[(1, 0.0, 0.0)]);
        let target = snapshot(1.0, &[(1, 4.0, 0.0), (2, 7.0, 3.0)]);

        let result = interpolate(&initial, &target, 0.0, 0.25);

        assert_eq!(result.players.len(), 2);
        assert_eq!(result.player(1).unwrap().position, Vec2::new(1.0, 0.0));
        assert_eq!(result.player(2).unwrap().position, Vec2::new(7.0, 3.0));
    }

    #[test]
    fn test_departed_player_dropped() {
        let initial = snapshot(0.0, &[(1, 0.0, 0.0), (2, 1.0, 1.0)]);
        let target = snapshot(1.0, &[(1, 4.0, 0.0)]);

        let result = interpolate(&initial, &target, 0.0, 0.5);

        assert!(result.player(2).is_none());
    }

    #[test]
    fn test_same_timestamp_returns_target() {
        let initial = snapshot(3.0, &[(1, 0.0, 0.0)]);
        let target = snapshot(3.0, &[(1, 9.0, 9.0)]);

        assert_eq!(interpolate(&initial, &target, 0.0, 3.0), target);
    }

    #[test]
    fn test_factor_clamped() {
        let initial = snapshot(0.0, &[(1, 0.0, 0.0)]);
        let target = snapshot(1.0, &[(1, 10.0, 0.0)]);

        let late = interpolate(&initial, &target, 0.0, 1.5);
        assert_eq!(late.player(1).unwrap().position, Vec2::new(10.0, 0.0));

        let early = interpolate(&initial, &target, 0.0, -1.0);
        assert_eq!(early.player(1).unwrap().position, Vec2::ZERO);
    }
}
