//! Per-tick orchestration
//!
//! One call advances the world by one frame. The order is fixed:
//! dilation, index rebuild, intended velocities, body-vs-body, body-vs-tile,
//! integration, removal of defeated NPCs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Hit, resolve_actors, resolve_tiles};
use super::state::{BodyId, WorldState};
use super::vector::{approach, approach_scalar, clamp_unit, direction};

/// Movement tunables, in cells per tick at full time dilation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player_speed: f32,
    /// Aggro NPCs chase slower than the player can run
    pub pursuit_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: 0.2,
            pursuit_speed: 0.1,
        }
    }
}

/// Keys held during this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Let time run without moving
    pub wait: bool,
}

impl TickInput {
    /// Sum of held directions (+y is down), clamped to unit length
    pub fn move_direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        clamp_unit(dir)
    }

    /// Any tracked key held; drives time dilation toward 1
    pub fn any_held(&self) -> bool {
        self.up || self.down || self.left || self.right || self.wait
    }
}

/// What happened during a tick, for the presentation layer
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub hits: Vec<Hit>,
    /// NPCs removed at the end of the tick
    pub defeated: Vec<BodyId>,
    /// Bodies corrected by the tile resolver
    pub tile_contacts: u32,
}

/// Advance the world one tick from held keys
pub fn tick(state: &mut WorldState, input: &TickInput, tuning: &Tuning) -> TickReport {
    run_tick(state, input.move_direction(), input.any_held(), tuning)
}

/// Advance the world one tick from a desired move direction.
///
/// `active` is whether the player is holding any tracked key this tick.
/// Directions longer than 1 are clamped.
pub fn run_tick(state: &mut WorldState, move_dir: Vec2, active: bool, tuning: &Tuning) -> TickReport {
    state.time_ticks += 1;

    let move_dir = clamp_unit(move_dir);
    let goal = if active { 1.0 } else { 0.0 };
    state.time_dilation = approach_scalar(state.time_dilation, goal);
    let dilation = state.time_dilation;

    state.index.rebuild(&state.npcs);

    state.player.vel = approach(state.player.vel, move_dir * tuning.player_speed * dilation);

    let player_pos = state.player.pos;
    for npc in &mut state.npcs {
        let target = if npc.aggro {
            direction(npc.pos, player_pos) * tuning.pursuit_speed * dilation
        } else {
            Vec2::ZERO
        };
        npc.vel = approach(npc.vel, target);
    }

    let hits = resolve_actors(&state.player, &mut state.npcs, &state.index);

    let mut tile_contacts = 0;
    if resolve_tiles(&mut state.player, &state.map).hit() {
        tile_contacts += 1;
    }
    for npc in &mut state.npcs {
        if resolve_tiles(npc, &state.map).hit() {
            tile_contacts += 1;
        }
    }

    state.player.pos += state.player.vel;
    for npc in &mut state.npcs {
        npc.pos += npc.vel;
    }

    let defeated: Vec<BodyId> = state
        .npcs
        .iter()
        .filter(|n| n.is_defeated())
        .map(|n| n.id)
        .collect();
    if !defeated.is_empty() {
        state.npcs.retain(|n| !n.is_defeated());
        for id in &defeated {
            log::debug!("NPC {:?} defeated on tick {}", id, state.time_ticks);
        }
    }

    TickReport {
        hits,
        defeated,
        tile_contacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{MAX_NPC_SPEED, circle_tile_overlap};
    use crate::sim::map::{TileMap, nearest_cell};
    use crate::sim::state::{Body, BodyTemplate};
    use glam::IVec2;

    fn player_at(x: f32, y: f32, damage: i32) -> Body {
        let template = BodyTemplate {
            radius: 0.4,
            health: 20,
            damage,
            aggro: false,
        };
        Body::from_template(BodyId::PLAYER, Vec2::new(x, y), &template)
    }

    fn npc_template(health: i32) -> BodyTemplate {
        BodyTemplate {
            radius: 0.4,
            health,
            damage: 1,
            aggro: false,
        }
    }

    const RIGHT: TickInput = TickInput {
        up: false,
        down: false,
        left: false,
        right: true,
        wait: false,
    };

    #[test]
    fn test_move_direction() {
        assert_eq!(TickInput::default().move_direction(), Vec2::ZERO);
        assert_eq!(RIGHT.move_direction(), Vec2::X);

        let up_left = TickInput {
            up: true,
            left: true,
            ..Default::default()
        };
        let dir = up_left.move_direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.x < 0.0 && dir.y < 0.0);

        let opposed = TickInput {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(opposed.move_direction(), Vec2::ZERO);
        assert!(opposed.any_held());
    }

    #[test]
    fn test_wait_counts_as_held_without_moving() {
        let wait = TickInput {
            wait: true,
            ..Default::default()
        };
        assert!(wait.any_held());
        assert_eq!(wait.move_direction(), Vec2::ZERO);
    }

    #[test]
    fn test_walk_into_wall_stops() {
        let mut state = WorldState::with_map(TileMap::bordered(5), player_at(2.0, 2.0, 5));
        let tuning = Tuning::default();

        let mut contact_seen = false;
        for _ in 0..30 {
            let report = tick(&mut state, &RIGHT, &tuning);
            if report.tile_contacts > 0 && !contact_seen {
                contact_seen = true;
                assert!(state.player.vel.x.abs() < 1e-6);
            }
        }

        assert!(contact_seen);
        assert!(state.player.pos.x < 3.5);
        assert!(state.player.pos.x + state.player.radius <= 3.5 + 1e-5);
        assert!((state.player.pos.x - 3.1).abs() < 1e-4);
        assert!(state.player.vel.x.abs() < 1e-6);
        assert!((state.player.pos.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlapping_npcs_separate_in_one_tick() {
        let mut state = WorldState::with_map(TileMap::bordered(8), player_at(6.0, 6.0, 5));
        state.spawn_npc(&npc_template(10), Vec2::new(3.0, 3.0));
        state.spawn_npc(&npc_template(10), Vec2::new(3.3, 3.0));

        let report = run_tick(&mut state, Vec2::ZERO, false, &Tuning::default());

        assert!(report.hits.is_empty());
        let separation = state.npcs[0].pos.distance(state.npcs[1].pos);
        assert!(separation >= 0.8 - 1e-5, "separation {separation}");
    }

    /// Contact damage has no cooldown: it lands every tick the circles overlap.
    #[test]
    fn test_sustained_contact_damages_every_tick() {
        let mut state = WorldState::with_map(TileMap::bordered(8), player_at(3.0, 3.0, 5));
        let id = state.spawn_npc(&npc_template(100), Vec2::new(3.5, 3.0));
        let tuning = Tuning::default();

        for n in 1..=6 {
            let report = run_tick(&mut state, Vec2::ZERO, false, &tuning);
            assert_eq!(report.hits.len(), 1);
            assert_eq!(report.hits[0].target, id);
            let npc = state.npc(id).expect("npc still alive");
            assert_eq!(npc.health.current, 100 - 5 * n);
        }
    }

    #[test]
    fn test_defeated_npc_removed() {
        let mut state = WorldState::with_map(TileMap::bordered(8), player_at(3.0, 3.0, 5));
        let weak = state.spawn_npc(&npc_template(5), Vec2::new(3.5, 3.0));
        let far = state.spawn_npc(&npc_template(5), Vec2::new(6.0, 6.0));

        let report = run_tick(&mut state, Vec2::ZERO, false, &Tuning::default());

        assert_eq!(report.defeated, vec![weak]);
        assert!(state.npc(weak).is_none());
        assert!(state.npc(far).is_some());
        assert_eq!(state.npcs.len(), 1);
        assert_eq!(state.bodies().count(), 2);
    }

    #[test]
    fn test_time_dilation_ramp() {
        let mut state = WorldState::with_map(TileMap::bordered(8), player_at(3.0, 3.0, 5));
        let tuning = Tuning::default();
        let wait = TickInput {
            wait: true,
            ..Default::default()
        };

        let mut last = state.time_dilation;
        for _ in 0..65 {
            tick(&mut state, &wait, &tuning);
            assert!(state.time_dilation >= last - 1e-6);
            last = state.time_dilation;
        }
        assert!((1.0 - state.time_dilation).abs() < 1e-6);

        for _ in 0..65 {
            tick(&mut state, &TickInput::default(), &tuning);
            assert!(state.time_dilation <= last + 1e-6);
            last = state.time_dilation;
        }
        assert!(state.time_dilation < 1e-6);
    }

    #[test]
    fn test_dilation_scales_player_speed() {
        let tuning = Tuning::default();
        let mut slow = WorldState::with_map(TileMap::bordered(16), player_at(8.0, 8.0, 5));
        let mut fast = slow.clone();
        fast.time_dilation = 1.0;

        tick(&mut slow, &RIGHT, &tuning);
        tick(&mut fast, &RIGHT, &tuning);
        assert!(fast.player.pos.x - 8.0 > slow.player.pos.x - 8.0);
        assert!((fast.player.vel.x - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_aggro_npc_pursues_player() {
        let mut state = WorldState::with_map(TileMap::bordered(16), player_at(3.0, 3.0, 5));
        let template = BodyTemplate {
            aggro: true,
            ..npc_template(10)
        };
        let id = state.spawn_npc(&template, Vec2::new(10.0, 3.0));
        state.time_dilation = 1.0;
        let wait = TickInput {
            wait: true,
            ..Default::default()
        };

        for _ in 0..10 {
            tick(&mut state, &wait, &Tuning::default());
        }
        let npc = state.npc(id).expect("npc alive");
        assert!(npc.pos.x < 10.0);
        assert!(npc.vel.x < 0.0);
        assert!(npc.vel.x.abs() <= Tuning::default().pursuit_speed + 1e-6);
    }

    #[test]
    fn test_idle_npc_stays_put() {
        let mut state = WorldState::with_map(TileMap::bordered(16), player_at(3.0, 3.0, 5));
        let id = state.spawn_npc(&npc_template(10), Vec2::new(10.0, 3.0));
        for _ in 0..10 {
            tick(&mut state, &RIGHT, &Tuning::default());
        }
        assert_eq!(state.npc(id).map(|n| n.pos), Some(Vec2::new(10.0, 3.0)));
    }

    #[test]
    fn test_determinism() {
        use crate::settings::Settings;

        let settings = Settings {
            map_side: 24,
            seed: 99,
            ..Default::default()
        };
        let mut a = WorldState::new(&settings);
        let mut b = WorldState::new(&settings);
        let inputs = [
            RIGHT,
            TickInput {
                down: true,
                ..Default::default()
            },
            TickInput {
                left: true,
                up: true,
                ..Default::default()
            },
        ];
        for i in 0..90 {
            let input = inputs[i / 30];
            tick(&mut a, &input, &settings.tuning);
            tick(&mut b, &input, &settings.tuning);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.npcs.len(), b.npcs.len());
        assert!(a.npcs.iter().zip(&b.npcs).all(|(x, y)| x.pos == y.pos && x.id == y.id));
    }

    /// Deepest overlap between `body` and the solid tiles around it
    fn wall_overlap(body: &Body, map: &TileMap) -> f32 {
        let cell = nearest_cell(body.pos);
        let mut deepest = 0.0f32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let tile = cell + IVec2::new(dx, dy);
                if !map.is_solid(tile) {
                    continue;
                }
                if let Some((_, depth)) = circle_tile_overlap(body.pos, body.radius, tile.as_vec2()) {
                    deepest = deepest.max(depth);
                }
            }
        }
        deepest
    }

    fn assert_clear_of_walls(state: &WorldState, label: &str) {
        for body in std::iter::once(&state.player).chain(&state.npcs) {
            assert!(
                state.map.in_bounds(nearest_cell(body.pos)),
                "{label}: {:?} left the map at {:?}",
                body.id,
                body.pos
            );
            let overlap = wall_overlap(body, &state.map);
            assert!(
                overlap < 1e-3,
                "{label}: {:?} at {:?} vel {:?} inside a wall by {overlap}",
                body.id,
                body.pos,
                body.vel
            );
        }
    }

    #[test]
    fn test_generated_world_never_penetrated() {
        use crate::settings::Settings;

        let settings = Settings {
            map_side: 20,
            seed: 5,
            ..Default::default()
        };
        let mut state = WorldState::new(&settings);
        let pattern = [
            RIGHT,
            TickInput {
                down: true,
                ..Default::default()
            },
            TickInput {
                left: true,
                ..Default::default()
            },
            TickInput {
                up: true,
                right: true,
                ..Default::default()
            },
        ];
        for i in 0..400 {
            tick(&mut state, &pattern[(i / 40) % pattern.len()], &settings.tuning);
            assert_clear_of_walls(&state, &format!("tick {i}"));
            let p = &state.player;
            for t in state.map.tiles().filter(|t| t.solid) {
                assert!(
                    p.pos.distance(t.center()) >= p.radius + 0.5 - 1e-3,
                    "tick {i}: player at {:?} inside {:?}",
                    p.pos,
                    t.coord
                );
            }
        }
    }

    /// Aggro NPCs piling onto a stationary player shove each other hard;
    /// none of them may be pushed into or through a wall.
    #[test]
    fn test_aggro_crowd_stays_out_of_walls() {
        use crate::settings::Settings;

        let wait = TickInput {
            wait: true,
            ..Default::default()
        };
        for seed in 0..10 {
            let mut settings = Settings {
                map_side: 20,
                seed,
                ..Default::default()
            };
            settings.npc.aggro = true;
            settings.npc.health = 1_000_000;
            let mut state = WorldState::new(&settings);
            let crowd = state.npcs.len();

            for i in 0..600 {
                tick(&mut state, &wait, &settings.tuning);
                assert_clear_of_walls(&state, &format!("seed {seed} tick {i}"));
                for npc in &state.npcs {
                    assert!(
                        npc.vel.length() <= MAX_NPC_SPEED + 1e-5,
                        "seed {seed} tick {i}: {:?} moving at {}",
                        npc.id,
                        npc.vel.length()
                    );
                }
            }
            assert_eq!(state.npcs.len(), crowd);
        }
    }
}
