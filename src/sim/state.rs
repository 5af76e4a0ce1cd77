//! World state and body types
//!
//! Everything the tick reads or writes lives in [`WorldState`]; there is no
//! ambient simulation state.

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::map::TileMap;
use super::spatial::SpatialIndex;
use crate::settings::Settings;

/// Stable body identity. The player is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    pub const PLAYER: BodyId = BodyId(0);

    #[inline]
    pub fn is_player(self) -> bool {
        self == Self::PLAYER
    }
}

/// Current and maximum hit points
///
/// `current` may dip below zero inside a tick; cleanup happens at tick end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }
}

/// Numeric spawn definition supplied by the settings/catalog layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyTemplate {
    pub radius: f32,
    pub health: i32,
    pub damage: i32,
    pub aggro: bool,
}

impl Default for BodyTemplate {
    fn default() -> Self {
        Self {
            radius: 0.4,
            health: 10,
            damage: 1,
            aggro: false,
        }
    }
}

/// A circular collidable body (player or NPC)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    /// Centre in grid space
    pub pos: Vec2,
    /// Per-tick displacement, persists across ticks
    pub vel: Vec2,
    pub radius: f32,
    pub health: Health,
    /// Damage dealt to an NPC on contact. Only the player's value is
    /// applied; NPCs carry theirs but never strike.
    pub damage: i32,
    /// Actively pursuing the player (NPCs only)
    pub aggro: bool,
}

impl Body {
    pub fn from_template(id: BodyId, pos: Vec2, template: &BodyTemplate) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: template.radius,
            health: Health::full(template.health),
            damage: template.damage,
            aggro: template.aggro && !id.is_player(),
        }
    }

    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.health.current <= 0
    }

    /// Where the body ends up if its velocity is applied unchanged
    #[inline]
    pub fn prospective(&self) -> Vec2 {
        self.pos + self.vel
    }
}

/// Read-only snapshot of a body for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub id: BodyId,
    pub pos: Vec2,
    pub radius: f32,
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id,
            pos: body.pos,
            radius: body.radius,
        }
    }
}

/// Complete simulation state, owned by the caller and advanced by `tick`
#[derive(Debug, Clone)]
pub struct WorldState {
    /// Seed the map was generated from
    pub seed: u64,
    pub map: TileMap,
    pub player: Body,
    /// NPCs in spawn order
    pub npcs: Vec<Body>,
    /// Smoothed 0..1 scalar applied to all intended velocities
    pub time_dilation: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Cell -> NPC lookup, rebuilt each tick
    pub index: SpatialIndex,
    next_id: u32,
}

impl WorldState {
    /// Generate a world from settings: seeded map, player, and NPCs on the
    /// spawn cells the generator picked.
    pub fn new(settings: &Settings) -> Self {
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let (map, spawns) = TileMap::generate(settings.map_side, &settings.map, &mut rng);

        let start = Self::player_start(&map, &spawns);
        let player = Body::from_template(BodyId::PLAYER, start.as_vec2(), &settings.player);

        let mut state = Self::with_map(map, player);
        state.seed = settings.seed;
        for cell in spawns.into_iter().filter(|&c| c != start) {
            state.spawn_npc(&settings.npc, cell.as_vec2());
        }
        log::info!(
            "World ready: seed={}, player at {:?}, {} NPCs",
            state.seed,
            start,
            state.npcs.len()
        );
        state
    }

    /// World on an existing map with no NPCs
    pub fn with_map(map: TileMap, player: Body) -> Self {
        let index = SpatialIndex::new(map.side());
        Self {
            seed: 0,
            map,
            player,
            npcs: Vec::new(),
            time_dilation: 0.0,
            time_ticks: 0,
            index,
            next_id: 1,
        }
    }

    /// First floor cell scanning row-major from (1, 1), preferring one with
    /// no NPC spawn. Falls back to the map centre on an all-wall map.
    fn player_start(map: &TileMap, spawns: &[IVec2]) -> IVec2 {
        let floor = || map.tiles().filter(|t| !t.solid).map(|t| t.coord);
        floor()
            .find(|c| !spawns.contains(c))
            .or_else(|| floor().next())
            .unwrap_or(IVec2::splat(map.side() / 2))
    }

    /// Allocate the next NPC id
    pub fn next_body_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an NPC at `pos`
    pub fn spawn_npc(&mut self, template: &BodyTemplate, pos: Vec2) -> BodyId {
        let id = self.next_body_id();
        self.npcs.push(Body::from_template(id, pos, template));
        id
    }

    pub fn npc(&self, id: BodyId) -> Option<&Body> {
        self.npcs.iter().find(|n| n.id == id)
    }

    /// Player followed by every remaining NPC
    pub fn bodies(&self) -> impl Iterator<Item = BodyView> + '_ {
        std::iter::once(BodyView::from(&self.player)).chain(self.npcs.iter().map(BodyView::from))
    }
}
