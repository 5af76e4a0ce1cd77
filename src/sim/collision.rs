//! Collision resolution for circular bodies
//!
//! Two resolvers run every tick:
//! - body vs static tiles: corrects velocity/position so no body sinks into a wall
//! - body vs body: player contact deals damage, NPC overlaps push apart
//!
//! Both work on the prospective position `pos + vel`. Tile resolution writes
//! the body back so that the final `pos += vel` lands on the corrected spot.

use glam::{IVec2, Vec2};

use super::map::{TileMap, nearest_cell};
use super::spatial::SpatialIndex;
use super::state::{Body, BodyId};

/// Half the side of a tile
const HALF_TILE: f32 = 0.5;

/// Share of a pair's penetration each NPC moves away on its own.
/// Both members of the pair get this, so one pass removes the overlap.
pub const SEPARATION_SHARE: f32 = 0.5;

/// Longest move the tile resolver checks in a single step, in cells.
/// Below half a cell the current cell's eight neighbours cover every wall
/// the landing circle can reach.
pub const MAX_TILE_STEP: f32 = 0.45;

/// Upper bound on tile sub-steps per body per tick
const MAX_TILE_SUBSTEPS: usize = 16;

/// NPC speed cap after repulsion, in cells per tick
pub const MAX_NPC_SPEED: f32 = MAX_TILE_STEP;

const DIAGONALS: [IVec2; 4] = [
    IVec2::new(-1, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 1),
    IVec2::new(1, 1),
];

/// What the tile resolver did to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileContact {
    /// No wall in reach, body untouched
    #[default]
    None,
    /// Blocked by an edge-adjacent wall (one or both axes)
    Axis,
    /// Pushed off a diagonal wall corner
    Corner,
}

impl TileContact {
    #[inline]
    pub fn hit(self) -> bool {
        self != TileContact::None
    }
}

/// Overlap between a circle and the tile square centred on `tile`.
///
/// Returns the push direction (away from the tile) and depth, or `None` when
/// the circle is at least `radius` away. The test is strict: exact touching
/// is not an overlap.
pub fn circle_tile_overlap(center: Vec2, radius: f32, tile: Vec2) -> Option<(Vec2, f32)> {
    let half = Vec2::splat(HALF_TILE);
    let closest = center.clamp(tile - half, tile + half);
    let offset = center - closest;
    let dist = offset.length();

    if dist > 0.0 {
        if dist >= radius {
            return None;
        }
        return Some((offset / dist, radius - dist));
    }

    // Centre inside the square: leave through the nearest face
    let local = center - tile;
    let exit = half - local.abs();
    if exit.x <= exit.y {
        let normal = Vec2::new(if local.x < 0.0 { -1.0 } else { 1.0 }, 0.0);
        Some((normal, exit.x + radius))
    } else {
        let normal = Vec2::new(0.0, if local.y < 0.0 { -1.0 } else { 1.0 });
        Some((normal, exit.y + radius))
    }
}

/// Keep one body out of solid tiles.
///
/// Neighbours are taken around the body's current cell; the prospective
/// position is tested against them.
///
/// 1. Edge neighbours, vertical then horizontal. Touching counts (`<=`): the
///    body is snapped so its edge sits on the boundary and velocity into the
///    wall is dropped.
/// 2. Only if no edge neighbour fired: the four diagonal neighbours, strict
///    overlap, first hit only. The body is pushed out along the contact
///    normal by the penetration depth.
///
/// Moves longer than [`MAX_TILE_STEP`] are split into equal sub-steps, each
/// resolved from the cell it starts in.
pub fn resolve_tiles(body: &mut Body, map: &TileMap) -> TileContact {
    let steps = ((body.vel.length() / MAX_TILE_STEP).ceil() as usize).clamp(1, MAX_TILE_SUBSTEPS);
    let mut pos = body.pos;
    let mut vel = body.vel / steps as f32;
    let mut contact = TileContact::None;

    for _ in 0..steps {
        let (target, corrected, step_contact) = resolve_step(pos, vel, body.radius, map);
        if !contact.hit() {
            contact = step_contact;
        }
        pos = target;
        vel = corrected;
    }

    if contact.hit() {
        body.vel = vel * steps as f32;
        body.pos = pos - body.vel;
        if steps > 1 {
            log::trace!("body {:?} resolved in {} sub-steps", body.id, steps);
        }
    }
    contact
}

/// One resolver step from `pos` moving by `vel`.
///
/// Returns the corrected landing point and velocity.
fn resolve_step(pos: Vec2, vel: Vec2, r: f32, map: &TileMap) -> (Vec2, Vec2, TileContact) {
    let cell = nearest_cell(pos);
    let mut target = pos + vel;
    let mut vel = vel;
    let mut any = false;

    if map.is_solid(cell - IVec2::Y) {
        let boundary = cell.y as f32 - HALF_TILE;
        if target.y - r <= boundary {
            target.y = boundary + r;
            vel.y = vel.y.max(0.0);
            any = true;
        }
    }
    if map.is_solid(cell + IVec2::Y) {
        let boundary = cell.y as f32 + HALF_TILE;
        if target.y + r >= boundary {
            target.y = boundary - r;
            vel.y = vel.y.min(0.0);
            any = true;
        }
    }
    if map.is_solid(cell - IVec2::X) {
        let boundary = cell.x as f32 - HALF_TILE;
        if target.x - r <= boundary {
            target.x = boundary + r;
            vel.x = vel.x.max(0.0);
            any = true;
        }
    }
    if map.is_solid(cell + IVec2::X) {
        let boundary = cell.x as f32 + HALF_TILE;
        if target.x + r >= boundary {
            target.x = boundary - r;
            vel.x = vel.x.min(0.0);
            any = true;
        }
    }

    if any {
        return (target, vel, TileContact::Axis);
    }

    for offset in DIAGONALS {
        let diagonal = cell + offset;
        if !map.is_solid(diagonal) {
            continue;
        }
        if let Some((normal, depth)) = circle_tile_overlap(target, r, diagonal.as_vec2()) {
            target += normal * depth;
            let into = vel.dot(normal);
            if into < 0.0 {
                vel -= normal * into;
            }
            log::trace!("pushed off corner of {:?} by {:.3}", diagonal, depth);
            return (target, vel, TileContact::Corner);
        }
    }

    (target, vel, TileContact::None)
}

/// A player strike on an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub attacker: BodyId,
    pub target: BodyId,
    pub damage: i32,
    /// Target health after the strike
    pub remaining: i32,
}

/// One overlapping neighbour found by [`contacts`]
#[derive(Debug, Clone, Copy)]
struct Contact {
    /// Index into the NPC slice
    index: usize,
    /// From neighbour centre to subject centre
    offset: Vec2,
    penetration: f32,
}

/// Vicinity bound guaranteeing no overlapping neighbour is missed: both
/// radii plus the worst-case distance from a centre to its nearest cell.
#[inline]
pub fn vicinity_radius(radius: f32, index: &SpatialIndex) -> f32 {
    radius + index.max_radius() + std::f32::consts::FRAC_1_SQRT_2
}

/// Neighbours whose prospective circle overlaps `subject` centred at `centre`
fn contacts(
    subject: &Body,
    centre: Vec2,
    npcs: &[Body],
    prospective: &[Vec2],
    index: &SpatialIndex,
) -> Vec<Contact> {
    index
        .query(subject.pos, vicinity_radius(subject.radius, index))
        .into_iter()
        .filter(|&j| npcs[j].id != subject.id)
        .filter_map(|j| {
            let offset = centre - prospective[j];
            let penetration = subject.radius + npcs[j].radius - offset.length();
            (penetration > 0.0).then_some(Contact {
                index: j,
                offset,
                penetration,
            })
        })
        .collect()
}

/// Separation direction for a pair; coincident centres split along x by id
fn separation_axis(subject: BodyId, other: BodyId, offset: Vec2) -> Vec2 {
    let dir = offset.normalize_or_zero();
    if dir != Vec2::ZERO {
        dir
    } else if subject < other {
        Vec2::NEG_X
    } else {
        Vec2::X
    }
}

/// Run the body-vs-body phase: the player first, then every NPC.
///
/// Prospective centres are captured before anything is processed, and NPC
/// repulsion is summed per body and applied once at the end, so the result
/// does not depend on NPC order. NPC speed is then capped at
/// [`MAX_NPC_SPEED`]. `index` must have been rebuilt from `npcs`
/// this tick.
pub fn resolve_actors(player: &Body, npcs: &mut [Body], index: &SpatialIndex) -> Vec<Hit> {
    let prospective: Vec<Vec2> = npcs.iter().map(Body::prospective).collect();

    let mut hits = Vec::new();
    for contact in contacts(player, player.prospective(), npcs, &prospective, index) {
        let target = &mut npcs[contact.index];
        target.health.current -= player.damage;
        if !target.aggro {
            target.aggro = true;
            log::debug!("NPC {:?} provoked", target.id);
        }
        hits.push(Hit {
            attacker: player.id,
            target: target.id,
            damage: player.damage,
            remaining: target.health.current,
        });
    }

    let snapshot: &[Body] = npcs;
    let impulses: Vec<Vec2> = snapshot
        .iter()
        .enumerate()
        .map(|(i, npc)| {
            contacts(npc, prospective[i], snapshot, &prospective, index)
                .into_iter()
                .fold(Vec2::ZERO, |push, c| {
                    let axis = separation_axis(npc.id, snapshot[c.index].id, c.offset);
                    push + axis * c.penetration * SEPARATION_SHARE
                })
        })
        .collect();

    for (npc, impulse) in npcs.iter_mut().zip(impulses) {
        npc.vel = (npc.vel + impulse).clamp_length_max(MAX_NPC_SPEED);
    }

    hits
}
