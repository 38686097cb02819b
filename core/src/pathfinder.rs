//! Shortest-path providers for agents and vehicles.
//!
//! Both pathfinders cache the set of road tiles and rebuild it lazily after
//! `update_roads()`. A missing start, goal or route is reported as `None`.

use crate::{
    error::SimResult,
    grid::{chebyshev, in_bounds, neighbors4, neighbors8},
    store::CityStore,
    types::Tile,
};
use pathfinding::prelude::astar;
use std::collections::HashSet;

/// How far `nearest_road` looks before giving up.
pub const NEAREST_ROAD_RADIUS: i32 = 3;

pub fn tile_of((x, y): (f64, f64)) -> Tile {
    (x.round() as i32, y.round() as i32)
}

fn to_point((x, y): Tile) -> (f64, f64) {
    (x as f64, y as f64)
}

fn load_road_tiles(store: &CityStore, city_id: &str) -> SimResult<HashSet<Tile>> {
    Ok(store.roads(city_id)?.into_iter().map(|r| (r.x, r.y)).collect())
}

/// Move `pos` one tick along `path` at `speed` tiles per tick. Reaching the
/// next waypoint snaps onto it and pops it. Returns true when this step
/// consumed the last waypoint.
pub fn advance_along(pos: &mut (f64, f64), path: &mut Vec<(f64, f64)>, speed: f64) -> bool {
    let Some(&next) = path.first() else {
        return false;
    };
    let (dx, dy) = (next.0 - pos.0, next.1 - pos.1);
    let dist = (dx * dx + dy * dy).sqrt();
    if dist <= speed {
        *pos = next;
        path.remove(0);
        return path.is_empty();
    }
    let f = speed / dist;
    *pos = (pos.0 + dx * f, pos.1 + dy * f);
    false
}

/// Road-graph A* for vehicles.
#[derive(Debug, Default)]
pub struct RoadPathfinder {
    roads: Option<HashSet<Tile>>,
}

impl RoadPathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the cached road graph stale.
    pub fn update_roads(&mut self) {
        self.roads = None;
    }

    pub fn is_cached(&self) -> bool {
        self.roads.is_some()
    }

    fn roads(&mut self, store: &CityStore, city_id: &str) -> SimResult<&HashSet<Tile>> {
        if self.roads.is_none() {
            self.roads = Some(load_road_tiles(store, city_id)?);
        }
        Ok(self.roads.get_or_insert_with(HashSet::new))
    }

    /// Route from `from` to `to` along road tiles. The returned waypoints
    /// exclude the starting position and end at `to`.
    pub fn find_path(
        &mut self,
        store: &CityStore,
        city_id: &str,
        from: (f64, f64),
        to: (f64, f64),
    ) -> SimResult<Option<Vec<(f64, f64)>>> {
        let roads = self.roads(store, city_id)?;
        let (Some(start), Some(goal)) = (
            nearest_road(roads, tile_of(from)),
            nearest_road(roads, tile_of(to)),
        ) else {
            return Ok(None);
        };

        let route = astar(
            &start,
            |&t| {
                neighbors4(t)
                    .filter(|n| roads.contains(n))
                    .map(|n| (n, 1u32))
                    .collect::<Vec<_>>()
            },
            |&t| (t.0 - goal.0).unsigned_abs() + (t.1 - goal.1).unsigned_abs(),
            |&t| t == goal,
        );

        Ok(route.map(|(tiles, _cost)| {
            let mut path: Vec<(f64, f64)> = tiles.into_iter().map(to_point).collect();
            if path.first() == Some(&from) {
                path.remove(0);
            }
            if path.last() != Some(&to) {
                path.push(to);
            }
            path
        }))
    }
}

/// Closest road tile within `NEAREST_ROAD_RADIUS`, searching rings of
/// growing Manhattan distance. Ties go to the first tile in row order.
pub fn nearest_road(roads: &HashSet<Tile>, (x, y): Tile) -> Option<Tile> {
    if roads.contains(&(x, y)) {
        return Some((x, y));
    }
    for radius in 1..=NEAREST_ROAD_RADIUS {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() + dy.abs() != radius {
                    continue;
                }
                let candidate = (x + dx, y + dy);
                if roads.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Free-walk A* over the whole grid for pedestrians. Road tiles are cheaper
/// to cross than open ground, so agents prefer sidewalks when close.
#[derive(Debug)]
pub struct WalkPathfinder {
    width:  u32,
    height: u32,
    roads:  Option<HashSet<Tile>>,
}

const ROAD_STEP_COST: u32 = 2;
const GROUND_STEP_COST: u32 = 3;

impl WalkPathfinder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, roads: None }
    }

    pub fn update_roads(&mut self) {
        self.roads = None;
    }

    pub fn is_cached(&self) -> bool {
        self.roads.is_some()
    }

    pub fn find_path(
        &mut self,
        store: &CityStore,
        city_id: &str,
        from: (f64, f64),
        to: (f64, f64),
    ) -> SimResult<Option<Vec<(f64, f64)>>> {
        if self.roads.is_none() {
            self.roads = Some(load_road_tiles(store, city_id)?);
        }
        let roads = self.roads.get_or_insert_with(HashSet::new);
        let (start, goal) = (tile_of(from), tile_of(to));
        let (width, height) = (self.width, self.height);
        if !in_bounds(start, width, height) || !in_bounds(goal, width, height) {
            return Ok(None);
        }

        let route = astar(
            &start,
            |&t| {
                neighbors8(t)
                    .filter(|&n| in_bounds(n, width, height))
                    .map(|n| {
                        let cost = if roads.contains(&n) { ROAD_STEP_COST } else { GROUND_STEP_COST };
                        (n, cost)
                    })
                    .collect::<Vec<_>>()
            },
            |&t| chebyshev(t, goal) * ROAD_STEP_COST,
            |&t| t == goal,
        );

        Ok(route.map(|(tiles, _cost)| {
            let mut path: Vec<(f64, f64)> = tiles.into_iter().skip(1).map(to_point).collect();
            match path.last_mut() {
                Some(last) => *last = to,
                None if from != to => path.push(to),
                None => {}
            }
            path
        }))
    }
}
