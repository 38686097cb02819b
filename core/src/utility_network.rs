//! Graph-reachability propagation shared by the power and water simulators.
//!
//! Lines and pipes are rasterised into tiles and joined into an undirected
//! tile graph. Service starts at every tile of a completed source building,
//! jumps 8-directionally into the graph, follows graph edges, and then
//! chains through any consumer building 8-adjacent to a supplied tile.
//! When reached demand exceeds total source capacity every non-source
//! consumer loses service for the cycle.

use crate::{
    config::{BuildingTypeConfig, SimConfig},
    error::SimResult,
    event::{BuildingStatus, CityEvent},
    grid::{line_tiles, neighbors8},
    model::{BuildingRecord, NetworkEdge, NetworkKind},
    store::{CityStore, ServiceFlag},
    types::{CityId, EntityId, Tile},
};
use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::Arc,
};

/// Which resource a network carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utility {
    Power,
    Water,
}

impl Utility {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Water => "water",
        }
    }

    pub fn network(&self) -> NetworkKind {
        match self {
            Self::Power => NetworkKind::PowerLine,
            Self::Water => NetworkKind::WaterPipe,
        }
    }

    pub fn flag(&self) -> ServiceFlag {
        match self {
            Self::Power => ServiceFlag::Power,
            Self::Water => ServiceFlag::Water,
        }
    }

    fn capacity(&self, kind: &BuildingTypeConfig) -> f64 {
        match self {
            Self::Power => kind.power_capacity,
            Self::Water => kind.water_capacity,
        }
    }

    /// Requirement scaled by floors.
    fn demand(&self, kind: &BuildingTypeConfig, floors: u32) -> f64 {
        let per_floor = match self {
            Self::Power => kind.power_required,
            Self::Water => kind.water_required,
        };
        per_floor * floors.max(1) as f64
    }

    fn current(&self, building: &BuildingRecord) -> bool {
        match self {
            Self::Power => building.powered,
            Self::Water => building.has_water,
        }
    }
}

/// Undirected adjacency over rasterised line tiles.
#[derive(Debug, Default)]
pub struct TileGraph {
    adjacency: HashMap<Tile, HashSet<Tile>>,
}

impl TileGraph {
    pub fn from_edges(edges: &[NetworkEdge]) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            let tiles = line_tiles(edge.from, edge.to);
            for tile in &tiles {
                graph.adjacency.entry(*tile).or_default();
            }
            for pair in tiles.windows(2) {
                graph.link(pair[0], pair[1]);
            }
        }
        graph
    }

    fn link(&mut self, a: Tile, b: Tile) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.adjacency.contains_key(&tile)
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    fn neighbors(&self, tile: Tile) -> impl Iterator<Item = Tile> + '_ {
        self.adjacency.get(&tile).into_iter().flatten().copied()
    }
}

/// Result of one propagation pass before rationing.
#[derive(Debug, Default)]
pub struct Reach {
    /// Graph tiles carrying service.
    pub line_tiles: HashSet<Tile>,
    /// Consumers 8-adjacent to service, in discovery order.
    pub consumers: Vec<EntityId>,
    pub demand: f64,
    pub capacity: f64,
}

/// Flood `graph` from the footprint tiles in `frontier`: each footprint tile
/// jumps into 8-adjacent graph tiles, which then follow their edges.
fn flood(graph: &TileGraph, frontier: &[Tile], reached: &mut HashSet<Tile>) {
    let mut queue: VecDeque<Tile> = VecDeque::new();
    for &tile in frontier {
        for entry in std::iter::once(tile).chain(neighbors8(tile)) {
            if graph.contains(entry) && reached.insert(entry) {
                queue.push_back(entry);
            }
        }
    }
    while let Some(tile) = queue.pop_front() {
        for next in graph.neighbors(tile) {
            if reached.insert(next) {
                queue.push_back(next);
            }
        }
    }
}

pub struct UtilityNetwork {
    pub utility: Utility,
    city_id:     CityId,
    config:      Arc<SimConfig>,
    /// Per-edge load from the last simulate(), written by apply().
    edge_load:   Vec<(EntityId, f64)>,
}

impl UtilityNetwork {
    pub fn new(utility: Utility, city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { utility, city_id, config, edge_load: Vec::new() }
    }

    /// Reachability without rationing.
    pub fn reach(&self, buildings: &[BuildingRecord], edges: &[NetworkEdge]) -> Reach {
        let graph = TileGraph::from_edges(edges);
        let mut reach = Reach::default();
        let mut area: HashSet<Tile> = HashSet::new();
        let mut frontier: Vec<Tile> = Vec::new();
        let mut pending: Vec<(&BuildingRecord, f64)> = Vec::new();

        for building in buildings {
            let Some(kind) = self.config.building_type(&building.building_type) else {
                continue;
            };
            if !building.is_complete() {
                continue;
            }
            let capacity = self.utility.capacity(kind);
            if capacity > 0.0 {
                reach.capacity += capacity;
                for tile in building.footprint().tiles() {
                    area.insert(tile);
                    frontier.push(tile);
                }
            } else if !kind.utility_exempt {
                pending.push((building, self.utility.demand(kind, building.floors)));
            }
        }

        // Worklist fixed point, bounded by the number of buildings.
        for _ in 0..=buildings.len() {
            flood(&graph, &frontier, &mut reach.line_tiles);
            frontier.clear();

            let supplied = |t: &Tile| area.contains(t) || reach.line_tiles.contains(t);
            let (serviced, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(|(b, _)| {
                let fp = b.footprint();
                let hit = fp.tiles().chain(fp.ring()).any(|t| supplied(&t));
                hit
            });
            pending = rest;
            if serviced.is_empty() {
                break;
            }
            for (building, demand) in serviced {
                reach.consumers.push(building.building_id);
                reach.demand += demand;
                for tile in building.footprint().tiles() {
                    if area.insert(tile) {
                        frontier.push(tile);
                    }
                }
            }
        }
        reach
    }

    /// Compute the service flag for every building in the city.
    pub fn simulate(&mut self, store: &CityStore) -> SimResult<BTreeMap<EntityId, bool>> {
        let buildings = store.buildings(&self.city_id)?;
        let edges = store.edges(self.utility.network(), &self.city_id)?;
        let reach = self.reach(&buildings, &edges);
        let rationed = reach.demand > reach.capacity;
        let reached: HashSet<EntityId> = reach.consumers.iter().copied().collect();

        let mut result = BTreeMap::new();
        for building in &buildings {
            let serviced = match self.config.building_type(&building.building_type) {
                None => {
                    log::warn!(
                        "city={} {}: unknown building type {} on building {}",
                        self.city_id, self.utility.label(), building.building_type, building.building_id
                    );
                    false
                }
                Some(kind) if kind.utility_exempt => true,
                // An unfinished source supplies nothing, itself included.
                Some(_) if !building.is_complete() => false,
                Some(kind) if self.utility.capacity(kind) > 0.0 => true,
                Some(_) => !rationed && reached.contains(&building.building_id),
            };
            result.insert(building.building_id, serviced);
        }

        let served = if rationed { 0.0 } else { reach.demand };
        self.edge_load = edges
            .iter()
            .map(|edge| {
                let live = line_tiles(edge.from, edge.to)
                    .iter()
                    .any(|t| reach.line_tiles.contains(t));
                let load = if live { served.min(edge.capacity) } else { 0.0 };
                (edge.edge_id, load)
            })
            .collect();

        if rationed {
            log::debug!(
                "city={} {}: demand {:.1} exceeds capacity {:.1}, rationing all consumers",
                self.city_id, self.utility.label(), reach.demand, reach.capacity
            );
        }
        Ok(result)
    }

    /// Persist flags that changed and the per-edge load. Emits one
    /// `buildings_updated` event listing the changed buildings.
    pub fn apply(&mut self, store: &CityStore, status: &BTreeMap<EntityId, bool>) -> SimResult<Vec<CityEvent>> {
        let flag = self.utility.flag();
        let mut changed = Vec::new();
        for building in store.buildings(&self.city_id)? {
            let Some(&serviced) = status.get(&building.building_id) else {
                continue;
            };
            if self.utility.current(&building) == serviced {
                continue;
            }
            store.set_service_flag(&self.city_id, building.building_id, flag, serviced)?;
            let mut entry = BuildingStatus {
                building_id: building.building_id,
                powered: building.powered,
                has_water: building.has_water,
                has_waste: building.has_waste,
            };
            match self.utility {
                Utility::Power => entry.powered = serviced,
                Utility::Water => entry.has_water = serviced,
            }
            changed.push(entry);
        }
        for (edge_id, load) in self.edge_load.drain(..) {
            store.set_edge_load(self.utility.network(), &self.city_id, edge_id, load)?;
        }

        if changed.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![CityEvent::BuildingsUpdated {
            utility: self.utility.label().to_string(),
            buildings: changed,
        }])
    }
}
