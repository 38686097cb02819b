//! Vehicle movement and road traffic load.
//!
//! Vehicles route along the road graph. Their speed is scaled by the
//! vehicle type's multiplier and by the speed limit of the road under
//! them. After moving, every road's traffic load is recomputed as
//! `min(vehicles_on_tile / lanes, 1)`.
//!
//! Execution: every tick.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    model::{RoadRecord, VehicleRecord},
    pathfinder::{advance_along, tile_of, RoadPathfinder},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, Tile},
};
use std::{any::Any, collections::HashMap, sync::Arc};

pub struct VehicleSubsystem {
    city_id:    CityId,
    config:     Arc<SimConfig>,
    pathfinder: RoadPathfinder,
}

impl VehicleSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>) -> Self {
        Self { city_id, config, pathfinder: RoadPathfinder::new() }
    }

    pub fn pathfinder(&self) -> &RoadPathfinder {
        &self.pathfinder
    }

    fn effective_speed(&self, vehicle: &VehicleRecord, roads: &HashMap<Tile, RoadRecord>) -> f64 {
        let traffic = &self.config.sim.traffic;
        let limit_factor = roads
            .get(&tile_of((vehicle.x, vehicle.y)))
            .map(|r| r.speed_limit / traffic.reference_speed_limit)
            .unwrap_or(1.0);
        vehicle.speed * traffic.multiplier(&vehicle.vehicle_type) * limit_factor
    }

    /// Route vehicles that have a destination but no path yet.
    fn route(&mut self, store: &CityStore, vehicle: &mut VehicleRecord) -> SimResult<bool> {
        let Some(destination) = vehicle.destination else {
            return Ok(false);
        };
        match self.pathfinder.find_path(store, &self.city_id, (vehicle.x, vehicle.y), destination)? {
            Some(path) if !path.is_empty() => vehicle.path = path,
            _ => vehicle.destination = None,
        }
        Ok(true)
    }

    fn update_traffic(&self, store: &CityStore, roads: &HashMap<Tile, RoadRecord>, vehicles: &[VehicleRecord]) -> SimResult<()> {
        let mut counts: HashMap<Tile, usize> = HashMap::new();
        for vehicle in vehicles {
            *counts.entry(tile_of((vehicle.x, vehicle.y))).or_insert(0) += 1;
        }
        for (tile, road) in roads {
            let count = counts.get(tile).copied().unwrap_or(0);
            let load = (count as f64 / road.lanes.max(1) as f64).min(1.0);
            if (load - road.traffic_load).abs() > f64::EPSILON {
                store.set_traffic_load(&self.city_id, road.road_id, load)?;
            }
        }
        Ok(())
    }
}

impl CitySubsystem for VehicleSubsystem {
    fn name(&self) -> &'static str {
        "vehicles"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let roads: HashMap<Tile, RoadRecord> = store
            .roads(&self.city_id)?
            .into_iter()
            .map(|r| ((r.x, r.y), r))
            .collect();
        let mut vehicles = store.vehicles(&self.city_id)?;

        let mut moving = 0;
        for vehicle in &mut vehicles {
            let changed = if vehicle.path.is_empty() {
                self.route(store, vehicle)?
            } else {
                let speed = self.effective_speed(vehicle, &roads);
                let mut pos = (vehicle.x, vehicle.y);
                if advance_along(&mut pos, &mut vehicle.path, speed) {
                    vehicle.destination = None;
                }
                (vehicle.x, vehicle.y) = pos;
                moving += 1;
                true
            };
            if changed {
                store.update_vehicle_motion(&self.city_id, vehicle)?;
            }
        }
        self.update_traffic(store, &roads, &vehicles)?;

        if moving > 0 {
            log::debug!("tick={} vehicles: {moving} moving", time.tick);
        }
        Ok(vec![])
    }

    fn roads_changed(&mut self) {
        self.pathfinder.update_roads();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
