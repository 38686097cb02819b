//! Store fixture shared by the integration tests.

#![allow(dead_code)]

use citysim_core::{
    clock::CityTime,
    config::SimConfig,
    model::{NetworkKind, ZoneClass},
    store::CityStore,
    types::{CityId, EntityId, Tick, Tile},
};
use std::sync::Arc;

pub const CITY: &str = "test-city";

/// A migrated in-memory store holding one city and a wealthy landlord who
/// owns every building placed through the fixture.
pub struct Town {
    pub store:    CityStore,
    pub city:     CityId,
    pub config:   Arc<SimConfig>,
    pub landlord: EntityId,
}

impl Town {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default_test().unwrap())
    }

    pub fn with_config(config: SimConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = CityStore::in_memory().expect("in-memory store");
        store.migrate().expect("migration");
        let economy = config.economy.initial_economy();
        store
            .insert_city_with_id(CITY, "Testville", 32, 32, 100_000.0, &economy)
            .expect("insert city");
        let landlord = store
            .insert_agent(CITY, "Landlord", None, None, (0.0, 0.0), 1_000_000.0)
            .expect("insert landlord");
        Self { store, city: CITY.to_string(), config: Arc::new(config), landlord }
    }

    /// Place a building of `kind` at `origin` with the type's footprint.
    pub fn build(&self, origin: Tile, kind: &str, floors: u32, progress: f64) -> EntityId {
        place(&self.store, &self.config, CITY, origin, kind, floors, progress, Some(self.landlord))
    }

    /// A finished single-floor building.
    pub fn built(&self, origin: Tile, kind: &str) -> EntityId {
        self.build(origin, kind, 1, 100.0)
    }

    pub fn zoned_parcel(&self, tile: Tile, zone: ZoneClass) -> EntityId {
        self.store
            .insert_parcel(CITY, tile, "grass", Some(zone), Some(self.landlord))
            .expect("insert parcel")
    }

    pub fn road(&self, tile: Tile) -> EntityId {
        let parcel = self.store.insert_parcel(CITY, tile, "road", None, None).expect("road parcel");
        self.store.insert_road(CITY, parcel, "ew", 2, 50.0).expect("insert road")
    }

    /// Roads on every tile of the straight run from `from` to `to`.
    pub fn road_run(&self, from: Tile, to: Tile) {
        for tile in citysim_core::grid::line_tiles(from, to) {
            self.road(tile);
        }
    }

    pub fn power_line(&self, from: Tile, to: Tile) -> EntityId {
        self.store
            .insert_edge(NetworkKind::PowerLine, CITY, from, to, 100.0)
            .expect("insert power line")
    }

    pub fn water_pipe(&self, from: Tile, to: Tile) -> EntityId {
        self.store
            .insert_edge(NetworkKind::WaterPipe, CITY, from, to, 100.0)
            .expect("insert water pipe")
    }

    pub fn agent(&self, name: &str, wallet: f64) -> EntityId {
        self.store
            .insert_agent(CITY, name, None, None, (0.0, 0.0), wallet)
            .expect("insert agent")
    }

    pub fn time(&self, tick: Tick) -> CityTime {
        CityTime::from_tick(tick, self.config.sim.ticks_per_minute)
    }

    /// City time at the start of day `day` (0-based), 08:00.
    pub fn day(&self, day: u64) -> CityTime {
        self.time(day * self.config.ticks_per_day())
    }

    pub fn wallet(&self, agent: EntityId) -> f64 {
        self.store.wallet(CITY, agent).expect("wallet").expect("agent exists")
    }

    pub fn building_flags(&self, building: EntityId) -> (bool, bool, bool) {
        let b = self.store.building(CITY, building).expect("query").expect("building exists");
        (b.powered, b.has_water, b.has_waste)
    }
}

/// Parcel plus building of `kind` with the type's footprint and zone.
#[allow(clippy::too_many_arguments)]
pub fn place(
    store: &CityStore,
    config: &SimConfig,
    city_id: &str,
    origin: Tile,
    kind: &str,
    floors: u32,
    progress: f64,
    owner: Option<EntityId>,
) -> EntityId {
    let kind_config = config.building_type(kind);
    let (width, height) = kind_config.map(|k| (k.width, k.height)).unwrap_or((1, 1));
    let zone = kind_config.and_then(|k| k.zone);
    let parcel = store
        .insert_parcel(city_id, origin, "grass", zone, owner)
        .expect("insert parcel");
    store
        .insert_building(city_id, parcel, kind, width, height, floors, progress)
        .expect("insert building")
}
