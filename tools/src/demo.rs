//! A small hand-laid town used by `--demo`.
//!
//! Layout (x to the right, y down):
//!   - an east-west road along y = 5
//!   - a power plant at (2,2) and a water tower at (1,6)
//!   - a row of houses at y = 6 and shops at y = 4
//!   - a garbage depot on the road at (12,4) and a park at (9,4)
//!   - power lines and water pipes along x = 4 and y = 7
//!   - zoned empty parcels at x >= 14 for the auto-builder

use anyhow::{Context, Result};
use citysim_core::{
    engine::SimEngine,
    model::{NetworkKind, ZoneClass},
    types::{CityId, EntityId, Tile},
};

const WIDTH: u32 = 24;
const HEIGHT: u32 = 12;
const TREASURY: f64 = 250_000.0;
const ROAD_Y: i32 = 5;
/// Every demo building finishes on the first construction pass, so the
/// usual completion events (residents, rental units) fire.
const NEARLY_BUILT: f64 = 99.0;

pub fn seed_city(engine: &SimEngine, name: &str) -> Result<CityId> {
    let city_id = engine.found_city(name, WIDTH, HEIGHT, TREASURY)?;
    let store = &engine.store;
    let landlord = store.insert_agent(&city_id, "Landlord", None, None, (0.0, 0.0), 50_000.0)?;

    for x in 0..WIDTH as i32 {
        let parcel = store.insert_parcel(&city_id, (x, ROAD_Y), "road", None, None)?;
        store.insert_road(&city_id, parcel, "ew", 2, 50.0)?;
    }

    let place = |tile: Tile, kind: &str, zone: Option<ZoneClass>| -> Result<EntityId> {
        let config = engine
            .config()
            .building_type(kind)
            .with_context(|| format!("demo needs building type {kind}"))?;
        let parcel = store.insert_parcel(&city_id, tile, "grass", zone, Some(landlord))?;
        Ok(store.insert_building(&city_id, parcel, kind, config.width, config.height, 1, NEARLY_BUILT)?)
    };

    place((2, 2), "power_plant", None)?;
    place((1, 6), "water_tower", None)?;
    place((12, 4), "garbage_depot", None)?;
    place((9, 4), "park", None)?;
    let mut homes = Vec::new();
    for x in 5..11 {
        homes.push(place((x, 6), "house", Some(ZoneClass::Residential))?);
    }
    let mut shops = Vec::new();
    for x in 5..8 {
        shops.push(place((x, 4), "shop", Some(ZoneClass::Commercial))?);
    }

    for (from, to) in [((4, 3), (4, 7)), ((0, 7), (4, 7)), ((4, 7), (12, 7))] {
        store.insert_edge(NetworkKind::PowerLine, &city_id, from, to, 100.0)?;
    }
    for (from, to) in [((2, 7), (12, 7)), ((4, 4), (4, 7))] {
        store.insert_edge(NetworkKind::WaterPipe, &city_id, from, to, 80.0)?;
    }

    for x in 14..20 {
        store.insert_parcel(&city_id, (x, 6), "grass", Some(ZoneClass::Residential), Some(landlord))?;
        store.insert_parcel(&city_id, (x, 4), "grass", Some(ZoneClass::Commercial), Some(landlord))?;
    }

    // Commuters: one per house, working at the shops in turn. Every other one drives.
    for (i, &home) in homes.iter().enumerate() {
        let work = shops[i % shops.len()];
        let x = 5.0 + i as f64 + 0.5;
        let commuter =
            store.insert_agent(&city_id, &format!("Commuter {}", i + 1), Some(home), Some(work), (x, 6.5), 1_500.0)?;
        if i % 2 == 0 {
            store.insert_vehicle(&city_id, Some(commuter), "car", (x, 5.0), 1.0)?;
        }
    }

    log::info!("city={city_id} demo town seeded ({} homes, {} shops)", homes.len(), shops.len());
    Ok(city_id)
}
