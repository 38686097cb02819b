//! Construction, land value, crime, fire, zone growth, demand and
//! auto-build.

mod common;

use citysim_core::{
    config::SimConfig,
    construction_subsystem::ConstructionSubsystem,
    crime_subsystem::CrimeSubsystem,
    demand_subsystem::DemandSubsystem,
    event::CityEvent,
    fire_subsystem::FireSubsystem,
    land_value_subsystem::{LandValueSubsystem, MAX_LAND_VALUE},
    model::{ZoneClass, ZoneDemand},
    rng::SubsystemRng,
    store::ServiceFlag,
    subsystem::CitySubsystem,
    types::EntityId,
    zone_build_subsystem::ZoneBuildSubsystem,
    zone_evolution_subsystem::ZoneEvolutionSubsystem,
};
use common::{place, Town, CITY};

fn serve(town: &Town, building: EntityId) {
    town.store.set_service_flag(CITY, building, ServiceFlag::Power, true).unwrap();
    town.store.set_service_flag(CITY, building, ServiceFlag::Water, true).unwrap();
}

fn parcel_of(town: &Town, building: EntityId) -> EntityId {
    town.store.building(CITY, building).unwrap().unwrap().parcel_id
}

fn land_value(town: &Town, building: EntityId) -> f64 {
    let parcel = parcel_of(town, building);
    town.store
        .parcels(CITY)
        .unwrap()
        .into_iter()
        .find(|p| p.parcel_id == parcel)
        .unwrap()
        .land_value
}

fn run(sim: &mut dyn CitySubsystem, town: &Town, tick: u64) -> Vec<CityEvent> {
    sim.update(&town.time(tick), &town.store, &[], &mut SubsystemRng::new(tick)).unwrap()
}

// ── Construction ───────────────────────────────────────────────────

#[test]
fn construction_advances_by_the_hourly_build_rate() {
    let town = Town::new();
    let house = town.build((2, 2), "house", 1, 80.0);
    let mut sim = ConstructionSubsystem::new(town.city.clone(), town.config.clone());

    assert!(run(&mut sim, &town, 0).is_empty());
    assert_eq!(town.store.building(CITY, house).unwrap().unwrap().progress, 90.0);

    let events = run(&mut sim, &town, 60);
    assert_eq!(
        events,
        vec![CityEvent::BuildingCompleted { building_id: house, building_type: "house".into() }]
    );
    let units = town.store.units_for_building(CITY, house).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].rent, 300.0);
    assert_eq!(units[0].tenant_id, None);
}

#[test]
fn completion_creates_rental_units_on_every_floor() {
    let town = Town::new();
    let block = town.build((2, 2), "apartment", 2, 98.0);
    let mut sim = ConstructionSubsystem::new(town.city.clone(), town.config.clone());

    run(&mut sim, &town, 0);

    let mut units = town.store.units_for_building(CITY, block).unwrap();
    units.sort_by_key(|u| u.unit_number);
    assert_eq!(units.len(), 8);
    let floors: Vec<u32> = units.iter().map(|u| u.floor).collect();
    assert_eq!(floors, vec![1, 1, 1, 1, 2, 2, 2, 2]);
    assert_eq!(units.last().map(|u| u.unit_number), Some(8));
}

#[test]
fn finished_and_unknown_buildings_are_left_alone() {
    let town = Town::new();
    town.built((2, 2), "house");
    let odd = town.build((6, 6), "spaceport", 1, 50.0);
    let mut sim = ConstructionSubsystem::new(town.city.clone(), town.config.clone());

    assert!(run(&mut sim, &town, 0).is_empty());
    assert_eq!(town.store.building(CITY, odd).unwrap().unwrap().progress, 50.0);
}

// ── Land value ─────────────────────────────────────────────────────

#[test]
fn appraisal_adds_service_and_park_bonuses() {
    let town = Town::new();
    let sim = LandValueSubsystem::new(town.city.clone(), town.config.clone());
    let cfg = &town.config.sim.land_value;
    let house = town.built((3, 3), "house");
    let parcel = |id| town.store.parcels(CITY).unwrap().into_iter().find(|p| p.parcel_id == id).unwrap();

    let record = town.store.building(CITY, house).unwrap().unwrap();
    let buildings = town.store.buildings(CITY).unwrap();
    assert_eq!(sim.appraise(&parcel(record.parcel_id), &buildings, Some(&record)), cfg.base);

    serve(&town, house);
    town.built((0, 0), "park");
    let record = town.store.building(CITY, house).unwrap().unwrap();
    let buildings = town.store.buildings(CITY).unwrap();
    assert_eq!(
        sim.appraise(&parcel(record.parcel_id), &buildings, Some(&record)),
        cfg.base + cfg.utility_bonus + cfg.park_bonus
    );
}

#[test]
fn appraisal_subtracts_industry_and_crime() {
    let town = Town::new();
    let sim = LandValueSubsystem::new(town.city.clone(), town.config.clone());
    let cfg = &town.config.sim.land_value;
    town.built((10, 10), "factory");
    let next_door = town.built((12, 10), "house");
    let far_away = town.built((20, 20), "house");
    town.store.set_crime_level(CITY, far_away, 20.0).unwrap();
    let buildings = town.store.buildings(CITY).unwrap();
    let parcels = town.store.parcels(CITY).unwrap();
    let appraise = |id: EntityId| {
        let b = buildings.iter().find(|b| b.building_id == id).unwrap();
        let p = parcels.iter().find(|p| p.parcel_id == b.parcel_id).unwrap();
        sim.appraise(p, &buildings, Some(b))
    };

    assert_eq!(appraise(next_door), cfg.base - cfg.industrial_penalty);
    assert!((appraise(far_away) - (cfg.base - cfg.crime_weight * 20.0)).abs() < 1e-9);
}

#[test]
fn appraisal_is_clamped() {
    let mut config = SimConfig::default_test().unwrap();
    config.sim.land_value.base = 400.0;
    let town = Town::with_config(config);
    let sim = LandValueSubsystem::new(town.city.clone(), town.config.clone());
    let parcel = town.zoned_parcel((4, 4), ZoneClass::Residential);
    let parcels = town.store.parcels(CITY).unwrap();
    let record = parcels.iter().find(|p| p.parcel_id == parcel).unwrap();

    assert_eq!(sim.appraise(record, &[], None), MAX_LAND_VALUE);
}

#[test]
fn land_values_are_written_once_per_day() {
    let town = Town::new();
    let house = town.built((3, 3), "house");
    let mut sim = LandValueSubsystem::new(town.city.clone(), town.config.clone());
    let base = town.config.sim.land_value.base;

    run(&mut sim, &town, 0);
    assert_eq!(land_value(&town, house), base);

    town.store.set_land_value(CITY, parcel_of(&town, house), 1.0).unwrap();
    run(&mut sim, &town, 60);
    assert_eq!(land_value(&town, house), 1.0, "second pass on the same day is skipped");

    run(&mut sim, &town, town.config.ticks_per_day());
    assert_eq!(land_value(&town, house), base);
}

// ── Crime ──────────────────────────────────────────────────────────

#[test]
fn police_coverage_zeroes_crime_and_sets_the_city_rate() {
    let town = Town::new();
    let station = town.built((0, 0), "police_station");
    serve(&town, station);
    let near = town.built((3, 3), "house");
    let far = town.built((20, 20), "house");
    for b in [station, near, far] {
        town.store.set_land_value(CITY, parcel_of(&town, b), 0.0).unwrap();
    }
    let mut sim = CrimeSubsystem::new(town.city.clone(), town.config.clone());

    run(&mut sim, &town, 0);

    let crime = |id| town.store.building(CITY, id).unwrap().unwrap().crime_level;
    let base = town.config.sim.crime.base;
    assert_eq!(crime(near), 0.0);
    assert_eq!(crime(far), base);
    let rate = town.store.require_city(CITY).unwrap().crime_rate;
    assert!((rate - base / 3.0).abs() < 1e-9);
}

#[test]
fn crime_falls_with_land_value() {
    let town = Town::new();
    let house = town.built((5, 5), "house");
    town.store.set_land_value(CITY, parcel_of(&town, house), MAX_LAND_VALUE / 2.0).unwrap();
    town.built((6, 6), "police_station");
    let mut sim = CrimeSubsystem::new(town.city.clone(), town.config.clone());

    run(&mut sim, &town, 0);

    let level = town.store.building(CITY, house).unwrap().unwrap().crime_level;
    assert_eq!(level, town.config.sim.crime.base / 2.0, "an unserviced station covers nothing");
}

// ── Fire ───────────────────────────────────────────────────────────

fn flammable_town() -> Town {
    let mut config = SimConfig::default_test().unwrap();
    config.sim.fire.ignition_chance = 1.0;
    Town::with_config(config)
}

#[test]
fn uncovered_buildings_ignite_but_parks_do_not() {
    let town = flammable_town();
    let house = town.built((5, 5), "house");
    let park = town.built((9, 9), "park");
    let mut sim = FireSubsystem::new(town.city.clone(), town.config.clone());

    let events = run(&mut sim, &town, 0);

    assert_eq!(events, vec![CityEvent::FireStarted { building_id: house }]);
    let fire = |id| town.store.building(CITY, id).unwrap().unwrap().fire_level;
    assert_eq!(fire(house), town.config.sim.fire.spread_per_hour);
    assert_eq!(fire(park), 0.0);
}

#[test]
fn fire_stations_put_out_fires_in_range() {
    let town = flammable_town();
    let station = town.built((0, 0), "fire_station");
    serve(&town, station);
    let house = town.built((4, 4), "house");
    town.store.set_fire_level(CITY, house, 60.0).unwrap();
    let mut sim = FireSubsystem::new(town.city.clone(), town.config.clone());

    assert!(run(&mut sim, &town, 0).is_empty());
    assert_eq!(town.store.building(CITY, house).unwrap().unwrap().fire_level, 0.0);
}

#[test]
fn fires_spread_until_the_building_burns_down() {
    let town = Town::new();
    let house = town.built((5, 5), "house");
    town.store.set_fire_level(CITY, house, 60.0).unwrap();
    let mut sim = FireSubsystem::new(town.city.clone(), town.config.clone());

    assert!(run(&mut sim, &town, 0).is_empty());
    assert_eq!(town.store.building(CITY, house).unwrap().unwrap().fire_level, 80.0);

    let events = run(&mut sim, &town, 60);
    assert_eq!(
        events,
        vec![CityEvent::BuildingDemolished { building_id: house, cause: "fire".into() }]
    );
    assert!(town.store.building(CITY, house).unwrap().is_none());
}

// ── Zone evolution ─────────────────────────────────────────────────

#[test]
fn serviced_buildings_on_valuable_land_gain_a_floor() {
    let town = Town::new();
    let house = town.built((3, 3), "house");
    serve(&town, house);
    town.store.set_land_value(CITY, parcel_of(&town, house), 70.0).unwrap();
    let mut sim = ZoneEvolutionSubsystem::new(town.city.clone(), town.config.clone());

    let events = run(&mut sim, &town, 0);
    assert_eq!(events, vec![CityEvent::BuildingUpgraded { building_id: house, floors: 2 }]);
    assert!(run(&mut sim, &town, 60).is_empty(), "once per day");
    assert!(
        run(&mut sim, &town, town.config.ticks_per_day()).is_empty(),
        "a house tops out at two floors"
    );
}

#[test]
fn unserviced_or_cheap_land_does_not_grow() {
    let town = Town::new();
    let dark = town.built((3, 3), "house");
    town.store.set_land_value(CITY, parcel_of(&town, dark), 200.0).unwrap();
    let cheap = town.built((8, 8), "house");
    serve(&town, cheap);
    town.store.set_land_value(CITY, parcel_of(&town, cheap), 69.0).unwrap();
    let station = town.built((12, 12), "police_station");
    serve(&town, station);
    town.store.set_land_value(CITY, parcel_of(&town, station), 200.0).unwrap();
    let mut sim = ZoneEvolutionSubsystem::new(town.city.clone(), town.config.clone());

    assert!(run(&mut sim, &town, 0).is_empty());
}

#[test]
fn garbage_buried_buildings_lose_a_floor() {
    let town = Town::new();
    let house = town.build((3, 3), "house", 2, 100.0);
    serve(&town, house);
    town.store.set_land_value(CITY, parcel_of(&town, house), 200.0).unwrap();
    town.store.set_garbage_level(CITY, house, 20.0).unwrap();
    let mut sim = ZoneEvolutionSubsystem::new(town.city.clone(), town.config.clone());

    let events = run(&mut sim, &town, 0);

    assert_eq!(events, vec![CityEvent::BuildingUpgraded { building_id: house, floors: 1 }]);
    assert_eq!(town.store.building(CITY, house).unwrap().unwrap().floors, 1);
}

// ── Demand ─────────────────────────────────────────────────────────

#[test]
fn an_empty_city_asks_for_homes_only() {
    let town = Town::new();
    let sim = DemandSubsystem::new(town.city.clone(), town.config.clone());
    assert_eq!(
        sim.compute(&town.store).unwrap(),
        ZoneDemand { residential: 1.0, commercial: 0.0, industrial: 0.0 }
    );
}

#[test]
fn demand_tracks_housing_and_job_fill() {
    let town = Town::new();
    let block = town.built((0, 0), "apartment");
    let shop = town.built((5, 5), "shop");
    let first = town.store.insert_resident(CITY, block).unwrap();
    town.store.insert_resident(CITY, block).unwrap();
    town.store.employ_resident(CITY, first, shop, 40.0).unwrap();
    let sim = DemandSubsystem::new(town.city.clone(), town.config.clone());

    let demand = sim.compute(&town.store).unwrap();

    assert_eq!(demand.residential, 0.0, "two of four homes taken");
    assert_eq!(demand.commercial, -0.5, "one of four jobs taken");
    assert_eq!(demand.industrial, 1.0, "people but no factories");
}

#[test]
fn demand_events_only_on_change() {
    let town = Town::new();
    let mut sim = DemandSubsystem::new(town.city.clone(), town.config.clone());

    let events = run(&mut sim, &town, 0);
    assert!(matches!(events.as_slice(), [CityEvent::DemandUpdated { residential, .. }] if *residential == 1.0));
    assert_eq!(town.store.require_city(CITY).unwrap().demand.residential, 1.0);
    assert!(run(&mut sim, &town, 60).is_empty());
}

// ── Zone auto-build ────────────────────────────────────────────────

fn wants_homes(town: &Town) {
    let demand = ZoneDemand { residential: 1.0, commercial: 0.0, industrial: 0.0 };
    town.store.update_demand(CITY, &demand).unwrap();
}

#[test]
fn zoned_parcels_next_to_roads_get_the_default_building() {
    let town = Town::new();
    wants_homes(&town);
    town.road_run((0, 6), (9, 6));
    let lot = town.zoned_parcel((5, 5), ZoneClass::Residential);
    town.zoned_parcel((5, 1), ZoneClass::Residential);
    town.zoned_parcel((7, 5), ZoneClass::Commercial);
    let mut sim = ZoneBuildSubsystem::new(town.city.clone(), town.config.clone());

    let events = run(&mut sim, &town, 0);

    let [CityEvent::ZoneBuildingPlaced { building_id, parcel_id, building_type, cost }] = events.as_slice() else {
        panic!("expected one placement, got {events:?}");
    };
    assert_eq!(*parcel_id, lot);
    assert_eq!(building_type, "house");
    assert_eq!(*cost, 5_000.0);
    let building = town.store.building(CITY, *building_id).unwrap().unwrap();
    assert_eq!(building.progress, 0.0);
    assert_eq!(town.store.treasury(CITY).unwrap(), 95_000.0);
}

#[test]
fn auto_build_respects_the_per_pass_cap_and_the_treasury() {
    let town = Town::new();
    wants_homes(&town);
    town.road_run((0, 6), (9, 6));
    for x in 2..6 {
        town.zoned_parcel((x, 5), ZoneClass::Residential);
    }
    let mut sim = ZoneBuildSubsystem::new(town.city.clone(), town.config.clone());

    assert_eq!(run(&mut sim, &town, 0).len(), town.config.sim.auto_build_per_pass);

    town.store.adjust_treasury(CITY, -88_000.0).unwrap();
    assert!(run(&mut sim, &town, 100).is_empty(), "2,000 left cannot pay for a house");
}

#[test]
fn occupied_parcels_are_not_built_on() {
    let town = Town::new();
    wants_homes(&town);
    town.road_run((0, 6), (9, 6));
    let house = place(&town.store, &town.config, CITY, (5, 5), "house", 1, 100.0, None);
    let mut sim = ZoneBuildSubsystem::new(town.city.clone(), town.config.clone());

    assert!(run(&mut sim, &town, 0).is_empty());
    assert!(town.store.building(CITY, house).unwrap().is_some());
}
