//! Population lifecycle: spawning on completion, displacement on demolition.

mod common;

use citysim_core::{
    command::AdminCommand,
    engine::SimEngine,
    event::CityEvent,
    population_subsystem::PopulationSubsystem,
    rng::SubsystemRng,
    subsystem::CitySubsystem,
    types::EntityId,
};
use common::{place, Town, CITY};

fn completed(building_id: EntityId, kind: &str) -> CityEvent {
    CityEvent::BuildingCompleted { building_id, building_type: kind.to_string() }
}

fn demolished(building_id: EntityId) -> CityEvent {
    CityEvent::BuildingDemolished { building_id, cause: "demolished".to_string() }
}

fn spawned(events: &[CityEvent]) -> usize {
    events.iter().filter(|e| matches!(e, CityEvent::ResidentSpawned { .. })).count()
}

#[test]
fn apartments_spawn_a_fixed_count_per_floor() {
    let town = Town::new();
    let block = town.build((4, 4), "apartment", 3, 100.0);
    let mut pop = PopulationSubsystem::new(town.city.clone(), town.config.clone());

    let events = pop
        .update(&town.time(1), &town.store, &[completed(block, "apartment")], &mut SubsystemRng::new(1))
        .unwrap();

    assert_eq!(spawned(&events), 12);
    assert_eq!(town.store.residents_by_home(CITY).unwrap()[&block], 12);
}

#[test]
fn houses_roll_within_their_range() {
    let town = Town::new();
    let mut pop = PopulationSubsystem::new(town.city.clone(), town.config.clone());
    for (i, seed) in (0..20u64).enumerate() {
        let house = town.built((i as i32, 0), "house");
        let events = pop
            .update(&town.time(1), &town.store, &[completed(house, "house")], &mut SubsystemRng::new(seed))
            .unwrap();
        let n = spawned(&events);
        assert!((1..=4).contains(&n), "house rolled {n} residents");
    }
}

#[test]
fn buildings_without_a_population_rule_spawn_nobody() {
    let town = Town::new();
    let shop = town.built((1, 1), "shop");
    let mut pop = PopulationSubsystem::new(town.city.clone(), town.config.clone());

    let events = pop
        .update(&town.time(1), &town.store, &[completed(shop, "shop")], &mut SubsystemRng::new(1))
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn demolition_displaces_exactly_the_residents_living_there() {
    let town = Town::new();
    let block = town.build((0, 0), "apartment", 2, 100.0);
    let other = town.build((5, 5), "apartment", 1, 100.0);
    let mut pop = PopulationSubsystem::new(town.city.clone(), town.config.clone());
    pop.update(
        &town.time(1),
        &town.store,
        &[completed(block, "apartment"), completed(other, "apartment")],
        &mut SubsystemRng::new(1),
    )
    .unwrap();
    assert_eq!(town.store.resident_count(CITY).unwrap(), 12);

    town.store.delete_building(CITY, block).unwrap();
    let events = pop
        .update(&town.time(2), &town.store, &[demolished(block)], &mut SubsystemRng::new(2))
        .unwrap();

    assert_eq!(events, vec![CityEvent::ResidentsDisplaced { building_id: block, count: 8 }]);
    assert_eq!(town.store.resident_count(CITY).unwrap(), 4);
}

#[test]
fn demolishing_a_workplace_lays_off_its_staff() {
    let town = Town::new();
    let home = town.build((0, 0), "apartment", 1, 100.0);
    let shop = town.built((5, 5), "shop");
    for _ in 0..3 {
        let resident = town.store.insert_resident(CITY, home).unwrap();
        town.store.employ_resident(CITY, resident, shop, 40.0).unwrap();
    }
    let mut pop = PopulationSubsystem::new(town.city.clone(), town.config.clone());

    town.store.delete_building(CITY, shop).unwrap();
    let events = pop
        .update(&town.time(2), &town.store, &[demolished(shop)], &mut SubsystemRng::new(2))
        .unwrap();

    assert_eq!(events, vec![CityEvent::JobsLost { building_id: shop, count: 3 }]);
    assert_eq!(town.store.resident_count(CITY).unwrap(), 3, "workers keep their homes");
    assert!(town.store.employed_residents(CITY).unwrap().is_empty());
}

#[test]
fn engine_spawns_residents_on_the_tick_construction_finishes() {
    let mut engine = SimEngine::build_test(7).unwrap();
    engine.found_city_with_id(CITY, "Lifecycle", 16, 16, 50_000.0).unwrap();
    let block = place(&engine.store, engine.config(), CITY, (2, 2), "apartment", 2, 99.0, None);

    engine.run_ticks(1).unwrap();

    let log = engine.store.events_for_tick(CITY, 1).unwrap();
    let types: Vec<&str> = log.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types.first(), Some(&"building_completed"));
    assert_eq!(types.iter().filter(|t| **t == "resident_spawned").count(), 8);
    assert_eq!(engine.store.units_for_building(CITY, block).unwrap().len(), 8);
}

#[test]
fn demolish_command_displaces_residents_on_the_next_tick() {
    let mut engine = SimEngine::build_test(7).unwrap();
    engine.found_city_with_id(CITY, "Lifecycle", 16, 16, 50_000.0).unwrap();
    let block = place(&engine.store, engine.config(), CITY, (2, 2), "apartment", 1, 99.0, None);
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.store.resident_count(CITY).unwrap(), 4);

    engine
        .queue_command(CITY, AdminCommand::DemolishBuilding { building_id: block })
        .unwrap();
    engine.run_ticks(1).unwrap();

    assert_eq!(engine.store.resident_count(CITY).unwrap(), 0);
    assert!(engine.store.building(CITY, block).unwrap().is_none());
    assert_eq!(engine.store.event_count(CITY, "residents_displaced").unwrap(), 1);
}
