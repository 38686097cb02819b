//! Engine clock, scheduling and the event stream.

mod common;

use citysim_core::{
    clock::{SimSpeed, EPOCH_YEAR},
    command::AdminCommand,
    engine::SimEngine,
    error::SimError,
    event::{EngineEvent, EventBroadcaster},
    model::ZoneClass,
};
use common::{place, CITY};
use std::sync::{Arc, Mutex};

fn engine_with_city(seed: u64) -> SimEngine {
    let engine = SimEngine::build_test(seed).unwrap();
    engine.found_city_with_id(CITY, "Engineville", 32, 32, 100_000.0).unwrap();
    engine
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<EngineEvent>>>);

impl EventBroadcaster for Recorder {
    fn broadcast(&mut self, event: &EngineEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[test]
fn ticking_a_stopped_engine_is_an_error() {
    let mut engine = engine_with_city(1);
    assert!(matches!(engine.tick(), Err(SimError::EngineStopped)));
    assert_eq!(engine.clock.current_tick, 0);
}

#[test]
fn run_ticks_advances_every_city_clock() {
    let mut engine = engine_with_city(1);
    engine.found_city_with_id("second-city", "Twinsville", 8, 8, 0.0).unwrap();

    engine.run_ticks(60).unwrap();

    assert!(!engine.is_running(), "run_ticks leaves a stopped engine stopped");
    for id in [CITY, "second-city"] {
        let city = engine.store.require_city(id).unwrap();
        assert_eq!(city.tick, 60);
        assert_eq!((city.hour, city.day, city.year), (9, 1, EPOCH_YEAR));
    }
}

#[test]
fn day_and_night_events_fire_on_daylight_flips() {
    let mut engine = engine_with_city(1);
    engine.start();
    let mut flips = Vec::new();
    for _ in 0..1_400 {
        for event in engine.tick().unwrap() {
            match event {
                EngineEvent::NightStarted { time } => flips.push(("night", time.tick, time.hour)),
                EngineEvent::DayStarted { time } => flips.push(("day", time.tick, time.hour)),
                _ => {}
            }
        }
    }
    assert_eq!(flips, vec![("night", 720, 20), ("day", 1_320, 6)]);
}

#[test]
fn every_city_gets_one_tick_event() {
    let mut engine = engine_with_city(1);
    engine.found_city_with_id("second-city", "Twinsville", 8, 8, 0.0).unwrap();
    engine.start();

    let events = engine.tick().unwrap();
    let cities: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Tick { city_id, .. } => Some(city_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(cities.len(), 2);
    assert!(cities.contains(&CITY) && cities.contains(&"second-city"));
}

#[test]
fn broadcaster_sees_lifecycle_and_ticks() {
    let mut engine = engine_with_city(1);
    let recorder = Recorder::default();
    engine.set_broadcaster(Box::new(recorder.clone()));

    engine.start();
    engine.tick().unwrap();
    engine.stop();

    let seen = recorder.0.lock().unwrap();
    assert!(matches!(seen.first(), Some(EngineEvent::Started { tick: 0 })));
    assert!(matches!(seen.get(1), Some(EngineEvent::Tick { city_id, .. }) if city_id == CITY));
    assert!(matches!(seen.last(), Some(EngineEvent::Stopped { tick: 1 })));
}

#[test]
fn set_time_jumps_the_clock_and_persists_city_time() {
    let mut engine = engine_with_city(1);
    let tick = engine.set_time(12, 5, EPOCH_YEAR).unwrap();

    assert_eq!(tick, (4 * 24 + 4) * 60);
    assert_eq!(engine.clock.current_tick, tick);
    let city = engine.store.require_city(CITY).unwrap();
    assert_eq!((city.hour, city.day), (12, 5));

    engine.run_ticks(1).unwrap();
    assert_eq!(engine.store.require_city(CITY).unwrap().tick, tick + 1);
}

#[test]
fn set_time_rejects_impossible_times() {
    let mut engine = engine_with_city(1);
    assert!(matches!(engine.set_time(24, 1, EPOCH_YEAR), Err(SimError::InvalidTime { .. })));
    assert!(matches!(engine.set_time(3, 1, EPOCH_YEAR), Err(SimError::InvalidTime { .. })));
    assert_eq!(engine.clock.current_tick, 0);
}

#[test]
fn bundles_are_built_on_demand_and_dropped_on_config_change() {
    let mut engine = engine_with_city(1);
    assert_eq!(engine.bundle_count(), 0);

    engine.run_ticks(1).unwrap();
    assert_eq!(engine.bundle_count(), 1);
    let names = engine.bundle(CITY).unwrap().subsystem_names();
    assert_eq!(names.first(), Some(&"construction"));
    assert_eq!(names.last(), Some(&"zone_build"));

    let config = engine.config().clone();
    engine.set_config(config);
    assert_eq!(engine.bundle_count(), 0);
}

#[test]
fn daily_jobs_survive_a_bundle_rebuild() {
    let mut engine = engine_with_city(1);
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.store.event_count(CITY, "tax_collected").unwrap(), 1);

    engine.invalidate_bundles();
    engine.run_ticks(1).unwrap();
    assert_eq!(
        engine.store.event_count(CITY, "tax_collected").unwrap(),
        1,
        "the job marker lives in the store, not the bundle"
    );
}

#[test]
fn commands_apply_on_the_next_tick() {
    let mut engine = engine_with_city(1);
    engine
        .queue_command(CITY, AdminCommand::SetTaxRate { zone: ZoneClass::Industrial, rate: 250.0 })
        .unwrap();
    assert_eq!(engine.store.require_city(CITY).unwrap().economy.tax_rates.industrial, 11.0);

    engine.run_ticks(1).unwrap();
    assert_eq!(
        engine.store.require_city(CITY).unwrap().economy.tax_rates.industrial,
        100.0,
        "rates are clamped to 0..100"
    );
}

#[test]
fn commands_for_unknown_cities_are_refused() {
    let mut engine = engine_with_city(1);
    let result = engine.queue_command("atlantis", AdminCommand::IssueBond { principal: 1.0, annual_rate: 1.0 });
    assert!(matches!(result, Err(SimError::CityNotFound { .. })));
}

#[test]
fn timer_loop_stops_after_the_requested_ticks() {
    let mut engine = engine_with_city(1);
    engine.clock.set_speed(SimSpeed::Ultra);

    assert_eq!(engine.run_timer(Some(3)).unwrap(), 3);
    assert_eq!(engine.clock.current_tick, 3);
    assert!(!engine.is_running());
}

#[test]
fn cities_do_not_share_state() {
    let mut engine = engine_with_city(1);
    engine.found_city_with_id("second-city", "Twinsville", 8, 8, 0.0).unwrap();
    place(&engine.store, engine.config(), CITY, (2, 2), "apartment", 1, 99.0, None);

    engine.run_ticks(1).unwrap();

    assert_eq!(engine.store.resident_count(CITY).unwrap(), 4);
    assert_eq!(engine.store.resident_count("second-city").unwrap(), 0);
    assert!(engine.store.buildings("second-city").unwrap().is_empty());
}
