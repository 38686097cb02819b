//! The simulation engine.
//!
//! One engine serves every city in the store. Each global tick:
//!   1. advance the master clock and derive the shared wall time once
//!   2. emit `day_started` / `night_started` when daylight flips
//!   3. for every city, in id order: apply its queued commands and run its
//!      bundle (see bundle.rs for the fixed subsystem order)
//!   4. persist every city sub-event to the event log and the derived time
//!      to the city row
//!   5. emit one `tick` event per city carrying that city's sub-events
//!
//! RULES:
//!   - Ticks never overlap; `run_timer` waits for a tick to finish before
//!     scheduling the next one.
//!   - Bundles are built lazily on first use and dropped by
//!     `invalidate_bundles()`.
//!   - All randomness flows through each bundle's RngBank.

use crate::{
    bundle::CityBundle,
    clock::{self, CityTime, SimClock},
    command::{AdminCommand, QueuedCommand},
    config::SimConfig,
    error::{SimError, SimResult},
    event::{EngineEvent, EventBroadcaster, EventLogEntry},
    store::CityStore,
    types::{CityId, Tick},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

pub struct SimEngine {
    pub clock:   SimClock,
    pub store:   CityStore,
    config:      Arc<SimConfig>,
    seed:        u64,
    bundles:     HashMap<CityId, CityBundle>,
    commands:    HashMap<CityId, Vec<QueuedCommand>>,
    broadcaster: Option<Box<dyn EventBroadcaster>>,
}

impl SimEngine {
    /// Build an engine over `store`, migrating it and resuming the clock at
    /// the latest persisted city tick.
    pub fn build(seed: u64, store: CityStore, config: SimConfig) -> SimResult<Self> {
        store.migrate()?;
        let mut clock = SimClock::new();
        clock.jump_to(store.max_city_tick()?);
        Ok(Self {
            clock,
            store,
            config: Arc::new(config),
            seed,
            bundles: HashMap::new(),
            commands: HashMap::new(),
            broadcaster: None,
        })
    }

    /// In-memory store with the test configuration.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        Self::build(seed, CityStore::in_memory()?, SimConfig::default_test()?)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Swap the configuration. Bundles are rebuilt on the next tick.
    pub fn set_config(&mut self, config: SimConfig) {
        self.config = Arc::new(config);
        self.invalidate_bundles();
    }

    pub fn set_broadcaster(&mut self, broadcaster: Box<dyn EventBroadcaster>) {
        self.broadcaster = Some(broadcaster);
        self.invalidate_bundles();
    }

    /// Create a city with the configured starting economy.
    pub fn found_city(&self, name: &str, width: u32, height: u32, treasury: f64) -> SimResult<CityId> {
        let economy = self.config.economy.initial_economy();
        let city_id = self.store.insert_city(name, width, height, treasury, &economy)?;
        self.store.update_city_time(&city_id, &self.now())?;
        log::info!("city={city_id} founded ({name}, {width}x{height})");
        Ok(city_id)
    }

    /// Same as `found_city` with a caller-chosen id.
    pub fn found_city_with_id(&self, city_id: &str, name: &str, width: u32, height: u32, treasury: f64) -> SimResult<()> {
        let economy = self.config.economy.initial_economy();
        self.store.insert_city_with_id(city_id, name, width, height, treasury, &economy)?;
        self.store.update_city_time(city_id, &self.now())
    }

    pub fn now(&self) -> CityTime {
        CityTime::from_tick(self.clock.current_tick, self.config.sim.ticks_per_minute)
    }

    pub fn start(&mut self) {
        if self.clock.running {
            return;
        }
        self.clock.start();
        log::info!("tick={} engine started", self.clock.current_tick);
        self.broadcast(&EngineEvent::Started { tick: self.clock.current_tick });
    }

    pub fn stop(&mut self) {
        if !self.clock.running {
            return;
        }
        self.clock.stop();
        log::info!("tick={} engine stopped", self.clock.current_tick);
        self.broadcast(&EngineEvent::Stopped { tick: self.clock.current_tick });
    }

    pub fn is_running(&self) -> bool {
        self.clock.running
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self) -> SimResult<Vec<EngineEvent>> {
        if !self.clock.running {
            return Err(SimError::EngineStopped);
        }
        let tpm = self.config.sim.ticks_per_minute;
        let previous = CityTime::from_tick(self.clock.current_tick, tpm);
        let tick = self.clock.advance();
        let time = CityTime::from_tick(tick, tpm);

        let mut out = Vec::new();
        if time.is_daylight && !previous.is_daylight {
            out.push(EngineEvent::DayStarted { time });
        } else if !time.is_daylight && previous.is_daylight {
            out.push(EngineEvent::NightStarted { time });
        }

        for city_id in self.store.city_ids()? {
            if !self.bundles.contains_key(&city_id) {
                let city = self.store.require_city(&city_id)?;
                let bundle = CityBundle::build(&city, self.seed, self.config.clone());
                log::debug!("city={city_id} bundle built");
                self.bundles.insert(city_id.clone(), bundle);
            }
            let Some(bundle) = self.bundles.get_mut(&city_id) else {
                continue;
            };
            let commands = self.commands.remove(&city_id).unwrap_or_default();
            let city_tick = bundle.tick(&time, &self.store, commands)?;

            for (event, source) in city_tick.events.iter().zip(&city_tick.sources) {
                self.store.append_event(&EventLogEntry {
                    id: None,
                    city_id: city_id.clone(),
                    tick,
                    subsystem: source.to_string(),
                    event_type: event.kind().to_string(),
                    payload: serde_json::to_string(event)?,
                })?;
            }
            self.store.update_city_time(&city_id, &time)?;
            out.push(EngineEvent::Tick { city_id, time, events: city_tick.events });
        }

        for event in &out {
            self.broadcast(event);
        }
        Ok(out)
    }

    /// Run n ticks back to back. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        let was_running = self.clock.running;
        self.clock.start();
        let result = (0..n).try_for_each(|_| self.tick().map(|_| ()));
        if !was_running {
            self.clock.stop();
        }
        result
    }

    /// Fixed-interval loop at the clock's speed. Each tick completes before
    /// the next is scheduled; the loop ends after `max_ticks` ticks (if
    /// given) or once the engine is stopped.
    pub fn run_timer(&mut self, max_ticks: Option<u64>) -> SimResult<u64> {
        self.start();
        let mut ran = 0;
        while self.clock.running && max_ticks.map_or(true, |max| ran < max) {
            let started = Instant::now();
            self.tick()?;
            ran += 1;
            let interval = Duration::from_millis(self.clock.tick_interval_ms());
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        self.stop();
        Ok(ran)
    }

    /// Debug time travel: overwrite the tick counter with the first tick of
    /// `hour` on `day` of `year`. Not safe while `run_timer` is looping.
    pub fn set_time(&mut self, hour: u32, day: u32, year: u32) -> SimResult<Tick> {
        let tick = clock::tick_for(hour, day, year, self.config.sim.ticks_per_minute)?;
        self.clock.jump_to(tick);
        for bundle in self.bundles.values_mut() {
            bundle.reset_cadences();
        }
        let time = self.now();
        for city_id in self.store.city_ids()? {
            self.store.update_city_time(&city_id, &time)?;
        }
        log::info!("time set to {hour:02}:00 day {day} year {year} (tick {tick})");
        Ok(tick)
    }

    /// Invalidate cached road graphs for one city, or all when `None`.
    pub fn on_roads_changed(&mut self, city_id: Option<&str>) {
        match city_id {
            Some(id) => {
                if let Some(bundle) = self.bundles.get_mut(id) {
                    bundle.roads_changed();
                }
            }
            None => self.bundles.values_mut().for_each(CityBundle::roads_changed),
        }
    }

    /// Queue a command for the city's next tick.
    pub fn queue_command(&mut self, city_id: &str, command: AdminCommand) -> SimResult<()> {
        self.store.require_city(city_id)?;
        let queued = QueuedCommand::new(city_id, self.clock.current_tick, command);
        self.commands.entry(city_id.to_string()).or_default().push(queued);
        Ok(())
    }

    pub fn invalidate_bundles(&mut self) {
        self.bundles.clear();
    }

    pub fn bundle(&self, city_id: &str) -> Option<&CityBundle> {
        self.bundles.get(city_id)
    }

    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    fn broadcast(&mut self, event: &EngineEvent) {
        if let Some(broadcaster) = self.broadcaster.as_mut() {
            broadcaster.broadcast(event);
        }
    }
}
