//! city-runner: headless runner for the city simulation core.
//!
//! Usage:
//!   city-runner --seed 12345 --ticks 2880 --db city.db --demo
//!   city-runner --seed 12345 --realtime --ticks 600
//!   city-runner --ipc-mode --demo

mod demo;

use anyhow::{Context, Result};
use citysim_core::{
    clock::CityTime,
    command::AdminCommand,
    config::SimConfig,
    engine::SimEngine,
    event::{EngineEvent, EventBroadcaster},
    model::ZoneDemand,
    store::CityStore,
    types::{CityId, Tick},
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        count: u64,
    },
    Command {
        city_id: CityId,
        command: AdminCommand,
    },
    SetTime {
        hour: u32,
        day:  u32,
        year: u32,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct CitySummary {
    city_id:       CityId,
    name:          String,
    treasury:      f64,
    residents:     usize,
    buildings:     usize,
    agents:        usize,
    credit_rating: String,
    crime_rate:    f64,
    demand:        ZoneDemand,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:    Tick,
    time:    CityTime,
    running: bool,
    cities:  Vec<CitySummary>,
}

/// Logs day/night transitions and per-city tick volume.
struct LogBroadcaster;

impl EventBroadcaster for LogBroadcaster {
    fn broadcast(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::DayStarted { time } => log::info!("day {} {}: sunrise", time.day, time.year),
            EngineEvent::NightStarted { time } => log::info!("day {} {}: nightfall", time.day, time.year),
            EngineEvent::Tick { city_id, time, events } if !events.is_empty() => {
                log::debug!("tick={} city={city_id} {} events", time.tick, events.len());
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 1_440u64);
    let ipc_mode = has_flag(&args, "--ipc-mode");
    let realtime = has_flag(&args, "--realtime");
    let demo = has_flag(&args, "--demo");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    if !ipc_mode {
        println!("city-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = if Path::new(data_dir).is_dir() {
        SimConfig::load(data_dir)?
    } else {
        log::warn!("data dir {data_dir} not found, using the embedded configuration");
        SimConfig::embedded()?
    };
    let store = if db == ":memory:" {
        CityStore::in_memory()?
    } else {
        CityStore::open(db).with_context(|| format!("cannot open database {db}"))?
    };

    let mut engine = SimEngine::build(seed, store, config)?;
    if demo {
        demo::seed_city(&engine, &format!("Demo Town {seed}"))?;
    }
    if engine.store.city_ids()?.is_empty() {
        log::warn!("no cities in {db}; pass --demo to seed one");
    }

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else if realtime {
        engine.set_broadcaster(Box::new(LogBroadcaster));
        let ran = engine.run_timer(Some(ticks))?;
        print_summary(&engine, ran)?;
    } else {
        engine.run_ticks(ticks)?;
        print_summary(&engine, ticks)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        if handle.read_line(&mut buffer)? == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        let outcome = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => Ok(()),
            IpcCommand::Tick { count } => engine.run_ticks(count),
            IpcCommand::Command { city_id, command } => engine.queue_command(&city_id, command),
            IpcCommand::SetTime { hour, day, year } => engine.set_time(hour, day, year).map(|_| ()),
        };
        match outcome {
            Ok(()) => writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine)?)?)?,
            Err(e) => writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> Result<UiState> {
    let store = &engine.store;
    let mut cities = Vec::new();
    for city_id in store.city_ids()? {
        let city = store.require_city(&city_id)?;
        cities.push(CitySummary {
            residents: store.resident_count(&city_id)?,
            buildings: store.buildings(&city_id)?.len(),
            agents: store.agents(&city_id)?.len(),
            credit_rating: city.economy.credit_rating.as_str().to_string(),
            city_id,
            name: city.name,
            treasury: city.treasury,
            crime_rate: city.crime_rate,
            demand: city.demand,
        });
    }
    Ok(UiState {
        tick: engine.clock.current_tick,
        time: engine.now(),
        running: engine.is_running(),
        cities,
    })
}

fn print_summary(engine: &SimEngine, ticks: u64) -> Result<()> {
    let time = engine.now();
    println!("=== RUN SUMMARY ===");
    println!("  ticks run:      {ticks}");
    println!("  final tick:     {}", engine.clock.current_tick);
    println!("  city time:      {:02}:00 day {} year {}", time.hour, time.day, time.year);

    let state = build_ui_state(engine)?;
    for city in &state.cities {
        let store = &engine.store;
        println!();
        println!("=== {} ({}) ===", city.name, city.city_id);
        println!("  treasury:       ${:.0}", city.treasury);
        println!("  credit rating:  {}", city.credit_rating);
        println!("  residents:      {}", city.residents);
        println!("  buildings:      {}", city.buildings);
        println!("  agents:         {}", city.agents);
        println!("  crime rate:     {:.1}", city.crime_rate);
        println!(
            "  demand R/C/I:   {:+.2} / {:+.2} / {:+.2}",
            city.demand.residential, city.demand.commercial, city.demand.industrial
        );
        for kind in ["building_completed", "zone_building_placed", "rent_warning_issued", "verdict_reached", "fire_started"] {
            println!("  {kind:<22}{}", store.event_count(&city.city_id, kind)?);
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
