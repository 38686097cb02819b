//! Agent movement and daily schedule.
//!
//! Agents with a path walk one step toward their next waypoint at the
//! configured speed. Agents without a path consult their schedule: at the
//! start hour they head to work, and a working agent found off shift heads
//! home, including one who only reached work after the shift ended. Vehicles
//! the agent owns are sent to the same target.
//!
//! Execution: every tick.

use crate::{
    clock::CityTime,
    config::SimConfig,
    error::SimResult,
    event::CityEvent,
    model::{AgentRecord, AgentState},
    pathfinder::{advance_along, WalkPathfinder},
    rng::SubsystemRng,
    store::CityStore,
    subsystem::CitySubsystem,
    types::{CityId, EntityId},
};
use std::{any::Any, sync::Arc};

fn arrival_state(agent: &AgentRecord, building_id: Option<EntityId>) -> AgentState {
    match building_id {
        Some(id) if Some(id) == agent.work_building_id => AgentState::Working,
        _ => AgentState::Idle,
    }
}

pub struct AgentSubsystem {
    city_id:    CityId,
    config:     Arc<SimConfig>,
    pathfinder: WalkPathfinder,
}

impl AgentSubsystem {
    pub fn new(city_id: CityId, config: Arc<SimConfig>, width: u32, height: u32) -> Self {
        Self {
            city_id,
            config,
            pathfinder: WalkPathfinder::new(width, height),
        }
    }

    pub fn pathfinder(&self) -> &WalkPathfinder {
        &self.pathfinder
    }

    /// Plan a trip to the centre of `building_id`. Returns false when the
    /// building is gone or unreachable.
    fn plan_trip(&mut self, store: &CityStore, agent: &mut AgentRecord, building_id: EntityId) -> SimResult<bool> {
        let Some(building) = store.building(&self.city_id, building_id)? else {
            log::warn!(
                "city={} agents: agent {} targets missing building {building_id}",
                self.city_id, agent.agent_id
            );
            return Ok(false);
        };
        let target = building.footprint().center();
        let Some(path) = self.pathfinder.find_path(store, &self.city_id, (agent.x, agent.y), target)? else {
            return Ok(false);
        };
        if path.is_empty() {
            agent.state = arrival_state(agent, Some(building_id));
            return Ok(true);
        }
        agent.destination = Some(target);
        agent.destination_building_id = Some(building_id);
        agent.path = path;
        agent.state = AgentState::Traveling;
        let cars = store.dispatch_owned_vehicles(&self.city_id, agent.agent_id, target)?;
        if cars > 0 {
            log::debug!("city={} agents: agent {} takes {cars} vehicle(s)", self.city_id, agent.agent_id);
        }
        Ok(true)
    }

    fn step(&self, agent: &mut AgentRecord) -> Vec<CityEvent> {
        let mut pos = (agent.x, agent.y);
        let arrived = advance_along(&mut pos, &mut agent.path, self.config.sim.agent_speed);
        (agent.x, agent.y) = pos;
        let mut events = vec![CityEvent::AgentMoved { agent_id: agent.agent_id, x: agent.x, y: agent.y }];
        if arrived {
            let building_id = agent.destination_building_id.take();
            agent.destination = None;
            agent.state = arrival_state(agent, building_id);
            events.push(CityEvent::AgentArrived { agent_id: agent.agent_id, building_id });
        }
        events
    }

    fn follow_schedule(&mut self, store: &CityStore, agent: &mut AgentRecord, hour: u32) -> SimResult<bool> {
        let schedule = agent.schedule;
        if hour == schedule.work_start
            && !matches!(agent.state, AgentState::Working | AgentState::Traveling)
        {
            if let Some(work) = agent.work_building_id {
                return self.plan_trip(store, agent, work);
            }
        } else if agent.state == AgentState::Working && !schedule.on_shift(hour) {
            match agent.home_building_id {
                Some(home) => return self.plan_trip(store, agent, home),
                None => {
                    agent.state = AgentState::Idle;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl CitySubsystem for AgentSubsystem {
    fn name(&self) -> &'static str {
        "agents"
    }

    fn update(
        &mut self,
        time: &CityTime,
        store: &CityStore,
        _events_in: &[CityEvent],
        _rng: &mut SubsystemRng,
    ) -> SimResult<Vec<CityEvent>> {
        let mut events = Vec::new();
        for mut agent in store.agents(&self.city_id)? {
            if agent.state == AgentState::InJail {
                continue;
            }
            let changed = if agent.path.is_empty() {
                self.follow_schedule(store, &mut agent, time.hour)?
            } else {
                events.extend(self.step(&mut agent));
                true
            };
            if changed {
                store.update_agent_motion(&self.city_id, &agent)?;
            }
        }
        Ok(events)
    }

    fn roads_changed(&mut self) {
        self.pathfinder.update_roads();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
