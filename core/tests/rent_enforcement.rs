//! The rent pipeline: warning, escalation, hearing, jail and release.

mod common;

use citysim_core::{
    command::pay_rent_warning,
    config::SimConfig,
    event::CityEvent,
    model::{AgentState, CaseStatus, InmateStatus, UnitStatus, Verdict, WarningStatus},
    rent_enforcement_subsystem::{RentEnforcementSubsystem, JAIL_SENTENCE},
    types::EntityId,
};
use common::{Town, CITY};
use std::collections::BTreeMap;

struct Lease {
    town:   Town,
    unit:   EntityId,
    tenant: EntityId,
}

/// A broke tenant leasing a 300/month unit from tick 0.
fn lease() -> Lease {
    let town = Town::new();
    let house = town.built((3, 3), "house");
    let unit = town.store.insert_rental_unit(CITY, house, 1, 1, "house", 300.0).unwrap();
    let tenant = town.agent("Tenant", 0.0);
    assert!(town.store.lease_unit(CITY, unit, tenant, 0).unwrap());
    Lease { town, unit, tenant }
}

/// Run one enforcement pass per day over `days`, keyed by day.
fn run_days(lease: &Lease, days: std::ops::RangeInclusive<u64>) -> BTreeMap<u64, Vec<CityEvent>> {
    let rent = RentEnforcementSubsystem::new(lease.town.city.clone(), lease.town.config.clone());
    days.map(|day| (day, rent.enforce(&lease.town.store, &lease.town.day(day)).unwrap()))
        .collect()
}

fn kinds(events: &[CityEvent]) -> Vec<&'static str> {
    events.iter().map(CityEvent::kind).collect()
}

#[test]
fn unpaid_rent_ends_in_jail_and_release() {
    let lease = lease();
    let tpd = lease.town.config.ticks_per_day();
    let by_day = run_days(&lease, 1..=41);

    let active: Vec<u64> = by_day.iter().filter(|(_, e)| !e.is_empty()).map(|(d, _)| *d).collect();
    assert_eq!(active, vec![30, 33, 34, 41]);

    match by_day[&30].as_slice() {
        [CityEvent::RentWarningIssued { tenant_id, amount, due_tick, .. }] => {
            assert_eq!(*tenant_id, lease.tenant);
            assert_eq!(*amount, 300.0);
            assert_eq!(*due_tick, 33 * tpd);
        }
        other => panic!("day 30: {other:?}"),
    }
    match by_day[&33].as_slice() {
        [CityEvent::CourtCaseOpened { defendant_id, hearing_tick, .. }] => {
            assert_eq!(*defendant_id, lease.tenant);
            assert_eq!(*hearing_tick, 34 * tpd);
        }
        other => panic!("day 33: {other:?}"),
    }
    assert_eq!(kinds(&by_day[&34]), vec!["verdict_reached", "jail_update"]);
    assert_eq!(
        by_day[&41],
        vec![CityEvent::JailUpdate { jailed: vec![], released: vec![lease.tenant] }]
    );

    let store = &lease.town.store;
    let case = &store.court_cases(CITY).unwrap()[0];
    assert_eq!(case.plaintiff_id, Some(lease.town.landlord));
    assert_eq!(case.verdict, Some(Verdict::Guilty));
    assert_eq!(case.sentence.as_deref(), Some(JAIL_SENTENCE));
    assert_eq!(case.status, CaseStatus::Closed);

    let inmate = &store.inmates(CITY).unwrap()[0];
    assert_eq!(inmate.check_in_tick, 34 * tpd);
    assert_eq!(inmate.release_tick, 41 * tpd);
    assert_eq!(inmate.status, InmateStatus::Released);

    let unit = store.rental_unit(CITY, lease.unit).unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Vacant);
    assert_eq!(unit.tenant_id, None);
    assert_eq!(store.agent(CITY, lease.tenant).unwrap().unwrap().state, AgentState::Idle);
}

#[test]
fn tenant_is_in_jail_between_verdict_and_release() {
    let lease = lease();
    run_days(&lease, 1..=34);

    let agent = lease.town.store.agent(CITY, lease.tenant).unwrap().unwrap();
    assert_eq!(agent.state, AgentState::InJail);
    assert!(agent.path.is_empty());
    assert!(lease.town.store.incarcerated(CITY, lease.tenant).unwrap());
}

#[test]
fn paying_before_the_due_date_keeps_the_case_out_of_court() {
    let lease = lease();
    run_days(&lease, 1..=31);

    let store = &lease.town.store;
    let warning = store.pending_warning_for_unit(CITY, lease.unit).unwrap().unwrap();
    store.adjust_wallet(CITY, lease.tenant, 300.0).unwrap();
    let landlord_before = lease.town.wallet(lease.town.landlord);
    assert!(pay_rent_warning(CITY, store, warning.warning_id).unwrap());

    let later = run_days(&lease, 32..=45);
    assert!(later.values().all(Vec::is_empty), "nothing escalates once paid");
    assert!(store.court_cases(CITY).unwrap().is_empty());
    assert_eq!(lease.town.wallet(lease.tenant), 0.0);
    assert_eq!(lease.town.wallet(lease.town.landlord), landlord_before + 300.0);
    let warning = store.warning(CITY, warning.warning_id).unwrap().unwrap();
    assert_eq!(warning.status, WarningStatus::Paid);
}

#[test]
fn paying_after_escalation_gets_the_case_dismissed() {
    let lease = lease();
    run_days(&lease, 1..=33);

    let store = &lease.town.store;
    let warning_id = store.warnings(CITY).unwrap()[0].warning_id;
    store.adjust_wallet(CITY, lease.tenant, 300.0).unwrap();
    assert!(pay_rent_warning(CITY, store, warning_id).unwrap());

    let day34 = run_days(&lease, 34..=34).remove(&34).unwrap();
    assert_eq!(
        kinds(&day34),
        vec!["verdict_reached"],
        "dismissal sends nobody to jail"
    );
    let case = &store.court_cases(CITY).unwrap()[0];
    assert_eq!(case.verdict, Some(Verdict::Dismissed));
    assert!(store.inmates(CITY).unwrap().is_empty());
    let unit = store.rental_unit(CITY, lease.unit).unwrap().unwrap();
    assert_eq!(unit.status, UnitStatus::Occupied);
}

#[test]
fn short_tenant_cannot_pay() {
    let lease = lease();
    run_days(&lease, 1..=30);
    let store = &lease.town.store;
    let warning_id = store.warnings(CITY).unwrap()[0].warning_id;

    assert!(!pay_rent_warning(CITY, store, warning_id).unwrap());
    let warning = store.warning(CITY, warning_id).unwrap().unwrap();
    assert_eq!(warning.status, WarningStatus::Pending);
}

#[test]
fn second_pass_on_the_same_day_does_nothing() {
    let lease = lease();
    let rent = RentEnforcementSubsystem::new(lease.town.city.clone(), lease.town.config.clone());
    let day30 = lease.town.day(30);

    assert_eq!(rent.enforce(&lease.town.store, &day30).unwrap().len(), 1);
    assert!(rent.enforce(&lease.town.store, &day30).unwrap().is_empty());
    assert_eq!(lease.town.store.warnings(CITY).unwrap().len(), 1);
}

#[test]
fn vacant_units_are_never_warned() {
    let town = Town::new();
    let house = town.built((3, 3), "house");
    town.store.insert_rental_unit(CITY, house, 1, 1, "house", 300.0).unwrap();
    let rent = RentEnforcementSubsystem::new(town.city.clone(), town.config.clone());

    for day in [30, 60, 90] {
        assert!(rent.enforce(&town.store, &town.day(day)).unwrap().is_empty());
    }
}

#[test]
fn skipped_due_day_is_warned_on_the_next_pass() {
    let lease = lease();
    let tpd = lease.town.config.ticks_per_day();
    let mut by_day = run_days(&lease, 1..=29);
    by_day.extend(run_days(&lease, 31..=31));

    assert!(by_day.range(..31).all(|(_, e)| e.is_empty()));
    match by_day[&31].as_slice() {
        [CityEvent::RentWarningIssued { tenant_id, due_tick, .. }] => {
            assert_eq!(*tenant_id, lease.tenant);
            assert_eq!(*due_tick, 34 * tpd);
        }
        other => panic!("day 31: {other:?}"),
    }
}

#[test]
fn each_period_is_warned_once() {
    let lease = lease();
    run_days(&lease, 1..=31);
    let store = &lease.town.store;
    let first = store.pending_warning_for_unit(CITY, lease.unit).unwrap().unwrap();
    store.adjust_wallet(CITY, lease.tenant, 300.0).unwrap();
    assert!(pay_rent_warning(CITY, store, first.warning_id).unwrap());

    let later = run_days(&lease, 32..=62);
    let active: Vec<u64> = later.iter().filter(|(_, e)| !e.is_empty()).map(|(d, _)| *d).collect();
    assert_eq!(active, vec![60], "second period falls due on day 60");
    assert_eq!(store.warnings(CITY).unwrap().len(), 2);
}

#[test]
fn zero_day_period_does_not_panic() {
    let mut config = SimConfig::default_test().unwrap();
    config.sim.rent.period_days = 0;
    let town = Town::with_config(config);
    let house = town.built((3, 3), "house");
    let unit = town.store.insert_rental_unit(CITY, house, 1, 1, "house", 300.0).unwrap();
    let tenant = town.agent("Tenant", 0.0);
    assert!(town.store.lease_unit(CITY, unit, tenant, 0).unwrap());
    let rent = RentEnforcementSubsystem::new(town.city.clone(), town.config.clone());

    let events = rent.enforce(&town.store, &town.day(1)).unwrap();
    assert_eq!(kinds(&events), vec!["rent_warning_issued"]);
}
