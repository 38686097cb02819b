//! Administrative commands applied directly to the store.

mod common;

use citysim_core::{
    command::AdminCommand,
    model::{UnitStatus, ZoneClass},
};
use common::{Town, CITY};

fn apply(town: &Town, command: AdminCommand) {
    command.apply(CITY, &town.store, &town.time(0)).unwrap();
}

#[test]
fn tax_rates_are_clamped_per_zone() {
    let town = Town::new();
    apply(&town, AdminCommand::SetTaxRate { zone: ZoneClass::Residential, rate: -5.0 });
    apply(&town, AdminCommand::SetTaxRate { zone: ZoneClass::Commercial, rate: 14.5 });

    let rates = town.store.require_city(CITY).unwrap().economy.tax_rates;
    assert_eq!(rates.residential, 0.0);
    assert_eq!(rates.commercial, 14.5);
    assert_eq!(rates.industrial, 11.0);
}

#[test]
fn ordinances_toggle_without_duplicates() {
    let town = Town::new();
    let enable = || AdminCommand::SetOrdinance { name: "recycling_program".into(), enabled: true };
    apply(&town, enable());
    apply(&town, enable());
    assert_eq!(town.store.require_city(CITY).unwrap().economy.ordinances, vec!["recycling_program"]);

    apply(&town, AdminCommand::SetOrdinance { name: "recycling_program".into(), enabled: false });
    assert!(town.store.require_city(CITY).unwrap().economy.ordinances.is_empty());
}

#[test]
fn negative_funding_is_floored_at_zero() {
    let town = Town::new();
    apply(&town, AdminCommand::SetDepartmentFunding { department: "parks".into(), percent: -20.0 });
    assert_eq!(town.store.require_city(CITY).unwrap().economy.department_funding["parks"], 0.0);
}

#[test]
fn bonds_fund_the_treasury_and_are_recorded() {
    let town = Town::new();
    let day = town.day(3);
    AdminCommand::IssueBond { principal: 20_000.0, annual_rate: 4.0 }
        .apply(CITY, &town.store, &day)
        .unwrap();

    let city = town.store.require_city(CITY).unwrap();
    assert_eq!(city.treasury, 120_000.0);
    assert_eq!(city.economy.bonds.len(), 1);
    assert_eq!(city.economy.bonds[0].issued_day, 3);
}

#[test]
fn leases_only_take_vacant_units() {
    let town = Town::new();
    let house = town.built((2, 2), "house");
    let unit = town.store.insert_rental_unit(CITY, house, 1, 1, "house", 300.0).unwrap();
    let first = town.agent("First", 0.0);
    let second = town.agent("Second", 0.0);

    apply(&town, AdminCommand::LeaseUnit { unit_id: unit, agent_id: first });
    apply(&town, AdminCommand::LeaseUnit { unit_id: unit, agent_id: second });

    let record = town.store.rental_unit(CITY, unit).unwrap().unwrap();
    assert_eq!(record.tenant_id, Some(first));
    assert_eq!(record.status, UnitStatus::Occupied);
    assert_eq!(record.lease_start, Some(0));
}

#[test]
fn missing_targets_are_ignored() {
    let town = Town::new();
    let events = AdminCommand::DemolishBuilding { building_id: 9_999 }
        .apply(CITY, &town.store, &town.time(0))
        .unwrap();
    assert!(events.is_empty());

    let house = town.built((2, 2), "house");
    let unit = town.store.insert_rental_unit(CITY, house, 1, 1, "house", 300.0).unwrap();
    apply(&town, AdminCommand::LeaseUnit { unit_id: unit, agent_id: 9_999 });
    assert_eq!(town.store.rental_unit(CITY, unit).unwrap().unwrap().tenant_id, None);
}

#[test]
fn commands_round_trip_through_json() {
    let json = r#"{"cmd":"set_tax_rate","zone":"industrial","rate":7.5}"#;
    let command: AdminCommand = serde_json::from_str(json).unwrap();
    assert_eq!(command, AdminCommand::SetTaxRate { zone: ZoneClass::Industrial, rate: 7.5 });
}
