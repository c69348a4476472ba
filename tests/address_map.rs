#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for the position index.

use led_array_controller::config::{DriverAddress, Position, parse_str};
use led_array_controller::{AddressMap, Error};

fn address(value: u8) -> DriverAddress {
    DriverAddress::new(value).expect("address in range")
}

#[test]
fn every_declared_position_resolves_to_its_entry() {
    let entries = parse_str("3 1 64\n1 3 0\n2 0 64\n4 7 0\n5 0 65").expect("valid config");
    let map = AddressMap::build(entries.clone()).expect("unique positions");
    for entry in &entries {
        assert_eq!(map.resolve(entry.position).expect("declared"), *entry);
    }
    assert_eq!(map.len(), entries.len());
}

#[test]
fn positions_iterate_in_ascending_order() {
    let map = AddressMap::build(parse_str("3 1 64\n1 3 0\n2 0 64").expect("valid"))
        .expect("unique positions");
    assert_eq!(
        map.positions().collect::<Vec<_>>(),
        [Position(1), Position(2), Position(3)]
    );
}

#[test]
fn unknown_position_fails() {
    let map = AddressMap::build(parse_str("1 3 0").expect("valid")).expect("unique positions");
    assert!(matches!(
        map.resolve(Position(9)),
        Err(Error::UnknownPosition {
            position: Position(9)
        })
    ));
    assert!(!map.contains(Position(9)));
    assert!(map.contains(Position(1)));
}

#[test]
fn duplicate_position_fails_construction() {
    let entries = parse_str("1 3 0\n1 0 64").expect("bindings differ");
    assert!(matches!(
        AddressMap::build(entries),
        Err(Error::DuplicatePosition {
            position: Position(1)
        })
    ));
}

#[test]
fn driver_addresses_are_distinct_and_exclude_direct_pins() {
    let entries = parse_str("1 3 0\n2 4 0\n3 0 64\n4 1 64\n5 2 64\n6 0 65").expect("valid");
    let map = AddressMap::build(entries).expect("unique positions");
    assert_eq!(
        map.driver_addresses().collect::<Vec<_>>(),
        [address(64), address(65)]
    );
}

#[test]
fn entries_are_grouped_by_address() {
    let entries = parse_str("1 3 0\n2 0 64\n3 4 0\n4 1 64\n5 0 65").expect("valid");
    let map = AddressMap::build(entries).expect("unique positions");

    let direct: Vec<_> = map.direct_entries().iter().map(|e| e.position).collect();
    assert_eq!(direct, [Position(1), Position(3)]);

    let chip: Vec<_> = map
        .entries_at(address(64))
        .iter()
        .map(|e| e.pin_or_channel)
        .collect();
    assert_eq!(chip, [0, 1]);

    assert!(map.entries_at(address(70)).is_empty());
}

#[test]
fn empty_map_has_nothing() {
    let map = AddressMap::build(Vec::new()).expect("empty is valid");
    assert!(map.is_empty());
    assert_eq!(map.driver_addresses().count(), 0);
    assert!(map.direct_entries().is_empty());
}
