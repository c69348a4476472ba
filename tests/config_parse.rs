#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for configuration parsing.

use std::io::Write;

use led_array_controller::config::{ConfigEntry, DriverAddress, Position, Target, parse, parse_str};
use led_array_controller::{Error, MalformedReason};
use tempfile::NamedTempFile;

fn entry(position: u16, pin_or_channel: u16, address: u8) -> ConfigEntry {
    ConfigEntry {
        position: Position(position),
        pin_or_channel,
        driver_address: DriverAddress::new(address).expect("address in range"),
    }
}

fn malformed_reason(text: &str) -> (usize, MalformedReason) {
    match parse_str(text) {
        Err(Error::MalformedConfig { line, reason }) => (line, reason),
        other => panic!("expected MalformedConfig, got {other:?}"),
    }
}

#[test]
fn mixed_pins_and_channels_parse_in_file_order() {
    let entries = parse_str("1 3 0\n2 0 64\n3 1 64").expect("valid config");
    assert_eq!(entries, [entry(1, 3, 0), entry(2, 0, 64), entry(3, 1, 64)]);
    assert_eq!(entries[0].target(), Target::DirectPin { pin: 3 });
    assert_eq!(
        entries[1].target(),
        Target::DriverChannel {
            address: DriverAddress::DEFAULT_PCA9685,
            channel: 0
        }
    );
}

#[test]
fn blank_lines_comments_and_tabs_are_accepted() {
    let text = "# rows\n1\t3\t0\n\n   \n2 0 64  # first column\n";
    let entries = parse_str(text).expect("valid config");
    assert_eq!(entries, [entry(1, 3, 0), entry(2, 0, 64)]);
}

#[test]
fn empty_text_gives_no_entries() {
    assert!(parse_str("").expect("empty is valid").is_empty());
}

#[test]
fn wrong_token_count_is_malformed() {
    assert_eq!(
        malformed_reason("1 3 0\n2 0"),
        (2, MalformedReason::TokenCount(2))
    );
    assert_eq!(
        malformed_reason("1 3 0 7"),
        (1, MalformedReason::TokenCount(4))
    );
}

#[test]
fn non_integer_token_is_malformed() {
    assert_eq!(malformed_reason("1 x 0"), (1, MalformedReason::NotInteger(2)));
    assert_eq!(malformed_reason("1.5 3 0"), (1, MalformedReason::NotInteger(1)));
}

#[test]
fn position_must_be_positive() {
    assert_eq!(
        malformed_reason("0 3 0"),
        (1, MalformedReason::PositionNotPositive)
    );
    assert_eq!(
        malformed_reason("-2 3 0"),
        (1, MalformedReason::PositionNotPositive)
    );
}

#[test]
fn negative_pin_is_malformed() {
    assert_eq!(
        malformed_reason("1 -1 0"),
        (1, MalformedReason::NegativePinOrChannel)
    );
}

#[test]
fn driver_address_must_be_seven_bit() {
    assert_eq!(
        malformed_reason("1 0 128"),
        (1, MalformedReason::AddressOutOfRange)
    );
    assert_eq!(
        malformed_reason("1 0 -1"),
        (1, MalformedReason::AddressOutOfRange)
    );
    assert!(parse_str("1 0 127").is_ok());
}

#[test]
fn oversized_values_are_malformed() {
    assert_eq!(
        malformed_reason("70000 0 0"),
        (1, MalformedReason::ValueTooLarge)
    );
    assert_eq!(
        malformed_reason("1 99999999999999999999 64"),
        (1, MalformedReason::ValueTooLarge)
    );
    assert_eq!(
        malformed_reason("1 3 -99999999999999999999"),
        (1, MalformedReason::ValueTooLarge)
    );
}

#[test]
fn same_direct_pin_twice_is_duplicate_binding() {
    let error = parse_str("1 5 0\n2 5 0").expect_err("pin 5 bound twice");
    assert!(matches!(
        error,
        Error::DuplicateBinding {
            line: 2,
            first_line: 1,
            pin_or_channel: 5,
            ..
        }
    ));
}

#[test]
fn duplicate_binding_is_detected_across_the_whole_file() {
    let error = parse_str("1 0 64\n2 1 64\n3 2 64\n4 0 64").expect_err("channel 0 bound twice");
    assert!(matches!(
        error,
        Error::DuplicateBinding {
            line: 4,
            first_line: 1,
            ..
        }
    ));
}

#[test]
fn same_number_on_different_addresses_is_allowed() {
    let entries = parse_str("1 5 0\n2 5 64\n3 5 65").expect("different domains");
    assert_eq!(entries.len(), 3);
}

#[test]
fn parse_reads_a_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "1 3 0")?;
    writeln!(file, "2 0 64")?;
    let entries = parse(file.path())?;
    assert_eq!(entries, [entry(1, 3, 0), entry(2, 0, 64)]);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing.txt");
    let error = parse(&path).expect_err("file does not exist");
    assert!(matches!(error, Error::Io { path: ref reported, .. } if *reported == path));
    assert!(error.is_construction_error());
}

#[test]
fn error_messages_name_the_line() {
    let error = parse_str("1 3 0\nfoo").expect_err("malformed");
    assert_eq!(
        error.to_string(),
        "configuration line 2: expected 3 tokens, found 1"
    );
}

#[test]
fn driver_address_is_seven_bit() {
    assert_eq!(DriverAddress::new(127).map(DriverAddress::get), Some(127));
    assert!(DriverAddress::new(128).is_none());
    assert!(DriverAddress::new(0).is_some_and(DriverAddress::is_direct));
}
