//! Validated lookup from logical position to physical output.
//!
//! See [`AddressMap`] for details.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::config::{ConfigEntry, DriverAddress, Position};
use crate::{Error, Result};

/// Read-only index built once per session from configuration entries.
///
/// Entries are indexed by [`Position`] and grouped by [`DriverAddress`]. The grouping is what
/// lets a session initialize each driver chip exactly once, no matter how many of its channels
/// are in use.
///
/// ```rust
/// use led_array_controller::AddressMap;
/// use led_array_controller::config::{parse_str, DriverAddress, Position};
///
/// let map = AddressMap::build(parse_str("1 3 0\n2 0 64\n3 1 64\n4 0 65")?)?;
/// assert_eq!(map.resolve(Position(3))?.pin_or_channel, 1);
/// assert_eq!(
///     map.driver_addresses().collect::<Vec<_>>(),
///     [DriverAddress::new(64).unwrap(), DriverAddress::new(65).unwrap()]
/// );
/// # Ok::<(), led_array_controller::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressMap {
    by_position: BTreeMap<Position, ConfigEntry>,
    by_address: BTreeMap<DriverAddress, Vec<ConfigEntry>>,
}

impl AddressMap {
    /// Index entries in a single pass.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicatePosition`] if two entries declare the same position.
    pub fn build(entries: impl IntoIterator<Item = ConfigEntry>) -> Result<Self> {
        let mut map = Self::default();
        for entry in entries {
            match map.by_position.entry(entry.position) {
                Entry::Occupied(_) => {
                    return Err(Error::DuplicatePosition {
                        position: entry.position,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
            map.by_address
                .entry(entry.driver_address)
                .or_default()
                .push(entry);
        }
        Ok(map)
    }

    /// Entry bound to `position`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPosition`] if the position is not configured.
    pub fn resolve(&self, position: Position) -> Result<ConfigEntry> {
        self.by_position
            .get(&position)
            .copied()
            .ok_or(Error::UnknownPosition { position })
    }

    /// Entry bound to `row`, which must be a direct pin.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPosition`] if the row is not configured or is a driver channel.
    pub fn resolve_row(&self, row: Position) -> Result<ConfigEntry> {
        self.resolve(row)
            .ok()
            .filter(|entry| entry.driver_address.is_direct())
            .ok_or(Error::UnknownPosition { position: row })
    }

    /// Entry bound to `column`, which must be a driver channel.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPosition`] if the column is not configured or is a direct pin.
    pub fn resolve_column(&self, column: Position) -> Result<ConfigEntry> {
        self.resolve(column)
            .ok()
            .filter(|entry| !entry.driver_address.is_direct())
            .ok_or(Error::UnknownPosition { position: column })
    }

    /// True if `position` is configured.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.by_position.contains_key(&position)
    }

    /// Distinct driver chip addresses in ascending order, excluding the direct-pin sentinel.
    pub fn driver_addresses(&self) -> impl Iterator<Item = DriverAddress> + '_ {
        self.by_address
            .keys()
            .copied()
            .filter(|address| !address.is_direct())
    }

    /// Entries behind one address, in configuration order.
    #[must_use]
    pub fn entries_at(&self, address: DriverAddress) -> &[ConfigEntry] {
        self.by_address
            .get(&address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entries wired straight to microcontroller pins.
    #[must_use]
    pub fn direct_entries(&self) -> &[ConfigEntry] {
        self.entries_at(DriverAddress::DIRECT)
    }

    /// All entries in position order.
    pub fn entries(&self) -> impl Iterator<Item = &ConfigEntry> + '_ {
        self.by_position.values()
    }

    /// All configured positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.by_position.keys().copied()
    }

    /// Number of configured positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    /// True when nothing is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}
