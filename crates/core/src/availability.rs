//! Availability slots
//!
//! When the customer can receive (or collect) the goods. An order may list
//! several slots; one of them becomes the order's effective availability.

use jiff::civil::{Date, Time};
use serde::{Deserialize, Serialize};

/// One slot offered by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Position in the customer's list, starting at 1.
    pub slot_number: u32,

    /// Day.
    pub date: Date,

    /// Time of day, if the customer gave one.
    #[serde(default)]
    pub time: Option<Time>,

    /// Whether the customer marked this slot as their preference.
    #[serde(default)]
    pub is_preferred: bool,
}

/// The slot an order is scheduled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveAvailability {
    /// Day.
    pub date: Date,

    /// Time of day; the default time when the slot had none.
    pub time: Time,
}

/// Pick the effective slot: the first one marked preferred, else the first
/// one listed, else none.
pub fn resolve_availability(
    slots: &[AvailabilitySlot],
    default_time: Time,
) -> Option<EffectiveAvailability> {
    slots
        .iter()
        .find(|slot| slot.is_preferred)
        .or_else(|| slots.first())
        .map(|slot| EffectiveAvailability {
            date: slot.date,
            time: slot.time.unwrap_or(default_time),
        })
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};

    use super::*;

    fn slot(slot_number: u32, day: i8, at: Option<Time>, is_preferred: bool) -> AvailabilitySlot {
        AvailabilitySlot {
            slot_number,
            date: date(2026, 3, day),
            time: at,
            is_preferred,
        }
    }

    #[test]
    fn preferred_slot_wins() {
        let slots = [
            slot(1, 10, Some(time(8, 0, 0, 0)), false),
            slot(2, 11, Some(time(14, 0, 0, 0)), true),
        ];

        assert_eq!(
            resolve_availability(&slots, time(9, 0, 0, 0)),
            Some(EffectiveAvailability {
                date: date(2026, 3, 11),
                time: time(14, 0, 0, 0),
            })
        );
    }

    #[test]
    fn falls_back_to_first_slot() {
        let slots = [slot(1, 10, Some(time(8, 0, 0, 0)), false), slot(2, 11, None, false)];

        assert_eq!(
            resolve_availability(&slots, time(9, 0, 0, 0)).map(|a| a.date),
            Some(date(2026, 3, 10))
        );
    }

    #[test]
    fn missing_time_uses_default() {
        let slots = [slot(1, 10, None, true)];

        assert_eq!(
            resolve_availability(&slots, time(9, 0, 0, 0)).map(|a| a.time),
            Some(time(9, 0, 0, 0))
        );
    }

    #[test]
    fn no_slots_means_no_availability() {
        assert_eq!(resolve_availability(&[], time(9, 0, 0, 0)), None);
    }
}
