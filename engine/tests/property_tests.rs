use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use savor_engine::dialog::slots::validate;
use savor_engine::dialog::{SlotName, SlotSet, Validation, ViolationKind};

/// Fixed reference instant so time validation is deterministic
fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn valid_locations() -> Vec<&'static str> {
    vec!["brooklyn", "manhattan"]
}

fn valid_cuisines() -> Vec<&'static str> {
    vec![
        "indian",
        "italian",
        "ethiopian",
        "american",
        "mexican",
        "japanese",
        "french",
        "spanish",
        "chinese",
    ]
}

fn slot_set(location: &str, cuisine: &str, time: &str, people: &str, email: &str) -> SlotSet {
    SlotSet {
        location: location.to_string(),
        cuisine: cuisine.to_string(),
        time: time.to_string(),
        people: people.to_string(),
        email: email.to_string(),
    }
}

// Property: any combination of supported values completes validation
proptest! {
    #[test]
    fn test_supported_values_always_complete(
        location in proptest::sample::select(valid_locations()),
        cuisine in proptest::sample::select(valid_cuisines()),
        hour in 0..24u32,
        minute in 0..60u32,
        people in 1..=10u32,
        local in "[a-z0-9]{1,10}",
        domain in "[a-z0-9]{1,10}",
        tld in "[a-z]{2,6}",
    ) {
        let slots = slot_set(
            location,
            cuisine,
            &format!("{}:{:02}", hour, minute),
            &people.to_string(),
            &format!("{}@{}.{}", local, domain, tld),
        );

        prop_assert_eq!(validate(&slots, noon()), Validation::Complete);
    }
}

// Property: blanking a single slot elicits exactly that slot, in the fixed
// Location, Cuisine, Time, People, Email order
proptest! {
    #[test]
    fn test_single_gap_elicits_that_slot(gap in 0..5usize) {
        let mut slots = slot_set("brooklyn", "japanese", "7pm", "4", "diner@example.com");

        let expected = SlotName::ORDERED[gap];
        match expected {
            SlotName::Location => slots.location.clear(),
            SlotName::Cuisine => slots.cuisine.clear(),
            SlotName::Time => slots.time.clear(),
            SlotName::People => slots.people.clear(),
            SlotName::Email => slots.email.clear(),
        }

        match validate(&slots, noon()) {
            Validation::Violated { slot, kind, .. } => {
                prop_assert_eq!(slot, expected);
                prop_assert_eq!(kind, ViolationKind::Missing);
            }
            Validation::Complete => prop_assert!(false, "gap must violate"),
        }
    }
}

// Property: an earlier gap always wins over a later invalid value
proptest! {
    #[test]
    fn test_earlier_gap_shadows_later_rejection(gap in 0..4usize) {
        // Email is deliberately invalid in every case
        let mut slots = slot_set("brooklyn", "japanese", "7pm", "4", "not-an-email");

        let expected = SlotName::ORDERED[gap];
        match expected {
            SlotName::Location => slots.location.clear(),
            SlotName::Cuisine => slots.cuisine.clear(),
            SlotName::Time => slots.time.clear(),
            SlotName::People => slots.people.clear(),
            SlotName::Email => unreachable!(),
        }

        match validate(&slots, noon()) {
            Validation::Violated { slot, .. } => prop_assert_eq!(slot, expected),
            Validation::Complete => prop_assert!(false, "gap must violate"),
        }
    }
}

// Property: party size is accepted exactly in the 1..=10 range
proptest! {
    #[test]
    fn test_people_bounds(n in 0..50u32) {
        let slots = slot_set("brooklyn", "japanese", "7pm", &n.to_string(), "diner@example.com");

        let outcome = validate(&slots, noon());
        if (1..=10).contains(&n) {
            prop_assert_eq!(outcome, Validation::Complete);
        } else {
            match outcome {
                Validation::Violated { slot, kind, .. } => {
                    prop_assert_eq!(slot, SlotName::People);
                    prop_assert_eq!(kind, ViolationKind::Rejected);
                }
                Validation::Complete => prop_assert!(false, "out-of-range size must reject"),
            }
        }
    }
}

// Property: every well-formed clock value is accepted; the engine corrects
// past instants forward rather than rejecting them
proptest! {
    #[test]
    fn test_wellformed_times_always_accepted(
        hour in 0..24u32,
        minute in 0..60u32,
        with_minutes in any::<bool>(),
    ) {
        let time = if with_minutes {
            format!("{}:{:02}", hour, minute)
        } else {
            hour.to_string()
        };

        let slots = slot_set("brooklyn", "japanese", &time, "4", "diner@example.com");
        prop_assert_eq!(validate(&slots, noon()), Validation::Complete);
    }

    #[test]
    fn test_wellformed_meridiem_times_always_accepted(
        hour in 1..=12u32,
        minute in 0..60u32,
        pm in any::<bool>(),
    ) {
        let time = format!("{}:{:02}{}", hour, minute, if pm { "pm" } else { "am" });

        let slots = slot_set("brooklyn", "japanese", &time, "4", "diner@example.com");
        prop_assert_eq!(validate(&slots, noon()), Validation::Complete);
    }
}

// Property: alphabetic garbage never passes the time slot
proptest! {
    #[test]
    fn test_unparseable_times_always_rejected(garbage in "[a-z]{1,12}") {
        // "am"/"pm" alone would strip to an empty clock and still fail to
        // parse, so the whole alphabetic space is rejected
        let slots = slot_set("brooklyn", "japanese", &garbage, "4", "diner@example.com");

        match validate(&slots, noon()) {
            Validation::Violated { slot, kind, .. } => {
                prop_assert_eq!(slot, SlotName::Time);
                prop_assert_eq!(kind, ViolationKind::Rejected);
            }
            Validation::Complete => prop_assert!(false, "garbage time must reject"),
        }
    }
}

// Property: addresses without an @ or a dotted domain never pass
proptest! {
    #[test]
    fn test_addresses_without_structure_rejected(raw in "[a-z0-9]{1,20}") {
        let slots = slot_set("brooklyn", "japanese", "7pm", "4", &raw);

        match validate(&slots, noon()) {
            Validation::Violated { slot, .. } => prop_assert_eq!(slot, SlotName::Email),
            Validation::Complete => prop_assert!(false, "bare string must reject"),
        }
    }
}
