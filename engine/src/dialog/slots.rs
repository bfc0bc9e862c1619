//! Slot validation for dining requests
//!
//! Pure functions: given the raw slot values the recognition engine
//! extracted and a reference "now", decide whether the request is complete
//! or which single slot to re-prompt for. Evaluation order is fixed
//! (Location, Cuisine, Time, People, Email) and stops at the first
//! violation, so the user is only ever asked about one thing at a time.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Locations with restaurant coverage
const LOCATIONS: &[&str] = &["brooklyn", "manhattan"];

/// Cuisines the catalog can answer for
const CUISINES: &[&str] = &[
    "indian",
    "italian",
    "ethiopian",
    "american",
    "mexican",
    "japanese",
    "french",
    "spanish",
    "chinese",
];

/// Email shape check. Compiled once and reused.
static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("Invalid email pattern")
    })
}

/// The five request slots, in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotName {
    Location,
    Cuisine,
    Time,
    People,
    Email,
}

impl SlotName {
    /// Validation order; also the order the conversation fills slots in.
    pub const ORDERED: [SlotName; 5] = [
        SlotName::Location,
        SlotName::Cuisine,
        SlotName::Time,
        SlotName::People,
        SlotName::Email,
    ];

    /// Slot name as the recognition engine spells it.
    pub fn wire_name(&self) -> &'static str {
        match self {
            SlotName::Location => "Location",
            SlotName::Cuisine => "Cuisine",
            SlotName::Time => "Time",
            SlotName::People => "People",
            SlotName::Email => "Email",
        }
    }

    /// Prompt asking the user to supply this slot.
    pub fn elicitation_prompt(&self) -> &'static str {
        match self {
            SlotName::Location => "Where would you like to eat? Brooklyn or Manhattan?",
            SlotName::Cuisine => "What type of cuisine do you prefer?",
            SlotName::Time => "What time do you prefer?",
            SlotName::People => "How many people (including you) are going?",
            SlotName::Email => "Please share your email address.",
        }
    }
}

/// Raw slot values for one dining request
///
/// Values are kept as the engine produced them; validation interprets but
/// never rewrites them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotSet {
    pub location: String,
    pub cuisine: String,
    pub time: String,
    pub people: String,
    pub email: String,
}

impl SlotSet {
    /// Build from the engine's slot map; absent slots become empty strings.
    pub fn from_map(slots: &HashMap<String, String>) -> Self {
        let pick = |name: &str| slots.get(name).cloned().unwrap_or_default();

        Self {
            location: pick("Location"),
            cuisine: pick("Cuisine"),
            time: pick("Time"),
            people: pick("People"),
            email: pick("Email"),
        }
    }

    /// Value for a slot by name.
    pub fn get(&self, slot: SlotName) -> &str {
        match slot {
            SlotName::Location => &self.location,
            SlotName::Cuisine => &self.cuisine,
            SlotName::Time => &self.time,
            SlotName::People => &self.people,
            SlotName::Email => &self.email,
        }
    }
}

/// Why a slot failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// The slot is empty; ask for it
    Missing,
    /// The slot has a value the rules reject; ask again
    Rejected,
}

/// Outcome of validating a slot set
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Every slot present and valid
    Complete,
    /// First violated slot, with the prompt to send back
    Violated {
        slot: SlotName,
        kind: ViolationKind,
        prompt: String,
    },
}

/// Validate a slot set against a reference instant.
///
/// `now` is injected so time acceptance is deterministic under test;
/// production callers pass `Local::now().naive_local()`.
pub fn validate(slots: &SlotSet, now: NaiveDateTime) -> Validation {
    for slot in SlotName::ORDERED {
        let value = slots.get(slot);

        if value.trim().is_empty() {
            return Validation::Violated {
                slot,
                kind: ViolationKind::Missing,
                prompt: slot.elicitation_prompt().to_string(),
            };
        }

        if let Some(prompt) = rejection(slot, value, now) {
            return Validation::Violated {
                slot,
                kind: ViolationKind::Rejected,
                prompt,
            };
        }
    }

    Validation::Complete
}

/// Rejection prompt for a non-empty value, or `None` when it passes.
fn rejection(slot: SlotName, value: &str, now: NaiveDateTime) -> Option<String> {
    match slot {
        SlotName::Location => {
            let normalized = value.trim().to_lowercase();
            (!LOCATIONS.contains(&normalized.as_str())).then(|| {
                "We do not have restaurants there. Please choose from Manhattan or Brooklyn."
                    .to_string()
            })
        }
        SlotName::Cuisine => {
            let normalized = value.trim().to_lowercase();
            (!CUISINES.contains(&normalized.as_str())).then(|| {
                format!(
                    "We do not have any restaurant that serves {}. Would you like a different cuisine?",
                    value.trim()
                )
            })
        }
        SlotName::Time => resolve_future_instant(value, now)
            .is_none()
            .then(|| "Please enter a valid time in the future.".to_string()),
        SlotName::People => {
            let valid = value
                .trim()
                .parse::<u32>()
                .map(|n| (1..=10).contains(&n))
                .unwrap_or(false);
            (!valid).then(|| {
                "Please enter a valid number of people (between 1 and 10).".to_string()
            })
        }
        SlotName::Email => (!email_pattern().is_match(value.trim()))
            .then(|| "Please enter a valid email address.".to_string()),
    }
}

/// Interpret a raw time-of-day on today's date and nudge it into the
/// future: a past instant gains 12 hours when the input carried no am/pm
/// marker, then rolls to the next day if still past. Returns the resolved
/// instant, or `None` when the input doesn't parse or can't land in the
/// future.
fn resolve_future_instant(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (time, has_meridiem) = parse_time_of_day(raw)?;

    let mut candidate = NaiveDateTime::new(now.date(), time);
    if candidate <= now {
        if !has_meridiem {
            candidate += Duration::hours(12);
        }
        if candidate <= now {
            candidate += Duration::days(1);
        }
    }

    (candidate > now).then_some(candidate)
}

/// Parse `H`, `HH`, `H:MM`, optionally suffixed with am/pm (any case,
/// optional space). Returns the time and whether a meridiem was given.
fn parse_time_of_day(raw: &str) -> Option<(NaiveTime, bool)> {
    let normalized = raw.trim().to_lowercase();

    let (clock, is_pm) = if let Some(stripped) = normalized.strip_suffix("am") {
        (stripped.trim_end(), Some(false))
    } else if let Some(stripped) = normalized.strip_suffix("pm") {
        (stripped.trim_end(), Some(true))
    } else {
        (normalized.as_str(), None)
    };

    let (hour_str, minute_str) = match clock.split_once(':') {
        Some((h, m)) => (h, m),
        None => (clock, "0"),
    };

    let hour: u32 = hour_str.trim().parse().ok()?;
    let minute: u32 = minute_str.trim().parse().ok()?;
    if minute > 59 {
        return None;
    }

    let hour = match is_pm {
        // 12-hour clock: 12am is midnight, 12pm is noon
        Some(pm) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            }
        }
        None => {
            if hour > 23 {
                return None;
            }
            hour
        }
    };

    NaiveTime::from_hms_opt(hour, minute, 0).map(|t| (t, is_pm.is_some()))
}
