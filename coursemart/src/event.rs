//! Events: scheduled sessions with a fee, a venue and a limited seat count.
//!
//! Events are submitted as multipart forms, so every field arrives as text.
//! [`EventForm`] carries that raw text; [`Event`] is the parsed, validated
//! field set that gets persisted. The same form type serves as both the
//! create draft (all fields required) and the update patch (absent fields
//! keep their stored value).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use nutype::nutype;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ValidationError;
use crate::resource::{Capabilities, Resource};
use crate::store::Collection;
use crate::validation::letters_and_spaces;

/// Event headline.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(Debug, Clone, PartialEq, Eq, AsRef, Deref, Display, Serialize, Deserialize)
)]
pub struct EventTitle(String);

/// Venue, free text.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(Debug, Clone, PartialEq, Eq, AsRef, Deref, Display, Serialize, Deserialize)
)]
pub struct Location(String);

/// Long-form description.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 5000),
    derive(Debug, Clone, PartialEq, Eq, AsRef, Deref, Display, Serialize, Deserialize)
)]
pub struct EventDescription(String);

/// Name of the person running the event: letters and spaces only.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 100, predicate = letters_and_spaces),
    derive(Debug, Clone, PartialEq, Eq, AsRef, Deref, Display, Serialize, Deserialize)
)]
pub struct ResourcePerson(String);

/// Attendance fee. Zero means free.
#[nutype(
    validate(finite, greater_or_equal = 0.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into, Serialize, Deserialize)
)]
pub struct EventFee(f64);

/// Number of seats on offer. Always at least one.
#[nutype(
    validate(greater = 0),
    derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Into, Serialize, Deserialize)
)]
pub struct SeatCount(u32);

/// Event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// "Business"
    Business,
    /// "Data science"
    #[serde(rename = "Data science")]
    DataScience,
    /// "Web development"
    #[serde(rename = "Web development")]
    WebDevelopment,
    /// "Finance"
    Finance,
    /// "Health"
    Health,
    /// "Art & Design"
    #[serde(rename = "Art & Design")]
    ArtAndDesign,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Business,
        Self::DataScience,
        Self::WebDevelopment,
        Self::Finance,
        Self::Health,
        Self::ArtAndDesign,
    ];

    /// The label used on the wire and in the UI.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::DataScience => "Data science",
            Self::WebDevelopment => "Web development",
            Self::Finance => "Finance",
            Self::Health => "Health",
            Self::ArtAndDesign => "Art & Design",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when text names no [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Start time of day, written `HH:MM` on a 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StartTime(NaiveTime);

impl StartTime {
    /// The time of day.
    pub const fn time(self) -> NaiveTime {
        self.0
    }
}

/// Returned when text is not an `HH:MM` time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid start time: {0}")]
pub struct InvalidStartTime(String);

impl FromStr for StartTime {
    type Err = InvalidStartTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let well_shaped = s.len() == 5 && s.as_bytes()[2] == b':';
        if !well_shaped {
            return Err(InvalidStartTime(s.to_string()));
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self)
            .map_err(|_| InvalidStartTime(s.to_string()))
    }
}

impl fmt::Display for StartTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for StartTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StartTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Headline.
    pub title: EventTitle,
    /// Attendance fee.
    pub event_fee: EventFee,
    /// Venue.
    pub location: Location,
    /// Category.
    pub category: Category,
    /// Description.
    pub event_description: EventDescription,
    /// Who runs it.
    pub resource_person: ResourcePerson,
    /// Calendar day.
    pub event_date: NaiveDate,
    /// Start time of day.
    pub start_time: StartTime,
    /// Seats on offer.
    pub allocated_seats: SeatCount,
    /// Relative path of the uploaded image, e.g. `uploads/<file>.png`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Raw event fields as submitted through a form.
///
/// `image` is never read from client text: the HTTP layer fills it in with
/// the stored path after saving an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventForm {
    /// `title`
    pub title: Option<String>,
    /// `eventFee`
    pub event_fee: Option<String>,
    /// `location`
    pub location: Option<String>,
    /// `category`
    pub category: Option<String>,
    /// `eventDescription`
    pub event_description: Option<String>,
    /// `resourcePerson`
    pub resource_person: Option<String>,
    /// `eventDate`
    pub event_date: Option<String>,
    /// `startTime`
    pub start_time: Option<String>,
    /// `allocatedSeats`
    pub allocated_seats: Option<String>,
    /// Stored image path, set by the server.
    #[serde(skip)]
    pub image: Option<String>,
}

impl EventForm {
    /// Wire names of the text fields, in form order.
    pub const TEXT_FIELDS: [&'static str; 9] = [
        "title",
        "eventFee",
        "location",
        "category",
        "eventDescription",
        "resourcePerson",
        "eventDate",
        "startTime",
        "allocatedSeats",
    ];

    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "title" => Some(&mut self.title),
            "eventFee" => Some(&mut self.event_fee),
            "location" => Some(&mut self.location),
            "category" => Some(&mut self.category),
            "eventDescription" => Some(&mut self.event_description),
            "resourcePerson" => Some(&mut self.resource_person),
            "eventDate" => Some(&mut self.event_date),
            "startTime" => Some(&mut self.start_time),
            "allocatedSeats" => Some(&mut self.allocated_seats),
            _ => None,
        }
    }

    /// Store the text value of the form field `name`.
    ///
    /// Returns `false` when `name` is not an event text field.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.slot(name) {
            Some(slot) => {
                *slot = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Builder form of [`EventForm::set`] for known field names.
    ///
    /// Debug builds panic on a name outside [`EventForm::TEXT_FIELDS`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        let known = self.set(name, value);
        debug_assert!(known, "unknown event form field: {name}");
        self
    }

    /// The text fields that carry a value, as `(wire name, value)` pairs.
    pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let values = [
            &self.title,
            &self.event_fee,
            &self.location,
            &self.category,
            &self.event_description,
            &self.resource_person,
            &self.event_date,
            &self.start_time,
            &self.allocated_seats,
        ];
        Self::TEXT_FIELDS
            .into_iter()
            .zip(values)
            .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
            .collect()
    }
}

/// Resolve one field: parse submitted text, or fall back to the stored value.
///
/// Blank text is always an error for required fields, even in an update: it
/// means the client cleared the field, not that it left it out.
fn resolve<T>(
    issues: &mut ValidationError,
    field: &'static str,
    raw: Option<String>,
    current: Option<T>,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    match raw {
        Some(text) if text.trim().is_empty() => {
            issues.push(field, "is required");
            None
        }
        Some(text) => match parse(text.trim()) {
            Ok(value) => Some(value),
            Err(reason) => {
                issues.push(field, reason);
                None
            }
        },
        None if current.is_some() => current,
        None => {
            issues.push(field, "is required");
            None
        }
    }
}

fn parse_event_date(text: &str) -> Result<NaiveDate, String> {
    // stored dates may come back from clients as full ISO timestamps
    let day = match text.split_once('T') {
        Some((day, _)) => day,
        None => text,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| "must be a date in YYYY-MM-DD format".to_string())
}

fn parse_fee(text: &str) -> Result<EventFee, String> {
    let amount: f64 = text.parse().map_err(|_| "must be a number".to_string())?;
    if !amount.is_finite() {
        return Err("must be a finite number".to_string());
    }
    EventFee::try_new(amount).map_err(|_| "must not be negative".to_string())
}

fn parse_seats(text: &str) -> Result<SeatCount, String> {
    text.parse::<u32>()
        .ok()
        .and_then(|seats| SeatCount::try_new(seats).ok())
        .ok_or_else(|| "must be a positive whole number".to_string())
}

fn parse_person(text: &str) -> Result<ResourcePerson, String> {
    if text.chars().count() > 100 {
        return Err("must be at most 100 characters".to_string());
    }
    ResourcePerson::try_new(text).map_err(|_| "must contain only letters and spaces".to_string())
}

fn category_choices() -> String {
    Category::ALL
        .iter()
        .map(|category| category.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Event {
    fn build(form: EventForm, current: Option<Self>) -> Result<Self, ValidationError> {
        let mut issues = ValidationError::default();
        let (
            title,
            event_fee,
            location,
            category,
            event_description,
            resource_person,
            event_date,
            start_time,
            allocated_seats,
            image,
        ) = match current {
            Some(event) => (
                Some(event.title),
                Some(event.event_fee),
                Some(event.location),
                Some(event.category),
                Some(event.event_description),
                Some(event.resource_person),
                Some(event.event_date),
                Some(event.start_time),
                Some(event.allocated_seats),
                event.image,
            ),
            None => (None, None, None, None, None, None, None, None, None, None),
        };

        let title = resolve(&mut issues, "title", form.title, title, |text| {
            EventTitle::try_new(text).map_err(|_| "must be at most 200 characters".to_string())
        });
        let event_fee = resolve(&mut issues, "eventFee", form.event_fee, event_fee, parse_fee);
        let location = resolve(&mut issues, "location", form.location, location, |text| {
            Location::try_new(text).map_err(|_| "must be at most 200 characters".to_string())
        });
        let category = resolve(&mut issues, "category", form.category, category, |text| {
            text.parse::<Category>()
                .map_err(|_| format!("must be one of {}", category_choices()))
        });
        let event_description = resolve(
            &mut issues,
            "eventDescription",
            form.event_description,
            event_description,
            |text| {
                EventDescription::try_new(text)
                    .map_err(|_| "must be at most 5000 characters".to_string())
            },
        );
        let resource_person = resolve(
            &mut issues,
            "resourcePerson",
            form.resource_person,
            resource_person,
            parse_person,
        );
        let event_date = resolve(
            &mut issues,
            "eventDate",
            form.event_date,
            event_date,
            parse_event_date,
        );
        let start_time = resolve(&mut issues, "startTime", form.start_time, start_time, |text| {
            text.parse::<StartTime>()
                .map_err(|_| "must be a time in HH:MM 24-hour format".to_string())
        });
        let allocated_seats = resolve(
            &mut issues,
            "allocatedSeats",
            form.allocated_seats,
            allocated_seats,
            parse_seats,
        );

        match (
            title,
            event_fee,
            location,
            category,
            event_description,
            resource_person,
            event_date,
            start_time,
            allocated_seats,
        ) {
            (
                Some(title),
                Some(event_fee),
                Some(location),
                Some(category),
                Some(event_description),
                Some(resource_person),
                Some(event_date),
                Some(start_time),
                Some(allocated_seats),
            ) if issues.is_empty() => Ok(Self {
                title,
                event_fee,
                location,
                category,
                event_description,
                resource_person,
                event_date,
                start_time,
                allocated_seats,
                image: form.image.or(image),
            }),
            _ => Err(issues),
        }
    }
}

impl Resource for Event {
    const COLLECTION: Collection = Collection::new("events");
    const LABEL: &'static str = "Event";
    const CAPABILITIES: Capabilities = Capabilities::ALL;

    type Draft = EventForm;
    type Patch = EventForm;

    fn validate(draft: EventForm) -> Result<Self, ValidationError> {
        Self::build(draft, None)
    }

    fn apply_patch(self, patch: EventForm) -> Result<Self, ValidationError> {
        Self::build(patch, Some(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn complete_form() -> EventForm {
        EventForm::default()
            .with("title", "Rust Meetup")
            .with("eventFee", "15.5")
            .with("location", "Hall A")
            .with("category", "Web development")
            .with("eventDescription", "An evening of systems programming")
            .with("resourcePerson", "Ada Lovelace")
            .with("eventDate", "2025-03-01")
            .with("startTime", "18:30")
            .with("allocatedSeats", "40")
    }

    #[test]
    fn complete_form_validates() {
        let event = Event::validate(complete_form()).expect("form is complete");

        assert_eq!(event.title.as_ref(), "Rust Meetup");
        assert_eq!(f64::from(event.event_fee), 15.5);
        assert_eq!(event.category, Category::WebDevelopment);
        assert_eq!(event.start_time.to_string(), "18:30");
        assert_eq!(u32::from(event.allocated_seats), 40);
        assert_eq!(event.image, None);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let error = Event::validate(EventForm::default()).expect_err("nothing submitted");

        let fields: Vec<_> = error.issues().iter().map(|issue| issue.field()).collect();
        assert_eq!(fields, EventForm::TEXT_FIELDS.to_vec());
    }

    #[test]
    fn zero_seats_are_rejected() {
        let error = Event::validate(complete_form().with("allocatedSeats", "0"))
            .expect_err("zero seats");

        assert_eq!(
            error.to_string(),
            "Validation failed: allocatedSeats must be a positive whole number"
        );
    }

    #[test]
    fn negative_fee_is_rejected() {
        let error = Event::validate(complete_form().with("eventFee", "-1")).expect_err("negative");

        assert_eq!(error.to_string(), "Validation failed: eventFee must not be negative");
    }

    #[test]
    fn non_finite_fees_are_rejected() {
        for raw in ["inf", "-inf", "NaN", "1e400"] {
            let error = Event::validate(complete_form().with("eventFee", raw)).expect_err(raw);

            assert_eq!(
                error.to_string(),
                "Validation failed: eventFee must be a finite number"
            );
        }
    }

    #[test]
    fn resource_person_must_be_letters_and_spaces() {
        let error = Event::validate(complete_form().with("resourcePerson", "Agent 47"))
            .expect_err("digits in name");

        assert_eq!(
            error.to_string(),
            "Validation failed: resourcePerson must contain only letters and spaces"
        );
    }

    #[test]
    fn unknown_category_lists_choices() {
        let error =
            Event::validate(complete_form().with("category", "Cooking")).expect_err("bad category");

        assert_eq!(
            error.to_string(),
            "Validation failed: category must be one of Business, Data science, Web development, Finance, Health, Art & Design"
        );
    }

    #[test]
    fn start_time_requires_two_digit_hours() {
        assert!("9:30".parse::<StartTime>().is_err());
        assert!("24:00".parse::<StartTime>().is_err());
        assert!("09:30".parse::<StartTime>().is_ok());
    }

    #[test]
    fn event_date_accepts_iso_timestamps() {
        let event = Event::validate(complete_form().with("eventDate", "2025-03-01T00:00:00.000Z"))
            .expect("timestamp prefix is a date");

        assert_eq!(event.event_date, NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"));
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let mut form = complete_form();
        form.image = Some("uploads/original.png".to_string());
        let event = Event::validate(form).expect("form is complete");

        let updated = event
            .clone()
            .apply_patch(EventForm::default().with("title", "Rust Meetup II"))
            .expect("partial patch is valid");

        assert_eq!(updated.title.as_ref(), "Rust Meetup II");
        assert_eq!(updated.location, event.location);
        assert_eq!(updated.image.as_deref(), Some("uploads/original.png"));
    }

    #[test]
    fn patch_replaces_image_when_supplied() {
        let mut form = complete_form();
        form.image = Some("uploads/original.png".to_string());
        let event = Event::validate(form).expect("form is complete");

        let patch = EventForm {
            image: Some("uploads/replacement.png".to_string()),
            ..EventForm::default()
        };
        let updated = event.apply_patch(patch).expect("image-only patch is valid");

        assert_eq!(updated.image.as_deref(), Some("uploads/replacement.png"));
    }

    #[test]
    fn patch_cannot_blank_a_required_field() {
        let event = Event::validate(complete_form()).expect("form is complete");

        let error = event
            .apply_patch(EventForm::default().with("location", "  "))
            .expect_err("blank location");

        assert_eq!(error.to_string(), "Validation failed: location is required");
    }

    #[test]
    fn set_rejects_unknown_names() {
        let mut form = EventForm::default();

        assert!(!form.set("price", "10"));
        assert!(form.set("title", "Workshop"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unknown event form field: price")]
    fn with_panics_on_a_misspelled_field() {
        let _form = EventForm::default().with("price", "10");
    }

    #[test]
    fn text_fields_yields_only_present_values() {
        let form = EventForm::default().with("title", "Workshop").with("startTime", "10:00");

        assert_eq!(
            form.text_fields(),
            vec![("title", "Workshop"), ("startTime", "10:00")]
        );
    }

    #[test]
    fn event_serializes_with_camel_case_names() {
        let event = Event::validate(complete_form()).expect("form is complete");

        insta::assert_json_snapshot!(event, @r###"
        {
          "title": "Rust Meetup",
          "eventFee": 15.5,
          "location": "Hall A",
          "category": "Web development",
          "eventDescription": "An evening of systems programming",
          "resourcePerson": "Ada Lovelace",
          "eventDate": "2025-03-01",
          "startTime": "18:30",
          "allocatedSeats": 40
        }
        "###);
    }

    proptest! {
        #[test]
        fn every_valid_clock_time_parses(hour in 0u32..24, minute in 0u32..60) {
            let text = format!("{hour:02}:{minute:02}");
            let parsed = text.parse::<StartTime>();
            prop_assert!(parsed.is_ok());
            prop_assert_eq!(parsed.map(|time| time.to_string()).ok(), Some(text));
        }

        #[test]
        fn every_category_label_round_trips(index in 0usize..6) {
            let category = Category::ALL[index];
            prop_assert_eq!(category.label().parse::<Category>().ok(), Some(category));
        }
    }
}
