//! Shop entries: the courses sold on the marketplace.
//!
//! Shops are created and deleted but never edited in place, so the resource
//! does not expose `Update`.

use std::convert::Infallible;

use nutype::nutype;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ValidationError;
use crate::resource::{Capabilities, Resource};
use crate::store::Collection;
use crate::validation::optional_text;

const NAME_MAX_CHARS: usize = 200;

/// Display name of a course.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(Debug, Clone, PartialEq, Eq, AsRef, Deref, Display, Serialize, Deserialize)
)]
pub struct ShopName(String);

/// Average review score, from 0 to 5 inclusive.
#[nutype(
    validate(finite, greater_or_equal = 0.0, less_or_equal = 5.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into, Serialize, Deserialize)
)]
pub struct Rating(f64);

/// A persisted course.
///
/// `price` is free text on purpose: listings use values like "Free" or
/// "$49.99" as well as plain numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Course name.
    pub name: ShopName,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Price as displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Catalogue category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Who teaches the course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    /// Teaching language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Review score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

/// Create request for a [`Shop`].
///
/// Unknown fields are rejected. An `_id`/`id` sent by the client is accepted
/// and ignored: ids are always assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewShop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(
        default,
        deserialize_with = "price_text",
        skip_serializing_if = "Option::is_none"
    )]
    price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    #[serde(default, rename = "_id", skip_serializing)]
    client_underscore_id: Option<IgnoredAny>,
    #[serde(default, rename = "id", skip_serializing)]
    client_id: Option<IgnoredAny>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Text(String),
    Number(f64),
}

fn price_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<PriceInput>::deserialize(deserializer)?.map(|price| match price {
            PriceInput::Text(text) => text,
            PriceInput::Number(number) => number.to_string(),
        }),
    )
}

impl NewShop {
    /// Start a draft with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the image URL.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the display price.
    #[must_use]
    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Set the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the instructor.
    #[must_use]
    pub fn instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = Some(instructor.into());
        self
    }

    /// Set the teaching language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the rating.
    #[must_use]
    pub const fn rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }
}

impl Resource for Shop {
    const COLLECTION: Collection = Collection::new("shops");
    const LABEL: &'static str = "Course";
    const CAPABILITIES: Capabilities = Capabilities::READ_CREATE_DELETE;

    type Draft = NewShop;
    type Patch = Infallible;

    fn validate(draft: NewShop) -> Result<Self, ValidationError> {
        let mut issues = ValidationError::default();

        let name = match optional_text(draft.name) {
            None => {
                issues.push("name", "is required");
                None
            }
            Some(name) => ShopName::try_new(name)
                .map_err(|_| {
                    issues.push(
                        "name",
                        format!("must be at most {NAME_MAX_CHARS} characters"),
                    );
                })
                .ok(),
        };

        let rating = match draft.rating {
            None => None,
            Some(value) => Rating::try_new(value)
                .map_err(|_| issues.push("rating", "must be between 0 and 5"))
                .ok(),
        };

        match name {
            Some(name) if issues.is_empty() => Ok(Self {
                name,
                description: optional_text(draft.description),
                image: optional_text(draft.image),
                price: optional_text(draft.price),
                category: optional_text(draft.category),
                instructor: optional_text(draft.instructor),
                language: optional_text(draft.language),
                rating,
            }),
            _ => Err(issues),
        }
    }

    fn apply_patch(self, patch: Infallible) -> Result<Self, ValidationError> {
        match patch {}
    }
}
