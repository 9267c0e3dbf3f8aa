//! Core record types for dartscore.
//!
//! This module defines the darts record as stored, the payloads used to
//! create and update it, and the pagination window used when listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{Error, Result};

/// Maximum length, in characters, of the text fields of a record.
pub const MAX_FIELD_LEN: usize = 50;

/// First page number accepted by [`Page::new`].
pub const FIRST_PAGE: u32 = 1;

/// A stored darts game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Dart {
    /// Identifier assigned by storage.
    #[schema(example = 1)]
    pub id: i64,

    /// Player name. Unique across all records.
    #[schema(example = "johndoe")]
    pub username: String,

    /// The game played.
    #[schema(example = "cricket")]
    pub game: String,

    /// How the game was played.
    #[schema(example = "practice")]
    pub game_type: String,

    /// Number of throws needed to finish the game.
    #[schema(example = 42)]
    pub throws: Option<i64>,

    /// Final score of the game.
    #[schema(example = 301)]
    pub score: Option<i64>,

    /// When the record was created.
    pub create_date: DateTime<Utc>,

    /// When the record was last written.
    pub update_date: DateTime<Utc>,
}

/// Payload for creating a record, or replacing one in full.
///
/// `throws` and `score` default to `null` when omitted, so a full update
/// without them clears any stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewDart {
    /// Player name.
    #[schema(example = "johndoe")]
    pub username: String,

    /// The game played.
    #[schema(example = "cricket")]
    pub game: String,

    /// How the game was played.
    #[schema(example = "practice")]
    pub game_type: String,

    /// Number of throws needed to finish the game.
    #[serde(default)]
    pub throws: Option<i64>,

    /// Final score of the game.
    #[serde(default)]
    pub score: Option<i64>,
}

impl NewDart {
    /// Create a payload with the required fields and no throws or score.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        game: impl Into<String>,
        game_type: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            game: game.into(),
            game_type: game_type.into(),
            throws: None,
            score: None,
        }
    }

    /// Set the number of throws.
    #[must_use]
    pub fn with_throws(mut self, throws: i64) -> Self {
        self.throws = Some(throws);
        self
    }

    /// Set the score.
    #[must_use]
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }

    /// Check every field against the record rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first field that fails.
    pub fn validate(&self) -> Result<()> {
        validate_text("username", &self.username)?;
        validate_text("game", &self.game)?;
        validate_text("game_type", &self.game_type)?;
        validate_count("throws", self.throws)?;
        validate_count("score", self.score)?;
        Ok(())
    }
}

/// Payload for a partial update.
///
/// Absent fields are left alone. For `throws` and `score` an explicit
/// `null` clears the stored value, which is why they are double options.
/// The text fields are required on the record, so `null` is rejected for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DartPatch {
    /// New player name.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,

    /// New game.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub game: Option<String>,

    /// New game type.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub game_type: Option<String>,

    /// New number of throws; `null` clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<i64>)]
    pub throws: Option<Option<i64>>,

    /// New score; `null` clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<i64>)]
    pub score: Option<Option<i64>>,
}

impl DartPatch {
    /// Check whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.game.is_none()
            && self.game_type.is_none()
            && self.throws.is_none()
            && self.score.is_none()
    }

    /// Merge this patch over an existing record.
    #[must_use]
    pub fn apply_to(&self, dart: &Dart) -> NewDart {
        NewDart {
            username: self
                .username
                .clone()
                .unwrap_or_else(|| dart.username.clone()),
            game: self.game.clone().unwrap_or_else(|| dart.game.clone()),
            game_type: self
                .game_type
                .clone()
                .unwrap_or_else(|| dart.game_type.clone()),
            throws: self.throws.unwrap_or(dart.throws),
            score: self.score.unwrap_or(dart.score),
        }
    }
}

/// Wraps a present field in `Some`. For an `Option` target, `null` becomes `Some(None)`;
/// for anything else `null` is a type error.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn validate_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be blank"));
    }
    let len = value.chars().count();
    if len > MAX_FIELD_LEN {
        return Err(Error::validation(
            field,
            format!("must be at most {MAX_FIELD_LEN} characters (got {len})"),
        ));
    }
    Ok(())
}

fn validate_count(field: &'static str, value: Option<i64>) -> Result<()> {
    match value {
        Some(n) if n < 0 => Err(Error::validation(
            field,
            format!("must not be negative (got {n})"),
        )),
        _ => Ok(()),
    }
}

/// Query parameters accepted by the list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number to retrieve, starting at 1.
    #[param(minimum = 1, example = 1)]
    pub page: Option<u32>,

    /// Number of records per page.
    #[param(minimum = 1, example = 10)]
    pub limit: Option<u32>,
}

/// A validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    limit: u32,
}

impl Page {
    /// Build a page window, checking bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `page` is zero or `limit` is outside
    /// `1..=max_limit`.
    pub fn new(page: u32, limit: u32, max_limit: u32) -> Result<Self> {
        if page < FIRST_PAGE {
            return Err(Error::validation("page", "must be at least 1"));
        }
        if limit == 0 || limit > max_limit {
            return Err(Error::validation(
                "limit",
                format!("must be between 1 and {max_limit} (got {limit})"),
            ));
        }
        Ok(Self { page, limit })
    }

    /// The 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of records in the page.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}
