//! Recipe list filters
//!
//! `GET /v1/recipes?tags=1,2&ingredients=3` restricts the listing to recipes
//! carrying at least one of the given tags AND at least one of the given
//! ingredients. Each dimension is an any-of test; an absent or empty
//! parameter does not restrict anything.
//!
//! ```
//! use recipe_shared::filters::{RecipeFilter, RecipeFilterParams};
//!
//! let params = RecipeFilterParams {
//!     tags: Some("3, 7".to_string()),
//!     ingredients: None,
//! };
//! let filter = RecipeFilter::try_from(params).unwrap();
//! assert_eq!(filter.tags, Some(vec![3, 7]));
//! assert_eq!(filter.ingredients, None);
//! ```

use serde::Deserialize;

/// Error raised for a malformed ID list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// An entry was not a valid integer ID
    #[error("'{value}' in '{param}' is not a valid id")]
    InvalidId {
        /// Query parameter the entry came from
        param: &'static str,
        /// Offending entry
        value: String,
    },
}

impl FilterError {
    /// Name of the query parameter that failed to parse
    pub fn param(&self) -> &'static str {
        match self {
            FilterError::InvalidId { param, .. } => param,
        }
    }
}

/// Raw query parameters as they arrive on the URL
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilterParams {
    /// Comma-separated tag IDs
    pub tags: Option<String>,

    /// Comma-separated ingredient IDs
    pub ingredients: Option<String>,
}

/// Parsed recipe filter; `None` means "no restriction" for that dimension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// Parses a comma-separated list of integer IDs
///
/// Whitespace around entries and empty entries are ignored, so `"1, 2,"`
/// yields `[1, 2]`. Duplicates are dropped, first occurrence wins.
pub fn parse_id_list(param: &'static str, raw: &str) -> Result<Vec<i64>, FilterError> {
    let mut ids = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse::<i64>().map_err(|_| FilterError::InvalidId {
            param,
            value: part.to_string(),
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

fn parse_dimension(param: &'static str, raw: Option<&str>) -> Result<Option<Vec<i64>>, FilterError> {
    match raw {
        Some(raw) => {
            let ids = parse_id_list(param, raw)?;
            Ok((!ids.is_empty()).then_some(ids))
        }
        None => Ok(None),
    }
}

impl RecipeFilter {
    /// Builds a filter from the raw parameter values
    pub fn parse(tags: Option<&str>, ingredients: Option<&str>) -> Result<Self, FilterError> {
        Ok(Self {
            tags: parse_dimension("tags", tags)?,
            ingredients: parse_dimension("ingredients", ingredients)?,
        })
    }

    /// True when neither dimension restricts the result
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.ingredients.is_none()
    }
}

impl TryFrom<RecipeFilterParams> for RecipeFilter {
    type Error = FilterError;

    fn try_from(params: RecipeFilterParams) -> Result<Self, Self::Error> {
        Self::parse(params.tags.as_deref(), params.ingredients.as_deref())
    }
}
