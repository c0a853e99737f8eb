//! Public property search: query-string parsing, validation and the
//! predicate both store implementations apply.

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{ContractType, Property, PropertyRecord, PropertyType};

/// Query string accepted by `GET /api/properties`.
///
/// Divisions are filtered by numeric id only. Prices apply to the monthly
/// price; `rooms` is a minimum room count.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_price_range"))]
pub struct PropertyQuery {
    pub region_id: Option<i32>,
    pub division_id: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub contract_type: Option<ContractType>,
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    #[validate(range(min = 0))]
    pub rooms: Option<i32>,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
}

fn validate_price_range(query: &PropertyQuery) -> Result<(), ValidationError> {
    match (query.min_price, query.max_price) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("min_price_above_max_price")),
        _ => Ok(()),
    }
}

impl PropertyQuery {
    /// Validates the query and fills in paging defaults.
    pub fn resolve(self, default_limit: i64, max_limit: i64) -> Result<PropertyFilter, ValidationErrors> {
        self.validate()?;
        let limit = self.limit.unwrap_or(default_limit);
        if limit > max_limit {
            let mut errors = ValidationErrors::new();
            errors.add("limit", ValidationError::new("range"));
            return Err(errors);
        }
        Ok(PropertyFilter {
            region_id: self.region_id,
            division_id: self.division_id,
            property_type: self.property_type,
            contract_type: self.contract_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_rooms: self.rooms,
            page: self.page.unwrap_or(1),
            limit,
        })
    }
}

/// A validated search. Every set field is ANDed together with
/// `is_active = true`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub region_id: Option<i32>,
    pub division_id: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub contract_type: Option<ContractType>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rooms: Option<i32>,
    pub page: i64,
    pub limit: i64,
}

impl Default for PropertyFilter {
    fn default() -> Self {
        Self {
            region_id: None,
            division_id: None,
            property_type: None,
            contract_type: None,
            min_price: None,
            max_price: None,
            min_rooms: None,
            page: 1,
            limit: 12,
        }
    }
}

impl PropertyFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn has_price_filter(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    pub fn matches(&self, property: &Property) -> bool {
        if !property.is_active {
            return false;
        }
        if self.region_id.is_some_and(|id| property.region_id != id)
            || self.division_id.is_some_and(|id| property.division_id != id)
            || self.property_type.is_some_and(|t| property.property_type != t)
            || self.contract_type.is_some_and(|t| property.contract_type != t)
            || self.min_rooms.is_some_and(|rooms| property.rooms < rooms)
        {
            return false;
        }
        if self.has_price_filter() {
            let Some(price) = property.monthly_price else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min)
                || self.max_price.is_some_and(|max| price > max)
            {
                return false;
            }
        }
        true
    }
}

/// One page of search results and the number of matches across all pages.
#[derive(Debug, Clone)]
pub struct PropertyPage {
    pub properties: Vec<PropertyRecord>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn property(region_id: i32, monthly_price: Option<i64>, is_active: bool) -> Property {
        let now = Utc::now();
        Property {
            id: 1,
            landlord_id: Uuid::new_v4(),
            title: "Studio meublé à Bonapriso".to_string(),
            description: "Studio lumineux proche des commerces".to_string(),
            property_type: PropertyType::Studio,
            contract_type: ContractType::LongTerm,
            monthly_price,
            nightly_price: None,
            rooms: 2,
            size_sqm: Some(35),
            region_id,
            division_id: 29,
            neighborhood: "Bonapriso".to_string(),
            address: "Rue Joss, Douala".to_string(),
            amenities: vec!["wifi".to_string()],
            images: vec![],
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn inactive_properties_never_match() {
        let filter = PropertyFilter::default();
        assert!(filter.matches(&property(5, Some(50_000), true)));
        assert!(!filter.matches(&property(5, Some(50_000), false)));
    }

    #[test]
    fn price_bounds_are_inclusive_and_skip_unpriced_listings() {
        let filter = PropertyFilter {
            min_price: Some(40_000),
            max_price: Some(50_000),
            ..PropertyFilter::default()
        };
        assert!(filter.matches(&property(5, Some(40_000), true)));
        assert!(filter.matches(&property(5, Some(50_000), true)));
        assert!(!filter.matches(&property(5, Some(50_001), true)));
        assert!(!filter.matches(&property(5, None, true)));
    }

    #[test]
    fn predicates_are_conjunctive() {
        let filter = PropertyFilter {
            region_id: Some(5),
            property_type: Some(PropertyType::Studio),
            min_rooms: Some(3),
            ..PropertyFilter::default()
        };
        // Region and type match but the room count does not.
        assert!(!filter.matches(&property(5, Some(50_000), true)));
    }

    #[test]
    fn resolve_applies_paging_defaults() {
        let filter = PropertyQuery::default().resolve(12, 100).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 12);
        assert_eq!(filter.offset(), 0);

        let filter = PropertyQuery {
            page: Some(3),
            limit: Some(10),
            ..PropertyQuery::default()
        }
        .resolve(12, 100)
        .unwrap();
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn resolve_rejects_bad_paging_and_inverted_prices() {
        let zero_page = PropertyQuery {
            page: Some(0),
            ..PropertyQuery::default()
        };
        assert!(zero_page.resolve(12, 100).is_err());

        let huge_limit = PropertyQuery {
            limit: Some(500),
            ..PropertyQuery::default()
        };
        assert!(huge_limit.resolve(12, 100).is_err());

        let inverted = PropertyQuery {
            min_price: Some(90_000),
            max_price: Some(10_000),
            ..PropertyQuery::default()
        };
        assert!(inverted.resolve(12, 100).is_err());
    }

    #[test]
    fn query_string_uses_camel_case_keys() {
        let query: PropertyQuery = serde_json::from_value(serde_json::json!({
            "regionId": 5,
            "divisionId": 29,
            "propertyType": "apartment",
            "contractType": "short_term",
            "minPrice": 10000,
        }))
        .unwrap();
        assert_eq!(query.region_id, Some(5));
        assert_eq!(query.division_id, Some(29));
        assert_eq!(query.property_type, Some(PropertyType::Apartment));
        assert_eq!(query.contract_type, Some(ContractType::ShortTerm));
        assert_eq!(query.min_price, Some(10_000));
    }
}
