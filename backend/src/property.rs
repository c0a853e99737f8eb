use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::access;
use crate::app::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::ApiError;
use crate::models::{
    nullable, ContractType, Division, NewProperty, PropertyChanges, PropertyRecord, PropertyType,
    Region, User,
};
use crate::search::PropertyQuery;

/// Public face of a listing's owner. `email` and `phone` are only filled in
/// for viewers allowed to contact the landlord.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandlordView {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_verified: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    pub id: i32,
    pub landlord_id: Uuid,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub contract_type: ContractType,
    pub monthly_price: Option<i64>,
    pub nightly_price: Option<i64>,
    pub rooms: i32,
    pub size_sqm: Option<i32>,
    pub region_id: i32,
    pub division_id: i32,
    pub neighborhood: String,
    /// Withheld unless `contact_visible`.
    pub address: Option<String>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub landlord: LandlordView,
    pub region: Region,
    pub division: Division,
    pub contact_visible: bool,
}

impl PropertyView {
    pub fn new(record: PropertyRecord, contact_visible: bool) -> Self {
        let PropertyRecord {
            property,
            landlord,
            region,
            division,
        } = record;
        let landlord = LandlordView {
            id: landlord.id,
            first_name: landlord.first_name,
            last_name: landlord.last_name,
            profile_image_url: landlord.profile_image_url,
            is_verified: landlord.is_verified,
            email: contact_visible.then_some(landlord.email),
            phone: if contact_visible { landlord.phone } else { None },
        };
        Self {
            id: property.id,
            landlord_id: property.landlord_id,
            title: property.title,
            description: property.description,
            property_type: property.property_type,
            contract_type: property.contract_type,
            monthly_price: property.monthly_price,
            nightly_price: property.nightly_price,
            rooms: property.rooms,
            size_sqm: property.size_sqm,
            region_id: property.region_id,
            division_id: property.division_id,
            neighborhood: property.neighborhood,
            address: contact_visible.then_some(property.address),
            amenities: property.amenities,
            images: property.images,
            is_active: property.is_active,
            created_at: property.created_at,
            updated_at: property.updated_at,
            landlord,
            region,
            division,
            contact_visible,
        }
    }

    /// Renders `record` with contact fields gated for `viewer`.
    pub fn for_viewer(record: PropertyRecord, viewer: Option<&User>, state: &AppState) -> Self {
        let visible = access::can_view_contact(
            viewer,
            record.property.landlord_id,
            &state.config,
            Utc::now(),
        );
        Self::new(record, visible)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListResponse {
    pub properties: Vec<PropertyView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create_prices"))]
pub struct CreatePropertyRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    pub property_type: PropertyType,
    pub contract_type: ContractType,
    #[validate(range(min = 0))]
    pub monthly_price: Option<i64>,
    #[validate(range(min = 0))]
    pub nightly_price: Option<i64>,
    #[validate(range(min = 0, max = 100))]
    pub rooms: i32,
    #[validate(range(min = 1))]
    pub size_sqm: Option<i32>,
    pub region_id: i32,
    pub division_id: i32,
    #[validate(length(min = 2, max = 200))]
    pub neighborhood: String,
    #[validate(length(min = 3, max = 500))]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub amenities: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub images: Vec<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn validate_create_prices(request: &CreatePropertyRequest) -> Result<(), ValidationError> {
    if request.monthly_price.is_none() && request.nightly_price.is_none() {
        return Err(ValidationError::new("price_required"));
    }
    Ok(())
}

impl CreatePropertyRequest {
    fn into_new_property(self, landlord_id: Uuid) -> NewProperty {
        NewProperty {
            landlord_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            property_type: self.property_type,
            contract_type: self.contract_type,
            monthly_price: self.monthly_price,
            nightly_price: self.nightly_price,
            rooms: self.rooms,
            size_sqm: self.size_sqm,
            region_id: self.region_id,
            division_id: self.division_id,
            neighborhood: self.neighborhood.trim().to_string(),
            address: self.address.trim().to_string(),
            amenities: normalize_amenities(self.amenities),
            images: normalize_images(self.images),
            is_active: self.is_active,
        }
    }
}

/// Partial update. A key set to `null` clears a nullable field; a missing
/// key leaves it alone.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub contract_type: Option<ContractType>,
    #[serde(default, deserialize_with = "nullable")]
    pub monthly_price: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub nightly_price: Option<Option<i64>>,
    #[validate(range(min = 0, max = 100))]
    pub rooms: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub size_sqm: Option<Option<i32>>,
    pub region_id: Option<i32>,
    pub division_id: Option<i32>,
    #[validate(length(min = 2, max = 200))]
    pub neighborhood: Option<String>,
    #[validate(length(min = 3, max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 30))]
    pub amenities: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl UpdatePropertyRequest {
    fn into_changes(self) -> PropertyChanges {
        PropertyChanges {
            title: self.title.map(|v| v.trim().to_string()),
            description: self.description.map(|v| v.trim().to_string()),
            property_type: self.property_type,
            contract_type: self.contract_type,
            monthly_price: self.monthly_price,
            nightly_price: self.nightly_price,
            rooms: self.rooms,
            size_sqm: self.size_sqm,
            region_id: self.region_id,
            division_id: self.division_id,
            neighborhood: self.neighborhood.map(|v| v.trim().to_string()),
            address: self.address.map(|v| v.trim().to_string()),
            amenities: self.amenities.map(normalize_amenities),
            images: self.images.map(normalize_images),
            is_active: self.is_active,
        }
    }
}

/// Trims and de-duplicates amenities case-insensitively. The first spelling
/// seen is the one kept.
pub fn normalize_amenities(amenities: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(amenities.len());
    for amenity in amenities {
        let amenity = amenity.trim();
        let duplicate = kept
            .iter()
            .any(|existing| existing.to_lowercase() == amenity.to_lowercase());
        if !amenity.is_empty() && !duplicate {
            kept.push(amenity.to_string());
        }
    }
    kept
}

fn normalize_images(images: Vec<String>) -> Vec<String> {
    images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

fn field_error(field: &'static str, code: &'static str) -> ApiError {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code));
    ApiError::Validation(errors)
}

fn check_prices(monthly_price: Option<i64>, nightly_price: Option<i64>) -> Result<(), ApiError> {
    for (field, price) in [("monthly_price", monthly_price), ("nightly_price", nightly_price)] {
        if price.is_some_and(|p| p < 0) {
            return Err(field_error(field, "range"));
        }
    }
    if monthly_price.is_none() && nightly_price.is_none() {
        return Err(field_error("monthly_price", "price_required"));
    }
    Ok(())
}

/// The division must exist and sit inside the region.
async fn check_location(state: &AppState, region_id: i32, division_id: i32) -> Result<(), ApiError> {
    match state.store.get_division(division_id).await? {
        None => Err(field_error("division_id", "unknown_division")),
        Some(division) if division.region_id != region_id => {
            Err(field_error("division_id", "division_region_mismatch"))
        }
        Some(_) => Ok(()),
    }
}

pub async fn list_properties(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    let filter = query.resolve(state.config.default_page_size, state.config.max_page_size)?;
    let (page, limit) = (filter.page, filter.limit);
    let result = state.store.list_properties(filter).await?;
    log::info!("Fetched {} of {} matching properties", result.properties.len(), result.total);
    let properties = result
        .properties
        .into_iter()
        .map(|record| PropertyView::for_viewer(record, viewer.as_ref(), &state))
        .collect();
    Ok(Json(PropertyListResponse {
        properties,
        total: result.total,
        page,
        limit,
    }))
}

/// Detail view. Inactive listings are still reachable by direct link.
pub async fn get_property(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<PropertyView>, ApiError> {
    let record = state
        .store
        .get_property(id)
        .await?
        .ok_or(ApiError::NotFound("Property"))?;
    Ok(Json(PropertyView::for_viewer(record, viewer.as_ref(), &state)))
}

pub async fn landlord_properties(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<PropertyView>>, ApiError> {
    let records = state.store.properties_by_landlord(user.id).await?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| PropertyView::new(record, true))
            .collect(),
    ))
}

/// The access check runs before the body is looked at, so a refused caller
/// always learns what they are missing.
pub async fn create_property(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PropertyView>), ApiError> {
    if let Err(denial) = access::can_create_property(&user, &state.config, Utc::now()) {
        log::debug!("User {} may not list properties: {}", user.id, denial);
        return Err(ApiError::AccessDenied(denial));
    }
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    body.validate()?;
    check_location(&state, body.region_id, body.division_id).await?;

    let created = state
        .store
        .create_property(body.into_new_property(user.id))
        .await?;
    log::info!("User {} listed property {}", user.id, created.id);
    let record = state
        .store
        .get_property(created.id)
        .await?
        .ok_or(ApiError::NotFound("Property"))?;
    Ok((StatusCode::CREATED, Json(PropertyView::new(record, true))))
}

pub async fn update_property(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<UpdatePropertyRequest>,
) -> Result<Json<PropertyView>, ApiError> {
    let current = state
        .store
        .get_property(id)
        .await?
        .filter(|record| record.property.landlord_id == user.id)
        .ok_or(ApiError::NotFound("Property"))?
        .property;
    body.validate()?;

    let changes = body.into_changes();
    check_prices(
        changes.monthly_price.unwrap_or(current.monthly_price),
        changes.nightly_price.unwrap_or(current.nightly_price),
    )?;
    if let Some(Some(size)) = changes.size_sqm {
        if size < 1 {
            return Err(field_error("size_sqm", "range"));
        }
    }
    if changes.region_id.is_some() || changes.division_id.is_some() {
        check_location(
            &state,
            changes.region_id.unwrap_or(current.region_id),
            changes.division_id.unwrap_or(current.division_id),
        )
        .await?;
    }

    state
        .store
        .update_property(id, user.id, changes)
        .await?
        .ok_or(ApiError::NotFound("Property"))?;
    log::info!("User {} updated property {}", user.id, id);
    let record = state
        .store
        .get_property(id)
        .await?
        .ok_or(ApiError::NotFound("Property"))?;
    Ok(Json(PropertyView::new(record, true)))
}

pub async fn delete_property(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_property(id, user.id).await? {
        return Err(ApiError::NotFound("Property"));
    }
    log::info!("User {} deleted property {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}
