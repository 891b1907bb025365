//! Demo data and upload API types

use serde::{Deserialize, Serialize};

/// Rows written by the demo data loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SeedSummary {
    pub contacts: usize,
    pub companies: usize,
    pub groups: usize,
    pub tags: usize,
    pub contact_tags: usize,
    pub contact_groups: usize,
    pub contact_companies: usize,
    /// Old demo rows removed before inserting
    pub removed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClearDemoResponse {
    pub removed: u64,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadResponse {
    pub bucket: String,
    pub path: String,
    pub url: String,
}
