use serde::{Deserialize, Serialize};

/// Body of `POST /Search/v3/Products/Keyword`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeywordSearchRequest {
    pub keywords: String,
    pub record_count: u32,
    pub record_start_position: u32,
    pub filters: SearchFilters,
    pub sort: SortParameters,
    pub requested_quantity: u32,
    pub search_options: Vec<String>,
    pub exclude_market_place_products: bool,
}

impl KeywordSearchRequest {
    pub const DEFAULT_RECORD_COUNT: u32 = 10;

    /// The fixed search defaults with `keyword` merged in.
    pub fn new(keyword: &str) -> Self {
        Self {
            keywords: keyword.to_string(),
            record_count: Self::DEFAULT_RECORD_COUNT,
            record_start_position: 0,
            filters: SearchFilters {
                taxonomy_ids: vec![0],
                manufacturer_ids: vec![0],
            },
            sort: SortParameters {
                sort_option: "SortByDigiKeyPartNumber".into(),
                direction: "Ascending".into(),
                sort_parameter_id: 0,
            },
            requested_quantity: 0,
            search_options: vec!["ManufacturerPartSearch".into()],
            exclude_market_place_products: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchFilters {
    pub taxonomy_ids: Vec<u64>,
    pub manufacturer_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SortParameters {
    pub sort_option: String,
    pub direction: String,
    pub sort_parameter_id: u64,
}

/// The subset of a part-detail payload the catalog importer consumes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductDetails {
    pub product_description: String,
    #[serde(default)]
    pub detailed_description: Option<String>,
    #[serde(default)]
    pub limited_taxonomy: Option<LimitedTaxonomy>,
    #[serde(default)]
    pub product_url: Option<String>,
    pub supplier: String,
    pub manufacturer_part_number: String,
    pub digi_key_part_number: String,
    #[serde(default)]
    pub quantity_available: u64,
    #[serde(default)]
    pub standard_pricing: Vec<PricingTier>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LimitedTaxonomy {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PricingTier {
    pub break_quantity: u64,
    pub unit_price: f64,
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorError {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Token endpoint response. Only `access_token` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}
