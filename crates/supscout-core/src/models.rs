use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name used when the upstream record has no product name
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// One supplement, normalized from an upstream product record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplement {
    /// Barcode, passed through untouched
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub categories: Vec<String>,
    pub image_url: Option<String>,
    pub nutritional_info: NutritionalInfo,
    pub allergens: Vec<String>,
    /// Additive codes such as `en:e330`
    pub additives: Vec<String>,
    pub dietary_tags: DietaryTags,
    pub serving_size: Option<String>,
}

/// Nutrients per 100g/100ml
///
/// The nine fixed fields are always serialized, as `null` when unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionalInfo {
    pub energy_kcal: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub sugars: Option<f64>,
    pub fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub salt: Option<f64>,
    /// Vitamin name -> milligrams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitamins: Option<BTreeMap<String, f64>>,
    /// Mineral name -> milligrams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minerals: Option<BTreeMap<String, f64>>,
}

/// Heuristic dietary flags derived from category text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryTags {
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    pub organic: bool,
}

impl DietaryTags {
    /// Labels of the flags that are set, in a fixed order
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.vegan {
            labels.push("vegan");
        }
        if self.vegetarian {
            labels.push("vegetarian");
        }
        if self.gluten_free {
            labels.push("gluten-free");
        }
        if self.organic {
            labels.push("organic");
        }
        labels
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub supplements: Vec<Supplement>,
    /// Total number of matches upstream
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl SearchResultPage {
    /// Number of pages needed for `count` results, at least 1
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.count.div_ceil(u64::from(self.page_size)).max(1)
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}
