// Raw Open Food Facts payloads -> domain model
//
// Everything here is total: any partial record maps to a valid Supplement.
use std::collections::BTreeMap;

use supscout_api::{Nutriments, RemoteProduct, RemoteSearchResponse};

use crate::models::{
    DietaryTags, NutritionalInfo, SearchResultPage, Supplement, UNKNOWN_PRODUCT_NAME,
};

const VITAMIN_KEYS: &[&str] = &[
    "vitamin-a",
    "vitamin-d",
    "vitamin-e",
    "vitamin-k",
    "vitamin-c",
    "vitamin-b1",
    "vitamin-b2",
    "vitamin-pp",
    "vitamin-b6",
    "vitamin-b9",
    "vitamin-b12",
    "biotin",
    "pantothenic-acid",
];

const MINERAL_KEYS: &[&str] = &[
    "calcium",
    "chloride",
    "chromium",
    "copper",
    "fluoride",
    "iodine",
    "iron",
    "magnesium",
    "manganese",
    "molybdenum",
    "phosphorus",
    "potassium",
    "selenium",
    "zinc",
];

/// Split a comma-joined list, trimming entries and dropping empty ones
///
/// `"a, b ,, c"` becomes `["a", "b", "c"]`.
pub fn split_list(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };

    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Guess dietary flags from the category text
///
/// Plain substring checks; good enough for badges, not for medical advice.
pub fn derive_dietary_tags(product: &RemoteProduct) -> DietaryTags {
    let categories = product
        .categories
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let vegan = categories.contains("vegan") || categories.contains("plant-based");

    DietaryTags {
        vegan,
        vegetarian: vegan || categories.contains("vegetarian"),
        gluten_free: categories.contains("gluten-free") || categories.contains("gluten free"),
        organic: categories.contains("organic"),
    }
}

pub fn map_nutritional_info(nutriments: Option<&Nutriments>) -> NutritionalInfo {
    let Some(nutriments) = nutriments else {
        return NutritionalInfo::default();
    };

    let value = |key: &str| nutriments.get(key).and_then(serde_json::Value::as_f64);

    NutritionalInfo {
        energy_kcal: value("energy-kcal_100g"),
        proteins: value("proteins_100g"),
        carbohydrates: value("carbohydrates_100g"),
        sugars: value("sugars_100g"),
        fat: value("fat_100g"),
        saturated_fat: value("saturated-fat_100g"),
        fiber: value("fiber_100g"),
        sodium: value("sodium_100g"),
        salt: value("salt_100g"),
        vitamins: micronutrients(nutriments, VITAMIN_KEYS),
        minerals: micronutrients(nutriments, MINERAL_KEYS),
    }
}

/// Pick the known `<name>_100g` entries, converting grams to milligrams
fn micronutrients(nutriments: &Nutriments, names: &[&str]) -> Option<BTreeMap<String, f64>> {
    let found: BTreeMap<String, f64> = names
        .iter()
        .filter_map(|name| {
            nutriments
                .get(&format!("{}_100g", name))
                .and_then(serde_json::Value::as_f64)
                .map(|grams| (name.to_string(), grams * 1000.0))
        })
        .collect();

    (!found.is_empty()).then_some(found)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn clean_tags(tags: Option<&[String]>) -> Vec<String> {
    tags.unwrap_or_default()
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn ingredients(product: &RemoteProduct) -> Vec<String> {
    if product.ingredients_text.is_some() {
        return split_list(product.ingredients_text.as_deref());
    }

    // Some records only carry the structured ingredient list
    product
        .ingredients
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|ingredient| ingredient.text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Convert one upstream product into a Supplement
pub fn map_product(product: &RemoteProduct) -> Supplement {
    Supplement {
        id: product.code.clone(),
        name: non_empty(product.product_name.as_deref())
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
        brand: non_empty(product.brands.as_deref()),
        description: non_empty(product.generic_name.as_deref()),
        ingredients: ingredients(product),
        categories: split_list(product.categories.as_deref()),
        image_url: non_empty(product.image_url.as_deref()),
        nutritional_info: map_nutritional_info(product.nutriments.as_ref()),
        allergens: clean_tags(product.allergens_tags.as_deref()),
        additives: clean_tags(product.additives_tags.as_deref()),
        dietary_tags: derive_dietary_tags(product),
        serving_size: non_empty(product.serving_size.as_deref()),
    }
}

/// Convert a search response; paging numbers are copied as-is
pub fn map_search_response(response: &RemoteSearchResponse) -> SearchResultPage {
    SearchResultPage {
        supplements: response.products.iter().map(map_product).collect(),
        count: response.count,
        page: response.page,
        page_size: response.page_size,
    }
}
