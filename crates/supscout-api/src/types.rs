// Raw Open Food Facts payloads
//
// The upstream schema is loose: almost everything is optional and numbers
// sometimes arrive as strings. These types only exist to get the JSON off the
// wire; the core crate maps them into the domain model right away.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Nutrient values keyed by the upstream name (`proteins_100g`, ...)
///
/// Values are kept as raw JSON because the map also carries unit strings
/// and other non-numeric noise.
pub type Nutriments = BTreeMap<String, serde_json::Value>;

/// A single product record as returned by Open Food Facts
///
/// Every field tolerates the wrong JSON type: a mistyped value is read as
/// absent instead of failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteProduct {
    /// Barcode, sometimes sent as a bare number
    #[serde(deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub product_name: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub brands: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub generic_name: Option<String>,
    /// Comma-joined ingredient list
    #[serde(deserialize_with = "lenient_opt_string")]
    pub ingredients_text: Option<String>,
    /// Comma-joined category list
    #[serde(deserialize_with = "lenient_opt_string")]
    pub categories: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub serving_size: Option<String>,
    #[serde(deserialize_with = "lenient_nutriments")]
    pub nutriments: Option<Nutriments>,
    #[serde(deserialize_with = "lenient_tags")]
    pub allergens_tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_tags")]
    pub additives_tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_tags")]
    pub vitamins_tags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_ingredients")]
    pub ingredients: Option<Vec<RemoteIngredient>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteIngredient {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
}

/// Response of `GET /api/v2/product/{barcode}.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteProductResponse {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub status: i64,
    #[serde(default)]
    pub status_verbose: Option<String>,
    #[serde(default, deserialize_with = "lenient_product")]
    pub product: Option<RemoteProduct>,
}

/// Response of `GET /cgi/search.pl?...&json=1`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSearchResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub page: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub page_size: u32,
    #[serde(default, deserialize_with = "lenient_products")]
    pub products: Vec<RemoteProduct>,
}

/// Accept `12`, `"12"` or anything else (read as 0)
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_u64(deserializer).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn scalar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strings pass through, numbers are printed, anything else is empty
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_text(value).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(scalar_text(value))
}

fn lenient_nutriments<'de, D>(deserializer: D) -> Result<Option<Nutriments>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    })
}

/// Arrays keep their string and number entries; a non-array is missing
fn lenient_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => {
            Some(items.into_iter().filter_map(scalar_text).collect())
        }
        _ => None,
    })
}

fn lenient_ingredients<'de, D>(deserializer: D) -> Result<Option<Vec<RemoteIngredient>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(None);
    };

    Ok(Some(
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
    ))
}

fn lenient_product<'de, D>(deserializer: D) -> Result<Option<RemoteProduct>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Records that are not objects at all are dropped, the rest of the page survives
fn lenient_products<'de, D>(deserializer: D) -> Result<Vec<RemoteProduct>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_with_only_code() {
        let product: RemoteProduct = serde_json::from_str(r#"{"code":"123"}"#).unwrap();
        assert_eq!(product.code, "123");
        assert!(product.product_name.is_none());
        assert!(product.nutriments.is_none());
    }

    #[test]
    fn test_product_ignores_unknown_fields() {
        let product: RemoteProduct =
            serde_json::from_str(r#"{"code":"1","nova_group":4,"product_name":"Whey"}"#).unwrap();
        assert_eq!(product.product_name.as_deref(), Some("Whey"));
    }

    #[test]
    fn test_nutriments_keep_non_numeric_values() {
        let product: RemoteProduct = serde_json::from_str(
            r#"{"code":"1","nutriments":{"proteins_100g":80,"energy-kcal_unit":"kcal"}}"#,
        )
        .unwrap();
        let nutriments = product.nutriments.unwrap();
        assert_eq!(nutriments["proteins_100g"].as_f64(), Some(80.0));
        assert_eq!(nutriments["energy-kcal_unit"], "kcal");
    }

    #[test]
    fn test_search_response_accepts_string_numbers() {
        let response: RemoteSearchResponse = serde_json::from_str(
            r#"{"count":"1234","page":"2","page_size":24,"products":[]}"#,
        )
        .unwrap();
        assert_eq!(response.count, 1234);
        assert_eq!(response.page, 2);
        assert_eq!(response.page_size, 24);
    }

    #[test]
    fn test_search_response_defaults_when_empty() {
        let response: RemoteSearchResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response, RemoteSearchResponse::default());
    }

    #[test]
    fn test_product_response_without_product() {
        let response: RemoteProductResponse =
            serde_json::from_str(r#"{"status":0,"status_verbose":"product not found"}"#).unwrap();
        assert_eq!(response.status, 0);
        assert!(response.product.is_none());
    }

    #[test]
    fn test_product_tolerates_mistyped_fields() {
        let product: RemoteProduct = serde_json::from_str(
            r#"{
                "code": 3017620422003,
                "product_name": null,
                "brands": ["not", "a", "string"],
                "allergens_tags": "en:milk",
                "additives_tags": ["en:e330", 7, null],
                "nutriments": "none",
                "ingredients": [{"text": null}, {"text": "Whey"}, "Cocoa"]
            }"#,
        )
        .unwrap();

        assert_eq!(product.code, "3017620422003");
        assert!(product.product_name.is_none());
        assert!(product.brands.is_none());
        assert!(product.allergens_tags.is_none());
        assert_eq!(product.additives_tags, Some(vec!["en:e330".to_string(), "7".to_string()]));
        assert!(product.nutriments.is_none());

        let texts: Vec<_> = product
            .ingredients
            .unwrap()
            .into_iter()
            .map(|ingredient| ingredient.text)
            .collect();
        assert_eq!(texts, vec!["", "Whey"]);
    }

    #[test]
    fn test_null_code_reads_as_empty() {
        let product: RemoteProduct = serde_json::from_str(r#"{"code":null}"#).unwrap();
        assert_eq!(product.code, "");
    }

    #[test]
    fn test_one_bad_record_keeps_the_page() {
        let response: RemoteSearchResponse = serde_json::from_str(
            r#"{
                "count": 3,
                "products": [
                    {"code": "1", "product_name": "A"},
                    {"code": 3017620422003, "allergens_tags": "en:milk"},
                    null,
                    {"code": "2", "ingredients": [{"text": null}]}
                ]
            }"#,
        )
        .unwrap();

        let codes: Vec<_> = response.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["1", "3017620422003", "2"]);
        assert_eq!(response.products[0].product_name.as_deref(), Some("A"));
    }

    #[test]
    fn test_mistyped_product_reads_as_missing() {
        let response: RemoteProductResponse =
            serde_json::from_str(r#"{"status":1,"product":"gone"}"#).unwrap();
        assert_eq!(response.status, 1);
        assert!(response.product.is_none());
    }
}
