//! Payload shapes posted by each payment gateway.
//!
//! Identifiers and amounts stay as raw JSON values: gateways send them as
//! numbers or strings depending on the product and the API version. Text,
//! nested objects and lists are read leniently, so one malformed field never
//! rejects the whole payload.

use serde::Deserialize;
use serde_json::Value as JsonValue;

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value as JsonValue;

    /// Strings as-is, numbers as their decimal text, anything else as absent.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<JsonValue>::deserialize(deserializer)? {
            Some(JsonValue::String(s)) => Some(s),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// A nested object that does not fit its shape is treated as absent.
    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(Option::<JsonValue>::deserialize(deserializer)?
            .and_then(|value| serde_json::from_value(value).ok()))
    }

    /// `null` or a non-array becomes empty; items that do not fit are skipped.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Option::<JsonValue>::deserialize(deserializer)? {
            Some(JsonValue::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayCustomer {
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
}

/// Vega: flat `products[]`, prices in decimal reais.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VegaPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default)]
    pub total_price: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub customer: Option<GatewayCustomer>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub products: Vec<VegaProduct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VegaProduct {
    #[serde(default)]
    pub code: Option<JsonValue>,
    #[serde(default)]
    pub id: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<JsonValue>,
}

/// GGCheckout: products nested under `plans[]`, amounts in integer cents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GgCheckoutPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub customer: Option<GatewayCustomer>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub payment: Option<GgPayment>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub plans: Vec<GgPlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GgPayment {
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GgPlan {
    #[serde(default)]
    pub id: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub products: Vec<GgProduct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GgProduct {
    #[serde(default)]
    pub id: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<JsonValue>,
}

/// AmploPay: a single product described by top-level fields, amount in reais.
/// Older integrations send `product_name` / `customer_email` instead of
/// `product_title` / `email`, and some send both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmploPayPayload {
    #[serde(default)]
    pub product_id: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub product_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub product_description: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub customer: Option<GatewayCustomer>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub customer_email: Option<String>,
}

impl AmploPayPayload {
    pub fn title(&self) -> Option<&str> {
        first_text(&[self.product_title.as_deref(), self.product_name.as_deref()])
    }

    pub fn fallback_email(&self) -> Option<&str> {
        first_text(&[self.email.as_deref(), self.customer_email.as_deref()])
    }
}

fn first_text<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_fields_accept_numbers_and_ignore_other_types() {
        let product: VegaProduct =
            serde_json::from_value(json!({ "title": 123, "name": null, "description": ["x"] }))
                .unwrap();
        assert_eq!(product.title.as_deref(), Some("123"));
        assert_eq!(product.name, None);
        assert_eq!(product.description, None);
    }

    #[test]
    fn null_or_malformed_lists_become_empty() {
        let plan: GgPlan = serde_json::from_value(json!({ "name": "Anual", "products": null })).unwrap();
        assert!(plan.products.is_empty());

        let vega: VegaPayload =
            serde_json::from_value(json!({ "products": [{ "title": "Kit" }, "junk", 4] })).unwrap();
        assert_eq!(vega.products.len(), 1);

        let gg: GgCheckoutPayload =
            serde_json::from_value(json!({ "plans": {}, "customer": "ana@example.com" })).unwrap();
        assert!(gg.plans.is_empty());
        assert!(gg.customer.is_none());
    }

    #[test]
    fn amplopay_accepts_both_spellings_at_once() {
        let payload: AmploPayPayload = serde_json::from_value(json!({
            "product_title": " ",
            "product_name": "Plano Mensal",
            "email": "ana@example.com",
            "customer_email": "bia@example.com"
        }))
        .unwrap();
        assert_eq!(payload.title(), Some("Plano Mensal"));
        assert_eq!(payload.fallback_email(), Some("ana@example.com"));
    }
}
