//! Canonical view of gateway webhook payloads.
//!
//! Each gateway gets its own typed shape. A platform hint picks the shape to
//! try first; when it is missing or does not fit, the payload is sniffed in a
//! fixed order (direct product fields, `products[]`, `plans[].products[]`).
//! Anything else is `Unrecognized`, which still yields a best-effort e-mail.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::dto::gateway_dto::{
    AmploPayPayload, GatewayCustomer, GgCheckoutPayload, VegaPayload,
};
use crate::models::platform::Platform;
use crate::utils::money::{amount_to_cents, AmountUnit};

pub const UNKNOWN_CODE: &str = "N/A";
pub const UNKNOWN_TITLE: &str = "Produto não identificado";
pub const UNKNOWN_DESCRIPTION: &str = "Sem descrição";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Approved,
    Pending,
    Refused,
    Refunded,
    Unknown,
}

impl PaymentStatus {
    /// Maps gateway vocabulary (`paid`, `pix.paid`, `waiting_payment`, ...) to a status.
    pub fn from_gateway(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        let key = lowered.rsplit('.').next().unwrap_or_default();
        match key {
            "approved" | "paid" | "completed" | "complete" | "success" | "succeeded"
            | "confirmed" | "authorized" => PaymentStatus::Approved,
            "pending" | "waiting" | "waiting_payment" | "processing" | "generated"
            | "created" | "in_process" | "billet_printed" => PaymentStatus::Pending,
            "refused" | "declined" | "failed" | "canceled" | "cancelled" | "expired"
            | "rejected" => PaymentStatus::Refused,
            "refunded" | "chargeback" | "chargedback" | "charged_back" => {
                PaymentStatus::Refunded
            }
            _ => PaymentStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedProduct {
    pub code: String,
    pub title: String,
    pub description: String,
    /// Integer cents.
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NormalizedPayment {
    pub platform: Option<Platform>,
    pub email: Option<String>,
    /// Integer cents.
    pub amount: Option<i64>,
    pub status: PaymentStatus,
    pub products: Vec<NormalizedProduct>,
}

#[derive(Debug, Clone)]
pub enum GatewayPayload {
    Vega(VegaPayload),
    GgCheckout(GgCheckoutPayload),
    AmploPay(AmploPayPayload),
    Unrecognized(JsonValue),
}

impl GatewayPayload {
    pub fn parse(hint: Option<Platform>, raw: &JsonValue) -> Self {
        if let Some(parsed) = hint.and_then(|platform| Self::parse_as(platform, raw)) {
            return parsed;
        }
        Self::sniff(raw)
            .into_iter()
            .find_map(|platform| Self::parse_as(platform, raw))
            .unwrap_or_else(|| GatewayPayload::Unrecognized(raw.clone()))
    }

    /// `None` when the payload lacks the fields that identify the gateway's shape.
    fn parse_as(platform: Platform, raw: &JsonValue) -> Option<Self> {
        match platform {
            Platform::Vega => {
                let payload: VegaPayload = serde_json::from_value(raw.clone()).ok()?;
                (!payload.products.is_empty()).then_some(GatewayPayload::Vega(payload))
            }
            Platform::GgCheckout => {
                let payload: GgCheckoutPayload = serde_json::from_value(raw.clone()).ok()?;
                (!payload.plans.is_empty()).then_some(GatewayPayload::GgCheckout(payload))
            }
            Platform::AmploPay => {
                let payload: AmploPayPayload = serde_json::from_value(raw.clone()).ok()?;
                let identified = payload.product_id.as_ref().and_then(id_text).is_some()
                    || payload.title().is_some();
                identified.then_some(GatewayPayload::AmploPay(payload))
            }
        }
    }

    /// Candidate gateways in priority order: direct product fields,
    /// then `products[]`, then `plans[]`.
    fn sniff(raw: &JsonValue) -> Vec<Platform> {
        let Some(object) = raw.as_object() else {
            return Vec::new();
        };
        let has_text = |key: &str| object.get(key).and_then(id_text).is_some();
        let has_array = |key: &str| {
            object
                .get(key)
                .and_then(JsonValue::as_array)
                .is_some_and(|items| !items.is_empty())
        };

        let mut candidates = Vec::with_capacity(3);
        if ["product_id", "product_title", "product_name"]
            .iter()
            .any(|key| has_text(key))
        {
            candidates.push(Platform::AmploPay);
        }
        if has_array("products") {
            candidates.push(Platform::Vega);
        }
        if has_array("plans") {
            candidates.push(Platform::GgCheckout);
        }
        candidates
    }

    pub fn platform(&self) -> Option<Platform> {
        match self {
            GatewayPayload::Vega(_) => Some(Platform::Vega),
            GatewayPayload::GgCheckout(_) => Some(Platform::GgCheckout),
            GatewayPayload::AmploPay(_) => Some(Platform::AmploPay),
            GatewayPayload::Unrecognized(_) => None,
        }
    }

    pub fn normalize(&self) -> NormalizedPayment {
        match self {
            GatewayPayload::Vega(payload) => normalize_vega(payload),
            GatewayPayload::GgCheckout(payload) => normalize_ggcheckout(payload),
            GatewayPayload::AmploPay(payload) => normalize_amplopay(payload),
            GatewayPayload::Unrecognized(raw) => NormalizedPayment {
                platform: None,
                email: probe_email(raw),
                amount: None,
                status: PaymentStatus::Unknown,
                products: Vec::new(),
            },
        }
    }
}

/// Parses and normalizes in one step. The hint is kept as the platform even
/// when the payload itself is unrecognized.
pub fn normalize(hint: Option<Platform>, raw: &JsonValue) -> NormalizedPayment {
    let mut normalized = GatewayPayload::parse(hint, raw).normalize();
    if normalized.platform.is_none() {
        normalized.platform = hint;
    }
    normalized
}

fn normalize_vega(payload: &VegaPayload) -> NormalizedPayment {
    let mut products = ProductSet::default();
    for item in &payload.products {
        products.push(
            item.code.as_ref().or(item.id.as_ref()),
            item.title
                .as_deref()
                .filter(|title| !title.trim().is_empty())
                .or(item.name.as_deref()),
            item.description.as_deref(),
            item.price
                .as_ref()
                .and_then(|price| amount_to_cents(price, AmountUnit::Reais)),
        );
    }

    let amount = payload
        .total_price
        .as_ref()
        .and_then(|total| amount_to_cents(total, AmountUnit::Reais))
        .or_else(|| products.total());

    NormalizedPayment {
        platform: Some(Platform::Vega),
        email: customer_email(payload.customer.as_ref(), payload.email.as_deref()),
        amount,
        status: status_of(&[payload.status.as_deref()]),
        products: products.into_products(),
    }
}

fn normalize_ggcheckout(payload: &GgCheckoutPayload) -> NormalizedPayment {
    let mut products = ProductSet::default();
    for plan in &payload.plans {
        if plan.products.is_empty() {
            products.push(
                plan.id.as_ref(),
                plan.name.as_deref(),
                None,
                plan.price
                    .as_ref()
                    .and_then(|price| amount_to_cents(price, AmountUnit::Cents)),
            );
            continue;
        }
        for item in &plan.products {
            products.push(
                item.id.as_ref(),
                item.name.as_deref(),
                item.description.as_deref(),
                item.price
                    .as_ref()
                    .and_then(|price| amount_to_cents(price, AmountUnit::Cents)),
            );
        }
    }

    let payment = payload.payment.as_ref();
    let amount = payment
        .and_then(|p| p.amount.as_ref())
        .and_then(|total| amount_to_cents(total, AmountUnit::Cents))
        .or_else(|| products.total());

    NormalizedPayment {
        platform: Some(Platform::GgCheckout),
        email: customer_email(payload.customer.as_ref(), None),
        amount,
        status: status_of(&[
            payment.and_then(|p| p.status.as_deref()),
            payload.status.as_deref(),
            payload.event.as_deref(),
        ]),
        products: products.into_products(),
    }
}

fn normalize_amplopay(payload: &AmploPayPayload) -> NormalizedPayment {
    let amount = payload
        .amount
        .as_ref()
        .and_then(|total| amount_to_cents(total, AmountUnit::Reais));

    let mut products = ProductSet::default();
    products.push(
        payload.product_id.as_ref(),
        payload.title(),
        payload.product_description.as_deref(),
        amount,
    );

    NormalizedPayment {
        platform: Some(Platform::AmploPay),
        email: customer_email(payload.customer.as_ref(), payload.fallback_email()),
        amount,
        status: status_of(&[payload.status.as_deref()]),
        products: products.into_products(),
    }
}

/// Line items keyed by inferred id, first occurrence wins.
#[derive(Default)]
struct ProductSet {
    by_key: BTreeMap<String, NormalizedProduct>,
}

impl ProductSet {
    fn push(
        &mut self,
        id: Option<&JsonValue>,
        title: Option<&str>,
        description: Option<&str>,
        amount: Option<i64>,
    ) {
        let code = id.and_then(id_text);
        let title = non_empty(title);
        let key = match (&code, &title) {
            (Some(code), _) => format!("id:{}", code),
            (None, Some(title)) => format!("title:{}", title.to_lowercase()),
            (None, None) => format!("item:{:04}", self.by_key.len()),
        };

        self.by_key.entry(key).or_insert_with(|| NormalizedProduct {
            code: code.unwrap_or_else(|| UNKNOWN_CODE.to_string()),
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            description: non_empty(description)
                .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string()),
            amount,
        });
    }

    fn total(&self) -> Option<i64> {
        self.by_key
            .values()
            .filter_map(|product| product.amount)
            .fold(None, |acc, amount| Some(acc.unwrap_or(0) + amount))
    }

    fn into_products(self) -> Vec<NormalizedProduct> {
        self.by_key.into_values().collect()
    }
}

fn id_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => non_empty(Some(s.as_str())),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn clean_email(value: Option<&str>) -> Option<String> {
    non_empty(value).map(|email| email.to_lowercase())
}

fn customer_email(customer: Option<&GatewayCustomer>, fallback: Option<&str>) -> Option<String> {
    clean_email(customer.and_then(|c| c.email.as_deref())).or_else(|| clean_email(fallback))
}

fn status_of(candidates: &[Option<&str>]) -> PaymentStatus {
    candidates
        .iter()
        .flatten()
        .map(|raw| PaymentStatus::from_gateway(raw))
        .find(|status| *status != PaymentStatus::Unknown)
        .unwrap_or(PaymentStatus::Unknown)
}

fn probe_email(raw: &JsonValue) -> Option<String> {
    ["/email", "/customer/email", "/customer_email", "/buyer/email"]
        .iter()
        .find_map(|pointer| clean_email(raw.pointer(pointer).and_then(JsonValue::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_vega_products_and_total() {
        let raw = json!({
            "status": "approved",
            "total_price": 147.9,
            "customer": { "name": "Ana", "email": "  Ana@Example.COM " },
            "products": [
                { "code": "KIT-02", "title": "Kit Natal", "description": "Moldes natalinos", "price": 50.0 },
                { "code": "KIT-01", "title": "Kit Páscoa", "price": "97,90" },
                { "code": "KIT-02", "title": "Kit Natal (duplicado)", "price": 50.0 }
            ]
        });

        let normalized = normalize(Some(Platform::Vega), &raw);
        assert_eq!(normalized.platform, Some(Platform::Vega));
        assert_eq!(normalized.email.as_deref(), Some("ana@example.com"));
        assert_eq!(normalized.amount, Some(14_790));
        assert_eq!(normalized.status, PaymentStatus::Approved);

        let codes: Vec<&str> = normalized.products.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["KIT-01", "KIT-02"]);
        assert_eq!(normalized.products[1].title, "Kit Natal");
        assert_eq!(normalized.products[0].description, UNKNOWN_DESCRIPTION);
        assert_eq!(normalized.products[0].amount, Some(9_790));
    }

    #[test]
    fn normalizes_ggcheckout_nested_plans() {
        let raw = json!({
            "event": "pix.paid",
            "customer": { "email": "bia@example.com" },
            "payment": { "amount": 4990 },
            "plans": [
                { "id": 7, "name": "Anual", "products": [
                    { "id": 11, "name": "Atividades", "description": "Acesso anual", "price": 2990 },
                    { "id": 12, "name": "Papercrafts", "price": 2000 }
                ]},
                { "id": 8, "name": "Bônus", "price": 0 }
            ]
        });

        let normalized = normalize(Some(Platform::GgCheckout), &raw);
        assert_eq!(normalized.status, PaymentStatus::Approved);
        assert_eq!(normalized.amount, Some(4_990));
        assert_eq!(normalized.email.as_deref(), Some("bia@example.com"));

        let titles: Vec<&str> = normalized.products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Atividades", "Papercrafts", "Bônus"]);
    }

    #[test]
    fn normalizes_amplopay_top_level_product() {
        let raw = json!({
            "product_id": "amp-991",
            "product_name": "Plano Mensal",
            "amount": "49,90",
            "status": "waiting_payment",
            "customer_email": "CARLA@example.com"
        });

        let normalized = normalize(Some(Platform::AmploPay), &raw);
        assert_eq!(normalized.status, PaymentStatus::Pending);
        assert_eq!(normalized.amount, Some(4_990));
        assert_eq!(normalized.email.as_deref(), Some("carla@example.com"));
        assert_eq!(
            normalized.products,
            vec![NormalizedProduct {
                code: "amp-991".into(),
                title: "Plano Mensal".into(),
                description: UNKNOWN_DESCRIPTION.into(),
                amount: Some(4_990),
            }]
        );
    }

    #[test]
    fn wrong_hint_falls_back_to_sniffing() {
        let raw = json!({ "products": [{ "code": "X1", "title": "Kit" }] });
        let parsed = GatewayPayload::parse(Some(Platform::AmploPay), &raw);
        assert_eq!(parsed.platform(), Some(Platform::Vega));
    }

    #[test]
    fn direct_fields_take_priority_when_sniffing() {
        let raw = json!({
            "product_id": 5,
            "products": [{ "code": "other" }],
        });
        let parsed = GatewayPayload::parse(None, &raw);
        assert_eq!(parsed.platform(), Some(Platform::AmploPay));
        assert_eq!(parsed.normalize().products[0].code, "5");
    }

    #[test]
    fn unrecognized_payload_keeps_email_and_hint() {
        let raw = json!({ "foo": 1, "buyer": { "email": "Dora@Example.com" }, "products": [] });
        let normalized = normalize(Some(Platform::Vega), &raw);
        assert!(normalized.products.is_empty());
        assert_eq!(normalized.status, PaymentStatus::Unknown);
        assert_eq!(normalized.platform, Some(Platform::Vega));
        assert_eq!(normalized.email.as_deref(), Some("dora@example.com"));
    }

    #[test]
    fn missing_fields_become_placeholders() {
        let raw = json!({ "products": [{}, {}] });
        let normalized = normalize(None, &raw);
        assert_eq!(normalized.products.len(), 2);
        for product in &normalized.products {
            assert_eq!(product.code, UNKNOWN_CODE);
            assert_eq!(product.title, UNKNOWN_TITLE);
            assert_eq!(product.amount, None);
        }
        assert_eq!(normalized.amount, None);
    }

    #[test]
    fn total_falls_back_to_line_items() {
        let raw = json!({ "products": [
            { "code": "a", "price": 10.5 },
            { "code": "b", "price": 4.5 },
            { "code": "c" }
        ]});
        assert_eq!(normalize(None, &raw).amount, Some(1_500));
    }

    #[test]
    fn any_recognized_field_yields_products() {
        let minimal = [
            json!({ "product_id": "p1" }),
            json!({ "product_title": "Só título" }),
            json!({ "products": [{ "title": "Kit" }] }),
            json!({ "products": [{ "code": 3 }] }),
            json!({ "plans": [{ "products": [{ "id": "gg-1" }] }] }),
            json!({ "plans": [{ "name": "Plano sem produtos" }] }),
            json!({ "product_id": null, "products": [{ "code": "A", "title": "Kit" }] }),
            json!({ "product_id": "", "plans": [{ "id": 9 }] }),
            json!({ "product_name": "Plano Mensal", "amount": 10 }),
            json!({ "product_id": "p2", "email": "a@example.com", "customer_email": "b@example.com" }),
            json!({ "product_title": "Mensal", "product_name": "Plano Mensal" }),
            json!({ "products": [{ "title": 123 }] }),
            json!({ "plans": [{ "name": "Anual", "products": null }] }),
            json!({ "products": [{ "code": "K" }], "customer": "not-an-object" }),
        ];

        for raw in &minimal {
            for hint in [None, Some(Platform::Vega), Some(Platform::GgCheckout), Some(Platform::AmploPay)] {
                let normalized = normalize(hint, raw);
                assert!(
                    !normalized.products.is_empty(),
                    "no products for {} with hint {:?}",
                    raw,
                    hint
                );
            }
        }
    }

    #[test]
    fn rejected_candidate_falls_through_to_next_shape() {
        let raw = json!({ "product_id": null, "products": [{ "code": "A", "title": "Kit" }] });
        let parsed = GatewayPayload::parse(None, &raw);
        assert_eq!(parsed.platform(), Some(Platform::Vega));
        assert_eq!(parsed.normalize().products[0].title, "Kit");

        let raw = json!({ "product_name": "Plano Mensal", "amount": 10 });
        let normalized = normalize(None, &raw);
        assert_eq!(normalized.platform, Some(Platform::AmploPay));
        assert_eq!(normalized.products[0].title, "Plano Mensal");
        assert_eq!(normalized.amount, Some(1_000));
    }

    #[test]
    fn tolerates_duplicate_spellings_and_odd_field_types() {
        let raw = json!({
            "product_id": 42,
            "product_title": "Mensal",
            "product_name": "Plano Mensal",
            "email": "Ana@Example.com",
            "customer_email": "bia@example.com"
        });
        let normalized = normalize(Some(Platform::AmploPay), &raw);
        assert_eq!(normalized.products[0].title, "Mensal");
        assert_eq!(normalized.email.as_deref(), Some("ana@example.com"));

        let raw = json!({ "products": [{ "code": "A", "title": 123 }] });
        assert_eq!(normalize(Some(Platform::Vega), &raw).products[0].title, "123");

        let raw = json!({ "plans": [{ "id": 1, "name": "Anual", "products": null }] });
        let normalized = normalize(Some(Platform::GgCheckout), &raw);
        assert_eq!(normalized.products.len(), 1);
        assert_eq!(normalized.products[0].title, "Anual");
    }

    #[test]
    fn maps_gateway_statuses() {
        assert_eq!(PaymentStatus::from_gateway("PAID"), PaymentStatus::Approved);
        assert_eq!(PaymentStatus::from_gateway("pix.generated"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_gateway("card.declined"), PaymentStatus::Refused);
        assert_eq!(PaymentStatus::from_gateway("chargeback"), PaymentStatus::Refunded);
        assert_eq!(PaymentStatus::from_gateway("whatever"), PaymentStatus::Unknown);
    }
}
