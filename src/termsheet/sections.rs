// src/termsheet/sections.rs
//! Optional-field records for each section of an extracted term sheet.
//!
//! Every field may be missing or hold any JSON value. Reading one never
//! fails; absent values come back as [`NOT_AVAILABLE`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

/// One optional value from the extracted document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Field(Option<Value>);

impl Field {
    pub fn new(value: Option<Value>) -> Self {
        Field(value)
    }

    pub fn value(&self) -> Option<&Value> {
        self.0.as_ref().filter(|v| !v.is_null())
    }

    #[cfg(test)]
    pub fn is_present(&self) -> bool {
        self.value().is_some()
    }

    /// Display text, or `N/A` when absent.
    pub fn text(&self) -> String {
        self.text_or(NOT_AVAILABLE)
    }

    pub fn text_or(&self, default: &str) -> String {
        match self.value() {
            Some(value) => value_text(value),
            None => default.to_string(),
        }
    }

    /// Nested field of a mapping value; absent for anything else.
    pub fn get(&self, key: &str) -> Field {
        Field(self.value().and_then(|v| v.get(key)).cloned())
    }

    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.value().and_then(Value::as_object)
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        self.value().and_then(Value::as_array)
    }

    /// Non-empty list entries joined by ", ", when the field is a non-empty list.
    pub fn joined_list(&self) -> Option<String> {
        let items = self.as_list().filter(|items| !items.is_empty())?;
        let joined = items
            .iter()
            .filter(|item| is_truthy(item))
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", ");
        Some(joined)
    }

    /// Records for every usable element of a list field. Elements that are
    /// empty, null or not mappings are skipped.
    pub fn records<T: DeserializeOwned + Default>(&self) -> Vec<T> {
        self.as_list()
            .map(|items| {
                items
                    .iter()
                    .filter(|item| is_truthy(item) && item.is_object())
                    .map(record)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Text form of a JSON value: strings unquoted, lists comma-joined, and
/// everything else in its JSON form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Whether a value counts as "has content": non-null, non-empty, non-zero, true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Reads a section record from any value. Non-mappings give an all-absent record.
pub fn record<T: DeserializeOwned + Default>(value: &Value) -> T {
    if value.is_object() {
        serde_json::from_value(value.clone()).unwrap_or_default()
    } else {
        T::default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductGeneral {
    pub product_name: Field,
    pub product_type: Field,
    pub currency: Field,
    pub issue_size: Field,
    pub denomination: Field,
    pub minimum_investment: Field,
    #[serde(rename = "ISIN")]
    pub isin: Field,
    pub valor: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IssuerInformation {
    pub issuer_name: Field,
    pub issuer_address: Field,
    pub issuer_rating: Field,
    pub supervisory_authority: Field,
    pub calculation_agent: Field,
    pub fiscal_transfer_paying_agents: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductDescription {
    pub description: Field,
    pub market_expectation: Field,
    pub reference_codes: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyDates {
    pub initial_fixing_date: Field,
    pub issue_date: Field,
    pub final_fixing_date: Field,
    pub redemption_date: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Underlying {
    pub name: Field,
    pub related_exchange: Field,
    pub reference_currency: Field,
    pub bloomberg_ticker: Field,
    pub initial_fixing_level: Field,
    pub strike_level: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Coupon {
    pub coupon_amount_formula: Field,
    pub coupon_rate: Field,
    pub coupon_payment_dates: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CouponPayment {
    pub payment_number: Field,
    pub coupon_rate: Field,
    pub payment_date: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EarlyRedemption {
    pub automatic_early_redemption_event: Field,
    pub redemption_events: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedemptionEvent {
    pub observation_number: Field,
    pub autocall_level: Field,
    pub early_redemption_amount: Field,
    pub observation_date: Field,
    pub redemption_date: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Redemption {
    pub redemption_formula: Field,
    pub final_fixing_level: Field,
    pub performance_calculation: Field,
    pub worst_performance: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskFactors {
    pub risk_of_loss: Field,
    pub additional_risk_factors: Field,
    pub issuer_credit_risk: Field,
    pub market_risks: Field,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductDocumentation {
    pub unique_identifier: Field,
    pub notices: Field,
    pub listing_exchange: Field,
    pub business_day_convention: Field,
    pub secondary_market: Field,
    pub settlement_type: Field,
}

/// All known sections of a result. A section is `Some` only when its key
/// holds content; `underlyings` is `Some` only for a non-empty list.
#[derive(Debug, Default)]
pub struct TermSheet {
    pub product_general: Option<ProductGeneral>,
    pub issuer_information: Option<IssuerInformation>,
    pub product_description: Option<ProductDescription>,
    pub dates: Option<KeyDates>,
    pub underlyings: Option<Vec<Underlying>>,
    pub coupon: Option<Coupon>,
    pub early_redemption: Option<EarlyRedemption>,
    pub redemption: Option<Redemption>,
    pub risk_factors: Option<RiskFactors>,
    pub product_documentation: Option<ProductDocumentation>,
}

fn section<T: DeserializeOwned + Default>(result: &Value, key: &str) -> Option<T> {
    result.get(key).filter(|v| is_truthy(v)).map(record)
}

impl TermSheet {
    pub fn from_value(result: &Value) -> Self {
        let underlyings = result
            .get("underlyings")
            .filter(|v| is_truthy(v))
            .and_then(|v| v.is_array().then(|| Field::new(Some(v.clone())).records()));

        let product_documentation = result
            .get("productDocumentation")
            .filter(|v| is_truthy(v) && v.is_object())
            .map(record);

        TermSheet {
            product_general: section(result, "productGeneral"),
            issuer_information: section(result, "issuerInformation"),
            product_description: section(result, "productDescription"),
            dates: section(result, "dates"),
            underlyings,
            coupon: section(result, "coupon"),
            early_redemption: section(result, "earlyRedemption"),
            redemption: section(result, "redemption"),
            risk_factors: section(result, "riskFactors"),
            product_documentation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_fields_read_as_sentinel() {
        let pg: ProductGeneral = record(&json!({"productName": "Autocall Note", "currency": null}));
        assert_eq!(pg.product_name.text(), "Autocall Note");
        assert_eq!(pg.currency.text(), NOT_AVAILABLE);
        assert_eq!(pg.isin.text(), NOT_AVAILABLE);
    }

    #[test]
    fn isin_uses_its_upper_case_key() {
        let pg: ProductGeneral = record(&json!({"ISIN": "CH0123456789"}));
        assert_eq!(pg.isin.text(), "CH0123456789");
    }

    #[test]
    fn scalar_values_render_without_quotes() {
        let pg: ProductGeneral = record(&json!({
            "issueSize": 5000000,
            "denomination": 1000.5,
            "valor": true,
            "productType": ["Autocall", "Barrier"]
        }));
        assert_eq!(pg.issue_size.text(), "5000000");
        assert_eq!(pg.denomination.text(), "1000.5");
        assert_eq!(pg.valor.text(), "true");
        assert_eq!(pg.product_type.text(), "Autocall, Barrier");
    }

    #[test]
    fn non_mapping_section_gives_all_absent_record() {
        let dates: KeyDates = record(&json!("see prospectus"));
        assert!(!dates.issue_date.is_present());
        let dates: KeyDates = record(&json!([1, 2, 3]));
        assert_eq!(dates.redemption_date.text(), NOT_AVAILABLE);
    }

    #[test]
    fn records_skip_empty_and_non_mapping_elements() {
        let field = Field::new(Some(json!([
            {"name": "SMI"},
            null,
            {},
            "loose string",
            {"bloombergTicker": "SMI Index"}
        ])));
        let rows: Vec<Underlying> = field.records();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.text(), "SMI");
        assert_eq!(rows[1].name.text(), NOT_AVAILABLE);
        assert_eq!(rows[1].bloomberg_ticker.text(), "SMI Index");
    }

    #[test]
    fn joined_list_drops_blank_entries() {
        let field = Field::new(Some(json!(["UBS AG", "", null, "SIX SIS"])));
        assert_eq!(field.joined_list().as_deref(), Some("UBS AG, SIX SIS"));
        assert_eq!(Field::new(Some(json!([]))).joined_list(), None);
        assert_eq!(Field::new(Some(json!("UBS AG"))).joined_list(), None);
    }

    #[test]
    fn nested_get_is_absent_on_non_mappings() {
        let codes = Field::new(Some(json!({"code": "SSPA 1230"})));
        assert_eq!(codes.get("code").text(), "SSPA 1230");
        assert_eq!(codes.get("other").text(), NOT_AVAILABLE);
        assert!(!Field::new(Some(json!("x"))).get("code").is_present());
    }

    #[test]
    fn sections_need_content_to_be_present() {
        let sheet = TermSheet::from_value(&json!({
            "productGeneral": {},
            "dates": {"issueDate": "2024-01-15"},
            "underlyings": [],
            "riskFactors": null,
            "productDocumentation": "not a mapping"
        }));
        assert!(sheet.product_general.is_none());
        assert!(sheet.dates.is_some());
        assert!(sheet.underlyings.is_none());
        assert!(sheet.risk_factors.is_none());
        assert!(sheet.product_documentation.is_none());
    }

    #[test]
    fn non_object_document_has_no_sections() {
        for doc in [json!(null), json!("text"), json!([1, 2]), json!(42)] {
            let sheet = TermSheet::from_value(&doc);
            assert!(sheet.product_general.is_none());
            assert!(sheet.underlyings.is_none());
        }
    }
}
