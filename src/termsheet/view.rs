// src/termsheet/view.rs
use serde_json::Value;
use std::fmt;

use crate::termsheet::sections::{
    CouponPayment, Field, RedemptionEvent, TermSheet, NOT_AVAILABLE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub label: &'static str,
    pub value: String,
    /// Rendered with emphasis.
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: Option<&'static str>,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: &'static str,
    pub properties: Vec<Property>,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabBody {
    Cards(Vec<Card>),
    /// Whole document, pretty-printed.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub title: &'static str,
    pub body: TabBody,
}

/// Sectioned, display-ready form of one extraction result.
#[derive(Debug, Clone, PartialEq)]
pub struct TermSheetView {
    pub tabs: Vec<Tab>,
}

pub const TAB_TITLES: [&str; 5] = [
    "General Info",
    "Underlyings & Dates",
    "Coupon & Redemption",
    "Risk Factors",
    "Raw JSON",
];

fn prop(label: &'static str, field: &Field) -> Property {
    Property {
        label,
        value: field.text(),
        important: false,
    }
}

fn key_prop(label: &'static str, field: &Field) -> Property {
    Property {
        important: true,
        ..prop(label, field)
    }
}

fn card(title: &'static str, properties: Vec<Property>) -> Card {
    Card {
        title,
        properties,
        table: None,
    }
}

/// A table only exists when it has at least one row.
fn table(title: Option<&'static str>, headers: Vec<&'static str>, rows: Vec<Vec<String>>) -> Option<Table> {
    (!rows.is_empty()).then_some(Table { title, headers, rows })
}

fn general_info(sheet: &TermSheet) -> Vec<Card> {
    let mut cards = Vec::new();

    if let Some(pg) = &sheet.product_general {
        cards.push(card(
            "Product General Information",
            vec![
                key_prop("Product Name", &pg.product_name),
                prop("Product Type", &pg.product_type),
                prop("Currency", &pg.currency),
                prop("Issue Size", &pg.issue_size),
                prop("Denomination", &pg.denomination),
                prop("Minimum Investment", &pg.minimum_investment),
                prop("ISIN", &pg.isin),
                prop("Valor", &pg.valor),
            ],
        ));
    }

    if let Some(ii) = &sheet.issuer_information {
        let mut properties = vec![
            key_prop("Issuer Name", &ii.issuer_name),
            prop("Issuer Address", &ii.issuer_address),
            prop("Issuer Rating", &ii.issuer_rating),
            prop("Supervisory Authority", &ii.supervisory_authority),
            prop("Calculation Agent", &ii.calculation_agent),
        ];
        if let Some(agents) = ii.fiscal_transfer_paying_agents.joined_list() {
            properties.push(Property {
                label: "Fiscal/Transfer/Paying Agents",
                value: agents,
                important: false,
            });
        }
        cards.push(card("Issuer Information", properties));
    }

    if let Some(pd) = &sheet.product_description {
        let mut properties = vec![
            prop("Description", &pd.description),
            prop("Market Expectation", &pd.market_expectation),
        ];
        if pd.reference_codes.as_object().is_some_and(|codes| !codes.is_empty()) {
            properties.push(prop("Reference Code", &pd.reference_codes.get("code")));
        }
        cards.push(card("Product Description", properties));
    }

    cards
}

fn underlyings_and_dates(sheet: &TermSheet) -> Vec<Card> {
    let mut cards = Vec::new();

    if let Some(dates) = &sheet.dates {
        cards.push(card(
            "Key Dates",
            vec![
                key_prop("Initial Fixing Date", &dates.initial_fixing_date),
                key_prop("Issue Date", &dates.issue_date),
                key_prop("Final Fixing Date", &dates.final_fixing_date),
                key_prop("Redemption Date", &dates.redemption_date),
            ],
        ));
    }

    if let Some(underlyings) = &sheet.underlyings {
        let rows = underlyings
            .iter()
            .map(|u| {
                vec![
                    u.name.text(),
                    u.related_exchange.text(),
                    u.reference_currency.text(),
                    u.bloomberg_ticker.text(),
                    u.initial_fixing_level.text(),
                    u.strike_level.text(),
                ]
            })
            .collect();
        cards.push(Card {
            table: table(
                None,
                vec!["Name", "Exchange", "Currency", "Bloomberg Ticker", "Initial Fixing Level", "Strike Level"],
                rows,
            ),
            ..card("Underlyings", Vec::new())
        });
    }

    cards
}

fn coupon_and_redemption(sheet: &TermSheet) -> Vec<Card> {
    let mut cards = Vec::new();

    if let Some(coupon) = &sheet.coupon {
        let rows = coupon
            .coupon_payment_dates
            .records::<CouponPayment>()
            .iter()
            .map(|p| {
                vec![
                    p.payment_number.text_or(""),
                    p.coupon_rate.text(),
                    p.payment_date.text(),
                ]
            })
            .collect();
        cards.push(Card {
            table: table(
                Some("Coupon Payment Dates"),
                vec!["Payment #", "Coupon Rate", "Payment Date"],
                rows,
            ),
            ..card(
                "Coupon Information",
                vec![
                    prop("Coupon Amount Formula", &coupon.coupon_amount_formula),
                    prop("Coupon Rate", &coupon.coupon_rate),
                ],
            )
        });
    }

    if let Some(er) = &sheet.early_redemption {
        let rows = er
            .redemption_events
            .records::<RedemptionEvent>()
            .iter()
            .map(|e| {
                vec![
                    e.observation_number.text_or(""),
                    e.autocall_level.text(),
                    e.early_redemption_amount.text(),
                    e.observation_date.text(),
                    e.redemption_date.text(),
                ]
            })
            .collect();
        cards.push(Card {
            table: table(
                Some("Redemption Events"),
                vec!["Observation #", "Autocall Level", "Redemption Amount", "Observation Date", "Redemption Date"],
                rows,
            ),
            ..card(
                "Early Redemption",
                vec![prop("Automatic Early Redemption Event", &er.automatic_early_redemption_event)],
            )
        });
    }

    if let Some(r) = &sheet.redemption {
        cards.push(card(
            "Final Redemption",
            vec![
                prop("Redemption Formula", &r.redemption_formula),
                prop("Final Fixing Level", &r.final_fixing_level),
                prop("Performance Calculation", &r.performance_calculation),
                prop("Worst Performance", &r.worst_performance),
            ],
        ));
    }

    cards
}

fn risk_factors(sheet: &TermSheet) -> Vec<Card> {
    let mut cards = Vec::new();

    if let Some(rf) = &sheet.risk_factors {
        cards.push(card(
            "Risk Factors",
            vec![
                prop("Risk of Loss", &rf.risk_of_loss),
                prop("Additional Risk Factors", &rf.additional_risk_factors),
                prop("Issuer Credit Risk", &rf.issuer_credit_risk),
                prop("Market Risks", &rf.market_risks),
            ],
        ));
    }

    if let Some(doc) = &sheet.product_documentation {
        cards.push(card(
            "Product Documentation",
            vec![
                prop("Unique Identifier", &doc.unique_identifier),
                prop("Notices", &doc.notices),
                prop("Listing Exchange", &doc.listing_exchange),
                prop("Business Day Convention", &doc.business_day_convention),
                prop("Secondary Market", &doc.secondary_market),
                prop("Settlement Type", &doc.settlement_type),
            ],
        ));
    }

    cards
}

impl TermSheetView {
    pub fn from_result(result: &Value) -> Self {
        let sheet = TermSheet::from_value(result);
        let raw = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());

        let bodies = [
            TabBody::Cards(general_info(&sheet)),
            TabBody::Cards(underlyings_and_dates(&sheet)),
            TabBody::Cards(coupon_and_redemption(&sheet)),
            TabBody::Cards(risk_factors(&sheet)),
            TabBody::Raw(raw),
        ];

        let tabs = TAB_TITLES
            .into_iter()
            .zip(bodies)
            .map(|(title, body)| Tab { title, body })
            .collect();

        TermSheetView { tabs }
    }
}

#[cfg(test)]
impl TermSheetView {
    pub fn tab(&self, title: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.title == title)
    }

    pub fn cards(&self, tab_title: &str) -> &[Card] {
        match self.tab(tab_title).map(|t| &t.body) {
            Some(TabBody::Cards(cards)) => cards,
            _ => &[],
        }
    }
}

#[cfg(test)]
impl Card {
    pub fn property(&self, label: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.value.as_str())
    }
}

// Plain-text form used by `extract --sections`.
impl fmt::Display for TermSheetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tab in &self.tabs {
            writeln!(f, "== {} ==", tab.title)?;
            match &tab.body {
                TabBody::Raw(_) => writeln!(f, "(see JSON output)")?,
                TabBody::Cards(cards) if cards.is_empty() => writeln!(f, "{}", NOT_AVAILABLE)?,
                TabBody::Cards(cards) => {
                    for card in cards {
                        writeln!(f, "-- {}", card.title)?;
                        for p in &card.properties {
                            writeln!(f, "{}: {}", p.label, p.value)?;
                        }
                        if let Some(table) = &card.table {
                            write_table(f, table)?;
                        }
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, table: &Table) -> fmt::Result {
    if let Some(title) = table.title {
        writeln!(f, "{}:", title)?;
    }
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    writeln!(f, "{}", line(table.headers.clone()))?;
    for row in &table.rows {
        writeln!(f, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_result() -> Value {
        json!({
            "productGeneral": {
                "productName": "Autocall Note on SMI",
                "productType": "Autocallable",
                "currency": "CHF",
                "ISIN": "CH1234567890"
            },
            "issuerInformation": {
                "issuerName": "Example Bank AG",
                "fiscalTransferPayingAgents": ["Example Bank AG", "", "SIX SIS AG"]
            },
            "productDescription": {
                "description": "Capital at risk",
                "referenceCodes": {"code": "SSPA 1230"}
            },
            "dates": {"issueDate": "2024-01-15"},
            "underlyings": [
                {"name": "SMI", "bloombergTicker": "SMI Index", "strikeLevel": 11000},
                {"name": "SX5E"}
            ],
            "coupon": {
                "couponRate": "6.00% p.a.",
                "couponPaymentDates": [
                    {"paymentNumber": 1, "paymentDate": "2024-07-15"},
                    {"couponRate": "3.00%"}
                ]
            },
            "earlyRedemption": {
                "automaticEarlyRedemptionEvent": "All underlyings at or above 100%",
                "redemptionEvents": [{"observationNumber": 1, "autocallLevel": "100%"}]
            },
            "redemption": {"worstPerformance": "Worst of"},
            "riskFactors": {"riskOfLoss": "Total loss possible"},
            "productDocumentation": {"listingExchange": "SIX"}
        })
    }

    #[test]
    fn tabs_come_in_fixed_order() {
        let view = TermSheetView::from_result(&json!({}));
        let titles: Vec<&str> = view.tabs.iter().map(|t| t.title).collect();
        assert_eq!(titles, TAB_TITLES.to_vec());
    }

    #[test]
    fn product_name_only_shows_sentinels_elsewhere() {
        let view = TermSheetView::from_result(&json!({"productGeneral": {"productName": "Autocall Note"}}));

        let general = view.cards("General Info");
        assert_eq!(general.len(), 1);
        let pg = &general[0];
        assert_eq!(pg.title, "Product General Information");
        assert_eq!(pg.property("Product Name"), Some("Autocall Note"));
        for label in ["Product Type", "Currency", "Issue Size", "Denomination", "Minimum Investment", "ISIN", "Valor"] {
            assert_eq!(pg.property(label), Some(NOT_AVAILABLE), "{label}");
        }
        assert!(pg.properties[0].important);

        assert!(view.cards("Underlyings & Dates").is_empty());
        assert!(view.cards("Coupon & Redemption").is_empty());
        assert!(view.cards("Risk Factors").is_empty());
    }

    #[test]
    fn empty_underlyings_render_no_table() {
        let view = TermSheetView::from_result(&json!({"underlyings": []}));
        assert!(view.cards("Underlyings & Dates").is_empty());
    }

    #[test]
    fn underlyings_without_usable_rows_render_no_table() {
        let view = TermSheetView::from_result(&json!({"underlyings": [null, {}]}));
        let cards = view.cards("Underlyings & Dates");
        assert_eq!(cards.len(), 1);
        assert!(cards[0].table.is_none());
    }

    #[test]
    fn list_sections_become_tables_with_sentinel_cells() {
        let view = TermSheetView::from_result(&full_result());

        let underlyings = &view.cards("Underlyings & Dates")[1];
        let table = underlyings.table.as_ref().unwrap();
        assert_eq!(table.headers.len(), 6);
        assert_eq!(
            table.rows[0],
            vec!["SMI", NOT_AVAILABLE, NOT_AVAILABLE, "SMI Index", NOT_AVAILABLE, "11000"]
        );
        assert_eq!(table.rows[1][0], "SX5E");
        assert_eq!(table.rows[1][3], NOT_AVAILABLE);

        let coupon = &view.cards("Coupon & Redemption")[0];
        let payments = coupon.table.as_ref().unwrap();
        assert_eq!(payments.rows[0], vec!["1", NOT_AVAILABLE, "2024-07-15"]);
        // Missing ordinal renders blank rather than N/A.
        assert_eq!(payments.rows[1], vec!["", "3.00%", NOT_AVAILABLE]);
    }

    #[test]
    fn issuer_agents_and_reference_code_are_conditional() {
        let view = TermSheetView::from_result(&full_result());
        let general = view.cards("General Info");
        assert_eq!(
            general[1].property("Fiscal/Transfer/Paying Agents"),
            Some("Example Bank AG, SIX SIS AG")
        );
        assert_eq!(general[2].property("Reference Code"), Some("SSPA 1230"));

        let sparse = TermSheetView::from_result(&json!({
            "issuerInformation": {"issuerName": "X", "fiscalTransferPayingAgents": "X"},
            "productDescription": {"referenceCodes": "SSPA"}
        }));
        let general = sparse.cards("General Info");
        assert_eq!(general[0].property("Fiscal/Transfer/Paying Agents"), None);
        assert_eq!(general[1].property("Reference Code"), None);
    }

    #[test]
    fn every_subset_of_sections_renders() {
        let full = full_result();
        let keys: Vec<String> = full.as_object().unwrap().keys().cloned().collect();
        // Drop each key in turn, then every prefix of keys.
        for skip in 0..keys.len() {
            let mut doc = full.clone();
            doc.as_object_mut().unwrap().remove(&keys[skip]);
            let view = TermSheetView::from_result(&doc);
            assert_eq!(view.tabs.len(), 5);
        }
        for n in 0..=keys.len() {
            let mut doc = full.clone();
            for key in &keys[..n] {
                doc.as_object_mut().unwrap().remove(key);
            }
            let view = TermSheetView::from_result(&doc);
            let text = view.to_string();
            assert!(text.contains("== Raw JSON =="));
        }
    }

    #[test]
    fn raw_tab_holds_the_pretty_document() {
        let doc = json!({"b": 1, "a": {"c": [1, 2]}});
        let view = TermSheetView::from_result(&doc);
        match &view.tab("Raw JSON").unwrap().body {
            TabBody::Raw(raw) => {
                assert!(raw.starts_with("{\n  \"b\": 1"));
                assert_eq!(serde_json::from_str::<Value>(raw).unwrap(), doc);
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn text_rendering_lists_properties_and_tables() {
        let text = TermSheetView::from_result(&full_result()).to_string();
        assert!(text.contains("-- Product General Information\nProduct Name: Autocall Note on SMI\n"));
        assert!(text.contains("Coupon Payment Dates:\nPayment # | Coupon Rate | Payment Date"));
        assert!(text.contains("Risk of Loss: Total loss possible"));
    }
}
