//! The canonical invoice data model.
//!
//! An [`InvoiceDocument`] is an immutable-per-render snapshot: the renderer
//! only ever borrows it. Loading is deliberately lenient so that a draft
//! saved by any version of the editor still renders:
//! - numeric fields accept either strings or JSON numbers,
//! - `null` collections load as empty,
//! - missing sections take their defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::labels::Labels;
use crate::totals::parse_or_zero;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl LogoSize {
    /// Display height in CSS pixels.
    pub fn height_px(self) -> u32 {
        match self {
            LogoSize::Small => 40,
            LogoSize::Medium => 64,
            LogoSize::Large => 96,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoPlacement {
    /// In the header row, beside the title.
    #[default]
    Tucked,
    /// Above the sender block.
    Prominent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceTheme {
    #[default]
    Light,
    Dark,
}

impl InvoiceTheme {
    /// (background, header) base colors used when custom colors are off.
    pub fn base_colors(self) -> (&'static str, &'static str) {
        match self {
            InvoiceTheme::Light => ("#ffffff", "#e5e7eb"),
            InvoiceTheme::Dark => ("#0f172a", "#1e293b"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVariant {
    #[default]
    Modern,
    Classic,
    Minimal,
}

impl TemplateVariant {
    pub const ALL: [TemplateVariant; 3] = [
        TemplateVariant::Modern,
        TemplateVariant::Classic,
        TemplateVariant::Minimal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateVariant::Modern => "modern",
            TemplateVariant::Classic => "classic",
            TemplateVariant::Minimal => "minimal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    #[default]
    Percent,
    Flat,
}

/// Branding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentStyle {
    pub font_family: String,
    pub header_color: String,
    pub background_color: String,
    pub use_custom_colors: bool,
    pub logo_size: LogoSize,
    pub logo_placement: LogoPlacement,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            header_color: "#e5e7eb".to_string(),
            background_color: "#ffffff".to_string(),
            use_custom_colors: false,
            logo_size: LogoSize::Medium,
            logo_placement: LogoPlacement::Tucked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub invoice_theme: InvoiceTheme,
    pub use_custom_theme: bool,
    /// ISO 4217 code.
    pub currency: String,
    pub template: TemplateVariant,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            invoice_theme: InvoiceTheme::Light,
            use_custom_theme: false,
            currency: "USD".to_string(),
            template: TemplateVariant::Modern,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sender {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub attention: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ship_to: String,
}

/// Dates are ISO `YYYY-MM-DD` strings; formatting happens at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceMeta {
    #[serde(deserialize_with = "null_as_default")]
    pub invoice_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub po_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issue_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payment_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub due_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub payment_terms: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "numeric_string")]
    pub quantity: String,
    #[serde(deserialize_with = "numeric_string")]
    pub rate: String,
}

impl LineItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: &str, rate: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            quantity: quantity.to_string(),
            rate: rate.to_string(),
        }
    }

    /// quantity × rate, with invalid input treated as zero.
    pub fn amount(&self) -> f64 {
        parse_or_zero(&self.quantity) * parse_or_zero(&self.rate)
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.description.trim().is_empty()
            && self.quantity.trim().is_empty()
            && self.rate.trim().is_empty()
    }
}

/// Tax or discount adjustment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fee {
    pub enabled: bool,
    #[serde(deserialize_with = "numeric_string")]
    pub value: String,
    #[serde(rename = "type")]
    pub kind: FeeType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingFee {
    pub enabled: bool,
    #[serde(deserialize_with = "numeric_string")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub tax: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub discount: Fee,
    #[serde(deserialize_with = "null_as_default")]
    pub shipping: ShippingFee,
    #[serde(deserialize_with = "numeric_string")]
    pub amount_paid: String,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            tax: Fee {
                enabled: false,
                value: String::new(),
                kind: FeeType::Percent,
            },
            discount: Fee {
                enabled: false,
                value: String::new(),
                kind: FeeType::Flat,
            },
            shipping: ShippingFee::default(),
            amount_paid: String::new(),
        }
    }
}

/// One invoice snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceDocument {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// URL, local path, or `data:` URI.
    pub logo: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub style: DocumentStyle,
    #[serde(deserialize_with = "null_as_default")]
    pub labels: Labels,
    #[serde(deserialize_with = "null_as_default")]
    pub preferences: Preferences,

    #[serde(deserialize_with = "null_as_default")]
    pub sender: Sender,
    #[serde(deserialize_with = "null_as_default")]
    pub client: Client,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: InvoiceMeta,

    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub fees: FeeConfig,

    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(deserialize_with = "null_as_default")]
    pub terms: String,
}

impl Default for InvoiceDocument {
    fn default() -> Self {
        Self::new("draft", DateTime::<Utc>::default())
    }
}

impl InvoiceDocument {
    /// A fresh draft with every default populated and one empty line item.
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let id = id.into();
        Self {
            items: vec![LineItem {
                id: format!("{id}-item-1"),
                quantity: "1".to_string(),
                ..LineItem::default()
            }],
            id,
            created_at: now,
            updated_at: now,
            logo: None,
            style: DocumentStyle::default(),
            labels: Labels::default(),
            preferences: Preferences::default(),
            sender: Sender::default(),
            client: Client::default(),
            meta: InvoiceMeta::default(),
            fees: FeeConfig::default(),
            notes: String::new(),
            terms: String::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// The document's own theme wins only when it opts in.
    pub fn effective_theme(&self, app_theme: InvoiceTheme) -> InvoiceTheme {
        if self.preferences.use_custom_theme {
            self.preferences.invoice_theme
        } else {
            app_theme
        }
    }

    /// (background, header) colors before normalization.
    pub fn base_colors(&self, app_theme: InvoiceTheme) -> (String, String) {
        if self.style.use_custom_colors {
            (
                self.style.background_color.clone(),
                self.style.header_color.clone(),
            )
        } else {
            let (bg, header) = self.effective_theme(app_theme).base_colors();
            (bg.to_string(), header.to_string())
        }
    }

    pub fn logo_source(&self) -> Option<&str> {
        self.logo
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `"12.5"`, `12.5`, `12`, or `null` and keep the textual form.
fn numeric_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(f)) => f.to_string(),
        Some(Raw::Bool(_)) | None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelKey;

    #[test]
    fn lenient_numeric_fields() {
        let json = r#"{
            "items": [{"id": "a", "name": "Work", "quantity": 2, "rate": "50"}],
            "fees": {"tax": {"enabled": true, "value": 10.5, "type": "percent"}, "amountPaid": null}
        }"#;
        let doc = InvoiceDocument::from_json(json).unwrap();
        assert_eq!(doc.items[0].quantity, "2");
        assert_eq!(doc.items[0].rate, "50");
        assert_eq!(doc.fees.tax.value, "10.5");
        assert_eq!(doc.fees.amount_paid, "");
    }

    #[test]
    fn null_items_load_as_empty() {
        let doc = InvoiceDocument::from_json(r#"{"items": null, "labels": null}"#).unwrap();
        assert!(doc.items.is_empty());
        assert_eq!(doc.labels.get(LabelKey::Notes), "Notes");
    }

    #[test]
    fn null_sections_load_as_defaults() {
        let json = r#"{
            "style": null, "preferences": null, "sender": null, "client": null,
            "meta": null, "fees": null, "notes": null,
            "items": [{"id": "a", "name": null, "quantity": 1, "rate": 5}]
        }"#;
        let doc = InvoiceDocument::from_json(json).unwrap();
        assert_eq!(doc.style, DocumentStyle::default());
        assert_eq!(doc.preferences.currency, "USD");
        assert_eq!(doc.sender, Sender::default());
        assert_eq!(doc.meta.invoice_number, "");
        assert_eq!(doc.fees, FeeConfig::default());
        assert_eq!(doc.notes, "");
        assert_eq!(doc.items[0].name, "");
    }

    #[test]
    fn new_draft_has_defaults() {
        let doc = InvoiceDocument::new("inv-1", Utc::now());
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.preferences.currency, "USD");
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn effective_theme_respects_opt_in() {
        let mut doc = InvoiceDocument::default();
        doc.preferences.invoice_theme = InvoiceTheme::Dark;
        assert_eq!(doc.effective_theme(InvoiceTheme::Light), InvoiceTheme::Light);
        doc.preferences.use_custom_theme = true;
        assert_eq!(doc.effective_theme(InvoiceTheme::Light), InvoiceTheme::Dark);
        assert_eq!(doc.base_colors(InvoiceTheme::Light).0, "#0f172a");
    }

    #[test]
    fn custom_colors_bypass_theme() {
        let mut doc = InvoiceDocument::default();
        doc.style.use_custom_colors = true;
        doc.style.background_color = "fff".to_string();
        doc.style.header_color = "#123".to_string();
        assert_eq!(
            doc.base_colors(InvoiceTheme::Dark),
            ("fff".to_string(), "#123".to_string())
        );
    }
}
