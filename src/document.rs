//! Structured visual document – the intermediate representation shared by
//! the HTML serializer and the off-screen layout/rasterizer.
//!
//! Optional fields are described declaratively (key, value accessor,
//! visibility rule) and expanded by a single loop, so every template variant
//! sees the same rows in the same order.

use serde::Serialize;

use crate::format::format_date;
use crate::labels::LabelKey;
use crate::model::{InvoiceDocument, LogoPlacement, TemplateVariant};
use crate::palette::Palette;

/// Interactive output keeps empty fields as editable slots; export output
/// drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Interactive,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Always,
    /// Hidden in export mode when the value is blank.
    WhenPresent,
}

impl Visibility {
    pub fn shows(self, value: &str, mode: RenderMode) -> bool {
        match self {
            Visibility::Always => true,
            Visibility::WhenPresent => mode == RenderMode::Interactive || !value.trim().is_empty(),
        }
    }
}

/// One optional field of the invoice.
pub struct FieldDescriptor {
    pub key: LabelKey,
    /// Stable identifier for the editable slot (`data-field`).
    pub field: &'static str,
    pub value: fn(&InvoiceDocument) -> String,
    pub visibility: Visibility,
}

impl FieldDescriptor {
    /// Expand into a row, or `None` when hidden in `mode`.
    pub fn resolve(&self, doc: &InvoiceDocument, label: &str, mode: RenderMode) -> Option<FieldRow> {
        let value = (self.value)(doc);
        if !self.visibility.shows(&value, mode) {
            return None;
        }
        Some(FieldRow {
            key: self.key,
            field: self.field.to_string(),
            label: label.to_string(),
            value,
        })
    }
}

pub const META_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        key: LabelKey::IssueDate,
        field: "meta.issueDate",
        value: |d| format_date(&d.meta.issue_date),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::DueDate,
        field: "meta.dueDate",
        value: |d| format_date(&d.meta.due_date),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::PaymentDate,
        field: "meta.paymentDate",
        value: |d| format_date(&d.meta.payment_date),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::PoNumber,
        field: "meta.poNumber",
        value: |d| d.meta.po_number.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::PaymentTerms,
        field: "meta.paymentTerms",
        value: |d| d.meta.payment_terms.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
];

pub const SENDER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        key: LabelKey::From,
        field: "sender.name",
        value: |d| d.sender.name.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::From,
        field: "sender.address",
        value: |d| d.sender.address.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::Email,
        field: "sender.email",
        value: |d| d.sender.email.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::Phone,
        field: "sender.phone",
        value: |d| d.sender.phone.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
];

pub const CLIENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        key: LabelKey::BillTo,
        field: "client.name",
        value: |d| d.client.name.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::Attention,
        field: "client.attention",
        value: |d| d.client.attention.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::BillTo,
        field: "client.address",
        value: |d| d.client.address.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::Email,
        field: "client.email",
        value: |d| d.client.email.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
];

pub const SHIP_TO_FIELD: FieldDescriptor = FieldDescriptor {
    key: LabelKey::ShipTo,
    field: "client.shipTo",
    value: |d| d.client.ship_to.trim().to_string(),
    visibility: Visibility::WhenPresent,
};

pub const NOTE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        key: LabelKey::Notes,
        field: "notes",
        value: |d| d.notes.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
    FieldDescriptor {
        key: LabelKey::Terms,
        field: "terms",
        value: |d| d.terms.trim().to_string(),
        visibility: Visibility::WhenPresent,
    },
];

/// A labelled value. Multi-line values keep their `\n`s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub key: LabelKey,
    pub field: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Logo {
    pub src: String,
    pub height_px: u32,
    pub placement: LogoPlacement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderSection {
    pub title: String,
    pub number: FieldRow,
    /// Present only for [`LogoPlacement::Tucked`].
    pub logo: Option<Logo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyBlock {
    pub heading: String,
    pub rows: Vec<FieldRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartiesSection {
    /// Present only for [`LogoPlacement::Prominent`].
    pub logo: Option<Logo>,
    pub sender: PartyBlock,
    pub client: PartyBlock,
    pub ship_to: Option<PartyBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub label: String,
    /// Share of the table width, 0.0–1.0.
    pub width: f32,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemsTable {
    pub columns: Vec<Column>,
    pub rows: Vec<ItemRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Normal,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalRow {
    pub key: LabelKey,
    pub label: String,
    pub amount: String,
    pub emphasis: Emphasis,
}

/// Sections in their fixed document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "lowercase")]
pub enum Section {
    Header(HeaderSection),
    Parties(PartiesSection),
    Meta { rows: Vec<FieldRow> },
    Items(ItemsTable),
    Totals { rows: Vec<TotalRow> },
    Notes { blocks: Vec<FieldRow> },
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Header(_) => "header",
            Section::Parties(_) => "parties",
            Section::Meta { .. } => "meta",
            Section::Items(_) => "items",
            Section::Totals { .. } => "totals",
            Section::Notes { .. } => "notes",
        }
    }
}

/// Purely decorative differences between template variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    /// The solid header color.
    Solid,
    /// The header color blended over the background.
    Overlay,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Divider {
    None,
    Hairline,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skin {
    pub border_radius: f32,
    pub header_fill: Fill,
    pub table_header_fill: Fill,
    pub divider: Divider,
}

/// Everything needed to draw one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualDocument {
    pub id: String,
    pub title: String,
    pub variant: TemplateVariant,
    pub mode: RenderMode,
    pub skin: Skin,
    pub palette: Palette,
    pub font_family: String,
    pub sections: Vec<Section>,
}

impl VisualDocument {
    /// All label/value text in reading order, ignoring decoration.
    pub fn semantic_content(&self) -> Vec<String> {
        let mut out = Vec::new();
        let push_rows = |out: &mut Vec<String>, rows: &[FieldRow]| {
            for r in rows {
                out.push(format!("{}={}", r.field, r.value));
            }
        };
        for section in &self.sections {
            out.push(format!("[{}]", section.name()));
            match section {
                Section::Header(h) => {
                    out.push(h.title.clone());
                    push_rows(&mut out, std::slice::from_ref(&h.number));
                    if let Some(logo) = &h.logo {
                        out.push(format!("logo={}", logo.src));
                    }
                }
                Section::Parties(p) => {
                    if let Some(logo) = &p.logo {
                        out.push(format!("logo={}", logo.src));
                    }
                    for block in std::iter::once(&p.sender)
                        .chain(std::iter::once(&p.client))
                        .chain(p.ship_to.iter())
                    {
                        out.push(block.heading.clone());
                        push_rows(&mut out, &block.rows);
                    }
                }
                Section::Meta { rows } | Section::Notes { blocks: rows } => push_rows(&mut out, rows),
                Section::Items(t) => {
                    out.extend(t.columns.iter().map(|c| c.label.clone()));
                    for r in &t.rows {
                        out.push(format!(
                            "{}|{}|{}|{}|{}",
                            r.name, r.description, r.quantity, r.rate, r.amount
                        ));
                    }
                }
                Section::Totals { rows } => {
                    for r in rows {
                        out.push(format!("{}={}", r.label, r.amount));
                    }
                }
            }
        }
        out
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_present_hides_blank_only_in_export() {
        assert!(Visibility::WhenPresent.shows("", RenderMode::Interactive));
        assert!(!Visibility::WhenPresent.shows("  ", RenderMode::Export));
        assert!(Visibility::WhenPresent.shows("x", RenderMode::Export));
        assert!(Visibility::Always.shows("", RenderMode::Export));
    }

    #[test]
    fn descriptor_resolution() {
        let mut doc = InvoiceDocument::default();
        doc.meta.po_number = " PO-9 ".to_string();
        let po = &META_FIELDS[3];
        let row = po.resolve(&doc, "PO", RenderMode::Export).unwrap();
        assert_eq!(row.value, "PO-9");
        assert_eq!(row.field, "meta.poNumber");
        assert!(META_FIELDS[0].resolve(&doc, "Date", RenderMode::Export).is_none());
    }
}
