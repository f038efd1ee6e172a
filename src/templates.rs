//! Template renderer – maps an invoice snapshot plus its computed totals and
//! palette onto a [`VisualDocument`].
//!
//! The three variants share one content builder; a variant only selects a
//! [`Skin`] (corner radius, header/table fills, divider style).

use crate::document::{
    Align, Column, Divider, Emphasis, FieldDescriptor, FieldRow, Fill, HeaderSection, ItemRow,
    ItemsTable, Logo, PartiesSection, PartyBlock, RenderMode, Section, Skin, TotalRow,
    VisualDocument, CLIENT_FIELDS, META_FIELDS, NOTE_FIELDS, SENDER_FIELDS, SHIP_TO_FIELD,
};
use crate::format::{format_currency, format_number};
use crate::labels::{LabelKey, Labels};
use crate::model::{FeeType, InvoiceDocument, LogoPlacement, TemplateVariant};
use crate::palette::Palette;
use crate::totals::{parse_or_zero, Totals};

impl Skin {
    pub fn for_variant(variant: TemplateVariant) -> Self {
        match variant {
            TemplateVariant::Modern => Skin {
                border_radius: 8.0,
                header_fill: Fill::Solid,
                table_header_fill: Fill::Solid,
                divider: Divider::None,
            },
            TemplateVariant::Classic => Skin {
                border_radius: 0.0,
                header_fill: Fill::Overlay,
                table_header_fill: Fill::Overlay,
                divider: Divider::Double,
            },
            TemplateVariant::Minimal => Skin {
                border_radius: 0.0,
                header_fill: Fill::None,
                table_header_fill: Fill::None,
                divider: Divider::Hairline,
            },
        }
    }
}

/// Build the visual tree. Pure: the same inputs always give the same tree.
pub fn render_document(
    doc: &InvoiceDocument,
    totals: &Totals,
    palette: &Palette,
    variant: TemplateVariant,
    mode: RenderMode,
) -> VisualDocument {
    let labels = &doc.labels;
    let logo = doc.logo_source().map(|src| Logo {
        src: src.to_string(),
        height_px: doc.style.logo_size.height_px(),
        placement: doc.style.logo_placement,
    });
    let (tucked_logo, prominent_logo) = match logo {
        Some(l) if l.placement == LogoPlacement::Prominent => (None, Some(l)),
        other => (other, None),
    };

    let title = labels.get(LabelKey::InvoiceTitle).to_string();
    let currency = doc.preferences.currency.as_str();

    let sections = vec![
        Section::Header(HeaderSection {
            title: title.clone(),
            number: FieldRow {
                key: LabelKey::InvoiceNumber,
                field: "meta.invoiceNumber".to_string(),
                label: labels.get(LabelKey::InvoiceNumber).to_string(),
                value: doc.meta.invoice_number.trim().to_string(),
            },
            logo: tucked_logo,
        }),
        Section::Parties(PartiesSection {
            logo: prominent_logo,
            sender: PartyBlock {
                heading: labels.get(LabelKey::From).to_string(),
                rows: resolve_fields(doc, labels, SENDER_FIELDS, mode),
            },
            client: PartyBlock {
                heading: labels.get(LabelKey::BillTo).to_string(),
                rows: resolve_fields(doc, labels, CLIENT_FIELDS, mode),
            },
            ship_to: SHIP_TO_FIELD
                .resolve(doc, labels.get(LabelKey::ShipTo), mode)
                .map(|row| PartyBlock {
                    heading: row.label.clone(),
                    rows: vec![row],
                }),
        }),
        Section::Meta {
            rows: resolve_fields(doc, labels, META_FIELDS, mode),
        },
        Section::Items(items_table(doc, labels, currency, mode)),
        Section::Totals {
            rows: total_rows(doc, labels, totals, currency, mode),
        },
        Section::Notes {
            blocks: resolve_fields(doc, labels, NOTE_FIELDS, mode),
        },
    ];

    VisualDocument {
        id: doc.id.clone(),
        title,
        variant,
        mode,
        skin: Skin::for_variant(variant),
        palette: palette.clone(),
        font_family: doc.style.font_family.clone(),
        sections,
    }
}

fn resolve_fields(
    doc: &InvoiceDocument,
    labels: &Labels,
    fields: &[FieldDescriptor],
    mode: RenderMode,
) -> Vec<FieldRow> {
    fields
        .iter()
        .filter_map(|f| f.resolve(doc, labels.get(f.key), mode))
        .collect()
}

fn items_table(doc: &InvoiceDocument, labels: &Labels, currency: &str, mode: RenderMode) -> ItemsTable {
    let columns = vec![
        Column {
            label: labels.get(LabelKey::Item).to_string(),
            width: 0.52,
            align: Align::Left,
        },
        Column {
            label: labels.get(LabelKey::Quantity).to_string(),
            width: 0.14,
            align: Align::Right,
        },
        Column {
            label: labels.get(LabelKey::Rate).to_string(),
            width: 0.17,
            align: Align::Right,
        },
        Column {
            label: labels.get(LabelKey::Amount).to_string(),
            width: 0.17,
            align: Align::Right,
        },
    ];

    let rows = doc
        .items
        .iter()
        // Blank rows are editing scaffolding; they never reach the output.
        .filter(|item| mode == RenderMode::Interactive || !item.is_blank())
        .map(|item| ItemRow {
            id: item.id.clone(),
            name: item.name.trim().to_string(),
            description: item.description.trim().to_string(),
            quantity: format_number(parse_or_zero(&item.quantity)),
            rate: format_currency(parse_or_zero(&item.rate), currency),
            amount: format_currency(item.amount(), currency),
        })
        .collect();

    ItemsTable { columns, rows }
}

fn fee_label(labels: &Labels, key: LabelKey, kind: FeeType, value: &str) -> String {
    let base = labels.get(key);
    match kind {
        FeeType::Percent => format!("{base} ({}%)", format_number(parse_or_zero(value))),
        FeeType::Flat => base.to_string(),
    }
}

fn total_rows(
    doc: &InvoiceDocument,
    labels: &Labels,
    totals: &Totals,
    currency: &str,
    mode: RenderMode,
) -> Vec<TotalRow> {
    let fees = &doc.fees;
    let row = |key: LabelKey, label: String, amount: f64, emphasis: Emphasis| TotalRow {
        key,
        label,
        amount: format_currency(amount, currency),
        emphasis,
    };

    let mut rows = vec![row(
        LabelKey::Subtotal,
        labels.get(LabelKey::Subtotal).to_string(),
        totals.subtotal,
        Emphasis::Normal,
    )];
    if fees.tax.enabled {
        rows.push(row(
            LabelKey::Tax,
            fee_label(labels, LabelKey::Tax, fees.tax.kind, &fees.tax.value),
            totals.tax,
            Emphasis::Normal,
        ));
    }
    if fees.discount.enabled {
        rows.push(row(
            LabelKey::Discount,
            fee_label(labels, LabelKey::Discount, fees.discount.kind, &fees.discount.value),
            -totals.discount,
            Emphasis::Normal,
        ));
    }
    if fees.shipping.enabled {
        rows.push(row(
            LabelKey::Shipping,
            labels.get(LabelKey::Shipping).to_string(),
            totals.shipping,
            Emphasis::Normal,
        ));
    }
    rows.push(row(
        LabelKey::Total,
        labels.get(LabelKey::Total).to_string(),
        totals.total,
        Emphasis::Strong,
    ));
    if mode == RenderMode::Interactive || totals.amount_paid != 0.0 {
        rows.push(row(
            LabelKey::AmountPaid,
            labels.get(LabelKey::AmountPaid).to_string(),
            totals.amount_paid,
            Emphasis::Normal,
        ));
    }
    rows.push(row(
        LabelKey::BalanceDue,
        labels.get(LabelKey::BalanceDue).to_string(),
        totals.amount_due,
        Emphasis::Strong,
    ));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineItem, LogoSize};
    use crate::palette::resolve_palette;
    use crate::totals::compute_totals;

    fn sample() -> InvoiceDocument {
        let mut doc = InvoiceDocument::default();
        doc.meta.invoice_number = "INV-7".to_string();
        doc.meta.issue_date = "2025-02-01".to_string();
        doc.sender.name = "Acme".to_string();
        doc.client.name = "Globex".to_string();
        doc.items = vec![LineItem::new("a", "Design", "2", "50")];
        doc
    }

    fn render(doc: &InvoiceDocument, variant: TemplateVariant, mode: RenderMode) -> VisualDocument {
        let totals = compute_totals(&doc.items, &doc.fees);
        let palette = resolve_palette("#ffffff", "#000000");
        render_document(doc, &totals, &palette, variant, mode)
    }

    #[test]
    fn sections_in_fixed_order() {
        let v = render(&sample(), TemplateVariant::Modern, RenderMode::Export);
        let names: Vec<_> = v.sections.iter().map(Section::name).collect();
        assert_eq!(names, ["header", "parties", "meta", "items", "totals", "notes"]);
    }

    #[test]
    fn export_omits_empty_meta_interactive_keeps_slots() {
        let doc = sample();
        let export = render(&doc, TemplateVariant::Classic, RenderMode::Export);
        let Some(Section::Meta { rows }) = export.section("meta") else {
            panic!("meta section missing");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "Feb 1, 2025");

        let interactive = render(&doc, TemplateVariant::Classic, RenderMode::Interactive);
        let Some(Section::Meta { rows }) = interactive.section("meta") else {
            panic!("meta section missing");
        };
        assert_eq!(rows.len(), META_FIELDS.len());
    }

    #[test]
    fn logo_placement() {
        let mut doc = sample();
        doc.logo = Some("data:image/png;base64,AAAA".to_string());
        doc.style.logo_size = LogoSize::Large;
        let tucked = render(&doc, TemplateVariant::Modern, RenderMode::Export);
        let Some(Section::Header(h)) = tucked.section("header") else {
            panic!()
        };
        assert_eq!(h.logo.as_ref().map(|l| l.height_px), Some(96));

        doc.style.logo_placement = LogoPlacement::Prominent;
        let prominent = render(&doc, TemplateVariant::Modern, RenderMode::Export);
        let Some(Section::Header(h)) = prominent.section("header") else {
            panic!()
        };
        assert!(h.logo.is_none());
        let Some(Section::Parties(p)) = prominent.section("parties") else {
            panic!()
        };
        assert!(p.logo.is_some());
    }

    #[test]
    fn fee_rows_follow_toggles() {
        let mut doc = sample();
        doc.fees.tax.enabled = true;
        doc.fees.tax.value = "10".to_string();
        let v = render(&doc, TemplateVariant::Minimal, RenderMode::Export);
        let Some(Section::Totals { rows }) = v.section("totals") else {
            panic!()
        };
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Subtotal", "Tax (10%)", "Total", "Balance Due"]);
        assert_eq!(rows[2].amount, "$110.00");
    }

    #[test]
    fn renamed_label_is_used() {
        let mut doc = sample();
        doc.labels.set(LabelKey::BillTo, "Customer");
        let v = render(&doc, TemplateVariant::Modern, RenderMode::Export);
        let Some(Section::Parties(p)) = v.section("parties") else {
            panic!()
        };
        assert_eq!(p.client.heading, "Customer");
    }

    #[test]
    fn variants_differ_only_in_skin() {
        let doc = sample();
        let a = render(&doc, TemplateVariant::Modern, RenderMode::Export);
        for variant in [TemplateVariant::Classic, TemplateVariant::Minimal] {
            let b = render(&doc, variant, RenderMode::Export);
            assert_eq!(a.sections, b.sections);
            assert_ne!(a.skin, b.skin);
        }
    }
}
