//! User-renameable field labels.
//!
//! The set of keys is closed: loading a label map ignores keys that are not
//! listed in [`LabelKey::ALL`], and any key without a (non-blank) override
//! resolves to its built-in default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every label a document can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabelKey {
    InvoiceTitle,
    InvoiceNumber,
    From,
    BillTo,
    ShipTo,
    Attention,
    Email,
    Phone,
    IssueDate,
    PaymentDate,
    DueDate,
    PaymentTerms,
    PoNumber,
    Item,
    Quantity,
    Rate,
    Amount,
    Subtotal,
    Tax,
    Discount,
    Shipping,
    Total,
    AmountPaid,
    BalanceDue,
    Notes,
    Terms,
}

impl LabelKey {
    pub const ALL: [LabelKey; 26] = [
        LabelKey::InvoiceTitle,
        LabelKey::InvoiceNumber,
        LabelKey::From,
        LabelKey::BillTo,
        LabelKey::ShipTo,
        LabelKey::Attention,
        LabelKey::Email,
        LabelKey::Phone,
        LabelKey::IssueDate,
        LabelKey::PaymentDate,
        LabelKey::DueDate,
        LabelKey::PaymentTerms,
        LabelKey::PoNumber,
        LabelKey::Item,
        LabelKey::Quantity,
        LabelKey::Rate,
        LabelKey::Amount,
        LabelKey::Subtotal,
        LabelKey::Tax,
        LabelKey::Discount,
        LabelKey::Shipping,
        LabelKey::Total,
        LabelKey::AmountPaid,
        LabelKey::BalanceDue,
        LabelKey::Notes,
        LabelKey::Terms,
    ];

    /// The key as it appears in serialized documents (camelCase).
    pub fn as_str(self) -> &'static str {
        match self {
            LabelKey::InvoiceTitle => "invoiceTitle",
            LabelKey::InvoiceNumber => "invoiceNumber",
            LabelKey::From => "from",
            LabelKey::BillTo => "billTo",
            LabelKey::ShipTo => "shipTo",
            LabelKey::Attention => "attention",
            LabelKey::Email => "email",
            LabelKey::Phone => "phone",
            LabelKey::IssueDate => "issueDate",
            LabelKey::PaymentDate => "paymentDate",
            LabelKey::DueDate => "dueDate",
            LabelKey::PaymentTerms => "paymentTerms",
            LabelKey::PoNumber => "poNumber",
            LabelKey::Item => "item",
            LabelKey::Quantity => "quantity",
            LabelKey::Rate => "rate",
            LabelKey::Amount => "amount",
            LabelKey::Subtotal => "subtotal",
            LabelKey::Tax => "tax",
            LabelKey::Discount => "discount",
            LabelKey::Shipping => "shipping",
            LabelKey::Total => "total",
            LabelKey::AmountPaid => "amountPaid",
            LabelKey::BalanceDue => "balanceDue",
            LabelKey::Notes => "notes",
            LabelKey::Terms => "terms",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == key)
    }

    /// Built-in display string. Never empty.
    pub fn default_label(self) -> &'static str {
        match self {
            LabelKey::InvoiceTitle => "INVOICE",
            LabelKey::InvoiceNumber => "Invoice #",
            LabelKey::From => "From",
            LabelKey::BillTo => "Bill To",
            LabelKey::ShipTo => "Ship To",
            LabelKey::Attention => "Attn",
            LabelKey::Email => "Email",
            LabelKey::Phone => "Phone",
            LabelKey::IssueDate => "Date",
            LabelKey::PaymentDate => "Payment Date",
            LabelKey::DueDate => "Due Date",
            LabelKey::PaymentTerms => "Payment Terms",
            LabelKey::PoNumber => "PO Number",
            LabelKey::Item => "Item",
            LabelKey::Quantity => "Quantity",
            LabelKey::Rate => "Rate",
            LabelKey::Amount => "Amount",
            LabelKey::Subtotal => "Subtotal",
            LabelKey::Tax => "Tax",
            LabelKey::Discount => "Discount",
            LabelKey::Shipping => "Shipping",
            LabelKey::Total => "Total",
            LabelKey::AmountPaid => "Amount Paid",
            LabelKey::BalanceDue => "Balance Due",
            LabelKey::Notes => "Notes",
            LabelKey::Terms => "Terms",
        }
    }
}

impl Serialize for LabelKey {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// User overrides on top of the default labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<String>>",
    into = "BTreeMap<String, String>"
)]
pub struct Labels {
    overrides: BTreeMap<LabelKey, String>,
}

impl Labels {
    /// Display string for `key`; a blank override counts as cleared.
    pub fn get(&self, key: LabelKey) -> &str {
        match self.overrides.get(&key) {
            Some(s) if !s.trim().is_empty() => s.as_str(),
            _ => key.default_label(),
        }
    }

    pub fn set(&mut self, key: LabelKey, value: impl Into<String>) {
        self.overrides.insert(key, value.into());
    }

    /// Drop the override so the default shows again.
    pub fn reset(&mut self, key: LabelKey) {
        self.overrides.remove(&key);
    }

    pub fn is_customized(&self, key: LabelKey) -> bool {
        self.overrides
            .get(&key)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// `null` marks a cleared label, same as a blank string.
impl From<BTreeMap<String, Option<String>>> for Labels {
    fn from(raw: BTreeMap<String, Option<String>>) -> Self {
        let mut overrides = BTreeMap::new();
        for (key, value) in raw {
            let value = value.unwrap_or_default();
            match LabelKey::from_key(&key) {
                // Blank or default values are not overrides.
                Some(k) if value.trim().is_empty() || value == k.default_label() => {}
                Some(k) => {
                    overrides.insert(k, value);
                }
                None => log::debug!("Ignoring unknown label key {key:?}"),
            }
        }
        Self { overrides }
    }
}

impl From<Labels> for BTreeMap<String, String> {
    fn from(labels: Labels) -> Self {
        // Serialize the full resolved set so consumers never see a missing key.
        LabelKey::ALL
            .iter()
            .map(|&k| (k.as_str().to_string(), labels.get(k).to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_a_default() {
        for key in LabelKey::ALL {
            assert!(!key.default_label().is_empty(), "{key:?}");
            assert_eq!(LabelKey::from_key(key.as_str()), Some(key));
        }
    }

    #[test]
    fn cleared_label_falls_back() {
        let mut labels = Labels::default();
        labels.set(LabelKey::BillTo, "Customer");
        assert_eq!(labels.get(LabelKey::BillTo), "Customer");
        labels.set(LabelKey::BillTo, "   ");
        assert_eq!(labels.get(LabelKey::BillTo), "Bill To");

        labels.set(LabelKey::Tax, "VAT");
        assert!(labels.is_customized(LabelKey::Tax));
        labels.reset(LabelKey::Tax);
        assert_eq!(labels.get(LabelKey::Tax), "Tax");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let labels: Labels =
            serde_json::from_str(r#"{"subtotal":"Sum","bogus":"x"}"#).unwrap();
        assert_eq!(labels.get(LabelKey::Subtotal), "Sum");
        assert_eq!(labels.get(LabelKey::Total), "Total");
        let out: BTreeMap<String, String> = labels.into();
        assert_eq!(out.len(), 26);
        assert!(!out.contains_key("bogus"));
    }

    #[test]
    fn null_label_counts_as_cleared() {
        let labels: Labels =
            serde_json::from_str(r#"{"billTo":null,"notes":"Remarks"}"#).unwrap();
        assert_eq!(labels.get(LabelKey::BillTo), "Bill To");
        assert!(!labels.is_customized(LabelKey::BillTo));
        assert_eq!(labels.get(LabelKey::Notes), "Remarks");
    }

    #[test]
    fn serialized_labels_load_back_equal() {
        let mut labels = Labels::default();
        labels.set(LabelKey::Notes, "Remarks");
        let json = serde_json::to_string(&labels).unwrap();
        let back: Labels = serde_json::from_str(&json).unwrap();
        assert_eq!(back, labels);
        assert!(!back.is_customized(LabelKey::Total));
    }
}
