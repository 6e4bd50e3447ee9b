use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Expected side
// ---------------------------------------------------------------------------

/// One expected product line, snapshotted from the basket when a scan starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub name: String,
    pub qty: u32,
    /// Free-text package size ("750ml", "1kg"). Parsed leniently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl ChecklistItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, qty: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            qty,
            size: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Observed side
// ---------------------------------------------------------------------------

/// One reported sighting of a product. Several detections may share an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub id: String,
    pub name: String,
    pub qty: u32,
}

impl Detection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, qty: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            qty,
        }
    }
}

// ---------------------------------------------------------------------------
// Basket
// ---------------------------------------------------------------------------

/// A line in the shopper's basket as maintained by prior barcode scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub qty: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub nutrition: Option<String>,
}

impl BasketItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            qty: 0,
            size: None,
            expiry: None,
            nutrition: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Project into the checklist shape used by reconciliation.
    pub fn to_checklist_item(&self) -> ChecklistItem {
        ChecklistItem {
            id: self.id.clone(),
            name: self.name.clone(),
            qty: self.qty,
            size: self.size.clone(),
        }
    }
}
