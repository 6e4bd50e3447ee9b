use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasketError {
    /// Quantities entering the basket must be at least 1.
    InvalidQuantity { id: String, qty: i64 },
    /// No basket line with this id.
    UnknownItem(String),
}

impl fmt::Display for BasketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuantity { id, qty } => {
                write!(f, "item '{id}': quantity must be at least 1, got {qty}")
            }
            Self::UnknownItem(id) => write!(f, "unknown basket item: {id}"),
        }
    }
}

impl std::error::Error for BasketError {}
