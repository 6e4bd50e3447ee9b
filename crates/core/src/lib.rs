//! `cartcheck-core` — basket model, package-size parsing and basket-fill estimation.
//!
//! Pure crate: no IO, no async. The session and recon crates build on these types.

pub mod basket;
pub mod capacity;
pub mod error;
pub mod model;
pub mod size;

pub use basket::{BasketRepository, InMemoryBasket, ACTIVITY_LIMIT};
pub use capacity::{
    estimate, estimate_with_capacity, CapacityEstimate, BASKET_CAPACITY_LITERS, NEAR_FULL_PERCENT,
};
pub use error::BasketError;
pub use model::{BasketItem, ChecklistItem, Detection};
pub use size::{parse_size_liters, FALLBACK_LITERS};
