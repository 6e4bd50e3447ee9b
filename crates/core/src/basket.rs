use std::sync::Mutex;

use crate::error::BasketError;
use crate::model::{BasketItem, ChecklistItem};

/// Most recent activity messages kept by the basket.
pub const ACTIVITY_LIMIT: usize = 10;

/// Read/notify surface a scan session needs from the basket.
///
/// Sessions copy [`checklist`](Self::checklist) once at start and never hold a
/// live view, so later basket edits cannot change an in-flight reconciliation.
pub trait BasketRepository: Send + Sync {
    /// Current basket lines projected to checklist items. Never contains qty 0.
    fn checklist(&self) -> Vec<ChecklistItem>;

    /// Record a user-facing activity notice.
    fn add_activity(&self, message: &str);
}

#[derive(Debug, Default)]
struct BasketState {
    items: Vec<BasketItem>,
    activity: Vec<String>,
}

impl BasketState {
    fn push_activity(&mut self, message: String) {
        self.activity.insert(0, message);
        self.activity.truncate(ACTIVITY_LIMIT);
    }
}

/// Process-local basket store.
#[derive(Debug, Default)]
pub struct InMemoryBasket {
    state: Mutex<BasketState>,
}

impl InMemoryBasket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a basket from items that already carry their quantities.
    pub fn from_items(items: Vec<BasketItem>) -> Result<Self, BasketError> {
        if let Some(bad) = items.iter().find(|i| i.qty == 0) {
            return Err(BasketError::InvalidQuantity { id: bad.id.clone(), qty: 0 });
        }
        Ok(Self {
            state: Mutex::new(BasketState { items, activity: Vec::new() }),
        })
    }

    /// Add `qty` units. An existing line with the same id is topped up;
    /// a new line goes to the front of the basket.
    pub fn add_item(&self, item: BasketItem, qty: u32) -> Result<(), BasketError> {
        if qty == 0 {
            return Err(BasketError::InvalidQuantity { id: item.id, qty: 0 });
        }
        let mut state = self.state.lock().unwrap();
        let message = format!("Added {qty} x {}", item.name);
        match state.items.iter().position(|b| b.id == item.id) {
            Some(pos) => state.items[pos].qty += qty,
            None => state.items.insert(0, BasketItem { qty, ..item }),
        }
        state.push_activity(message);
        Ok(())
    }

    /// Adjust a line by `delta`. Lines reaching 0 are dropped from the basket.
    pub fn update_qty(&self, id: &str, delta: i64) -> Result<(), BasketError> {
        let mut state = self.state.lock().unwrap();
        let pos = state
            .items
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BasketError::UnknownItem(id.to_string()))?;

        let next = (i64::from(state.items[pos].qty) + delta).clamp(0, i64::from(u32::MAX));
        if next == 0 {
            state.items.remove(pos);
        } else {
            state.items[pos].qty = next as u32;
        }
        Ok(())
    }

    pub fn remove_item(&self, id: &str) {
        self.state.lock().unwrap().items.retain(|b| b.id != id);
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().items.clear();
    }

    pub fn items(&self) -> Vec<BasketItem> {
        self.state.lock().unwrap().items.clone()
    }

    /// Sum of price × qty over all lines.
    pub fn total(&self) -> f64 {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .map(|i| i.price * f64::from(i.qty))
            .sum()
    }

    /// Newest first.
    pub fn recent_activity(&self) -> Vec<String> {
        self.state.lock().unwrap().activity.clone()
    }
}

impl BasketRepository for InMemoryBasket {
    fn checklist(&self) -> Vec<ChecklistItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|i| i.qty > 0)
            .map(BasketItem::to_checklist_item)
            .collect()
    }

    fn add_activity(&self, message: &str) {
        log::debug!("activity: {message}");
        self.state.lock().unwrap().push_activity(message.to_string());
    }
}
