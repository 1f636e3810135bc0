use serde::{Deserialize, Serialize};
use windrose_protocol::Yield;

/// A yield vector with a per-key capacity.
///
/// `incr` is deliberately allowed to leave the value above capacity; callers
/// run `cap` at the end of a work step, which is when extras are discarded.
/// `deposit` is the strict variant used by traders offloading at a sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceStore {
    value: Yield,
    capacity: Yield,
}

impl ResourceStore {
    pub fn new(capacity: Yield) -> Self {
        Self {
            value: Yield::zero(),
            capacity,
        }
    }

    pub fn with_value(value: Yield, capacity: Yield) -> Self {
        Self { value, capacity }
    }

    pub fn value(&self) -> Yield {
        self.value
    }

    pub fn capacity(&self) -> Yield {
        self.capacity
    }

    /// Add `amount` and return the portion now above capacity.
    pub fn incr(&mut self, amount: Yield) -> Yield {
        self.value += amount;
        self.value.saturating_sub(self.capacity)
    }

    /// Add as much of `amount` as fits; return the rejected remainder.
    pub fn deposit(&mut self, amount: Yield) -> Yield {
        let room = self.capacity.saturating_sub(self.value);
        let accepted = amount.min(room);
        self.value += accepted;
        amount.saturating_sub(accepted)
    }

    /// Subtract, saturating at zero per key.
    pub fn decr(&mut self, amount: Yield) {
        self.value = self.value.saturating_sub(amount);
    }

    /// Clamp the value to capacity, discarding extras.
    pub fn cap(&mut self) {
        self.value = self.value.min(self.capacity);
    }

    pub fn fulfills(&self, cost: &Yield) -> bool {
        self.value.fulfills(cost)
    }

    pub fn set_capacity(&mut self, capacity: Yield) {
        self.capacity = capacity;
    }

    /// Raise capacity so that `target` fits, never lowering any key.
    pub fn raise_capacity_to(&mut self, target: Yield) {
        self.capacity = Yield {
            food: self.capacity.food.max(target.food),
            production: self.capacity.production.max(target.production),
            gold: self.capacity.gold.max(target.gold),
            science: self.capacity.science.max(target.science),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incr_reports_overflow_without_clamping() {
        let mut store = ResourceStore::new(Yield::food(5));
        assert_eq!(store.incr(Yield::food(3)), Yield::zero());
        assert_eq!(store.incr(Yield::food(4)), Yield::food(2));
        assert_eq!(store.value(), Yield::food(7));
        store.cap();
        assert_eq!(store.value(), Yield::food(5));
    }

    #[test]
    fn deposit_rejects_what_does_not_fit() {
        let mut store = ResourceStore::new(Yield::food(5));
        assert_eq!(store.deposit(Yield::food(4)), Yield::zero());
        assert_eq!(store.deposit(Yield::food(4)), Yield::food(3));
        assert_eq!(store.value(), Yield::food(5));
    }

    #[test]
    fn raise_capacity_never_lowers() {
        let mut store = ResourceStore::new(Yield::food(10) + Yield::production(2));
        store.raise_capacity_to(Yield::food(4) + Yield::science(6));
        assert_eq!(
            store.capacity(),
            Yield::food(10) + Yield::production(2) + Yield::science(6)
        );
    }
}
