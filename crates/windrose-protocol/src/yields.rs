use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A nonnegative resource vector over the fixed yield schema.
///
/// Subtraction saturates at zero; comparison helpers are componentwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Yield {
    pub food: i32,
    pub production: i32,
    pub gold: i32,
    pub science: i32,
}

impl Yield {
    pub const fn zero() -> Self {
        Self {
            food: 0,
            production: 0,
            gold: 0,
            science: 0,
        }
    }

    pub const fn food(amount: i32) -> Self {
        Self {
            food: amount,
            ..Self::zero()
        }
    }

    pub const fn production(amount: i32) -> Self {
        Self {
            production: amount,
            ..Self::zero()
        }
    }

    pub const fn gold(amount: i32) -> Self {
        Self {
            gold: amount,
            ..Self::zero()
        }
    }

    pub const fn science(amount: i32) -> Self {
        Self {
            science: amount,
            ..Self::zero()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Componentwise minimum.
    pub fn min(self, other: Yield) -> Yield {
        Yield {
            food: self.food.min(other.food),
            production: self.production.min(other.production),
            gold: self.gold.min(other.gold),
            science: self.science.min(other.science),
        }
    }

    /// Componentwise subtraction, saturating at zero.
    pub fn saturating_sub(self, other: Yield) -> Yield {
        Yield {
            food: (self.food - other.food).max(0),
            production: (self.production - other.production).max(0),
            gold: (self.gold - other.gold).max(0),
            science: (self.science - other.science).max(0),
        }
    }

    /// Componentwise `>=` — whether this vector covers `cost`.
    pub fn fulfills(&self, cost: &Yield) -> bool {
        self.food >= cost.food
            && self.production >= cost.production
            && self.gold >= cost.gold
            && self.science >= cost.science
    }

    /// Componentwise floor division. `n` must be positive.
    pub fn div_floor(self, n: i32) -> Yield {
        debug_assert!(n > 0);
        Yield {
            food: self.food / n,
            production: self.production / n,
            gold: self.gold / n,
            science: self.science / n,
        }
    }
}

impl Add for Yield {
    type Output = Yield;

    fn add(self, other: Yield) -> Yield {
        Yield {
            food: self.food + other.food,
            production: self.production + other.production,
            gold: self.gold + other.gold,
            science: self.science + other.science,
        }
    }
}

impl AddAssign for Yield {
    fn add_assign(&mut self, other: Yield) {
        *self = *self + other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtraction_saturates() {
        let a = Yield::food(2) + Yield::production(5);
        let b = Yield::food(4) + Yield::production(1);
        assert_eq!(a.saturating_sub(b), Yield::production(4));
    }

    #[test]
    fn fulfills_is_componentwise() {
        let have = Yield::food(5) + Yield::production(2);
        assert!(have.fulfills(&Yield::food(5)));
        assert!(!have.fulfills(&(Yield::food(1) + Yield::production(3))));
        assert!(Yield::zero().fulfills(&Yield::zero()));
    }

    #[test]
    fn div_floor_rounds_down() {
        let a = Yield::food(7) + Yield::science(3);
        assert_eq!(a.div_floor(2), Yield::food(3) + Yield::science(1));
    }
}
