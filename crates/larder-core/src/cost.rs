//! # Cost Arithmetic
//!
//! Cost is normalized to the ingredient's purchase quantity: a usage costs
//! `price / available_quantity * used_quantity`. A recipe's total is the sum
//! of its usage costs under a [`CostPolicy`], and the per-serving figure is
//! the total divided by the number of servings.

use crate::IngredientUsage;

/// Which usages contribute to a recipe's total cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostPolicy {
    /// Unavailable usages contribute zero. Their price and quantity are kept
    /// for display only.
    ExcludeUnavailable,
    /// Every usage contributes, regardless of its availability flag.
    IncludeAll,
}

/// Cost of a single usage.
#[must_use]
pub fn usage_cost(usage: &IngredientUsage) -> f64 {
    let per_unit = usage.price / usage.available_quantity;
    per_unit * usage.used_quantity
}

/// Sum of usage costs under `policy`. Zero for an empty slice.
#[must_use]
pub fn total_cost(usages: &[IngredientUsage], policy: CostPolicy) -> f64 {
    usages
        .iter()
        .filter(|usage| match policy {
            CostPolicy::ExcludeUnavailable => !usage.unavailable,
            CostPolicy::IncludeAll => true,
        })
        .map(usage_cost)
        .sum()
}

/// Cost of one serving.
///
/// Zero servings is treated as one, so a half-filled form still previews a
/// finite number.
#[must_use]
pub fn cost_per_serving(total_cost: f64, servings: u32) -> f64 {
    total_cost / f64::from(servings.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IngredientId;

    fn usage(price: f64, available: f64, used: f64, unavailable: bool) -> IngredientUsage {
        IngredientUsage {
            id: IngredientId(1),
            name: "x".to_string(),
            price,
            unit: "g".to_string(),
            available_quantity: available,
            used_quantity: used,
            unavailable,
        }
    }

    #[test]
    fn usage_cost_is_per_unit_times_used() {
        // 10000 / 5 = 2000 per unit, 2 units used
        assert_eq!(usage_cost(&usage(10000.0, 5.0, 2.0, false)), 4000.0);
    }

    #[test]
    fn empty_total_is_zero() {
        assert_eq!(total_cost(&[], CostPolicy::ExcludeUnavailable), 0.0);
        assert_eq!(total_cost(&[], CostPolicy::IncludeAll), 0.0);
    }

    #[test]
    fn policy_controls_unavailable_usages() {
        let usages = vec![
            usage(15000.0, 1000.0, 200.0, false),
            usage(10000.0, 5.0, 2.0, true),
        ];

        assert_eq!(total_cost(&usages, CostPolicy::ExcludeUnavailable), 3000.0);
        assert_eq!(total_cost(&usages, CostPolicy::IncludeAll), 7000.0);
    }

    #[test]
    fn per_serving_divides_total() {
        assert_eq!(cost_per_serving(3000.0, 4), 750.0);
        assert_eq!(cost_per_serving(3000.0, 0), 3000.0);
    }
}
