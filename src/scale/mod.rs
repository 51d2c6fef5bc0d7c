//! Portion scaling
//!
//! Each open recipe view owns one `PortionScaler`: a target portion count
//! the user nudges up and down, and the math that turns stored ingredient
//! amounts into displayed quantities. Portion count is a cosmetic display
//! control, so nothing here fails; every input is clamped or defaulted.

use crate::feed::record::{Ingredient, RecipeRecord};

/// Smallest selectable portion count
pub const MIN_PORTIONS: u32 = 1;

/// Largest selectable portion count
pub const MAX_PORTIONS: u32 = 99;

/// Per-view portion state for one displayed recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortionScaler {
    target: u32,
}

impl PortionScaler {
    /// Create a scaler starting at the given portion count, clamped
    pub fn new(target: u32) -> Self {
        Self {
            target: target.clamp(MIN_PORTIONS, MAX_PORTIONS),
        }
    }

    /// Scaler for a recipe view, starting at the recipe's base portions
    pub fn for_recipe(recipe: &RecipeRecord) -> Self {
        Self::new(recipe.base_portions)
    }

    /// Current target portion count, always within `[1, 99]`
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Set the target, clamping out-of-range values instead of rejecting
    pub fn set_target(&mut self, target: u32) {
        self.target = target.clamp(MIN_PORTIONS, MAX_PORTIONS);
    }

    /// One portion more; a no-op at the upper bound
    pub fn increment(&mut self) {
        self.set_target(self.target.saturating_add(1));
    }

    /// One portion less; a no-op at the lower bound
    pub fn decrement(&mut self) {
        self.set_target(self.target.saturating_sub(1));
    }

    /// Scaled amount for the current target, rounded to 2 decimal places
    ///
    /// `base_portions` comes from the parse boundary and is always positive;
    /// a zero still falls back to 1 at this seam rather than dividing by it.
    pub fn scaled_amount(&self, amount: f64, base_portions: u32) -> f64 {
        let base = base_portions.max(1) as f64;
        let scaled = amount * self.target as f64 / base;
        (scaled * 100.0).round() / 100.0
    }

    /// Displayed quantity string for an ingredient line, e.g. "1.5 dl"
    ///
    /// The one formatting path for quantities, so every view renders the
    /// same value for the same ingredient.
    pub fn display_quantity(&self, ingredient: &Ingredient, base_portions: u32) -> String {
        let qty = format_quantity(self.scaled_amount(ingredient.amount, base_portions));
        if ingredient.unit.is_empty() {
            qty
        } else {
            format!("{} {}", qty, ingredient.unit)
        }
    }
}

/// Format a quantity rounded to 2 decimal places
///
/// Exact values render as integers (`6`, never `6.00`) and trailing zeros
/// are dropped (`1.5`, never `1.50`).
pub fn format_quantity(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
