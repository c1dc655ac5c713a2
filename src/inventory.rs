use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{NutritionError, Result};
use crate::nutrition::factor_from_servings;
use crate::records::{InventoryHolding, RecipeComposition};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngredientSufficiency {
    pub ingredient_id: i64,
    pub required_grams: f64,
    pub available_grams: f64,
    pub shortfall_grams: f64,
    pub is_missing: bool,
    pub is_insufficient: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SufficiencyReport {
    pub per_ingredient: Vec<IngredientSufficiency>,
    pub can_make: bool,
}

/// Stock on hand per ingredient. Several holdings of one ingredient add up.
pub(crate) fn stock_by_ingredient(holdings: &[InventoryHolding]) -> Result<HashMap<i64, f64>> {
    let mut stock: HashMap<i64, f64> = HashMap::new();
    for holding in holdings {
        if !holding.quantity_grams.is_finite() || holding.quantity_grams < 0.0 {
            return Err(NutritionError::InvalidQuantity {
                ingredient_id: holding.ingredient_id,
                grams: holding.quantity_grams,
            });
        }
        *stock.entry(holding.ingredient_id).or_insert(0.0) += holding.quantity_grams;
    }
    Ok(stock)
}

/// Compares `required_grams` against the stock map using the shared
/// missing/insufficient rules. Equal quantities are sufficient.
pub(crate) fn compare_with_stock(
    ingredient_id: i64,
    required_grams: f64,
    stock: &HashMap<i64, f64>,
) -> IngredientSufficiency {
    match stock.get(&ingredient_id) {
        None => IngredientSufficiency {
            ingredient_id,
            required_grams,
            available_grams: 0.0,
            shortfall_grams: required_grams,
            is_missing: true,
            is_insufficient: false,
        },
        Some(&available_grams) => {
            let shortfall_grams = (required_grams - available_grams).max(0.0);
            IngredientSufficiency {
                ingredient_id,
                required_grams,
                available_grams,
                shortfall_grams,
                is_missing: false,
                is_insufficient: shortfall_grams > 0.0,
            }
        }
    }
}

/// Grams of each ingredient needed to cook `planned_servings` of `recipe`, in
/// first-appearance order. Repeated usages of one ingredient are merged.
pub(crate) fn required_grams(
    recipe: &RecipeComposition,
    planned_servings: f64,
) -> Result<Vec<(i64, f64)>> {
    let factor = factor_from_servings(planned_servings, f64::from(recipe.servings))?;

    let mut required: Vec<(i64, f64)> = Vec::with_capacity(recipe.ingredients.len());
    for usage in &recipe.ingredients {
        if !usage.quantity_grams.is_finite() || usage.quantity_grams < 0.0 {
            return Err(NutritionError::InvalidQuantity {
                ingredient_id: usage.ingredient_id,
                grams: usage.quantity_grams,
            });
        }
        let grams = usage.quantity_grams * factor;
        match required.iter_mut().find(|(id, _)| *id == usage.ingredient_id) {
            Some((_, total)) => *total += grams,
            None => required.push((usage.ingredient_id, grams)),
        }
    }
    Ok(required)
}

/// Checks whether `planned_servings` of `recipe` can be cooked from
/// `holdings`. Holdings are only read; nothing is reserved or consumed.
pub fn check_sufficiency(
    recipe: &RecipeComposition,
    planned_servings: f64,
    holdings: &[InventoryHolding],
) -> Result<SufficiencyReport> {
    let required = required_grams(recipe, planned_servings)?;
    let stock = stock_by_ingredient(holdings)?;

    let per_ingredient: Vec<IngredientSufficiency> = required
        .into_iter()
        .map(|(ingredient_id, grams)| compare_with_stock(ingredient_id, grams, &stock))
        .collect();
    let can_make = per_ingredient
        .iter()
        .all(|i| !i.is_missing && !i.is_insufficient);

    log::debug!(
        "recipe {} x{}: {} ingredient(s) checked, can_make={}",
        recipe.recipe_id,
        planned_servings,
        per_ingredient.len(),
        can_make
    );

    Ok(SufficiencyReport {
        per_ingredient,
        can_make,
    })
}
