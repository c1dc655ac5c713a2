use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{NutritionError, Result};
use crate::inventory::{compare_with_stock, required_grams, stock_by_ingredient};
use crate::nutrition::{aggregate, factor_from_servings};
use crate::records::{InventoryHolding, MealPlanEntry, MealType, NutritionProfile, RecipeComposition};

/// Planned nutrition for one calendar day of a meal plan.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlannedDay {
    pub by_meal: BTreeMap<MealType, NutritionProfile>,
    pub total: NutritionProfile,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShoppingItem {
    pub ingredient_id: i64,
    pub required_grams: f64,
    pub available_grams: f64,
    pub to_buy_grams: f64,
}

fn lookup<'a>(
    recipes: &'a HashMap<i64, RecipeComposition>,
    recipe_id: i64,
) -> Result<&'a RecipeComposition> {
    recipes
        .get(&recipe_id)
        .ok_or(NutritionError::UnknownRecipe(recipe_id))
}

/// Per-serving recipe nutrition times planned servings, grouped by day and
/// meal type.
pub fn planned_nutrition(
    entries: &[MealPlanEntry],
    recipes: &HashMap<i64, RecipeComposition>,
) -> Result<BTreeMap<NaiveDate, PlannedDay>> {
    let mut grouped: BTreeMap<NaiveDate, BTreeMap<MealType, Vec<(&NutritionProfile, f64)>>> =
        BTreeMap::new();
    for entry in entries {
        let recipe = lookup(recipes, entry.recipe_id)?;
        recipe.nutrition.validate()?;
        let factor = factor_from_servings(entry.planned_servings, 1.0)?;
        grouped
            .entry(entry.date)
            .or_default()
            .entry(entry.meal_type)
            .or_default()
            .push((&recipe.nutrition, factor));
    }

    let mut days = BTreeMap::new();
    for (date, meals) in grouped {
        let mut by_meal = BTreeMap::new();
        let mut total = NutritionProfile::ZERO;
        for (meal_type, items) in meals {
            let meal = aggregate(items)?;
            total += meal;
            by_meal.insert(meal_type, meal);
        }
        days.insert(date, PlannedDay { by_meal, total });
    }
    Ok(days)
}

/// Everything the plan needs beyond current stock, ordered by ingredient id.
/// Ingredients that are fully covered are left out.
pub fn shopping_list(
    entries: &[MealPlanEntry],
    recipes: &HashMap<i64, RecipeComposition>,
    holdings: &[InventoryHolding],
) -> Result<Vec<ShoppingItem>> {
    let mut needed: BTreeMap<i64, f64> = BTreeMap::new();
    for entry in entries {
        let recipe = lookup(recipes, entry.recipe_id)?;
        for (ingredient_id, grams) in required_grams(recipe, entry.planned_servings)? {
            *needed.entry(ingredient_id).or_insert(0.0) += grams;
        }
    }

    let stock = stock_by_ingredient(holdings)?;
    let items: Vec<ShoppingItem> = needed
        .into_iter()
        .map(|(ingredient_id, grams)| compare_with_stock(ingredient_id, grams, &stock))
        .filter(|s| s.shortfall_grams > 0.0)
        .map(|s| ShoppingItem {
            ingredient_id: s.ingredient_id,
            required_grams: s.required_grams,
            available_grams: s.available_grams,
            to_buy_grams: s.shortfall_grams,
        })
        .collect();

    log::debug!("shopping list for {} planned meal(s): {} item(s)", entries.len(), items.len());
    Ok(items)
}
