use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{NutritionError, Result};

/// Energy and macronutrients per a stated reference unit
/// (100 g for ingredients, one serving for recipes).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutritionProfile {
    pub kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl NutritionProfile {
    pub const ZERO: NutritionProfile = NutritionProfile {
        kcal: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
    };

    pub fn new(kcal: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            kcal,
            protein_g,
            carbs_g,
            fat_g,
        }
    }

    /// Rejects any field that is negative, NaN or infinite.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("kcal", self.kcal),
            ("protein_g", self.protein_g),
            ("carbs_g", self.carbs_g),
            ("fat_g", self.fat_g),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(NutritionError::InvalidProfile { field, value });
            }
        }
        Ok(())
    }
}

impl std::ops::Add for NutritionProfile {
    type Output = NutritionProfile;

    fn add(self, rhs: NutritionProfile) -> NutritionProfile {
        NutritionProfile {
            kcal: self.kcal + rhs.kcal,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

impl std::ops::AddAssign for NutritionProfile {
    fn add_assign(&mut self, rhs: NutritionProfile) {
        *self = *self + rhs;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngredientUsage {
    pub ingredient_id: i64,
    pub quantity_grams: f64,
    /// Per 100 g.
    pub nutrition: NutritionProfile,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeComposition {
    pub recipe_id: i64,
    pub name: String,
    pub servings: u32,
    /// Per serving.
    pub nutrition: NutritionProfile,
    /// Quantities for the whole batch of `servings`.
    pub ingredients: Vec<IngredientUsage>,
}

/// A logged meal. The nutrition fields are a snapshot taken when the entry was
/// logged and stay untouched if the recipe changes later.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JournalEntry {
    pub user_id: i64,
    pub recipe_id: i64,
    pub servings_eaten: f64,
    pub logged_at: DateTime<Utc>,
    pub kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl JournalEntry {
    /// Captures the recipe's current per-serving nutrition for `servings_eaten`.
    pub fn snapshot(
        user_id: i64,
        recipe: &RecipeComposition,
        servings_eaten: f64,
        logged_at: DateTime<Utc>,
    ) -> Result<Self> {
        let factor = crate::nutrition::scaler::factor_from_servings(servings_eaten, 1.0)?;
        let eaten = crate::nutrition::scaler::scale(&recipe.nutrition, factor)?;
        Ok(Self {
            user_id,
            recipe_id: recipe.recipe_id,
            servings_eaten,
            logged_at,
            kcal: eaten.kcal,
            protein_g: eaten.protein_g,
            carbs_g: eaten.carbs_g,
            fat_g: eaten.fat_g,
        })
    }

    pub fn nutrition(&self) -> NutritionProfile {
        NutritionProfile::new(self.kcal, self.protein_g, self.carbs_g, self.fat_g)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.servings_eaten.is_finite() || self.servings_eaten <= 0.0 {
            return Err(NutritionError::InvalidServings(self.servings_eaten));
        }
        self.nutrition().validate()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        };
        f.write_str(name)
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(format!("unknown meal type '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MealPlanEntry {
    pub plan_id: i64,
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub planned_servings: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InventoryHolding {
    pub inventory_id: i64,
    pub ingredient_id: i64,
    pub quantity_grams: f64,
}

/// One use of a saved meal template by a user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavedMealUse {
    pub user_id: i64,
    pub saved_meal_id: i64,
    pub used_at: DateTime<Utc>,
}
