pub mod aggregator;
pub mod scaler;

pub use aggregator::{aggregate, recipe_profile, RecipeNutritionProfile};
pub use scaler::{factor_from_grams, factor_from_servings, scale};
