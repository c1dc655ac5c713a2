pub mod cli;
pub mod dates;
pub mod error;
pub mod inventory;
pub mod nutrition;
pub mod planning;
pub mod ranking;
pub mod records;
pub mod rollup;
pub mod service;
pub mod source;

pub use error::{NutritionError, Result};
pub use records::{
    IngredientUsage, InventoryHolding, JournalEntry, MealPlanEntry, MealType, NutritionProfile,
    RecipeComposition, SavedMealUse,
};
pub use service::NutritionService;
pub use source::{CsvSource, InMemorySource, NutritionRecordSource};
