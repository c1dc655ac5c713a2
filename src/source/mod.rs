pub mod csv_source;

pub use csv_source::CsvSource;

use crate::error::Result;
use crate::records::{InventoryHolding, JournalEntry, MealPlanEntry, RecipeComposition, SavedMealUse};

/// Read access to already-persisted records. The engine only ever consumes
/// what a source returns; it never writes back.
pub trait NutritionRecordSource {
    fn recipe(&self, recipe_id: i64) -> Result<Option<RecipeComposition>>;
    fn recipes(&self) -> Result<Vec<RecipeComposition>>;
    fn journal_entries(&self, user_id: i64) -> Result<Vec<JournalEntry>>;
    fn meal_plan(&self, plan_id: i64) -> Result<Vec<MealPlanEntry>>;
    fn inventory(&self) -> Result<Vec<InventoryHolding>>;
    fn saved_meal_uses(&self, user_id: i64) -> Result<Vec<SavedMealUse>>;
}

/// Source backed by plain vectors, filled through the `with_*` builders.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    recipes: Vec<RecipeComposition>,
    journal: Vec<JournalEntry>,
    meal_plan: Vec<MealPlanEntry>,
    inventory: Vec<InventoryHolding>,
    saved_meal_uses: Vec<SavedMealUse>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipes(mut self, recipes: Vec<RecipeComposition>) -> Self {
        self.recipes = recipes;
        self
    }

    pub fn with_journal(mut self, journal: Vec<JournalEntry>) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_meal_plan(mut self, meal_plan: Vec<MealPlanEntry>) -> Self {
        self.meal_plan = meal_plan;
        self
    }

    pub fn with_inventory(mut self, inventory: Vec<InventoryHolding>) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_saved_meal_uses(mut self, uses: Vec<SavedMealUse>) -> Self {
        self.saved_meal_uses = uses;
        self
    }
}

impl NutritionRecordSource for InMemorySource {
    fn recipe(&self, recipe_id: i64) -> Result<Option<RecipeComposition>> {
        Ok(self.recipes.iter().find(|r| r.recipe_id == recipe_id).cloned())
    }

    fn recipes(&self) -> Result<Vec<RecipeComposition>> {
        Ok(self.recipes.clone())
    }

    fn journal_entries(&self, user_id: i64) -> Result<Vec<JournalEntry>> {
        Ok(self
            .journal
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    fn meal_plan(&self, plan_id: i64) -> Result<Vec<MealPlanEntry>> {
        Ok(self
            .meal_plan
            .iter()
            .filter(|e| e.plan_id == plan_id)
            .cloned()
            .collect())
    }

    fn inventory(&self) -> Result<Vec<InventoryHolding>> {
        Ok(self.inventory.clone())
    }

    fn saved_meal_uses(&self, user_id: i64) -> Result<Vec<SavedMealUse>> {
        Ok(self
            .saved_meal_uses
            .iter()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect())
    }
}
