use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::error::{NutritionError, Result};
use crate::inventory::{check_sufficiency, SufficiencyReport};
use crate::nutrition::{recipe_profile, RecipeNutritionProfile};
use crate::planning::{self, PlannedDay, ShoppingItem};
use crate::ranking::{most_logged_recipes, most_used_saved_meals, UsageRank};
use crate::records::{JournalEntry, RecipeComposition};
use crate::rollup::{self, NutritionAverage, NutritionTotals};
use crate::source::NutritionRecordSource;

/// Fetches records from a source and hands them to the pure calculations.
/// Holds no state of its own beyond the source; everything call-specific
/// (user, dates, plan, time zone) is passed in.
pub struct NutritionService<S> {
    source: S,
}

impl<S: NutritionRecordSource> NutritionService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn recipe(&self, recipe_id: i64) -> Result<RecipeComposition> {
        self.source
            .recipe(recipe_id)?
            .ok_or(NutritionError::UnknownRecipe(recipe_id))
    }

    fn recipes_by_id(&self) -> Result<HashMap<i64, RecipeComposition>> {
        Ok(self
            .source
            .recipes()?
            .into_iter()
            .map(|r| (r.recipe_id, r))
            .collect())
    }

    pub fn daily<Tz: TimeZone>(&self, user_id: i64, date: NaiveDate, tz: &Tz) -> Result<NutritionTotals> {
        let entries = self.source.journal_entries(user_id)?;
        rollup::daily_nutrition(&entries, date, tz)
    }

    pub fn weekly(&self, user_id: i64, week_start: NaiveDate) -> Result<NutritionTotals> {
        let entries = self.source.journal_entries(user_id)?;
        rollup::weekly_nutrition(&entries, week_start)
    }

    pub fn average<Tz: TimeZone>(
        &self,
        user_id: i64,
        end_date: NaiveDate,
        window_days: u32,
        tz: &Tz,
    ) -> Result<Option<NutritionAverage>> {
        let entries = self.source.journal_entries(user_id)?;
        rollup::average_daily_nutrition(&entries, end_date, window_days, tz)
    }

    pub fn can_make(&self, recipe_id: i64, planned_servings: f64) -> Result<SufficiencyReport> {
        let recipe = self.recipe(recipe_id)?;
        let holdings = self.source.inventory()?;
        check_sufficiency(&recipe, planned_servings, &holdings)
    }

    pub fn recipe_nutrition(&self, recipe_id: i64) -> Result<RecipeNutritionProfile> {
        recipe_profile(&self.recipe(recipe_id)?)
    }

    pub fn plan_nutrition(&self, plan_id: i64) -> Result<BTreeMap<NaiveDate, PlannedDay>> {
        let entries = self.source.meal_plan(plan_id)?;
        planning::planned_nutrition(&entries, &self.recipes_by_id()?)
    }

    pub fn shopping_list(&self, plan_id: i64) -> Result<Vec<ShoppingItem>> {
        let entries = self.source.meal_plan(plan_id)?;
        let holdings = self.source.inventory()?;
        planning::shopping_list(&entries, &self.recipes_by_id()?, &holdings)
    }

    pub fn top_recipes(&self, user_id: i64, limit: usize) -> Result<Vec<UsageRank>> {
        Ok(most_logged_recipes(&self.source.journal_entries(user_id)?, limit))
    }

    pub fn top_saved_meals(&self, user_id: i64, limit: usize) -> Result<Vec<UsageRank>> {
        Ok(most_used_saved_meals(&self.source.saved_meal_uses(user_id)?, limit))
    }

    /// Builds the journal record for eating `servings` of a recipe now. The
    /// caller is responsible for persisting it.
    pub fn log_meal(
        &self,
        user_id: i64,
        recipe_id: i64,
        servings: f64,
        logged_at: DateTime<Utc>,
    ) -> Result<JournalEntry> {
        let recipe = self.recipe(recipe_id)?;
        JournalEntry::snapshot(user_id, &recipe, servings, logged_at)
    }
}
