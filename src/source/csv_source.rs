use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::{InMemorySource, NutritionRecordSource};
use crate::dates::parse_timestamp;
use crate::error::{NutritionError, Result};
use crate::records::{
    IngredientUsage, InventoryHolding, JournalEntry, MealPlanEntry, NutritionProfile,
    RecipeComposition, SavedMealUse,
};

pub const INGREDIENTS_FILE: &str = "ingredients.csv";
pub const RECIPES_FILE: &str = "recipes.csv";
pub const RECIPE_INGREDIENTS_FILE: &str = "recipe_ingredients.csv";
pub const INVENTORY_FILE: &str = "inventory.csv";
pub const JOURNAL_FILE: &str = "journal.csv";
pub const MEAL_PLAN_FILE: &str = "meal_plan.csv";
pub const SAVED_MEAL_USES_FILE: &str = "saved_meal_uses.csv";

// Column headers
const INGREDIENT_ID_COL: &str = "ingredient_id";
const RECIPE_ID_COL: &str = "recipe_id";
const INVENTORY_ID_COL: &str = "inventory_id";
const PLAN_ID_COL: &str = "plan_id";
const USER_ID_COL: &str = "user_id";
const SAVED_MEAL_ID_COL: &str = "saved_meal_id";
const NAME_COL: &str = "name";
const SERVINGS_COL: &str = "servings";
const KCAL_COL: &str = "kcal";
const PROTEIN_COL: &str = "protein_g";
const CARBS_COL: &str = "carbs_g";
const FAT_COL: &str = "fat_g";
const QUANTITY_COL: &str = "quantity_grams";
const SERVINGS_EATEN_COL: &str = "servings_eaten";
const LOGGED_AT_COL: &str = "logged_at";
const USED_AT_COL: &str = "used_at";
const DATE_COL: &str = "date";
const MEAL_TYPE_COL: &str = "meal_type";
const PLANNED_SERVINGS_COL: &str = "planned_servings";

/// Raw text of every data file, keyed by file name.
pub type DatasetText = HashMap<&'static str, String>;

struct Table {
    file: &'static str,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

struct Row<'t> {
    table: &'t Table,
    index: usize,
    record: &'t StringRecord,
}

impl Table {
    fn parse(file: &'static str, content: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr.headers()?.clone();
        let rows = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
        Ok(Self {
            file,
            headers,
            rows,
        })
    }

    /// Fails when any of `columns` is absent from the header line.
    fn require(&self, columns: &[&'static str]) -> Result<()> {
        for &column in columns {
            if !self.headers.iter().any(|h| h == column) {
                return Err(NutritionError::MissingColumn {
                    file: self.file.to_string(),
                    column,
                });
            }
        }
        Ok(())
    }

    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(move |(index, record)| Row {
            table: self,
            index,
            record,
        })
    }
}

impl Row<'_> {
    fn raw(&self, column: &'static str) -> Result<&str> {
        let idx = self
            .table
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| NutritionError::MissingColumn {
                file: self.table.file.to_string(),
                column,
            })?;
        Ok(self.record.get(idx).unwrap_or(""))
    }

    fn malformed(&self, column: &'static str, value: &str) -> NutritionError {
        NutritionError::MalformedField {
            file: self.table.file.to_string(),
            column,
            row: self.index + 1,
            value: value.to_string(),
        }
    }

    fn get<T: FromStr>(&self, column: &'static str) -> Result<T> {
        let raw = self.raw(column)?;
        raw.parse::<T>().map_err(|_| self.malformed(column, raw))
    }

    fn timestamp(&self, column: &'static str) -> Result<chrono::DateTime<chrono::Utc>> {
        parse_timestamp(self.raw(column)?)
    }

    fn profile(&self) -> Result<NutritionProfile> {
        let profile = NutritionProfile::new(
            self.get(KCAL_COL)?,
            self.get(PROTEIN_COL)?,
            self.get(CARBS_COL)?,
            self.get(FAT_COL)?,
        );
        profile.validate()?;
        Ok(profile)
    }
}

/// Loads a directory of CSV exports into memory once; all lookups afterwards
/// are served from that snapshot.
#[derive(Debug, Clone)]
pub struct CsvSource {
    inner: InMemorySource,
}

impl CsvSource {
    pub async fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let mut texts = DatasetText::new();
        for file in [
            INGREDIENTS_FILE,
            RECIPES_FILE,
            RECIPE_INGREDIENTS_FILE,
            INVENTORY_FILE,
            JOURNAL_FILE,
            MEAL_PLAN_FILE,
        ] {
            let path = data_dir.join(file);
            if !tokio::fs::try_exists(&path).await? {
                return Err(NutritionError::MissingFile(path));
            }
            texts.insert(file, tokio::fs::read_to_string(&path).await?);
        }

        let optional = data_dir.join(SAVED_MEAL_USES_FILE);
        if tokio::fs::try_exists(&optional).await? {
            texts.insert(SAVED_MEAL_USES_FILE, tokio::fs::read_to_string(&optional).await?);
        } else {
            log::warn!("{:?} not present, saved meal rankings will be empty", optional);
        }

        let source = Self::from_texts(&texts)?;
        log::info!("loaded nutrition data from {:?}", data_dir);
        Ok(source)
    }

    /// Builds a source from already-read file contents. Missing optional files
    /// yield empty collections; missing required ones are an error.
    pub fn from_texts(texts: &DatasetText) -> Result<Self> {
        let table = |file: &'static str| -> Result<Option<Table>> {
            texts.get(file).map(|content| Table::parse(file, content)).transpose()
        };
        let required = |file: &'static str| -> Result<Table> {
            table(file)?.ok_or_else(|| NutritionError::MissingFile(file.into()))
        };

        let ingredients = parse_ingredients(&required(INGREDIENTS_FILE)?)?;
        let recipes = parse_recipes(
            &required(RECIPES_FILE)?,
            &required(RECIPE_INGREDIENTS_FILE)?,
            &ingredients,
        )?;
        let inventory = parse_inventory(&required(INVENTORY_FILE)?)?;
        let journal = parse_journal(&required(JOURNAL_FILE)?)?;
        let meal_plan = parse_meal_plan(&required(MEAL_PLAN_FILE)?)?;
        let saved_meal_uses = match table(SAVED_MEAL_USES_FILE)? {
            Some(t) => parse_saved_meal_uses(&t)?,
            None => Vec::new(),
        };

        log::debug!(
            "{} ingredients, {} recipes, {} holdings, {} journal entries, {} plan entries",
            ingredients.len(),
            recipes.len(),
            inventory.len(),
            journal.len(),
            meal_plan.len()
        );

        Ok(Self {
            inner: InMemorySource::new()
                .with_recipes(recipes)
                .with_inventory(inventory)
                .with_journal(journal)
                .with_meal_plan(meal_plan)
                .with_saved_meal_uses(saved_meal_uses),
        })
    }
}

fn parse_ingredients(table: &Table) -> Result<HashMap<i64, NutritionProfile>> {
    table.require(&[INGREDIENT_ID_COL, KCAL_COL, PROTEIN_COL, CARBS_COL, FAT_COL])?;
    let mut ingredients = HashMap::new();
    for row in table.rows() {
        let ingredient_id: i64 = row.get(INGREDIENT_ID_COL)?;
        if ingredients.insert(ingredient_id, row.profile()?).is_some() {
            return Err(NutritionError::DuplicateId {
                file: table.file.to_string(),
                id: ingredient_id,
            });
        }
    }
    Ok(ingredients)
}

fn parse_recipes(
    recipes: &Table,
    usages: &Table,
    ingredients: &HashMap<i64, NutritionProfile>,
) -> Result<Vec<RecipeComposition>> {
    recipes.require(&[
        RECIPE_ID_COL,
        NAME_COL,
        SERVINGS_COL,
        KCAL_COL,
        PROTEIN_COL,
        CARBS_COL,
        FAT_COL,
    ])?;
    usages.require(&[RECIPE_ID_COL, INGREDIENT_ID_COL, QUANTITY_COL])?;

    let mut by_recipe: HashMap<i64, Vec<IngredientUsage>> = HashMap::new();
    for row in usages.rows() {
        let recipe_id: i64 = row.get(RECIPE_ID_COL)?;
        let ingredient_id: i64 = row.get(INGREDIENT_ID_COL)?;
        let quantity_grams: f64 = row.get(QUANTITY_COL)?;
        if !quantity_grams.is_finite() || quantity_grams < 0.0 {
            return Err(row.malformed(QUANTITY_COL, row.raw(QUANTITY_COL)?));
        }
        let nutrition = *ingredients.get(&ingredient_id).ok_or(NutritionError::UnknownIngredient {
            recipe_id,
            ingredient_id,
        })?;
        by_recipe.entry(recipe_id).or_default().push(IngredientUsage {
            ingredient_id,
            quantity_grams,
            nutrition,
        });
    }

    let mut compositions: Vec<RecipeComposition> = Vec::with_capacity(recipes.rows.len());
    for row in recipes.rows() {
        let recipe_id: i64 = row.get(RECIPE_ID_COL)?;
        if compositions.iter().any(|c| c.recipe_id == recipe_id) {
            return Err(NutritionError::DuplicateId {
                file: recipes.file.to_string(),
                id: recipe_id,
            });
        }
        let servings: u32 = row.get(SERVINGS_COL)?;
        if servings == 0 {
            return Err(row.malformed(SERVINGS_COL, "0"));
        }
        compositions.push(RecipeComposition {
            recipe_id,
            name: row.raw(NAME_COL)?.to_string(),
            servings,
            nutrition: row.profile()?,
            ingredients: by_recipe.remove(&recipe_id).unwrap_or_default(),
        });
    }
    if let Some(&recipe_id) = by_recipe.keys().min() {
        return Err(NutritionError::OrphanedUsage {
            file: usages.file.to_string(),
            recipe_id,
        });
    }
    Ok(compositions)
}

fn parse_inventory(table: &Table) -> Result<Vec<InventoryHolding>> {
    table.require(&[INVENTORY_ID_COL, INGREDIENT_ID_COL, QUANTITY_COL])?;
    table
        .rows()
        .map(|row| {
            let quantity_grams: f64 = row.get(QUANTITY_COL)?;
            if !quantity_grams.is_finite() || quantity_grams < 0.0 {
                return Err(row.malformed(QUANTITY_COL, row.raw(QUANTITY_COL)?));
            }
            Ok(InventoryHolding {
                inventory_id: row.get(INVENTORY_ID_COL)?,
                ingredient_id: row.get(INGREDIENT_ID_COL)?,
                quantity_grams,
            })
        })
        .collect()
}

fn parse_journal(table: &Table) -> Result<Vec<JournalEntry>> {
    table.require(&[
        USER_ID_COL,
        RECIPE_ID_COL,
        SERVINGS_EATEN_COL,
        LOGGED_AT_COL,
        KCAL_COL,
        PROTEIN_COL,
        CARBS_COL,
        FAT_COL,
    ])?;
    table
        .rows()
        .map(|row| {
            let profile = row.profile()?;
            let entry = JournalEntry {
                user_id: row.get(USER_ID_COL)?,
                recipe_id: row.get(RECIPE_ID_COL)?,
                servings_eaten: row.get(SERVINGS_EATEN_COL)?,
                logged_at: row.timestamp(LOGGED_AT_COL)?,
                kcal: profile.kcal,
                protein_g: profile.protein_g,
                carbs_g: profile.carbs_g,
                fat_g: profile.fat_g,
            };
            entry.validate()?;
            Ok(entry)
        })
        .collect()
}

fn parse_meal_plan(table: &Table) -> Result<Vec<MealPlanEntry>> {
    table.require(&[
        PLAN_ID_COL,
        RECIPE_ID_COL,
        DATE_COL,
        MEAL_TYPE_COL,
        PLANNED_SERVINGS_COL,
    ])?;
    table
        .rows()
        .map(|row| {
            let planned_servings: f64 = row.get(PLANNED_SERVINGS_COL)?;
            if !planned_servings.is_finite() || planned_servings <= 0.0 {
                return Err(NutritionError::InvalidServings(planned_servings));
            }
            Ok(MealPlanEntry {
                plan_id: row.get(PLAN_ID_COL)?,
                recipe_id: row.get(RECIPE_ID_COL)?,
                date: row.get(DATE_COL)?,
                meal_type: row.get(MEAL_TYPE_COL)?,
                planned_servings,
            })
        })
        .collect()
}

fn parse_saved_meal_uses(table: &Table) -> Result<Vec<SavedMealUse>> {
    table.require(&[USER_ID_COL, SAVED_MEAL_ID_COL, USED_AT_COL])?;
    table
        .rows()
        .map(|row| {
            Ok(SavedMealUse {
                user_id: row.get(USER_ID_COL)?,
                saved_meal_id: row.get(SAVED_MEAL_ID_COL)?,
                used_at: row.timestamp(USED_AT_COL)?,
            })
        })
        .collect()
}

impl NutritionRecordSource for CsvSource {
    fn recipe(&self, recipe_id: i64) -> Result<Option<RecipeComposition>> {
        self.inner.recipe(recipe_id)
    }

    fn recipes(&self) -> Result<Vec<RecipeComposition>> {
        self.inner.recipes()
    }

    fn journal_entries(&self, user_id: i64) -> Result<Vec<JournalEntry>> {
        self.inner.journal_entries(user_id)
    }

    fn meal_plan(&self, plan_id: i64) -> Result<Vec<MealPlanEntry>> {
        self.inner.meal_plan(plan_id)
    }

    fn inventory(&self) -> Result<Vec<InventoryHolding>> {
        self.inner.inventory()
    }

    fn saved_meal_uses(&self, user_id: i64) -> Result<Vec<SavedMealUse>> {
        self.inner.saved_meal_uses(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MealType;

    fn dataset() -> DatasetText {
        DatasetText::from([
            (
                INGREDIENTS_FILE,
                "ingredient_id,name,kcal,protein_g,carbs_g,fat_g\n\
                 10,Rolled oats,389,16.9,66.3,6.9\n\
                 11,Milk,64,3.4,4.8,3.6\n"
                    .to_string(),
            ),
            (
                RECIPES_FILE,
                "recipe_id,name,servings,kcal,protein_g,carbs_g,fat_g\n\
                 1,Oatmeal,2,290.5,13.55,40.35,8.85\n\
                 2,Glass of water,1,0,0,0,0\n"
                    .to_string(),
            ),
            (
                RECIPE_INGREDIENTS_FILE,
                "recipe_id,ingredient_id,quantity_grams\n1,10,100\n1,11,300\n".to_string(),
            ),
            (
                INVENTORY_FILE,
                "inventory_id,ingredient_id,quantity_grams\n1,10,500\n".to_string(),
            ),
            (
                JOURNAL_FILE,
                "user_id,recipe_id,servings_eaten,logged_at,kcal,protein_g,carbs_g,fat_g\n\
                 1,1,1,2025-01-06T08:00:00Z,290.5,13.55,40.35,8.85\n\
                 2,1,2,2025-01-06 09:00:00,581,27.1,80.7,17.7\n"
                    .to_string(),
            ),
            (
                MEAL_PLAN_FILE,
                "plan_id,recipe_id,date,meal_type,planned_servings\n7,1,2025-01-08,breakfast,1\n"
                    .to_string(),
            ),
        ])
    }

    #[test]
    fn test_from_texts_joins_recipes_with_ingredients() {
        let source = CsvSource::from_texts(&dataset()).unwrap();
        let oatmeal = source.recipe(1).unwrap().unwrap();
        assert_eq!(oatmeal.servings, 2);
        assert_eq!(oatmeal.ingredients.len(), 2);
        assert_eq!(oatmeal.ingredients[1].ingredient_id, 11);
        assert_eq!(oatmeal.ingredients[1].nutrition.kcal, 64.0);

        let water = source.recipe(2).unwrap().unwrap();
        assert!(water.ingredients.is_empty());
        assert!(source.recipe(3).unwrap().is_none());
    }

    #[test]
    fn test_from_texts_filters_by_user_and_plan() {
        let source = CsvSource::from_texts(&dataset()).unwrap();
        assert_eq!(source.journal_entries(1).unwrap().len(), 1);
        assert_eq!(source.journal_entries(2).unwrap()[0].kcal, 581.0);
        assert!(source.journal_entries(3).unwrap().is_empty());

        let plan = source.meal_plan(7).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].meal_type, MealType::Breakfast);
        assert!(source.saved_meal_uses(1).unwrap().is_empty());
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut texts = dataset();
        texts.insert(
            INVENTORY_FILE,
            "inventory_id,ingredient_id\n1,10\n".to_string(),
        );
        let err = CsvSource::from_texts(&texts).unwrap_err();
        assert!(err
            .to_string()
            .contains(&format!("column '{}' not found", QUANTITY_COL)));
    }

    #[test]
    fn test_malformed_timestamp_fails_loudly() {
        let mut texts = dataset();
        texts.insert(
            JOURNAL_FILE,
            "user_id,recipe_id,servings_eaten,logged_at,kcal,protein_g,carbs_g,fat_g\n\
             1,1,1,last tuesday,290.5,13.55,40.35,8.85\n"
                .to_string(),
        );
        assert!(matches!(
            CsvSource::from_texts(&texts),
            Err(NutritionError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_malformed_number_reports_row() {
        let mut texts = dataset();
        texts.insert(
            INVENTORY_FILE,
            "inventory_id,ingredient_id,quantity_grams\n1,10,500\n2,11,lots\n".to_string(),
        );
        match CsvSource::from_texts(&texts) {
            Err(NutritionError::MalformedField { column, row, value, .. }) => {
                assert_eq!(column, QUANTITY_COL);
                assert_eq!(row, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("expected malformed field, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ingredient_in_recipe() {
        let mut texts = dataset();
        texts.insert(
            RECIPE_INGREDIENTS_FILE,
            "recipe_id,ingredient_id,quantity_grams\n1,99,100\n".to_string(),
        );
        assert!(matches!(
            CsvSource::from_texts(&texts),
            Err(NutritionError::UnknownIngredient {
                recipe_id: 1,
                ingredient_id: 99
            })
        ));
    }

    #[test]
    fn test_duplicate_ingredient_id_is_rejected() {
        let mut texts = dataset();
        texts.insert(
            INGREDIENTS_FILE,
            "ingredient_id,name,kcal,protein_g,carbs_g,fat_g\n\
             10,Rolled oats,389,16.9,66.3,6.9\n\
             11,Milk,64,3.4,4.8,3.6\n\
             10,Oat bran,246,17.3,66.2,7.0\n"
                .to_string(),
        );
        match CsvSource::from_texts(&texts) {
            Err(NutritionError::DuplicateId { file, id }) => {
                assert_eq!(file, INGREDIENTS_FILE);
                assert_eq!(id, 10);
            }
            other => panic!("expected duplicate id, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_recipe_id_is_rejected() {
        let mut texts = dataset();
        texts.insert(
            RECIPES_FILE,
            "recipe_id,name,servings,kcal,protein_g,carbs_g,fat_g\n\
             1,Oatmeal,2,290.5,13.55,40.35,8.85\n\
             1,Oatmeal again,1,0,0,0,0\n"
                .to_string(),
        );
        assert!(matches!(
            CsvSource::from_texts(&texts),
            Err(NutritionError::DuplicateId { id: 1, .. })
        ));
    }

    #[test]
    fn test_usages_for_undefined_recipe_are_rejected() {
        let mut texts = dataset();
        texts.insert(
            RECIPE_INGREDIENTS_FILE,
            "recipe_id,ingredient_id,quantity_grams\n1,10,100\n1,11,300\n5,10,50\n".to_string(),
        );
        match CsvSource::from_texts(&texts) {
            Err(NutritionError::OrphanedUsage { file, recipe_id }) => {
                assert_eq!(file, RECIPE_INGREDIENTS_FILE);
                assert_eq!(recipe_id, 5);
            }
            other => panic!("expected orphaned usage, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_file() {
        let mut texts = dataset();
        texts.remove(MEAL_PLAN_FILE);
        assert!(matches!(
            CsvSource::from_texts(&texts),
            Err(NutritionError::MissingFile(_))
        ));
    }
}
