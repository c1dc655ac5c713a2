use thiserror::Error;

pub type Result<T> = std::result::Result<T, NutritionError>;

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("scale factor must be finite and non-negative, got {0}")]
    InvalidFactor(f64),
    #[error("servings must be finite and greater than zero, got {0}")]
    InvalidServings(f64),
    #[error("quantity for ingredient {ingredient_id} must be finite and non-negative, got {grams}")]
    InvalidQuantity { ingredient_id: i64, grams: f64 },
    #[error("nutrition field '{field}' must be finite and non-negative, got {value}")]
    InvalidProfile { field: &'static str, value: f64 },
    #[error("averaging window must cover at least one day")]
    InvalidWindow,
    #[error("record at position {0} has no timestamp")]
    MissingTimestamp(usize),
    #[error("could not parse timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("recipe {0} not found")]
    UnknownRecipe(i64),
    #[error("ingredient {ingredient_id} used by recipe {recipe_id} is not defined")]
    UnknownIngredient { recipe_id: i64, ingredient_id: i64 },
    #[error("id {id} appears more than once in {file}")]
    DuplicateId { file: String, id: i64 },
    #[error("{file} lists ingredients for recipe {recipe_id}, which is not defined")]
    OrphanedUsage { file: String, recipe_id: i64 },
    #[error("data file not found at: {0:?}")]
    MissingFile(std::path::PathBuf),
    #[error("column '{column}' not found in {file}")]
    MissingColumn { file: String, column: &'static str },
    #[error("malformed value '{value}' for '{column}' in {file} at row {row}")]
    MalformedField {
        file: String,
        column: &'static str,
        row: usize,
        value: String,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
