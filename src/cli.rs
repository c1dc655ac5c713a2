use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Nutrition rollups and pantry checks over exported tracker data", long_about = None)]
pub struct Cli {
    /// Directory holding the CSV exports (ingredients.csv, recipes.csv, ...)
    #[arg(short, long, env = "NUTRI_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// User whose journal is read
    #[arg(short, long, env = "NUTRI_USER_ID", default_value_t = 1)]
    pub user: i64,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging{n}[SETS env: RUST_LOG=debug]
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Totals for one calendar day (defaults to today)
    Daily { date: Option<NaiveDate> },
    /// Totals for the Monday-based week containing the given date
    Weekly { date: Option<NaiveDate> },
    /// Average per logged day over a trailing window
    Average {
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Last day of the window (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Check whether the inventory covers a recipe
    CanMake {
        recipe_id: i64,
        #[arg(short, long, default_value_t = 1.0)]
        servings: f64,
    },
    /// Batch, per-serving and per-100g nutrition of a recipe
    Recipe { recipe_id: i64 },
    /// Planned nutrition per day and meal of a meal plan
    Plan { plan_id: i64 },
    /// Ingredients to buy for a meal plan
    Shopping { plan_id: i64 },
    /// Most frequently logged recipes
    TopRecipes {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Most frequently used saved meals
    TopSavedMeals {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_can_make_with_servings() {
        let cli = Cli::try_parse_from(["nutri", "--data-dir", "/tmp/x", "can-make", "3", "-s", "2.5"])
            .unwrap();
        assert_eq!(cli.data_dir, "/tmp/x");
        match cli.command {
            Command::CanMake { recipe_id, servings } => {
                assert_eq!(recipe_id, 3);
                assert_eq!(servings, 2.5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parses_dates() {
        let cli = Cli::try_parse_from(["nutri", "average", "--days", "3", "--end", "2025-01-08"]).unwrap();
        match cli.command {
            Command::Average { days, end } => {
                assert_eq!(days, 3);
                assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 8));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["nutri", "daily", "not-a-date"]).is_err());
    }
}
