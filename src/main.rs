use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use nutri_engine::cli::{parse_args, Command};
use nutri_engine::rollup::NutritionTotals;
use nutri_engine::{CsvSource, NutritionService};
use serde::Serialize;
use std::env;

fn logger_init(verbose: bool) {
    let debug = verbose
        || env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default() == "debug";
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module(
            "nutri_engine",
            if debug {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

fn totals_text(label: &str, t: &NutritionTotals) -> String {
    format!(
        "{}: {} meal(s), {:.1} kcal, P {:.1} g, C {:.1} g, F {:.1} g",
        label, t.meal_count, t.total_kcal, t.total_protein, t.total_carbs, t.total_fat
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    logger_init(cli.verbose);

    let source = CsvSource::load(&cli.data_dir)
        .await
        .with_context(|| format!("Failed to load nutrition data from '{}'", cli.data_dir))?;
    let service = NutritionService::new(source);
    let today: NaiveDate = Local::now().date_naive();
    let user = cli.user;

    match cli.command {
        Command::Daily { date } => {
            let date = date.unwrap_or(today);
            let totals = service.daily(user, date, &Local)?;
            emit(cli.json, &totals, |t| totals_text(&date.to_string(), t))?;
        }
        Command::Weekly { date } => {
            let week = nutri_engine::dates::week_key(date.unwrap_or(today));
            let totals = service.weekly(user, week)?;
            emit(cli.json, &totals, |t| totals_text(&format!("week of {}", week), t))?;
        }
        Command::Average { days, end } => {
            let end = end.unwrap_or(today);
            let average = service.average(user, end, days, &Local)?;
            emit(cli.json, &average, |a| match a {
                Some(a) => format!(
                    "{} logged day(s) of the last {}: {:.1} kcal, P {:.1} g, C {:.1} g, F {:.1} g per day",
                    a.days_logged, days, a.avg_kcal, a.avg_protein, a.avg_carbs, a.avg_fat
                ),
                None => format!("No data: nothing logged in the {} day(s) up to {}", days, end),
            })?;
        }
        Command::CanMake { recipe_id, servings } => {
            let report = service
                .can_make(recipe_id, servings)
                .with_context(|| format!("Sufficiency check failed for recipe {}", recipe_id))?;
            emit(cli.json, &report, |r| {
                let mut lines = vec![format!(
                    "recipe {} x{}: {}",
                    recipe_id,
                    servings,
                    if r.can_make { "can make" } else { "cannot make" }
                )];
                for i in &r.per_ingredient {
                    let status = if i.is_missing {
                        "missing"
                    } else if i.is_insufficient {
                        "insufficient"
                    } else {
                        "ok"
                    };
                    lines.push(format!(
                        "  ingredient {}: need {:.1} g, have {:.1} g, short {:.1} g ({})",
                        i.ingredient_id, i.required_grams, i.available_grams, i.shortfall_grams, status
                    ));
                }
                lines.join("\n")
            })?;
        }
        Command::Recipe { recipe_id } => {
            let profile = service.recipe_nutrition(recipe_id)?;
            emit(cli.json, &profile, |p| {
                format!(
                    "batch: {:.1} kcal over {} | per serving: {:.1} kcal | per 100g: {}",
                    p.batch.kcal,
                    p.total_mass_g.map_or_else(|| "N/A".to_string(), |m| format!("{:.1} g", m)),
                    p.per_serving.kcal,
                    p.per_100g.map_or_else(|| "N/A".to_string(), |n| format!("{:.1} kcal", n.kcal)),
                )
            })?;
        }
        Command::Plan { plan_id } => {
            let days = service.plan_nutrition(plan_id)?;
            emit(cli.json, &days, |d| {
                d.iter()
                    .map(|(date, day)| {
                        let meals = day
                            .by_meal
                            .iter()
                            .map(|(meal, n)| format!("{} {:.0}", meal, n.kcal))
                            .collect::<Vec<String>>()
                            .join(", ");
                        format!("{}: {:.1} kcal ({})", date, day.total.kcal, meals)
                    })
                    .collect::<Vec<String>>()
                    .join("\n")
            })?;
        }
        Command::Shopping { plan_id } => {
            let items = service.shopping_list(plan_id)?;
            emit(cli.json, &items, |items| {
                if items.is_empty() {
                    return "Inventory covers the whole plan.".to_string();
                }
                items
                    .iter()
                    .map(|i| format!("ingredient {}: buy {:.1} g", i.ingredient_id, i.to_buy_grams))
                    .collect::<Vec<String>>()
                    .join("\n")
            })?;
        }
        Command::TopRecipes { limit } => {
            let ranked = service.top_recipes(user, limit)?;
            emit(cli.json, &ranked, |r| {
                r.iter()
                    .map(|u| format!("recipe {}: {} time(s), last {}", u.id, u.count, u.last_used_at))
                    .collect::<Vec<String>>()
                    .join("\n")
            })?;
        }
        Command::TopSavedMeals { limit } => {
            let ranked = service.top_saved_meals(user, limit)?;
            emit(cli.json, &ranked, |r| {
                r.iter()
                    .map(|u| format!("saved meal {}: {} time(s), last {}", u.id, u.count, u.last_used_at))
                    .collect::<Vec<String>>()
                    .join("\n")
            })?;
        }
    }

    Ok(())
}
