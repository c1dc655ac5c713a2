use serde::{Deserialize, Serialize};

use crate::error::{NutritionError, Result};
use crate::nutrition::scaler::{factor_from_grams, scale};
use crate::records::{NutritionProfile, RecipeComposition};

/// Batch total, per-serving and per-100g views of a recipe computed from its
/// ingredient usages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeNutritionProfile {
    pub total_mass_g: Option<f64>,
    pub batch: NutritionProfile,
    pub per_serving: NutritionProfile,
    pub per_100g: Option<NutritionProfile>,
}

/// Scales each `(profile, factor)` pair and sums the results field by field.
///
/// An empty input yields [`NutritionProfile::ZERO`]. Summation order is not
/// significant, so a list may be aggregated in pieces and the partial totals
/// aggregated again with factor 1.
pub fn aggregate<'a, I>(items: I) -> Result<NutritionProfile>
where
    I: IntoIterator<Item = (&'a NutritionProfile, f64)>,
{
    let mut total = NutritionProfile::ZERO;
    for (profile, factor) in items {
        total += scale(profile, factor)?;
    }
    Ok(total)
}

pub fn recipe_profile(recipe: &RecipeComposition) -> Result<RecipeNutritionProfile> {
    if recipe.servings == 0 {
        return Err(NutritionError::InvalidServings(0.0));
    }

    let mut total_mass_g = 0.0_f64;
    let mut scaled = Vec::with_capacity(recipe.ingredients.len());
    for usage in &recipe.ingredients {
        let factor = factor_from_grams(usage.quantity_grams).map_err(|_| {
            NutritionError::InvalidQuantity {
                ingredient_id: usage.ingredient_id,
                grams: usage.quantity_grams,
            }
        })?;
        usage.nutrition.validate()?;
        total_mass_g += usage.quantity_grams;
        scaled.push((&usage.nutrition, factor));
    }

    let batch = aggregate(scaled)?;
    let per_serving = scale(&batch, 1.0 / f64::from(recipe.servings))?;
    let per_100g = if total_mass_g > 0.0 {
        Some(scale(&batch, 100.0 / total_mass_g)?)
    } else {
        None
    };

    log::debug!(
        "recipe {} ({}): {:.1} kcal per batch over {:.1} g",
        recipe.recipe_id,
        recipe.name,
        batch.kcal,
        total_mass_g
    );

    Ok(RecipeNutritionProfile {
        total_mass_g: if total_mass_g > 0.0 { Some(total_mass_g) } else { None },
        batch,
        per_serving,
        per_100g,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::IngredientUsage;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn assert_close(a: &NutritionProfile, b: &NutritionProfile) {
        let eps = 1e-9;
        assert!((a.kcal - b.kcal).abs() < eps, "kcal {} vs {}", a.kcal, b.kcal);
        assert!((a.protein_g - b.protein_g).abs() < eps);
        assert!((a.carbs_g - b.carbs_g).abs() < eps);
        assert!((a.fat_g - b.fat_g).abs() < eps);
    }

    fn random_items(rng: &mut StdRng, n: usize) -> Vec<(NutritionProfile, f64)> {
        (0..n)
            .map(|_| {
                (
                    NutritionProfile::new(
                        rng.gen_range(0.0..900.0),
                        rng.gen_range(0.0..50.0),
                        rng.gen_range(0.0..80.0),
                        rng.gen_range(0.0..40.0),
                    ),
                    rng.gen_range(0.0..5.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        let empty: Vec<(&NutritionProfile, f64)> = Vec::new();
        assert_eq!(aggregate(empty).unwrap(), NutritionProfile::ZERO);
    }

    #[test]
    fn test_aggregate_sums_fields_independently() {
        let rice = NutritionProfile::new(130.0, 2.7, 28.0, 0.3);
        let chicken = NutritionProfile::new(165.0, 31.0, 0.0, 3.6);
        let total = aggregate([(&rice, 2.0), (&chicken, 1.5)]).unwrap();
        assert_close(
            &total,
            &NutritionProfile::new(260.0 + 247.5, 5.4 + 46.5, 56.0, 0.6 + 5.4),
        );
    }

    #[test]
    fn test_aggregate_propagates_invalid_factor() {
        let rice = NutritionProfile::new(130.0, 2.7, 28.0, 0.3);
        assert!(matches!(
            aggregate([(&rice, 1.0), (&rice, -1.0)]),
            Err(NutritionError::InvalidFactor(_))
        ));
    }

    #[test]
    fn test_aggregate_rejects_invalid_profile() {
        let rice = NutritionProfile::new(130.0, 2.7, 28.0, 0.3);
        let bad = NutritionProfile::new(f64::NAN, -5.0, 0.0, 0.0);
        assert!(matches!(
            aggregate([(&rice, 1.0), (&bad, 1.0)]),
            Err(NutritionError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_aggregate_is_splittable() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = random_items(&mut rng, 24);
        let whole = aggregate(items.iter().map(|(p, f)| (p, *f))).unwrap();

        let (left, right) = items.split_at(9);
        let left_total = aggregate(left.iter().map(|(p, f)| (p, *f))).unwrap();
        let right_total = aggregate(right.iter().map(|(p, f)| (p, *f))).unwrap();
        let combined = aggregate([(&left_total, 1.0), (&right_total, 1.0)]).unwrap();

        assert_close(&whole, &combined);
    }

    #[test]
    fn test_aggregate_ignores_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items = random_items(&mut rng, 30);
        let before = aggregate(items.iter().map(|(p, f)| (p, *f))).unwrap();
        items.shuffle(&mut rng);
        let after = aggregate(items.iter().map(|(p, f)| (p, *f))).unwrap();
        assert_close(&before, &after);
    }

    #[test]
    fn test_recipe_profile_views() {
        let recipe = RecipeComposition {
            recipe_id: 1,
            name: "Oatmeal".to_string(),
            servings: 2,
            nutrition: NutritionProfile::ZERO,
            ingredients: vec![
                IngredientUsage {
                    ingredient_id: 10,
                    quantity_grams: 100.0,
                    nutrition: NutritionProfile::new(389.0, 16.9, 66.3, 6.9),
                },
                IngredientUsage {
                    ingredient_id: 11,
                    quantity_grams: 300.0,
                    nutrition: NutritionProfile::new(64.0, 3.4, 4.8, 3.6),
                },
            ],
        };

        let profile = recipe_profile(&recipe).unwrap();
        assert_eq!(profile.total_mass_g, Some(400.0));
        assert_close(&profile.batch, &NutritionProfile::new(581.0, 27.1, 80.7, 17.7));
        assert_close(&profile.per_serving, &NutritionProfile::new(290.5, 13.55, 40.35, 8.85));
        assert_close(
            &profile.per_100g.unwrap(),
            &NutritionProfile::new(145.25, 6.775, 20.175, 4.425),
        );
    }

    #[test]
    fn test_recipe_profile_without_ingredients() {
        let recipe = RecipeComposition {
            recipe_id: 2,
            name: "Water".to_string(),
            servings: 1,
            nutrition: NutritionProfile::ZERO,
            ingredients: vec![],
        };
        let profile = recipe_profile(&recipe).unwrap();
        assert_eq!(profile.total_mass_g, None);
        assert_eq!(profile.per_100g, None);
        assert_eq!(profile.batch, NutritionProfile::ZERO);
    }

    #[test]
    fn test_recipe_profile_rejects_negative_quantity() {
        let recipe = RecipeComposition {
            recipe_id: 3,
            name: "Broken".to_string(),
            servings: 1,
            nutrition: NutritionProfile::ZERO,
            ingredients: vec![IngredientUsage {
                ingredient_id: 99,
                quantity_grams: -5.0,
                nutrition: NutritionProfile::ZERO,
            }],
        };
        assert!(matches!(
            recipe_profile(&recipe),
            Err(NutritionError::InvalidQuantity { ingredient_id: 99, .. })
        ));
    }
}
