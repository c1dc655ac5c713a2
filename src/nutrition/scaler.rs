use crate::error::{NutritionError, Result};
use crate::records::NutritionProfile;

/// Multiplies every field of `profile` by `factor`.
///
/// The factor is `grams / 100` for per-100g ingredient profiles or
/// `planned / base` servings for recipe profiles. A zero factor is valid and
/// yields the zero profile; negative or non-finite factors are rejected, and
/// so is a profile with any negative or non-finite field.
pub fn scale(profile: &NutritionProfile, factor: f64) -> Result<NutritionProfile> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(NutritionError::InvalidFactor(factor));
    }
    profile.validate()?;
    Ok(NutritionProfile {
        kcal: profile.kcal * factor,
        protein_g: profile.protein_g * factor,
        carbs_g: profile.carbs_g * factor,
        fat_g: profile.fat_g * factor,
    })
}

pub fn factor_from_grams(quantity_grams: f64) -> Result<f64> {
    if !quantity_grams.is_finite() || quantity_grams < 0.0 {
        return Err(NutritionError::InvalidFactor(quantity_grams));
    }
    Ok(quantity_grams / 100.0)
}

pub fn factor_from_servings(planned_servings: f64, base_servings: f64) -> Result<f64> {
    for servings in [planned_servings, base_servings] {
        if !servings.is_finite() || servings <= 0.0 {
            return Err(NutritionError::InvalidServings(servings));
        }
    }
    Ok(planned_servings / base_servings)
}
