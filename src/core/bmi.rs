//! Body mass index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// BMI from weight in kilograms and height in centimetres.
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> Result<f64, BmiError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(BmiError::InvalidWeight(weight_kg));
    }
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(BmiError::InvalidHeight(height_cm));
    }

    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum BmiError {
    #[error("weight must be a positive number of kilograms, got {0}")]
    InvalidWeight(f64),
    #[error("height must be a positive number of centimetres, got {0}")]
    InvalidHeight(f64),
}

/// WHO weight category bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obesity,
}

impl BmiCategory {
    /// Bands are half-open so every finite BMI has a category.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obesity
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obesity => "Obesity",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A computed BMI with its category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiReading {
    pub bmi: f64,
    pub category: BmiCategory,
}

impl BmiReading {
    pub fn compute(weight_kg: f64, height_cm: f64) -> Result<Self, BmiError> {
        let bmi = calculate_bmi(weight_kg, height_cm)?;
        Ok(Self {
            bmi,
            category: BmiCategory::from_bmi(bmi),
        })
    }
}

impl fmt::Display for BmiReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ({})", self.bmi, self.category)
    }
}
