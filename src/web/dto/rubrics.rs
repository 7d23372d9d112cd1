use serde::{Deserialize, Serialize};

use crate::model::entity::{AchievementLevel, Indicator, Rubric};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct IndicatorWithLevels {
    pub indicator: Indicator,
    pub levels: Vec<AchievementLevel>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct RubricDetailResponse {
    pub rubric: Rubric,
    pub indicators: Vec<IndicatorWithLevels>,
}

impl RubricDetailResponse {
    pub fn from_entities(rubric: Rubric, indicators: Vec<(Indicator, Vec<AchievementLevel>)>) -> Self {
        Self {
            rubric,
            indicators: indicators
                .into_iter()
                .map(|(indicator, levels)| IndicatorWithLevels { indicator, levels })
                .collect(),
        }
    }
}
