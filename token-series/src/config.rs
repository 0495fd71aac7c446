use serde::{Deserialize, Serialize};
use token_core::SeriesError;

use crate::series::{CloseConvention, MonthMode};

/// What the aggregator does with snapshots that are not in timestamp order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrder {
    /// Stable-sort a copy, keeping store order for equal timestamps
    #[default]
    Sort,
    /// Fail with `NonMonotonicInput`
    Reject,
}

/// Largest number of buckets one series may span
pub const MAX_TICK_BUDGET: usize = 5_000;

/// Reject tick budgets outside `1..=MAX_TICK_BUDGET`
pub fn check_tick_budget(tick_budget: usize) -> Result<(), SeriesError> {
    if tick_budget == 0 || tick_budget > MAX_TICK_BUDGET {
        return Err(SeriesError::InvalidTickBudget {
            requested: tick_budget,
            max: MAX_TICK_BUDGET,
        });
    }
    Ok(())
}

/// Series engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Maximum number of buckets in a returned series
    pub tick_budget: usize,
    pub convention: CloseConvention,
    pub month_mode: MonthMode,
    pub input_order: InputOrder,
    /// Run the gap filler on the windowed series
    pub fill_gaps: bool,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            tick_budget: 120,
            convention: CloseConvention::OwnBucket,
            month_mode: MonthMode::FixedStride,
            input_order: InputOrder::Sort,
            fill_gaps: true,
        }
    }
}

impl SeriesConfig {
    pub fn validate(&self) -> Result<(), SeriesError> {
        check_tick_budget(self.tick_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SeriesConfig::default();
        assert_eq!(config.tick_budget, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tick_budget_bounds() {
        assert!(check_tick_budget(1).is_ok());
        assert!(check_tick_budget(MAX_TICK_BUDGET).is_ok());
        assert_eq!(
            check_tick_budget(0),
            Err(SeriesError::InvalidTickBudget {
                requested: 0,
                max: MAX_TICK_BUDGET
            })
        );

        let config = SeriesConfig {
            tick_budget: 50_000_000,
            ..SeriesConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SeriesError::InvalidTickBudget { requested: 50_000_000, .. })
        ));
    }
}
