use serde::{Deserialize, Serialize};
use super::PeriodId;

/// Dimensions of the repeating teaching cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_periods_per_day")]
    pub periods_per_day: u32,
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,
    #[serde(default = "default_weeks_per_cycle")]
    pub weeks_per_cycle: u32,
}

fn default_periods_per_day() -> u32 {
    5
}

fn default_days_per_week() -> u32 {
    5
}

fn default_weeks_per_cycle() -> u32 {
    2
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            periods_per_day: 5,
            days_per_week: 5,
            weeks_per_cycle: 2,
        }
    }
}

impl CycleConfig {
    /// Total periods in one cycle
    pub fn total_periods(&self) -> u32 {
        self.periods_per_day * self.days_per_week * self.weeks_per_cycle
    }
}

/// One teaching period within the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    /// Period within the day, 1-based
    pub number: u32,
    /// Day within the week, 1-based
    pub day: u32,
    /// Week within the cycle, 1-based
    pub week: u32,
}

impl Period {
    /// Reconstruct a period from its linear id under the given cycle
    pub fn from_id(id: PeriodId, config: &CycleConfig) -> Self {
        let index = id.0 - 1;
        let per_week = config.periods_per_day * config.days_per_week;
        let week = index / per_week;
        let day = (index % per_week) / config.periods_per_day;
        let number = index % config.periods_per_day;
        Self {
            id,
            number: number + 1,
            day: day + 1,
            week: week + 1,
        }
    }

    /// Linear id of the (week, day, number) coordinates under the given cycle
    pub fn linear_id(week: u32, day: u32, number: u32, config: &CycleConfig) -> PeriodId {
        let per_week = config.periods_per_day * config.days_per_week;
        PeriodId((week - 1) * per_week + (day - 1) * config.periods_per_day + number)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "W{}D{}P{}", self.week, self.day, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cycle_has_fifty_periods() {
        assert_eq!(CycleConfig::default().total_periods(), 50);
    }

    #[test]
    fn linear_id_round_trips() {
        let config = CycleConfig::default();
        for id in 1..=config.total_periods() {
            let period = Period::from_id(PeriodId(id), &config);
            assert_eq!(
                Period::linear_id(period.week, period.day, period.number, &config),
                PeriodId(id)
            );
            assert!((1..=config.periods_per_day).contains(&period.number));
            assert!((1..=config.days_per_week).contains(&period.day));
            assert!((1..=config.weeks_per_cycle).contains(&period.week));
        }
    }

    #[test]
    fn first_and_last_period_coordinates() {
        let config = CycleConfig::default();
        let first = Period::from_id(PeriodId(1), &config);
        assert_eq!((first.week, first.day, first.number), (1, 1, 1));
        let last = Period::from_id(PeriodId(50), &config);
        assert_eq!((last.week, last.day, last.number), (2, 5, 5));
    }
}
