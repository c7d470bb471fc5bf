//! Company holidays and the date-keyed overlay used by the calendar.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

/// Holiday names keyed by date. Later inserts replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HolidayMap(BTreeMap<NaiveDate, String>);

impl HolidayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, holiday: Holiday) {
        self.0.insert(holiday.date, holiday.name);
    }

    pub fn name_on(&self, date: NaiveDate) -> Option<&str> {
        self.0.get(&date).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Holidays on or after `from`, in date order.
    pub fn upcoming(&self, from: NaiveDate) -> impl Iterator<Item = Holiday> + '_ {
        self.0.range(from..).map(|(date, name)| Holiday {
            date: *date,
            name: name.clone(),
        })
    }
}

impl FromIterator<Holiday> for HolidayMap {
    fn from_iter<I: IntoIterator<Item = Holiday>>(iter: I) -> Self {
        let mut map = Self::new();
        for holiday in iter {
            map.insert(holiday);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(m: u32, d: u32, name: &str) -> Holiday {
        Holiday {
            date: NaiveDate::from_ymd_opt(2024, m, d).unwrap(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_upcoming_is_ordered_and_inclusive() {
        let map: HolidayMap = [holiday(12, 25, "Christmas"), holiday(3, 25, "Holi"), holiday(1, 26, "Republic Day")]
            .into_iter()
            .collect();

        let from = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        let names: Vec<String> = map.upcoming(from).map(|h| h.name).collect();
        assert_eq!(names, vec!["Holi", "Christmas"]);
    }

    #[test]
    fn test_name_on() {
        let map: HolidayMap = [holiday(3, 25, "Holi")].into_iter().collect();
        assert_eq!(map.name_on(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()), Some("Holi"));
        assert_eq!(map.name_on(NaiveDate::from_ymd_opt(2024, 3, 26).unwrap()), None);
    }
}
