//! Age group mapping for licensed child care categories
//!
//! Toronto licenses daycare spaces in five age bands. A child's band is
//! derived from their birthday and a reference date, in whole calendar
//! months. Band lower bounds are inclusive, upper bounds exclusive, so a
//! child turning exactly 18 months old counts as a toddler that day.

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::America::Toronto;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::CareFinderError;

/// One of the five licensing age bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Infant,
    Toddler,
    Preschool,
    Kindergarten,
    SchoolAge,
}

impl AgeGroup {
    /// All bands, youngest first
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::Infant,
        AgeGroup::Toddler,
        AgeGroup::Preschool,
        AgeGroup::Kindergarten,
        AgeGroup::SchoolAge,
    ];

    /// Band for an age in whole months
    #[must_use]
    pub fn from_age_months(months: u32) -> Self {
        match months {
            0..=17 => AgeGroup::Infant,
            18..=29 => AgeGroup::Toddler,
            30..=47 => AgeGroup::Preschool,
            48..=71 => AgeGroup::Kindergarten,
            _ => AgeGroup::SchoolAge,
        }
    }

    /// Human-readable label matching the dataset's licensing categories
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Infant => "Infant (0-18 months)",
            AgeGroup::Toddler => "Toddler (18-30 months)",
            AgeGroup::Preschool => "Preschool (30 months - 4 years)",
            AgeGroup::Kindergarten => "Kindergarten (4-5 years)",
            AgeGroup::SchoolAge => "School Age (6+ years)",
        }
    }
}

/// Age in whole calendar months between a birthday and a reference date.
///
/// A month only counts once the day-of-month has been reached, so a child
/// born January 31 is 0 months old on February 28.
pub fn age_in_months(birthday: NaiveDate, reference: NaiveDate) -> Result<u32> {
    if birthday > reference {
        return Err(CareFinderError::invalid_input(format!(
            "birthday {birthday} is after the reference date {reference}"
        )));
    }

    let mut months = (reference.year() - birthday.year()) * 12 + reference.month() as i32
        - birthday.month() as i32;
    if reference.day() < birthday.day() {
        months -= 1;
    }

    Ok(u32::try_from(months).unwrap_or(0))
}

/// Map a birthday to its licensing age band as of a reference date
pub fn map_age_group(birthday: NaiveDate, reference: NaiveDate) -> Result<AgeGroup> {
    let months = age_in_months(birthday, reference)?;
    Ok(AgeGroup::from_age_months(months))
}

/// Today's date in Toronto, the reference date for live queries
#[must_use]
pub fn today_in_toronto() -> NaiveDate {
    Utc::now().with_timezone(&Toronto).date_naive()
}

/// Format an age in months for display ("2 years, 3 months" or "7 months")
#[must_use]
pub fn format_age(months: u32) -> String {
    if months >= 12 {
        format!("{} years, {} months", months / 12, months % 12)
    } else {
        format!("{months} months")
    }
}
