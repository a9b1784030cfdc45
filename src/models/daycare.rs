//! Licensed child care facility records

use serde::{Deserialize, Serialize};

use crate::age_group::AgeGroup;

/// Licensed capacity per age group at one facility.
///
/// The five counts mirror the dataset's IGSPACE/TGSPACE/PGSPACE/KGSPACE/
/// SGSPACE columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupSpaces {
    pub infant: u32,
    pub toddler: u32,
    pub preschool: u32,
    pub kindergarten: u32,
    pub school_age: u32,
}

impl AgeGroupSpaces {
    /// Capacity for a specific age group
    #[must_use]
    pub fn for_group(&self, group: AgeGroup) -> u32 {
        match group {
            AgeGroup::Infant => self.infant,
            AgeGroup::Toddler => self.toddler,
            AgeGroup::Preschool => self.preschool,
            AgeGroup::Kindergarten => self.kindergarten,
            AgeGroup::SchoolAge => self.school_age,
        }
    }
}

/// One licensed child care centre from the open-data snapshot.
///
/// Records are built and validated once at catalog load time and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaycareRecord {
    /// Stable identifier from the dataset (LOC_ID)
    pub id: String,
    pub name: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    /// Latitude in decimal degrees (WGS84)
    pub latitude: f64,
    /// Longitude in decimal degrees (WGS84)
    pub longitude: f64,
    /// Licensed spaces per age group
    pub spaces: AgeGroupSpaces,
    /// Total licensed spaces across all groups
    pub total_spaces: u32,
    /// Facility offers fee-subsidy placements
    pub subsidy: bool,
    /// Facility participates in the CWELCC program
    pub cwelcc: bool,
}

impl DaycareRecord {
    /// Capacity for a specific age group
    #[must_use]
    pub fn capacity_for(&self, group: AgeGroup) -> u32 {
        self.spaces.for_group(group)
    }

    /// Whether the facility has any spaces for the given age group
    #[must_use]
    pub fn serves(&self, group: AgeGroup) -> bool {
        self.capacity_for(group) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_spaces(spaces: AgeGroupSpaces) -> DaycareRecord {
        DaycareRecord {
            id: "1001".to_string(),
            name: "Test Centre".to_string(),
            address: "100 Queen St W".to_string(),
            postal_code: Some("M5H 2N2".to_string()),
            phone: None,
            latitude: 43.6532,
            longitude: -79.3832,
            spaces,
            total_spaces: 30,
            subsidy: true,
            cwelcc: false,
        }
    }

    #[test]
    fn test_capacity_lookup_per_group() {
        let record = record_with_spaces(AgeGroupSpaces {
            infant: 0,
            toddler: 5,
            preschool: 10,
            kindergarten: 15,
            school_age: 0,
        });

        assert_eq!(record.capacity_for(AgeGroup::Infant), 0);
        assert_eq!(record.capacity_for(AgeGroup::Toddler), 5);
        assert_eq!(record.capacity_for(AgeGroup::Preschool), 10);
        assert_eq!(record.capacity_for(AgeGroup::Kindergarten), 15);
        assert_eq!(record.capacity_for(AgeGroup::SchoolAge), 0);
    }

    #[test]
    fn test_serves_requires_nonzero_capacity() {
        let record = record_with_spaces(AgeGroupSpaces {
            toddler: 5,
            ..AgeGroupSpaces::default()
        });

        assert!(record.serves(AgeGroup::Toddler));
        assert!(!record.serves(AgeGroup::Infant));
    }
}
