use chrono::{Months, NaiveDate};

/// Warranties expiring within this many days count as "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Warranty lengths the server knows how to turn into an expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarrantyDuration {
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FiveYears,
    Lifetime,
}

impl WarrantyDuration {
    pub const ALL: [WarrantyDuration; 6] = [
        WarrantyDuration::SixMonths,
        WarrantyDuration::OneYear,
        WarrantyDuration::TwoYears,
        WarrantyDuration::ThreeYears,
        WarrantyDuration::FiveYears,
        WarrantyDuration::Lifetime,
    ];

    /// Parse a duration label case-insensitively ("1 Year", "lifetime").
    /// Returns None for "Other" and anything unrecognised.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "6 months" => Some(WarrantyDuration::SixMonths),
            "1 year" => Some(WarrantyDuration::OneYear),
            "2 years" => Some(WarrantyDuration::TwoYears),
            "3 years" => Some(WarrantyDuration::ThreeYears),
            "5 years" => Some(WarrantyDuration::FiveYears),
            "lifetime" => Some(WarrantyDuration::Lifetime),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WarrantyDuration::SixMonths => "6 Months",
            WarrantyDuration::OneYear => "1 Year",
            WarrantyDuration::TwoYears => "2 Years",
            WarrantyDuration::ThreeYears => "3 Years",
            WarrantyDuration::FiveYears => "5 Years",
            WarrantyDuration::Lifetime => "Lifetime",
        }
    }

    fn months(&self) -> u32 {
        match self {
            WarrantyDuration::SixMonths => 6,
            WarrantyDuration::OneYear => 12,
            WarrantyDuration::TwoYears => 24,
            WarrantyDuration::ThreeYears => 36,
            WarrantyDuration::FiveYears => 60,
            // Lifetime is stored as 99 years
            WarrantyDuration::Lifetime => 99 * 12,
        }
    }

    /// Expiry date for a purchase made on `purchased`. Month arithmetic
    /// clamps to the last day of the month (Feb 29 + 1 year = Feb 28).
    pub fn expiry_from(&self, purchased: NaiveDate) -> Option<NaiveDate> {
        purchased.checked_add_months(Months::new(self.months()))
    }
}

impl std::fmt::Display for WarrantyDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarrantyStatus {
    Active,
    ExpiringSoon,
    Expired,
    Unknown,
}

impl WarrantyStatus {
    pub fn for_expiry(expiry: Option<NaiveDate>, today: NaiveDate) -> Self {
        match expiry {
            None => WarrantyStatus::Unknown,
            Some(date) if date < today => WarrantyStatus::Expired,
            Some(date) if (date - today).num_days() <= EXPIRING_SOON_DAYS => {
                WarrantyStatus::ExpiringSoon
            }
            Some(_) => WarrantyStatus::Active,
        }
    }
}

impl std::fmt::Display for WarrantyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarrantyStatus::Active => write!(f, "Active"),
            WarrantyStatus::ExpiringSoon => write!(f, "Expiring soon"),
            WarrantyStatus::Expired => write!(f, "Expired"),
            WarrantyStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(WarrantyDuration::parse("1 Year"), Some(WarrantyDuration::OneYear));
        assert_eq!(WarrantyDuration::parse("LIFETIME"), Some(WarrantyDuration::Lifetime));
        assert_eq!(WarrantyDuration::parse(" 6 months "), Some(WarrantyDuration::SixMonths));
        assert_eq!(WarrantyDuration::parse("Other"), None);
        assert_eq!(WarrantyDuration::parse(""), None);
    }

    #[test]
    fn test_labels_parse_back() {
        for duration in WarrantyDuration::ALL {
            assert_eq!(WarrantyDuration::parse(duration.label()), Some(duration));
        }
    }

    #[test]
    fn test_expiry_from() {
        let bought = date(2024, 1, 15);
        assert_eq!(WarrantyDuration::SixMonths.expiry_from(bought), Some(date(2024, 7, 15)));
        assert_eq!(WarrantyDuration::TwoYears.expiry_from(bought), Some(date(2026, 1, 15)));
        assert_eq!(WarrantyDuration::Lifetime.expiry_from(bought), Some(date(2123, 1, 15)));
        // Leap day clamps
        assert_eq!(WarrantyDuration::OneYear.expiry_from(date(2024, 2, 29)), Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_status_for_expiry() {
        let today = date(2025, 6, 1);
        assert_eq!(WarrantyStatus::for_expiry(None, today), WarrantyStatus::Unknown);
        assert_eq!(WarrantyStatus::for_expiry(Some(date(2025, 5, 31)), today), WarrantyStatus::Expired);
        assert_eq!(WarrantyStatus::for_expiry(Some(today), today), WarrantyStatus::ExpiringSoon);
        assert_eq!(WarrantyStatus::for_expiry(Some(date(2025, 7, 1)), today), WarrantyStatus::ExpiringSoon);
        assert_eq!(WarrantyStatus::for_expiry(Some(date(2025, 7, 2)), today), WarrantyStatus::Active);
    }
}
