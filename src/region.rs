//! Region tags, their display names and the country lookup used to place a roster.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::error::{RankingError, Result};

pub const EUROPE: Region = Region(0);
pub const AMERICAS: Region = Region(1);
pub const ASIA: Region = Region(2);

pub const ALL_REGIONS: [Region; 3] = [EUROPE, AMERICAS, ASIA];

// Only Europe has published regional standings so far
const REGION_NAMES: &[&str] = &["Europe"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub u8);

impl Region {
    pub fn name(&self) -> Option<&'static str> {
        REGION_NAMES.get(self.0 as usize).copied()
    }

    // Majority vote over players' countries. Unknown countries abstain; no votes or a tie goes to the lowest region id.
    pub fn from_countries<'a, I>(country_isos: I) -> Region
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut votes: HashMap<Region, usize> = HashMap::new();
        for iso in country_isos {
            if let Some(region) = region_of_country(iso) {
                *votes.entry(region).or_default() += 1;
            }
        }

        votes
            .into_iter()
            .max_by(|(ra, a), (rb, b)| a.cmp(b).then(rb.cmp(ra)))
            .map(|(region, _)| region)
            .unwrap_or(EUROPE)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "region {}", self.0),
        }
    }
}

/// Parses a region selection given as a JSON list, e.g. `[0,1,2]`.
pub fn parse_regions(input: &str) -> Result<Vec<Region>> {
    let ids: Vec<u8> = serde_json::from_str(input).map_err(|e| RankingError::InvalidRegions {
        input: input.to_string(),
        reason: e.to_string(),
    })?;

    if ids.is_empty() {
        return Err(RankingError::InvalidRegions {
            input: input.to_string(),
            reason: "at least one region is required".to_string(),
        });
    }

    Ok(ids.into_iter().map(Region).collect())
}

fn region_of_country(iso: &str) -> Option<Region> {
    const EUROPE_ISOS: &[&str] = &[
        "AL", "AM", "AT", "AZ", "BA", "BE", "BG", "BY", "CH", "CY", "CZ", "DE", "DK", "EE", "ES",
        "FI", "FR", "GB", "GE", "GR", "HR", "HU", "IE", "IL", "IS", "IT", "KZ", "LT", "LU", "LV",
        "MD", "ME", "MK", "MT", "NL", "NO", "PL", "PT", "RO", "RS", "RU", "SE", "SI", "SK", "TR",
        "UA", "UZ", "XK", "EG", "MA", "TN", "DZ", "ZA",
    ];
    const AMERICAS_ISOS: &[&str] = &[
        "AR", "BO", "BR", "CA", "CL", "CO", "CR", "DO", "EC", "GT", "HN", "MX", "PA", "PE", "PR",
        "PY", "SV", "US", "UY", "VE",
    ];
    const ASIA_ISOS: &[&str] = &[
        "AE", "AU", "BD", "CN", "HK", "ID", "IN", "IQ", "IR", "JO", "JP", "KG", "KR", "KW", "LB",
        "MN", "MO", "MY", "NZ", "PH", "PK", "QA", "SA", "SG", "SY", "TH", "TJ", "TM", "TW", "VN",
    ];

    let iso = iso.trim().to_ascii_uppercase();
    if EUROPE_ISOS.contains(&iso.as_str()) {
        Some(EUROPE)
    } else if AMERICAS_ISOS.contains(&iso.as_str()) {
        Some(AMERICAS)
    } else if ASIA_ISOS.contains(&iso.as_str()) {
        Some(ASIA)
    } else {
        None
    }
}
