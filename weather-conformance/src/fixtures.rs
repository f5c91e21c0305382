//! Literal data-provider rows.

use crate::result::Param;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityCase {
    pub city: &'static str,
    pub country: &'static str,
}

impl CityCase {
    pub fn params(&self) -> Vec<Param> {
        vec![self.city.into(), self.country.into()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastCase {
    pub city: &'static str,
    pub country: &'static str,
    pub days: u32,
}

impl ForecastCase {
    pub fn params(&self) -> Vec<Param> {
        vec![self.city.into(), self.country.into(), self.days.into()]
    }
}

pub fn cities() -> Vec<CityCase> {
    vec![
        CityCase { city: "London", country: "United Kingdom" },
        CityCase { city: "Berlin", country: "Germany" },
        CityCase { city: "Warsaw", country: "Poland" },
    ]
}

pub fn forecasts() -> Vec<ForecastCase> {
    vec![
        ForecastCase { city: "London", country: "United Kingdom", days: 3 },
        ForecastCase { city: "Berlin", country: "Germany", days: 5 },
        ForecastCase { city: "Warsaw", country: "Poland", days: 7 },
    ]
}
