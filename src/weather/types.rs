// Copyright 2025 The Nimbus Authors
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};

/// Current-conditions payload returned by the weather API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub location: Location,
    pub current: Current,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub country: String,
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Current {
    pub temp_c: f64,
    pub temp_f: f64,
    pub precip_mm: f64,
    pub condition: Condition,
    pub wind_degree: f64,
    pub wind_kph: f64,
    pub wind_mph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

/// What to ask the weather API for.
///
/// `q` is whatever the API accepts as a location: a place name, or
/// `"lat,lon"` as produced by the geolocation adapter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeatherParams {
    pub path: String,
    pub api_key: String,
    pub q: Option<String>,
    pub lang: Option<String>,
}
