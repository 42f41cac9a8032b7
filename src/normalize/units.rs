//! Unit-carrying wrappers and boundary conversions.
//!
//! Providers mix feet/inches, pounds, and mph freely; everything past
//! the normalizer is metric. Each wrapper is a distinct type so mixed
//! arithmetic is a compile error, and conversion happens exactly once.

/// Height in centimeters, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Centimeters(f64);

impl Centimeters {
    pub fn from_inches(total_inches: f64) -> Self {
        Centimeters(round1(total_inches * 2.54))
    }

    pub fn from_feet_inches(feet: u32, inches: u32) -> Self {
        Centimeters::from_inches((feet * 12 + inches) as f64)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Weight in kilograms, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Kilograms(f64);

impl Kilograms {
    pub fn from_pounds(pounds: f64) -> Self {
        Kilograms(round1(pounds * 0.453592))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Speed in meters per second, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MetersPerSecond(f64);

impl MetersPerSecond {
    pub fn from_mph(mph: f64) -> Self {
        MetersPerSecond((mph * 0.44704 * 100.0).round() / 100.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Parse a provider height string in any encountered encoding:
/// `6'2"`, `6-2`, or `74` (inches only).
pub fn parse_height(raw: &str) -> Option<Centimeters> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some((feet, rest)) = trimmed.split_once('\'') {
        let feet: u32 = feet.trim().parse().ok()?;
        let inches_part = rest.trim().trim_end_matches('"').trim();
        let inches: u32 = if inches_part.is_empty() {
            0
        } else {
            inches_part.parse().ok()?
        };
        return Some(Centimeters::from_feet_inches(feet, inches));
    }

    if let Some((feet, inches)) = trimmed.split_once('-') {
        let feet: u32 = feet.trim().parse().ok()?;
        let inches: u32 = inches.trim().parse().ok()?;
        return Some(Centimeters::from_feet_inches(feet, inches));
    }

    let total_inches: f64 = trimmed.parse().ok()?;
    // A bare number this large is already centimeters.
    if total_inches >= 120.0 {
        return Some(Centimeters(round1(total_inches)));
    }
    Some(Centimeters::from_inches(total_inches))
}
