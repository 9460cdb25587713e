use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ForecastError;

/// A single observed exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub timestamp: DateTime<Utc>,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl RatePoint {
    pub fn new(timestamp: DateTime<Utc>, rate: f64) -> Self {
        Self {
            timestamp,
            rate,
            high: None,
            low: None,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_range(mut self, high: f64, low: f64) -> Self {
        self.high = Some(high);
        self.low = Some(low);
        self
    }

    pub fn range(&self) -> Option<f64> {
        match (self.high, self.low) {
            (Some(high), Some(low)) => Some(high - low),
            _ => None,
        }
    }
}

/// Time-ordered rate history for one currency pair.
#[derive(Debug, Clone, Default)]
pub struct RateSeries {
    points: Vec<RatePoint>,
}

impl RateSeries {
    /// Builds a series, sorting by timestamp when the feed delivered points out of order.
    pub fn from_points(points: &[RatePoint]) -> Self {
        let mut points = points.to_vec();
        if !points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
            points.sort_by_key(|p| p.timestamp);
        }
        Self { points }
    }

    pub fn last(&self) -> Option<&RatePoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.rate).collect()
    }

    /// Volumes of the points that reported one, oldest first.
    pub fn volumes(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter_map(|p| p.volume)
            .map(|v| v as f64)
            .collect()
    }
}

/// Aggregated news sentiment for a pair, supplied by the sentiment feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// In [-1, 1].
    pub score: f64,
    pub article_count: u32,
}

impl SentimentSummary {
    pub fn new(score: f64, article_count: u32) -> Self {
        Self {
            score: score.clamp(-1.0, 1.0),
            article_count,
        }
    }

    pub fn label(&self) -> SentimentLabel {
        if self.score > 0.1 {
            SentimentLabel::Positive
        } else if self.score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

/// Currency pair label such as `USD/EUR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyPair {
    base: String,
    quote: String,
}

impl CurrencyPair {
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

impl FromStr for CurrencyPair {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| ForecastError::InvalidPair(s.to_string()))?;

        if !is_currency_code(base) || !is_currency_code(quote) {
            return Err(ForecastError::InvalidPair(s.to_string()));
        }

        Ok(Self {
            base: base.to_ascii_uppercase(),
            quote: quote.to_ascii_uppercase(),
        })
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyPair> for String {
    fn from(pair: CurrencyPair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_series_sorts_out_of_order_points() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let points = vec![
            RatePoint::new(t0 + Duration::hours(2), 1.3),
            RatePoint::new(t0, 1.1),
            RatePoint::new(t0 + Duration::hours(1), 1.2),
        ];

        let series = RateSeries::from_points(&points);
        assert_eq!(series.rates(), vec![1.1, 1.2, 1.3]);
        assert_eq!(series.last().map(|p| p.rate), Some(1.3));
    }

    #[test]
    fn test_series_volumes_skip_missing() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let points = vec![
            RatePoint::new(t0, 1.1).with_volume(100),
            RatePoint::new(t0 + Duration::hours(1), 1.2),
            RatePoint::new(t0 + Duration::hours(2), 1.3).with_volume(300),
        ];

        assert_eq!(RateSeries::from_points(&points).volumes(), vec![100.0, 300.0]);
    }

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(SentimentSummary::new(0.4, 3).label(), SentimentLabel::Positive);
        assert_eq!(SentimentSummary::new(-0.2, 3).label(), SentimentLabel::Negative);
        assert_eq!(SentimentSummary::new(0.05, 3).label(), SentimentLabel::Neutral);
        assert_eq!(SentimentSummary::new(4.0, 1).score, 1.0);
    }

    #[test]
    fn test_currency_pair_parsing() {
        let pair: CurrencyPair = "usd/eur".parse().unwrap();
        assert_eq!(pair.base(), "USD");
        assert_eq!(pair.quote(), "EUR");
        assert_eq!(pair.to_string(), "USD/EUR");

        assert!("USDEUR".parse::<CurrencyPair>().is_err());
        assert!("US/EUR".parse::<CurrencyPair>().is_err());
        assert!("USD/E1R".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_rate_point_range() {
        let point = RatePoint::new(Utc::now(), 1.05).with_range(1.06, 1.04);
        assert!((point.range().unwrap() - 0.02).abs() < 1e-12);
        assert!(RatePoint::new(Utc::now(), 1.05).range().is_none());
    }
}
