use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{
    bollinger_position, macd, moving_average, rolling_volatility, rsi, DEFAULT_BOLLINGER_PERIOD,
    DEFAULT_MACD_FAST, DEFAULT_MACD_SLOW, DEFAULT_RSI_PERIOD,
};
use crate::types::{RatePoint, RateSeries, SentimentSummary};

/// Widest indicator window; shorter histories get the cold-start vector.
pub const MIN_HISTORY: usize = 20;

pub const DEFAULT_VOLUME: f64 = 1_000_000.0;
pub const DEFAULT_NEWS_COUNT: f64 = 10.0;

/// Fixed-size, model-agnostic feature vector for forecasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rate_lag_1: f64,
    pub rate_lag_2: f64,
    pub rate_lag_3: f64,
    pub rate_lag_6: f64,
    pub rate_lag_12: f64,
    pub rate_ma_5: f64,
    pub rate_ma_10: f64,
    pub rate_ma_20: f64,
    pub volatility_5: f64,
    pub volatility_10: f64,
    pub rsi: f64,
    pub macd: f64,
    pub bollinger_position: f64,
    pub volume_ma_5: f64,
    pub volume_ma_10: f64,
    pub sentiment_score: f64,
    pub news_count: f64,
    pub hour_of_day: f64,
    pub day_of_week: f64,
    pub day_of_month: f64,
}

impl FeatureVector {
    pub const NUM_FEATURES: usize = 20;

    pub const NAMES: [&'static str; Self::NUM_FEATURES] = [
        "rate_lag_1",
        "rate_lag_2",
        "rate_lag_3",
        "rate_lag_6",
        "rate_lag_12",
        "rate_ma_5",
        "rate_ma_10",
        "rate_ma_20",
        "volatility_5",
        "volatility_10",
        "rsi",
        "macd",
        "bollinger_position",
        "volume_ma_5",
        "volume_ma_10",
        "sentiment_score",
        "news_count",
        "hour_of_day",
        "day_of_week",
        "day_of_month",
    ];

    /// Constant vector used when history is too short. Calendar fields are
    /// fixed (hour 0, Monday, day 1) so the vector never depends on the clock.
    pub fn cold_start() -> Self {
        Self {
            rate_lag_1: 1.0545,
            rate_lag_2: 1.0540,
            rate_lag_3: 1.0535,
            rate_lag_6: 1.0530,
            rate_lag_12: 1.0525,
            rate_ma_5: 1.0540,
            rate_ma_10: 1.0535,
            rate_ma_20: 1.0530,
            volatility_5: 0.01,
            volatility_10: 0.012,
            rsi: 50.0,
            macd: 0.0,
            bollinger_position: 0.5,
            volume_ma_5: DEFAULT_VOLUME,
            volume_ma_10: DEFAULT_VOLUME,
            sentiment_score: 0.0,
            news_count: DEFAULT_NEWS_COUNT,
            hour_of_day: 0.0,
            day_of_week: 0.0,
            day_of_month: 1.0,
        }
    }

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.rate_lag_1,
            self.rate_lag_2,
            self.rate_lag_3,
            self.rate_lag_6,
            self.rate_lag_12,
            self.rate_ma_5,
            self.rate_ma_10,
            self.rate_ma_20,
            self.volatility_5,
            self.volatility_10,
            self.rsi,
            self.macd,
            self.bollinger_position,
            self.volume_ma_5,
            self.volume_ma_10,
            self.sentiment_score,
            self.news_count,
            self.hour_of_day,
            self.day_of_week,
            self.day_of_month,
        ]
    }

    /// Name of the first non-finite feature, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .zip(self.to_array())
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::cold_start()
    }
}

/// Rate `n` steps back from the end (lag 1 is the latest), back-filled with
/// the oldest rate when the series is shorter than the lag.
fn lag(rates: &[f64], n: usize) -> f64 {
    if rates.len() >= n {
        rates[rates.len() - n]
    } else {
        rates.first().copied().unwrap_or(0.0)
    }
}

/// Build the feature vector for a rate history and optional sentiment.
///
/// Points are sorted by timestamp if the feed delivered them out of order.
pub fn build_features(series: &[RatePoint], sentiment: Option<&SentimentSummary>) -> FeatureVector {
    if series.len() < MIN_HISTORY {
        debug!(
            "Cold start: {} points < {}, using default features",
            series.len(),
            MIN_HISTORY
        );
        return FeatureVector::cold_start();
    }

    let series = RateSeries::from_points(series);
    let rates = series.rates();
    let volumes = series.volumes();

    let (volume_ma_5, volume_ma_10) = if volumes.is_empty() {
        (DEFAULT_VOLUME, DEFAULT_VOLUME)
    } else {
        (moving_average(&volumes, 5), moving_average(&volumes, 10))
    };

    let (sentiment_score, news_count) = sentiment
        .map(|s| (s.score, s.article_count as f64))
        .unwrap_or((0.0, DEFAULT_NEWS_COUNT));

    let (hour_of_day, day_of_week, day_of_month) = series
        .last()
        .map(|p| {
            (
                p.timestamp.hour() as f64,
                p.timestamp.weekday().num_days_from_monday() as f64,
                p.timestamp.day() as f64,
            )
        })
        .unwrap_or((0.0, 0.0, 1.0));

    FeatureVector {
        rate_lag_1: lag(&rates, 1),
        rate_lag_2: lag(&rates, 2),
        rate_lag_3: lag(&rates, 3),
        rate_lag_6: lag(&rates, 6),
        rate_lag_12: lag(&rates, 12),
        rate_ma_5: moving_average(&rates, 5),
        rate_ma_10: moving_average(&rates, 10),
        rate_ma_20: moving_average(&rates, 20),
        volatility_5: rolling_volatility(&rates, 5),
        volatility_10: rolling_volatility(&rates, 10),
        rsi: rsi(&rates, DEFAULT_RSI_PERIOD),
        macd: macd(&rates, DEFAULT_MACD_FAST, DEFAULT_MACD_SLOW),
        bollinger_position: bollinger_position(&rates, DEFAULT_BOLLINGER_PERIOD),
        volume_ma_5,
        volume_ma_10,
        sentiment_score,
        news_count,
        hour_of_day,
        day_of_week,
        day_of_month,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn hourly_series(n: usize, start: f64, step: f64) -> Vec<RatePoint> {
        // 2024-03-06 is a Wednesday
        let t0 = Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| RatePoint::new(t0 + Duration::hours(i as i64), start + i as f64 * step))
            .collect()
    }

    #[test]
    fn test_short_history_returns_default_vector() {
        for n in 0..MIN_HISTORY {
            let series = hourly_series(n, 149.85, 0.3);
            assert_eq!(build_features(&series, None), FeatureVector::cold_start());
        }
    }

    #[test]
    fn test_short_history_ignores_sentiment() {
        let sentiment = SentimentSummary::new(0.8, 42);
        let series = hourly_series(5, 1.1, 0.01);
        assert_eq!(build_features(&series, Some(&sentiment)), FeatureVector::cold_start());
    }

    #[test]
    fn test_lags_and_averages() {
        let series = hourly_series(30, 1.0, 0.01);
        let features = build_features(&series, None);

        assert!((features.rate_lag_1 - 1.29).abs() < 1e-9);
        assert!((features.rate_lag_2 - 1.28).abs() < 1e-9);
        assert!((features.rate_lag_3 - 1.27).abs() < 1e-9);
        assert!((features.rate_lag_6 - 1.24).abs() < 1e-9);
        assert!((features.rate_lag_12 - 1.18).abs() < 1e-9);
        assert!((features.rate_ma_5 - 1.27).abs() < 1e-9);
        assert!((features.rate_ma_10 - 1.245).abs() < 1e-9);
        assert!((features.rate_ma_20 - 1.195).abs() < 1e-9);
        assert_eq!(features.rsi, 100.0);
        assert!(features.macd > 0.0);
        assert!(features.bollinger_position > 0.5);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut series = hourly_series(25, 1.0, 0.01);
        let sorted = build_features(&series, None);
        series.reverse();
        assert_eq!(build_features(&series, None), sorted);
    }

    #[test]
    fn test_calendar_features_from_last_point() {
        let series = hourly_series(21, 1.0, 0.0);
        let features = build_features(&series, None);
        // last point: 2024-03-06 20:00 UTC, a Wednesday
        assert_eq!(features.hour_of_day, 20.0);
        assert_eq!(features.day_of_week, 2.0);
        assert_eq!(features.day_of_month, 6.0);
    }

    #[test]
    fn test_sentiment_and_volume_defaults() {
        let features = build_features(&hourly_series(25, 1.0, 0.001), None);
        assert_eq!(features.sentiment_score, 0.0);
        assert_eq!(features.news_count, DEFAULT_NEWS_COUNT);
        assert_eq!(features.volume_ma_5, DEFAULT_VOLUME);
        assert_eq!(features.volume_ma_10, DEFAULT_VOLUME);
    }

    #[test]
    fn test_sentiment_and_volume_supplied() {
        let series: Vec<RatePoint> = hourly_series(25, 1.0, 0.001)
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.with_volume(100 * (i as u64 + 1)))
            .collect();
        let sentiment = SentimentSummary::new(-0.4, 7);

        let features = build_features(&series, Some(&sentiment));
        assert_eq!(features.sentiment_score, -0.4);
        assert_eq!(features.news_count, 7.0);
        // last five volumes: 2100..2500
        assert_eq!(features.volume_ma_5, 2300.0);
        assert_eq!(features.volume_ma_10, 2050.0);
    }

    #[test]
    fn test_constant_series_is_well_formed() {
        let features = build_features(&hourly_series(40, 1.0545, 0.0), None);
        assert_eq!(features.rsi, 50.0);
        assert_eq!(features.bollinger_position, 0.5);
        assert!(features.volatility_5 < 1e-12);
        assert!(features.first_non_finite().is_none());
    }

    #[test]
    fn test_lag_backfills_with_oldest() {
        assert_eq!(lag(&[1.0, 2.0, 3.0], 12), 1.0);
        assert_eq!(lag(&[1.0, 2.0, 3.0], 1), 3.0);
        assert_eq!(lag(&[], 3), 0.0);
    }

    #[test]
    fn test_feature_array_matches_names() {
        let features = FeatureVector::cold_start();
        let arr = features.to_array();
        assert_eq!(arr.len(), FeatureVector::NAMES.len());
        assert_eq!(arr[0], features.rate_lag_1);
        assert_eq!(arr[12], features.bollinger_position);
        assert_eq!(arr[19], features.day_of_month);
    }

    #[test]
    fn test_non_finite_detection() {
        let features = FeatureVector {
            macd: f64::NAN,
            ..FeatureVector::cold_start()
        };
        assert_eq!(features.first_non_finite(), Some("macd"));
    }
}
