use super::mean;

/// Exponential moving average seeded with the first observed value.
#[derive(Debug, Clone)]
pub struct EMA {
    period: usize,
    multiplier: f64,
    value: Option<f64>,
}

impl EMA {
    pub fn new(period: usize) -> Self {
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self {
            period,
            multiplier,
            value: None,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            Some(prev) => self.multiplier * price + (1.0 - self.multiplier) * prev,
            None => price,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// EMA over the whole sequence with smoothing factor `2 / (period + 1)`.
///
/// With fewer than `period` rates this is the plain mean of what is available
/// (0.0 when empty).
pub fn ema(rates: &[f64], period: usize) -> f64 {
    if rates.len() < period {
        return mean(rates);
    }

    let mut ema = EMA::new(period);
    rates.iter().fold(0.0, |_, &rate| ema.update(rate))
}
