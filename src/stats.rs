//! Per-key running statistics.

use crate::record::Value;

/// Neumaier-compensated float sum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Compensated {
    sum: f64,
    compensation: f64,
}

impl Compensated {
    #[inline]
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn merge(&mut self, other: Compensated) {
        self.add(other.sum);
        self.compensation += other.compensation;
    }

    fn total(self) -> f64 {
        self.sum + self.compensation
    }
}

/// Exact while every value fits in tenths, compensated once one doesn't.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Sum {
    Tenths(i64),
    Float(Compensated),
}

impl Sum {
    fn to_compensated(self) -> Compensated {
        match self {
            Sum::Tenths(tenths) => Compensated {
                sum: tenths as f64 / 10.0,
                compensation: 0.0,
            },
            Sum::Float(compensated) => compensated,
        }
    }

    #[inline]
    fn add(&mut self, value: Value) {
        if let (Sum::Tenths(sum), Value::Tenths(tenths)) = (&mut *self, value) {
            if let Some(total) = sum.checked_add(tenths) {
                *sum = total;
                return;
            }
        }

        let mut compensated = self.to_compensated();
        compensated.add(value.as_f64());
        *self = Sum::Float(compensated);
    }

    fn merge(&mut self, other: Sum) {
        if let (Sum::Tenths(sum), Sum::Tenths(tenths)) = (&mut *self, other) {
            if let Some(total) = sum.checked_add(tenths) {
                *sum = total;
                return;
            }
        }

        let mut compensated = self.to_compensated();
        compensated.merge(other.to_compensated());
        *self = Sum::Float(compensated);
    }

    fn total(self) -> f64 {
        self.to_compensated().total()
    }

    fn mean(self, count: u64) -> f64 {
        match self {
            // One rounding step: tenths and count * 10 are both exact.
            Sum::Tenths(tenths) => tenths as f64 / (count as f64 * 10.0),
            Sum::Float(compensated) => compensated.total() / count as f64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    count: u64,
    sum: Sum,
    min: f64,
    max: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: Sum::Tenths(0),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, value: Value) {
        let float = value.as_f64();

        self.count += 1;
        self.sum.add(value);
        self.min = self.min.min(float);
        self.max = self.max.max(float);
    }

    /// Folds another partial result for the same key into this one.
    pub fn merge(&mut self, other: &Stats) {
        self.count += other.count;
        self.sum.merge(other.sum);
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum.total()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `sum / count`, clamped to `[min, max]`; `0.0` when nothing was recorded.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum.mean(self.count).clamp(self.min, self.max)
    }
}
