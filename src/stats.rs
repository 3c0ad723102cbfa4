use serde::Serialize;

/// Running mean and sample variance of a stream of values (Welford).
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    m2: f64,
}

#[derive(Debug, Serialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    /// NaN when no value was added.
    pub mean: f64,
    /// Sample standard deviation, NaN with fewer than two values.
    pub std_dev: f64,
}

impl Accumulator {
    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;
        let delta = val - self.mean;
        self.mean += delta / self.n_vals as f64;
        self.m2 += delta * (val - self.mean);
    }

    pub fn report(&self) -> AccumulatorReport {
        let mean = match self.n_vals {
            0 => f64::NAN,
            _ => self.mean,
        };
        let std_dev = match self.n_vals {
            0 | 1 => f64::NAN,
            n_vals => (self.m2 / (n_vals - 1) as f64).sqrt(),
        };
        AccumulatorReport {
            n_vals: self.n_vals,
            mean,
            std_dev,
        }
    }
}

impl FromIterator<f64> for Accumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Accumulator::default();
        iter.into_iter().for_each(|val| acc.add(val));
        acc
    }
}
