//! Cointegration and z-score contracts consumed by the statistical
//! detector. The underlying math (Engle-Granger/Johansen, ADF critical
//! values) is out of scope; `OlsCointegrationAnalyzer` is a minimal,
//! self-contained implementation sufficient to exercise the detector
//! end-to-end.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointegrationResult {
    pub is_cointegrated: bool,
    pub p_value: f64,
    pub hedge_ratio: f64,
    pub test_statistic: f64,
    pub half_life: f64,
}

pub trait CointegrationAnalyzer: Send + Sync {
    fn analyze(&self, series_a: &[f64], series_b: &[f64]) -> CointegrationResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZScoreSignal {
    EntryLong,
    EntryShort,
    Exit,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreOutput {
    pub zscore: f64,
    pub spread: f64,
    pub mean: f64,
    pub std: f64,
    pub signal: ZScoreSignal,
}

pub trait ZScoreGenerator: Send + Sync {
    fn generate(
        &self,
        series_a: &[f64],
        series_b: &[f64],
        hedge_ratio: f64,
        lookback: usize,
        entry_zscore: f64,
        exit_zscore: f64,
    ) -> Option<ZScoreOutput>;
}

/// OLS hedge ratio plus a residual-stationarity proxy: fits
/// `series_a = hedge_ratio * series_b + intercept` by least squares,
/// then treats the lag-1 autocorrelation of the residual spread as a
/// stand-in for an ADF test statistic. Not a substitute for a real
/// cointegration test; good enough to drive the detector's contract.
pub struct OlsCointegrationAnalyzer {
    pub significance_level: f64,
    pub min_half_life: f64,
    pub max_half_life: f64,
}

impl Default for OlsCointegrationAnalyzer {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_half_life: 1.0,
            max_half_life: 90.0,
        }
    }
}

impl OlsCointegrationAnalyzer {
    #[must_use]
    pub fn new(significance_level: f64, min_half_life: f64, max_half_life: f64) -> Self {
        Self { significance_level, min_half_life, max_half_life }
    }

    #[must_use]
    pub fn qualifies(&self, result: &CointegrationResult) -> bool {
        result.is_cointegrated
            && result.p_value < self.significance_level
            && result.half_life >= self.min_half_life
            && result.half_life <= self.max_half_life
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl CointegrationAnalyzer for OlsCointegrationAnalyzer {
    fn analyze(&self, series_a: &[f64], series_b: &[f64]) -> CointegrationResult {
        let n = series_a.len().min(series_b.len());
        if n < 3 {
            return CointegrationResult {
                is_cointegrated: false,
                p_value: 1.0,
                hedge_ratio: 0.0,
                test_statistic: 0.0,
                half_life: f64::INFINITY,
            };
        }
        let a = &series_a[..n];
        let b = &series_b[..n];
        let mean_a = mean(a);
        let mean_b = mean(b);

        let mut cov_ab = 0.0;
        let mut var_b = 0.0;
        for i in 0..n {
            cov_ab += (a[i] - mean_a) * (b[i] - mean_b);
            var_b += (b[i] - mean_b).powi(2);
        }
        let hedge_ratio = if var_b > 0.0 { cov_ab / var_b } else { 0.0 };
        let intercept = mean_a - hedge_ratio * mean_b;

        let residuals: Vec<f64> = (0..n).map(|i| a[i] - (hedge_ratio * b[i] + intercept)).collect();
        let residual_mean = mean(&residuals);
        let residual_var = residuals.iter().map(|r| (r - residual_mean).powi(2)).sum::<f64>() / n as f64;
        let residual_std = residual_var.sqrt();

        // Lag-1 autocorrelation of the residual spread: near 1 means the
        // spread wanders like a random walk (not stationary), near 0
        // means it reverts quickly.
        let mut autocov = 0.0;
        for i in 1..n {
            autocov += (residuals[i] - residual_mean) * (residuals[i - 1] - residual_mean);
        }
        let autocorr = if residual_var > 0.0 && n > 1 {
            (autocov / (n - 1) as f64) / residual_var
        } else {
            1.0
        };

        let half_life = if autocorr > 0.0 && autocorr < 1.0 {
            -(2f64.ln()) / autocorr.ln()
        } else {
            f64::INFINITY
        };

        let test_statistic = -autocorr.abs() * (n as f64).sqrt();
        let p_value = (autocorr.abs()).min(1.0);
        let is_cointegrated = residual_std > 0.0 && autocorr < 0.5 && half_life.is_finite();

        CointegrationResult {
            is_cointegrated,
            p_value,
            hedge_ratio,
            test_statistic,
            half_life,
        }
    }
}

/// Rolling z-score of the cointegration residual spread over `lookback`
/// observations.
pub struct RollingZScoreGenerator;

impl ZScoreGenerator for RollingZScoreGenerator {
    fn generate(
        &self,
        series_a: &[f64],
        series_b: &[f64],
        hedge_ratio: f64,
        lookback: usize,
        entry_zscore: f64,
        exit_zscore: f64,
    ) -> Option<ZScoreOutput> {
        let n = series_a.len().min(series_b.len());
        if n < lookback || lookback < 2 {
            return None;
        }
        let start = n - lookback;
        let spreads: Vec<f64> = (start..n).map(|i| series_a[i] - hedge_ratio * series_b[i]).collect();
        let m = mean(&spreads);
        let variance = spreads.iter().map(|s| (s - m).powi(2)).sum::<f64>() / spreads.len() as f64;
        let std = variance.sqrt();
        if std <= 0.0 {
            return None;
        }
        let spread = *spreads.last()?;
        let zscore = (spread - m) / std;

        let signal = if zscore >= entry_zscore {
            ZScoreSignal::EntryShort
        } else if zscore <= -entry_zscore {
            ZScoreSignal::EntryLong
        } else if zscore.abs() <= exit_zscore {
            ZScoreSignal::Exit
        } else {
            ZScoreSignal::Hold
        };

        Some(ZScoreOutput { zscore, spread, mean: m, std, signal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfectly_correlated_series_yield_hedge_ratio_one() {
        let a: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let b: Vec<f64> = (0..50).map(|i| 50.0 + i as f64).collect();
        let analyzer = OlsCointegrationAnalyzer::default();
        let result = analyzer.analyze(&a, &b);
        assert!((result.hedge_ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn short_series_is_never_cointegrated() {
        let analyzer = OlsCointegrationAnalyzer::default();
        let result = analyzer.analyze(&[1.0, 2.0], &[1.0, 2.0]);
        assert!(!result.is_cointegrated);
    }

    #[test]
    fn extreme_zscore_yields_entry_signal() {
        let mut a: Vec<f64> = vec![100.0; 30];
        let b: Vec<f64> = vec![50.0; 30];
        *a.last_mut().unwrap() = 150.0;
        let generator = RollingZScoreGenerator;
        let output = generator.generate(&a, &b, 1.0, 30, 2.0, 0.5).expect("output");
        assert_eq!(output.signal, ZScoreSignal::EntryShort);
    }
}
