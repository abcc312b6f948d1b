use serde::Serialize;

/// Ordered per-year growth rates, each a fractional annual return
/// (0.07 means 7%). Length equals the accumulation horizon in years.
///
/// The engine does not enforce a rate domain; values of -1.0 or less are
/// representable and make compounding collapse to zero or negative in one
/// step, which downstream code must carry through rather than reject.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    rates: Vec<f64>,
}

impl RateSeries {
    pub fn from_rates(rates: Vec<f64>) -> Self {
        Self { rates }
    }

    /// A single scalar repeated for every year of the horizon.
    pub fn fixed(rate: f64, years: u32) -> Self {
        Self {
            rates: vec![rate; years as usize],
        }
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Arithmetic mean of the series; 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.rates.is_empty() {
            return 0.0;
        }
        self.rates.iter().sum::<f64>() / self.rates.len() as f64
    }
}

/// Balance at the end of the accumulation horizon plus the realized
/// average rate across the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub balance: f64,
    pub effective_rate: f64,
}

/// Year-by-year post-withdrawal balances (rounded to cents for reporting)
/// and the count of years simulated before termination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownTrajectory {
    pub years_funded: u32,
    pub balances: Vec<f64>,
}

impl DrawdownTrajectory {
    /// Last reported balance, or None for an empty trajectory
    /// (degenerate zero-year horizon).
    pub fn final_balance(&self) -> Option<f64> {
        self.balances.last().copied()
    }
}

/// Largest sustainable annual withdrawal found by bisection, with the
/// search parameters echoed back for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalSolution {
    pub annual_withdrawal: f64,
    pub target_years: u32,
    pub tolerance: f64,
}
