use super::engine::{round_cents, simulate_drawdown};
use super::types::WithdrawalSolution;

/// Search parameters for the sustainable-withdrawal bisection.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub target_years: u32,
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            target_years: 30,
            tolerance: 0.01,
        }
    }
}

/// Bisection search for the largest annual withdrawal whose drawdown
/// trajectory keeps the balance positive through `target_years`.
///
/// The bracket `[0, balance]` halves each step, so the loop runs
/// O(log2(balance / tolerance)) iterations. Validity rests on the
/// simulator being monotone in the expense: raising the withdrawal never
/// raises the final balance. The returned value is the lower bound of the
/// final bracket, rounded to cents, so the estimate is conservative.
///
/// Callers must pass `balance >= 0`; a negative balance inverts the
/// bracket and the search degenerates to an immediate no-op. A zero
/// `target_years` makes every probe trajectory empty, in which case the
/// starting balance itself is compared against zero and the search drifts
/// toward `balance` rather than a meaningful withdrawal; the HTTP
/// boundary rejects non-positive horizons before reaching this point.
pub fn solve_max_withdrawal(balance: f64, rate: f64, config: SolverConfig) -> WithdrawalSolution {
    let mut low = 0.0_f64;
    let mut high = balance;

    while high - low > config.tolerance {
        let mid = (low + high) / 2.0;
        let trajectory = simulate_drawdown(balance, mid, rate, Some(config.target_years));
        let final_balance = trajectory.final_balance().unwrap_or(balance);
        if final_balance > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }

    WithdrawalSolution {
        annual_withdrawal: round_cents(low),
        target_years: config.target_years,
        tolerance: config.tolerance,
    }
}
