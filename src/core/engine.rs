use super::types::{DrawdownTrajectory, ProjectionResult, RateSeries};

/// Hard cap on simulated drawdown years. Guarantees termination when no
/// target horizon is given and the balance never depletes; changing it
/// changes observable trajectory lengths.
pub const MAX_SIMULATION_YEARS: u32 = 120;

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compound growth at a single fixed annual rate.
///
/// A zero-or-negative horizon is a no-op, not an error: the principal is
/// returned rounded to cents. Rounding happens once at the end, never on
/// intermediate values.
pub fn accumulate_fixed(principal: f64, rate: f64, years: u32) -> f64 {
    if years == 0 {
        return round_cents(principal);
    }
    round_cents(principal * (1.0 + rate).powi(years as i32))
}

/// Compound growth under a per-year rate sequence. An empty series leaves
/// the principal untouched apart from the final cents rounding.
pub fn accumulate_variable(principal: f64, rates: &[f64]) -> f64 {
    if rates.is_empty() {
        return round_cents(principal);
    }
    let growth: f64 = rates.iter().map(|r| 1.0 + r).product();
    round_cents(principal * growth)
}

/// Accumulation balance plus the realized average rate across the series.
pub fn project(principal: f64, series: &RateSeries) -> ProjectionResult {
    ProjectionResult {
        balance: accumulate_variable(principal, series.rates()),
        effective_rate: series.mean(),
    }
}

/// Year-by-year depletion of `balance` under a constant withdrawal.
///
/// Each year the balance compounds at `rate` and then `annual_expense` is
/// subtracted. The year that drives the balance non-positive is still
/// counted and reported. Reported balances are rounded to cents but the
/// carried-forward balance stays unrounded, so rounding error never
/// compounds across years.
pub fn simulate_drawdown(
    balance: f64,
    annual_expense: f64,
    rate: f64,
    target_years: Option<u32>,
) -> DrawdownTrajectory {
    let mut bal = balance;
    let mut years = 0u32;
    let mut balances = Vec::new();

    while bal > 0.0
        && target_years.is_none_or(|target| years < target)
        && years < MAX_SIMULATION_YEARS
    {
        bal = bal * (1.0 + rate) - annual_expense;
        years += 1;
        balances.push(round_cents(bal));
    }

    DrawdownTrajectory {
        years_funded: years,
        balances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fixed_rate_matches_closed_form() {
        assert_approx(accumulate_fixed(10_000.0, 0.07, 20), 38_696.84);
        assert_approx(accumulate_fixed(1_000.0, 0.0, 10), 1_000.0);
        assert_approx(accumulate_fixed(500.0, 0.10, 1), 550.0);
    }

    #[test]
    fn zero_year_horizon_returns_rounded_principal() {
        assert_approx(accumulate_fixed(1_234.567, 0.07, 0), 1_234.57);
    }

    #[test]
    fn rate_of_minus_one_collapses_balance() {
        assert_approx(accumulate_fixed(1_000.0, -1.0, 3), 0.0);
        assert_approx(accumulate_fixed(1_000.0, -1.5, 1), -500.0);
    }

    #[test]
    fn variable_single_element_matches_fixed_one_year() {
        for rate in [-0.5, 0.0, 0.05, 0.07, 0.25] {
            assert_approx(
                accumulate_variable(10_000.0, &[rate]),
                accumulate_fixed(10_000.0, rate, 1),
            );
        }
    }

    #[test]
    fn empty_series_returns_rounded_principal() {
        assert_approx(accumulate_variable(9_999.999, &[]), 10_000.0);
    }

    #[test]
    fn variable_product_is_order_insensitive() {
        let forward = accumulate_variable(25_000.0, &[0.05, -0.02, 0.11, 0.03]);
        let reversed = accumulate_variable(25_000.0, &[0.03, 0.11, -0.02, 0.05]);
        assert_approx(forward, reversed);
    }

    #[test]
    fn project_reports_balance_and_mean_rate() {
        let series = RateSeries::from_rates(vec![0.05, 0.06, 0.07, 0.08]);
        let result = project(10_000.0, &series);
        assert_approx(result.effective_rate, 0.065);
        assert_approx(result.balance, accumulate_variable(10_000.0, series.rates()));
    }

    #[test]
    fn project_empty_series_has_zero_effective_rate() {
        let result = project(5_000.0, &RateSeries::from_rates(Vec::new()));
        assert_approx(result.balance, 5_000.0);
        assert_approx(result.effective_rate, 0.0);
    }

    #[test]
    fn drawdown_funds_full_horizon_when_growth_outpaces_expense() {
        // 38,696.84 * 0.07 ~ 2,708.78 of annual growth against a 2,000
        // withdrawal, so the balance rises every year.
        let trajectory = simulate_drawdown(38_696.84, 2_000.0, 0.07, Some(30));
        assert_eq!(trajectory.years_funded, 30);
        assert_eq!(trajectory.balances.len(), 30);
        assert!(trajectory.final_balance().unwrap() > 38_696.84);
    }

    #[test]
    fn drawdown_zero_target_is_empty() {
        let trajectory = simulate_drawdown(10_000.0, 500.0, 0.07, Some(0));
        assert_eq!(trajectory.years_funded, 0);
        assert!(trajectory.balances.is_empty());
        assert_eq!(trajectory.final_balance(), None);
    }

    #[test]
    fn drawdown_counts_the_depleting_year() {
        let trajectory = simulate_drawdown(100.0, 200.0, 0.0, None);
        assert_eq!(trajectory.years_funded, 1);
        assert_eq!(trajectory.balances, vec![-100.0]);
    }

    #[test]
    fn drawdown_zero_expense_terminates_at_safety_cap() {
        let trajectory = simulate_drawdown(1_000.0, 0.0, 0.05, None);
        assert_eq!(trajectory.years_funded, MAX_SIMULATION_YEARS);
        assert_eq!(trajectory.balances.len(), MAX_SIMULATION_YEARS as usize);
    }

    #[test]
    fn drawdown_rate_below_minus_one_depletes_immediately() {
        let trajectory = simulate_drawdown(1_000.0, 0.0, -1.0, None);
        assert_eq!(trajectory.years_funded, 1);
        assert_approx(trajectory.balances[0], 0.0);
    }

    #[test]
    fn drawdown_rounds_reports_but_carries_unrounded_balance() {
        // With a tiny rate the per-year growth is below a cent; if the
        // recurrence carried rounded values the trajectory would flatline
        // instead of matching the closed form at the cap.
        let rate = 0.0001234;
        let trajectory = simulate_drawdown(1_000.0, 0.0, rate, None);
        let expected = round_cents(1_000.0 * (1.0 + rate).powi(MAX_SIMULATION_YEARS as i32));
        assert_approx(trajectory.balances[MAX_SIMULATION_YEARS as usize - 1], expected);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_fixed_matches_sequential_product(
            principal in 1u32..1_000_000,
            rate_bp in -3000i32..3000,
            years in 0u32..40
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let sequential = (0..years).fold(principal, |bal, _| bal * (1.0 + rate));
            let actual = accumulate_fixed(principal, rate, years);
            let tol = 0.011 + sequential.abs() * 1e-9;
            prop_assert!((actual - round_cents(sequential)).abs() <= tol,
                "closed form {actual} vs sequential {sequential}");
        }

        #[test]
        fn prop_variable_single_element_agrees_with_fixed(
            principal in 1u32..1_000_000,
            rate_bp in -15000i32..5000
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let fixed = accumulate_fixed(principal, rate, 1);
            let variable = accumulate_variable(principal, &[rate]);
            prop_assert!((fixed - variable).abs() <= EPS);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_drawdown_terminates_within_cap(
            balance in 1u32..1_000_000_000,
            expense in 0u32..100_000,
            rate_bp in -12000i32..3000
        ) {
            let trajectory = simulate_drawdown(
                balance as f64,
                expense as f64,
                rate_bp as f64 / 10_000.0,
                None,
            );
            prop_assert!(trajectory.years_funded <= MAX_SIMULATION_YEARS);
            prop_assert!(trajectory.balances.len() == trajectory.years_funded as usize);
        }

        #[test]
        fn prop_drawdown_respects_target_horizon(
            balance in 1u32..10_000_000,
            expense in 0u32..50_000,
            rate_bp in -5000i32..2000,
            target in 0u32..80
        ) {
            let trajectory = simulate_drawdown(
                balance as f64,
                expense as f64,
                rate_bp as f64 / 10_000.0,
                Some(target),
            );
            prop_assert!(trajectory.years_funded <= target);
        }

        #[test]
        fn prop_drawdown_is_monotone_in_expense(
            balance in 1_000u32..10_000_000,
            expense in 0u32..200_000,
            delta in 1u32..50_000,
            rate_bp in -2000i32..1500,
            target in 1u32..60
        ) {
            let balance = balance as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let lower = simulate_drawdown(balance, expense as f64, rate, Some(target));
            let higher = simulate_drawdown(balance, (expense + delta) as f64, rate, Some(target));

            // A larger withdrawal can only deplete sooner, and when both
            // runs survive the same number of years its balance is lower.
            prop_assert!(higher.years_funded <= lower.years_funded);
            if higher.years_funded == lower.years_funded {
                if let (Some(hi), Some(lo)) = (higher.final_balance(), lower.final_balance()) {
                    prop_assert!(hi <= lo + EPS);
                }
            }
        }
    }
}
