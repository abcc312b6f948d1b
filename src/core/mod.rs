mod engine;
mod solver;
mod types;

pub use engine::{
    MAX_SIMULATION_YEARS, accumulate_fixed, accumulate_variable, project, simulate_drawdown,
};
pub use solver::{SolverConfig, solve_max_withdrawal};
pub use types::{DrawdownTrajectory, ProjectionResult, RateSeries, WithdrawalSolution};
