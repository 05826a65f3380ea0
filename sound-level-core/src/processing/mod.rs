pub mod level_estimator;
pub mod smoother;
