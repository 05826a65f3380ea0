pub mod capture_provider;
pub mod level_observer;
