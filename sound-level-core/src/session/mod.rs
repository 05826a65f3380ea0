pub mod capture_session;
pub(crate) mod delivery;
