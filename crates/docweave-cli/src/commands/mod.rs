//! Command implementations.

pub mod extract;
pub mod profiles;

pub use self::extract::execute_extract;
pub use self::profiles::execute_profiles;
