pub mod health;
pub mod lookup;
pub mod register;

pub use health::{AppStartTime, HealthService, health_routes};
pub use lookup::{LookupService, lookup_routes};
pub use register::{RegisterService, register_routes};
