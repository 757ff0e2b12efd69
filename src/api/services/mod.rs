pub mod admin;
pub mod health;
pub mod redirect;

pub use admin::admin_scope;
pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, RedirectState, redirect_routes};
