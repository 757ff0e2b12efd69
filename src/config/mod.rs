mod r#impl;
mod structs;
mod validators;

pub use r#impl::{get_config, init_config, init_config_from, set_config};
pub use structs::*;
pub use validators::validate_route_prefix;
