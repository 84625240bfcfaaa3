pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod session;
pub mod utils;

pub use config::Config;
pub use errors::{CoreError, CoreResult};
pub use session::SessionController;
