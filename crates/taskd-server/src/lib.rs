pub mod manager;
pub mod routes;
pub mod server;

pub use manager::{TaskError, TaskManager};
pub use server::{start, ServerConfig, ServerHandle};
