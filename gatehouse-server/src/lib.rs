mod config;
mod error;
mod response;
mod server;


pub use config::{ListenConfig, ServerConfig};
pub use error::ServerError;
pub use response::{failure_response, greeting_response};
pub use server::Server;
