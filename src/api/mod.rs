pub mod command;
mod handlers;
pub mod response;
mod routes;
pub mod signature;

pub use routes::create_router;
