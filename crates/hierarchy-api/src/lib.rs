pub mod assembler;
pub mod error;
pub mod handlers;
pub mod health;
pub mod links;
pub mod routes;
pub mod server;
pub mod state;

pub use assembler::*;
pub use error::*;
pub use handlers::*;
pub use health::*;
pub use links::*;
pub use routes::*;
pub use server::*;
pub use state::*;
