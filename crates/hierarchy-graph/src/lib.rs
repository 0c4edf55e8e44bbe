pub mod client;
pub mod memory;
pub mod neo4j;
pub mod row;
pub mod statement;
pub mod store;

pub use client::*;
pub use memory::*;
pub use neo4j::*;
pub use row::*;
pub use statement::*;
pub use store::*;
