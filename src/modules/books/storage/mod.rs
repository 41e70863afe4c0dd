//! Gateway implementations for the books module.

pub mod entity;
mod memory;
mod sea_orm_gateway;

pub use memory::InMemoryBookGateway;
pub use sea_orm_gateway::SeaOrmBookGateway;
