//! Entities, value objects and the ports the workflow needs from the outside
//! world.

pub mod card;
pub mod job;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
pub mod product;
pub mod shipping;
pub mod view;
