//! Domain types for the inventory API: field validators, enumerated statuses
//! and the five entity definitions consumed by the generic entity service.

pub mod errors;
pub mod validation;
pub mod status;
pub mod entity;
pub mod item;
pub mod user;
pub mod product;
pub mod order;
pub mod review;

pub use entity::{Entity, SortValue, UniqueKey};
pub use errors::ValidationError;
pub use item::Item;
pub use order::Order;
pub use product::Product;
pub use review::Review;
pub use user::User;
