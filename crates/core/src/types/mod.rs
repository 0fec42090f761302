//! Common domain types.

mod cart;
mod email;
mod id;
mod product;
mod user;

pub use cart::{CartLine, CartSnapshot};
pub use email::{Email, EmailError};
pub use id::{CartLineId, ProductId, UserId};
pub use product::Product;
pub use user::User;
