pub mod collection;
pub mod entities;
pub mod projection;
pub mod value_objects;

pub use collection::{Collection, Entity};
pub use value_objects::{EntityId, UserId};
