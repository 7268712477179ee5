//! Recording data model

pub mod events;
pub mod metadata;
pub mod pool;
pub mod reference;
pub mod value;
