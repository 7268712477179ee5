//! Decision pass state: retained events and live constant pool entries

pub mod liveness;
pub mod selection;

pub use liveness::LivenessMark;
pub use selection::{Selection, TypeCounts};
