pub mod general;
pub mod sync;
