//! The value and object model: tagged words, the bump heap, and the
//! operations messages are answered with.

pub mod heap;
pub mod object;
pub mod value;
