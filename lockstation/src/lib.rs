pub mod command;
pub mod link;
pub mod registers;

pub use link::{Channel, RxEvent};
pub use registers::RegisterStore;
