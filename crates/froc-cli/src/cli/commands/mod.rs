pub mod dispatch;
pub mod evaluate;
pub mod match_cmd;
pub mod prepare;

pub use dispatch::dispatch;
