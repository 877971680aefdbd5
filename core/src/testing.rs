pub mod orchestrator;
pub mod ratelimit;
pub mod result;
pub mod retry;
pub mod runner;
pub mod testcase;

#[cfg(test)]
pub(crate) mod mock;

pub use orchestrator::*;
pub use ratelimit::*;
pub use result::*;
pub use retry::*;
pub use runner::*;
pub use testcase::*;
