//! 매매일지 도메인 모델.

mod account;
mod leaderboard;
mod metrics;
mod store;
mod trade;

pub use account::*;
pub use leaderboard::*;
pub use metrics::*;
pub use store::*;
pub use trade::*;
