//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 모든 Repository는 static methods 패턴을 사용하며, [`PgJournalStore`]가
//! 이를 `journal_core`의 저장소 트레이트에 연결합니다.

pub mod accounts;
pub mod leaderboard;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;
pub mod trades;

pub use accounts::AccountRepository;
pub use leaderboard::LeaderboardRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use postgres::PgJournalStore;
pub use trades::TradeRepository;
