//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。エンジンが外部に求める能力を
//! trait として定義し、実装は `impls` に置きます。
//!
//! # 設計原則
//! - ファイルシステム（ディレクトリ名 = ID）が source of truth
//! - 時刻・ID・通知・遅延実行はすべて注入する（グローバル状態を読まない）

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod scheduler;
pub mod storage;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::scheduler::Scheduler;
pub use self::storage::Storage;
