//! App - アプリケーション層
//!
//! ports を組み合わせて一時ファイルのライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **ManagerBuilder**: 構築とワイヤリング（Fail-fast 検証）
//! - **LifecycleManager**: create / get / delete / lock / sweep / clear_all
//! - **SweepLoop**: periodic モードの定期 sweep
//! - **ReclaimLoop**: queued モードの遅延 delete

pub mod builder;
pub mod manager;
pub mod reclaim_loop;
pub mod sweep_loop;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ManagerBuilder};
pub use self::manager::{DeleteOutcome, LifecycleManager, SweepReport, MAX_ID_ATTEMPTS};
pub use self::reclaim_loop::ReclaimLoop;
pub use self::sweep_loop::SweepLoop;
