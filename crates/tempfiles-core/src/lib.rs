//! tempfiles-core
//!
//! Lifecycle engine for short-lived uploaded files.
//!
//! 各ファイルは `<root>/<id>/` に blob と `manifest.json` を置くだけ。
//! 別のインデックスは持たず、ディレクトリ一覧がそのまま台帳になる。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（FileId, TemporaryFile, EventKind, FileView, errors）
//! - **ports**: 抽象化レイヤー（Storage, Clock, IdGenerator, EventSink, Scheduler）
//! - **codec**: manifest.json のエンコード/デコード
//! - **store**: ディレクトリ一覧 + manifest からのレコード読み出し
//! - **app**: LifecycleManager とバックグラウンドループ
//! - **impls**: 実装（LocalDiskStorage, InMemoryStorage, sinks, ChannelScheduler）
//! - **config**: 設定（環境変数から読める）

pub mod app;
pub mod codec;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod store;

pub use crate::app::{DeleteOutcome, LifecycleManager, ManagerBuilder, SweepReport};
pub use crate::config::{Config, ReclamationMode};
pub use crate::domain::{FileData, FileId, FileView, TempFileError, TemporaryFile};
