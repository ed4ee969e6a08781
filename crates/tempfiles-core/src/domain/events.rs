//! Events - ライフサイクルイベント
//!
//! `EventSink` に渡されるイベント種別。
//! - Created: `create` がディレクトリ・blob・manifest を書き終えた後
//! - Used: コア外のコラボレーターが「使用済み」と判断したとき
//! - Deleted: ディレクトリ削除の後

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Used,
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Created => "created",
            EventKind::Used => "used",
            EventKind::Deleted => "deleted",
        };
        f.write_str(name)
    }
}
