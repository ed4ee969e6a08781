//! IdGenerator port - ID 生成の抽象化
//!
//! 生成された ID はそのままディレクトリ名になるため、
//! ファイルシステムで安全な文字だけを含む必要があります。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use ulid::Ulid;

use crate::domain::FileId;
use crate::ports::Clock;

/// IdGenerator は一時ファイルの ID を生成
///
/// `filename` は参考情報として渡されるだけで、使うかどうかは実装次第。
/// 衝突時の再試行は manager 側が行う（ディレクトリの存在チェック）。
pub trait IdGenerator: Send + Sync {
    fn generate(&self, filename: &str) -> FileId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock の時刻 + 80bit の乱数。小文字の Crockford base32 なので
/// 大文字小文字を区別しないファイルシステムでも衝突しません。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate(&self, _filename: &str) -> FileId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        FileId::from_ulid(ulid)
    }
}
