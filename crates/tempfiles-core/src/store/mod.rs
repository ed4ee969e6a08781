//! Store - ファイルシステム上のレコードの読み出し

pub mod reader;

pub use self::reader::{Entry, RecordStore};
