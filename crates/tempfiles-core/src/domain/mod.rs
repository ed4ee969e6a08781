//! Domain model (ids, file record, events, errors, views).

pub mod errors;
pub mod events;
pub mod file;
pub mod ids;
pub mod view;

pub use self::errors::{Result, SchedulerError, SinkError, StorageError, TempFileError};
pub use self::events::EventKind;
pub use self::file::{FileData, MANIFEST_FILENAME, TemporaryFile};
pub use self::ids::FileId;
pub use self::view::FileView;
