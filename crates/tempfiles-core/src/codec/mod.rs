//! Codec - manifest のシリアライズ

pub mod manifest;

pub use self::manifest::ManifestCodec;
