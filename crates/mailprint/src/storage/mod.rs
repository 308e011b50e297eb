pub mod attachment;

pub use attachment::{AttachmentStore, PRINTABLE_EXTENSION};
