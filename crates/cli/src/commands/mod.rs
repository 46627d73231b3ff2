//! CLI Commands

pub mod audit;
pub mod init;
pub mod note;

pub use audit::AuditCommand;
pub use init::InitCommand;
pub use note::{NoteCommand, NoteOrder};
