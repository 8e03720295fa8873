pub mod accounting;
pub mod changelog;
pub mod diff;
pub mod format;
pub mod forms;
pub mod media;
pub mod monitoring;
pub mod session;
pub mod store;
