pub mod accounting;
pub mod change_log;
pub mod change_record;
pub mod entities;
pub mod error;
pub mod field_change;
pub mod page;
pub mod pagination;
pub mod ports;
pub mod request;
pub mod value_objects;
