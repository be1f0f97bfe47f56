pub mod constants;
pub mod error;
pub mod header;
pub mod packet;
pub mod table_id;
pub mod tables;
