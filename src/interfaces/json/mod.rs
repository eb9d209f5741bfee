pub mod catalog_reader;
pub mod requests;
pub mod response;
pub mod script;
