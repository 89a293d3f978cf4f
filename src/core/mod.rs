pub mod block;
pub mod document;
pub mod error;
pub mod structure;
pub mod value;
