pub mod edit;

pub use edit::{EditRequest, EditResult, ErrorKind};
