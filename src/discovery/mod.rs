//! Source discovery: glob resolution on local disk and object storage, and table naming for
//! the matches.

pub mod glob;
pub mod naming;
pub mod object_store;

pub use glob::{is_glob, split_base_pattern, GlobSplit};
pub use naming::{derive, derive_all};
pub use object_store::{ListPage, ObjectLister, StaticObjectLister};
