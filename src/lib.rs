pub mod error;
mod io;
pub mod package;
pub mod qfs;

pub use error::{Error, Result};
pub use package::Package;
pub use package::directory::DirectoryEntry;
pub use package::entry::Entry;
pub use package::header::PackageHeader;
pub use package::index::{EntryState, IndexEntry, RawIndexEntry, TGI};
pub use package::resource::{Resource, TypedResource, GenericResource, ExemplarResource, ExemplarProperty, ExemplarPropertyDataType, ExemplarPropertyValue, LtextResource, COHORT_TYPE_ID, EXEMPLAR_TYPE_ID, LTEXT_TYPE_ID};
