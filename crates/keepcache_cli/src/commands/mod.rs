pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod query;
pub(crate) mod sync;
