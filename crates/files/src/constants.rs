/// Name of the hidden directory, inside a store root, where writes are staged before being
/// renamed into place.
pub const STAGING_DIR_NAME: &str = ".partial";
