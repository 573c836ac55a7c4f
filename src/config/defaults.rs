//! Built-in defaults. They form the lowest configuration layer; the option bag and the
//! locator's query parameters are layered on top.

use crate::options::OptionBag;

pub const DEFAULT_SCHEMA: &str = "files";
pub const DEFAULT_MEMORY_THRESHOLD: u64 = 64 * 1024 * 1024;
pub const DEFAULT_BATCH_SIZE: u32 = 8192;
pub const REMOTE_REFRESH_INTERVAL: &str = "5 minutes";
pub const SPILL_DIR_NAME: &str = "filedriver_spill";
pub const DEFAULT_TABLE_CASING: &str = "UPPER";
pub const DEFAULT_COLUMN_CASING: &str = "UNCHANGED";

/// `<tmp>/filedriver_spill` for the current platform.
pub fn default_spill_directory() -> String {
    std::env::temp_dir().join(SPILL_DIR_NAME).to_string_lossy().to_string()
}

/// Spill-over defaults for local and multi-location connections. `executionEngine` is left
/// alone: the operand builder picks it per format.
pub fn apply_spill_defaults(bag: &mut OptionBag) {
    bag.set_if_absent("memoryThreshold", DEFAULT_MEMORY_THRESHOLD.to_string());
    bag.set_if_absent("spillDirectory", default_spill_directory());
    bag.set_if_absent("batchSize", DEFAULT_BATCH_SIZE.to_string());
    bag.set_if_absent("tableNameCasing", DEFAULT_TABLE_CASING);
    bag.set_if_absent("columnNameCasing", DEFAULT_COLUMN_CASING);
    bag.set_if_absent("recursive", "true");
}

/// Remote single sources refresh periodically unless told otherwise.
pub fn apply_remote_defaults(bag: &mut OptionBag) {
    apply_spill_defaults(bag);
    bag.set_if_absent("refreshInterval", REMOTE_REFRESH_INTERVAL);
}
