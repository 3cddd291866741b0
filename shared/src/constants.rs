//! Centralized constants for the TotalGB host bridge.
//!
//! The size limits here duplicate limits the native module enforces on its
//! own. They exist only so the host can reject bad selections before touching
//! foreign memory, and must be revisited whenever the native limits change.

/// Largest ROM the host will hand to the native module.
///
/// The largest official cartridge is 4 MiB. Zipped ROMs stored without
/// compression are slightly larger than the raw image because of the zip
/// headers, hence the extra 64 KiB.
pub const ROM_MAX_SIZE: u64 = 0x41_0000;

/// Largest single battery save accepted by the upload flow (64 KiB).
pub const SAVE_MAX_SIZE: u64 = 0x1_0000;

/// Name of the exported linear memory.
pub const EXPORT_MEMORY: &str = "memory";

/// Allocator export: `(len: i32) -> ptr: i32`.
pub const EXPORT_MALLOC: &str = "malloc";

/// Deallocator export: `(ptr: i32)`.
pub const EXPORT_FREE: &str = "free";

/// ROM loader export: `(name_ptr: i32, data_ptr: i32, len: i32)`.
pub const EXPORT_LOAD_ROM: &str = "em_load_rom_data";

/// Save uploader export: `(name_ptr: i32, data_ptr: i32, len: i32)`.
pub const EXPORT_UPLOAD_SAVE: &str = "em_upload_save";

/// Zips every save and returns the archive size: `() -> i32`.
pub const EXPORT_ARCHIVE_SIZE: &str = "em_zip_all_saves";

/// Returns a pointer to the archive built by [`EXPORT_ARCHIVE_SIZE`]: `() -> i32`.
pub const EXPORT_ARCHIVE_DATA: &str = "em_get_zip_saves_data";

/// Default file name offered for the save archive download.
pub const ARCHIVE_FILE_NAME: &str = "saves.zip";

/// MIME type of the save archive download.
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Maximum allowed WASM module size for reading into memory.
pub const MAX_WASM_BYTES: u64 = 128 * 1024 * 1024; // 128 MiB
