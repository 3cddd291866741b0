//! The three host-initiated flows
//!
//! - [`load_rom`] - one ROM file into the "load ROM" entry point
//! - [`upload_saves`] - a batch of saves, then one persistence barrier
//! - [`download_archive`] - the module's save archive out to a download target

mod archive;
mod batch;
mod rom;
mod saves;

pub use archive::{ArchiveResult, download_archive, fetch_archive};
pub use batch::{BatchJob, BatchProgress, MemberState};
pub use rom::{load_rom, validate_rom_selection};
pub use saves::{BatchReport, upload_saves, validate_save_selection};
