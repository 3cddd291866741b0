//! ROM loading against a real module

use super::test_utils::*;
use crate::config::LimitsConfig;
use crate::error::BridgeError;
use crate::flows::load_rom;
use crate::foreign::{ForeignModule, ForeignPtr};
use crate::selection::{FileSelection, SelectedFile};
use crate::test_utils::BRIDGE_WAT;

fn rom(name: &str, len: usize) -> FileSelection {
    let bytes: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
    FileSelection::new(vec![SelectedFile::from_bytes(name, bytes)])
}

#[tokio::test]
async fn test_rom_reaches_module_with_name_and_length() {
    let mut module = native(BRIDGE_WAT);
    let selection = rom("zelda.gb", 32 * 1024);

    load_rom(&mut module, &selection, &LimitsConfig::default())
        .await
        .unwrap();

    assert_eq!(probe(&mut module, "rom_len"), 32 * 1024);
    assert_eq!(probe(&mut module, "alloc_count"), 2);
    assert_eq!(probe(&mut module, "free_count"), 2);

    // The fixture's free is a no-op, so the bytes are still in memory.
    let name_ptr = ForeignPtr::new(probe(&mut module, "rom_name") as u32);
    assert_eq!(module.read_bytes(name_ptr, 9).unwrap(), b"zelda.gb\0");

    let data_ptr = ForeignPtr::new(probe(&mut module, "rom_data") as u32);
    let expected = selection.get(0).unwrap().read().await.unwrap();
    assert_eq!(module.read_bytes(data_ptr, 32 * 1024).unwrap(), expected);
}

#[tokio::test]
async fn test_trapping_loader_frees_both_buffers() {
    let mut module = native(BRIDGE_WAT);
    set(&mut module, "set_rom_trap", 1);

    let err = load_rom(&mut module, &rom("cursed.gb", 256), &LimitsConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ForeignCall { ref name, .. } if name == "em_load_rom_data"));
    assert_eq!(probe(&mut module, "alloc_count"), 2);
    assert_eq!(probe(&mut module, "free_count"), 2);
}

#[tokio::test]
async fn test_failed_data_allocation_skips_call() {
    let mut module = native(BRIDGE_WAT);
    set(&mut module, "set_alloc_limit", 16);

    let err = load_rom(&mut module, &rom("tiny.gb", 64), &LimitsConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::AllocationFailed { len: 64 }));
    assert_eq!(probe(&mut module, "rom_len"), -1);
    assert_eq!(probe(&mut module, "alloc_count"), 1);
    assert_eq!(probe(&mut module, "free_count"), 1);
}

#[tokio::test]
async fn test_rom_larger_than_memory_is_out_of_bounds() {
    let mut module = native(BRIDGE_WAT);

    // Fits the ROM cap but not the fixture's two pages.
    let err = load_rom(&mut module, &rom("big.gbc", 256 * 1024), &LimitsConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::OutOfBounds { len: 262144, .. }));
    assert_eq!(probe(&mut module, "rom_len"), -1);
    assert_eq!(probe(&mut module, "free_count"), 2);
}

#[tokio::test]
async fn test_oversized_rom_never_touches_module() {
    let mut module = native(BRIDGE_WAT);

    let err = load_rom(
        &mut module,
        &rom("huge.gb", 5 * 1024 * 1024),
        &LimitsConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(probe(&mut module, "alloc_count"), 0);
    assert_eq!(probe(&mut module, "free_count"), 0);
}
