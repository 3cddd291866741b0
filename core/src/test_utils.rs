//! Shared test utilities for integration and unit tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use crate::error::{BridgeError, SyncError};
use crate::foreign::{EntryPoint, ForeignModule, ForeignPtr};
use crate::persist::PersistenceBarrier;

// ============================================================================
// Recording Module
// ============================================================================

/// What a [`RecordingModule`] observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Malloc { len: u32, ptr: ForeignPtr },
    Free(ForeignPtr),
    Invoke { entry: EntryPoint, args: Vec<u32> },
}

/// Name and data an entry point saw in foreign memory at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub entry: EntryPoint,
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

/// In-memory stand-in for the native module.
///
/// Bump-allocates out of a growable byte vector, tracks live allocations so
/// leaks and double frees are visible, and records every call.
pub struct RecordingModule {
    memory: Vec<u8>,
    next: u32,
    live: HashSet<ForeignPtr>,
    malloc_calls: usize,
    pub events: Vec<Event>,
    pub received: Vec<Received>,
    pub double_frees: usize,
    /// Zero-based index of the `malloc` call that returns null
    pub fail_malloc_at: Option<usize>,
    /// Entry point that traps instead of running
    pub fail_entry: Option<EntryPoint>,
    /// Make every `write_bytes` fail as out of bounds
    pub fail_writes: bool,
    /// Archive returned by the archive entry points (none means size 0)
    pub archive: Option<Vec<u8>>,
    /// Canned return values that replace an entry point's behavior
    pub replies: HashMap<EntryPoint, Option<u32>>,
    /// Shared ordering log (module uploads and barrier syncs)
    pub timeline: Rc<RefCell<Vec<String>>>,
}

impl Default for RecordingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingModule {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 64 * 1024],
            next: 16,
            live: HashSet::new(),
            malloc_calls: 0,
            events: Vec::new(),
            received: Vec::new(),
            double_frees: 0,
            fail_malloc_at: None,
            fail_entry: None,
            fail_writes: false,
            archive: None,
            replies: HashMap::new(),
            timeline: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_archive(archive: Vec<u8>) -> Self {
        Self {
            archive: Some(archive),
            ..Self::new()
        }
    }

    /// Successful (non-null) allocations made through `malloc`.
    pub fn mallocs(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Malloc { ptr, .. } if !ptr.is_null()))
            .count()
    }

    pub fn frees(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Free(_)))
            .count()
    }

    pub fn invocations(&self, entry: EntryPoint) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Invoke { entry: seen, .. } if *seen == entry))
            .count()
    }

    /// Allocations that have not been freed yet.
    pub fn live_buffers(&self) -> usize {
        self.live.len()
    }

    fn bump(&mut self, len: u32) -> ForeignPtr {
        let ptr = self.next;
        self.next = (self.next + len + 7) & !7;
        if self.memory.len() < self.next as usize {
            self.memory.resize(self.next as usize * 2, 0);
        }
        let ptr = ForeignPtr::new(ptr);
        self.live.insert(ptr);
        ptr
    }

    fn c_string_at(&self, ptr: ForeignPtr) -> Vec<u8> {
        let start = ptr.addr() as usize;
        self.memory[start..]
            .iter()
            .take_while(|&&b| b != 0)
            .copied()
            .collect()
    }

    fn range(&self, ptr: ForeignPtr, len: u32) -> Result<std::ops::Range<usize>, BridgeError> {
        let start = ptr.addr() as usize;
        let end = start + len as usize;
        if end > self.memory.len() {
            return Err(BridgeError::OutOfBounds { ptr, len });
        }
        Ok(start..end)
    }
}

impl ForeignModule for RecordingModule {
    fn malloc(&mut self, len: u32) -> Result<ForeignPtr, BridgeError> {
        let call = self.malloc_calls;
        self.malloc_calls += 1;

        let ptr = if self.fail_malloc_at == Some(call) {
            ForeignPtr::NULL
        } else {
            self.bump(len)
        };
        self.events.push(Event::Malloc { len, ptr });
        Ok(ptr)
    }

    fn free(&mut self, ptr: ForeignPtr) -> Result<(), BridgeError> {
        self.events.push(Event::Free(ptr));
        if ptr.is_null() || self.live.remove(&ptr) {
            return Ok(());
        }
        self.double_frees += 1;
        Err(BridgeError::ForeignCall {
            name: "free".to_string(),
            source: anyhow::anyhow!("free of unowned pointer {}", ptr),
        })
    }

    fn write_bytes(&mut self, ptr: ForeignPtr, bytes: &[u8]) -> Result<(), BridgeError> {
        if self.fail_writes {
            return Err(BridgeError::OutOfBounds {
                ptr,
                len: bytes.len() as u32,
            });
        }
        let range = self.range(ptr, bytes.len() as u32)?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    fn read_bytes(&self, ptr: ForeignPtr, len: u32) -> Result<Vec<u8>, BridgeError> {
        let range = self.range(ptr, len)?;
        Ok(self.memory[range].to_vec())
    }

    fn invoke(&mut self, entry: EntryPoint, args: &[u32]) -> Result<Option<u32>, BridgeError> {
        self.events.push(Event::Invoke {
            entry,
            args: args.to_vec(),
        });

        if self.fail_entry == Some(entry) {
            return Err(BridgeError::ForeignCall {
                name: entry.role().to_string(),
                source: anyhow::anyhow!("wasm trap: unreachable"),
            });
        }
        if let Some(reply) = self.replies.get(&entry) {
            return Ok(*reply);
        }

        match entry {
            EntryPoint::LoadRom | EntryPoint::UploadSave => {
                let name = self.c_string_at(ForeignPtr::new(args[0]));
                let data = self.read_bytes(ForeignPtr::new(args[1]), args[2])?;
                self.timeline
                    .borrow_mut()
                    .push(format!("{}:{}", entry.role(), String::from_utf8_lossy(&name)));
                self.received.push(Received { entry, name, data });
                Ok(None)
            }
            EntryPoint::ArchiveSize => {
                Ok(Some(self.archive.as_ref().map_or(0, |a| a.len() as u32)))
            }
            EntryPoint::ArchiveData => {
                let Some(archive) = self.archive.clone() else {
                    return Ok(Some(0));
                };
                let ptr = self.bump(archive.len() as u32);
                self.write_bytes(ptr, &archive)?;
                Ok(Some(ptr.addr()))
            }
        }
    }
}

// ============================================================================
// Recording Barrier
// ============================================================================

/// Persistence barrier that counts syncs and logs them to a shared timeline.
pub struct RecordingBarrier {
    pub syncs: Cell<usize>,
    pub fail: bool,
    pub timeline: Rc<RefCell<Vec<String>>>,
}

impl RecordingBarrier {
    pub fn new(timeline: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            syncs: Cell::new(0),
            fail: false,
            timeline,
        }
    }

    pub fn failing(timeline: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            fail: true,
            ..Self::new(timeline)
        }
    }
}

impl PersistenceBarrier for RecordingBarrier {
    async fn sync(&self) -> Result<(), SyncError> {
        self.syncs.set(self.syncs.get() + 1);
        self.timeline.borrow_mut().push("sync".to_string());
        if self.fail {
            return Err(SyncError::Io {
                path: "/saves".into(),
                source: std::io::Error::other("quota exceeded"),
            });
        }
        Ok(())
    }
}

// ============================================================================
// WAT fixture
// ============================================================================

/// A minimal native module speaking the bridge's ABI.
///
/// `malloc` bump-allocates and returns null for requests larger than the
/// limit set through `set_alloc_limit`. `em_load_rom_data` traps once
/// `set_rom_trap(1)` has been called. Counters are exported for assertions.
pub const BRIDGE_WAT: &str = r#"
(module
    (memory (export "memory") 2)

    (global $heap (mut i32) (i32.const 4096))
    (global $allocs (mut i32) (i32.const 0))
    (global $frees (mut i32) (i32.const 0))
    (global $alloc_limit (mut i32) (i32.const -1))
    (global $trap_rom (mut i32) (i32.const 0))
    (global $rom_name (mut i32) (i32.const 0))
    (global $rom_data (mut i32) (i32.const 0))
    (global $rom_len (mut i32) (i32.const -1))
    (global $uploads (mut i32) (i32.const 0))
    (global $upload_bytes (mut i32) (i32.const 0))

    ;; An empty zip: just the end-of-central-directory record
    (data (i32.const 64) "PK\05\06\00\00\00\00\00\00\00\00\00\00\00\00\00\00\00\00\00\00")

    (func (export "malloc") (param $len i32) (result i32)
        (local $ptr i32)
        (if (i32.gt_u (local.get $len) (global.get $alloc_limit))
            (then (return (i32.const 0))))
        (local.set $ptr (global.get $heap))
        (global.set $heap
            (i32.and
                (i32.add (i32.add (global.get $heap) (local.get $len)) (i32.const 7))
                (i32.const -8)))
        (global.set $allocs (i32.add (global.get $allocs) (i32.const 1)))
        (local.get $ptr))

    (func (export "free") (param $ptr i32)
        (global.set $frees (i32.add (global.get $frees) (i32.const 1))))

    (func (export "em_load_rom_data") (param $name i32) (param $data i32) (param $len i32)
        (if (global.get $trap_rom) (then unreachable))
        (global.set $rom_name (local.get $name))
        (global.set $rom_data (local.get $data))
        (global.set $rom_len (local.get $len)))

    (func (export "em_upload_save") (param $name i32) (param $data i32) (param $len i32)
        (global.set $uploads (i32.add (global.get $uploads) (i32.const 1)))
        (global.set $upload_bytes (i32.add (global.get $upload_bytes) (local.get $len))))

    (func (export "em_zip_all_saves") (result i32) (i32.const 22))
    (func (export "em_get_zip_saves_data") (result i32) (i32.const 64))

    (func (export "set_alloc_limit") (param i32) (global.set $alloc_limit (local.get 0)))
    (func (export "set_rom_trap") (param i32) (global.set $trap_rom (local.get 0)))

    (func (export "alloc_count") (result i32) (global.get $allocs))
    (func (export "free_count") (result i32) (global.get $frees))
    (func (export "rom_name") (result i32) (global.get $rom_name))
    (func (export "rom_data") (result i32) (global.get $rom_data))
    (func (export "rom_len") (result i32) (global.get $rom_len))
    (func (export "upload_count") (result i32) (global.get $uploads))
    (func (export "upload_bytes") (result i32) (global.get $upload_bytes))
)
"#;

/// The same ABI, but with no saves to archive.
pub const EMPTY_ARCHIVE_WAT: &str = r#"
(module
    (memory (export "memory") 1)
    (global $frees (mut i32) (i32.const 0))
    (global $fetches (mut i32) (i32.const 0))
    (func (export "malloc") (param i32) (result i32) (i32.const 1024))
    (func (export "free") (param i32)
        (global.set $frees (i32.add (global.get $frees) (i32.const 1))))
    (func (export "em_zip_all_saves") (result i32) (i32.const 0))
    (func (export "em_get_zip_saves_data") (result i32)
        (global.set $fetches (i32.add (global.get $fetches) (i32.const 1)))
        (i32.const 0))
    (func (export "free_count") (result i32) (global.get $frees))
    (func (export "fetch_count") (result i32) (global.get $fetches))
)
"#;
