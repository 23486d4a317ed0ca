pub mod error;
pub mod header;
pub mod frame_table;
pub mod codec;
pub mod queue;
pub mod event;
pub mod config;
pub mod engine;
pub mod manager;
pub mod verify;

pub use error::{CodecError, EngineError, FormatError, ManagerError, StateError};
pub use header::{CompressionType, Header};
pub use frame_table::FrameTable;
pub use codec::{FrameDecompressor, Lz4BlockDecompressor};
pub use event::{Event, EventKind, EventListener, EventSink, SlotId};
pub use config::EngineOptions;
pub use engine::{DecodeStats, Direction, FrameView, LoopMode, PlaybackEngine, PlaybackState};
pub use manager::{StreamManager, MAX_STREAMS};
pub use verify::{verify_file, VerifyReport};
