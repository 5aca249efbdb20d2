//! Spatial layout engine for mindmap canvases.
//!
//! Blocks of text live at free positions on an unbounded world plane. The
//! engine sizes each block from its content, keeps blocks from overlapping,
//! fits the camera to the content, and persists everything through a
//! pluggable key-value [`storage::Storage`]. It has no renderer and no event
//! loop: a host (the `tenebris` CLI, a GUI shell) calls [`store::BlockStore`]
//! operations and drives deferred work with [`store::BlockStore::tick`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | `BlockStore`: block operations, undo, organize, pins, persistence |
//! | [`block`] | Block model and sparse updates |
//! | [`measure`] | `TextMeasurer`: line wrapping over a pluggable metrics backend |
//! | [`sizer`] | `BlockSizer`: content to block dimensions |
//! | [`overlap`] | `OverlapResolver`: iterative relaxation around a fixed subject |
//! | [`viewport`] | `ViewportFitter`: zoom-to-fit and gentle recentering |
//! | [`camera`] | Points, rectangles, viewport and the pan/zoom camera |
//! | [`organize`] | Grid layout and snapshot for organize mode |
//! | [`interaction`] | Idle / editing / dragging state |
//! | [`debounce`] | Generation-counted debounce timer |
//! | [`storage`] | Storage trait, memory and file backends, health checks |
//! | [`transfer`] | JSON import and export |
//! | [`stats`] | Aggregate figures over visible blocks |
//! | [`clock`] / [`notify`] | Time and user-notification seams |
//! | [`config`] | `LayoutConfig` and environment overrides |
//! | [`consts`] | Default tunables |

pub mod block;
pub mod camera;
pub mod clock;
pub mod config;
pub mod consts;
pub mod debounce;
pub mod interaction;
pub mod measure;
pub mod notify;
pub mod organize;
pub mod overlap;
pub mod sizer;
pub mod stats;
pub mod storage;
pub mod store;
pub mod transfer;
pub mod viewport;

pub use block::{Block, BlockId, FocusWeight, MoodTag, PartialBlock};
pub use camera::{Camera, Point, Rect, Viewport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LayoutConfig;
pub use notify::{NotificationKind, Notifier, RecordingNotifier, TracingNotifier};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{BlockStore, StoreError};
pub use transfer::{ExportDocument, ImportError, ImportMode, ImportPlan, parse_import};
