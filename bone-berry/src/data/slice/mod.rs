//! CT scan/label 冠状切片对象的操作.

mod core;
mod iter;
mod save;

pub use core::{LabelSlice, LabelSliceMut, ScanSlice};

pub(crate) use iter::{PosIter, PosIter3d};

pub use save::save_overlay;
