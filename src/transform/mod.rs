//! Rigid-body transforms built from TOPUP motion parameters.
//!
//! - `rigid` - Motion parameters and the 4x4 rigid transform builder
//! - `motion` - Parsing of the `_movpar.txt` side output
//! - `premat` - Writing matrices as premat text files

pub mod motion;
pub mod premat;
pub mod rigid;

pub use motion::{parse_movpar, read_movpar, select_row};
pub use premat::{format_premat, write_premat};
pub use rigid::{rigid_transform, MotionParameters};
