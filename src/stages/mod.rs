//! Stage modules
//!
//! Each stage is a pure orchestration function: it computes deterministic
//! output paths under Basedir, invokes the step runner once per sub-step in
//! a fixed order, and returns a [`crate::engine::StageReport`] with any
//! failure embedded. Stages never raise on a failed sub-step; the controller
//! decides what is fatal.

pub mod agat;
pub mod busco;
pub mod detenga;
pub mod gffread;
pub mod lai;
pub mod omark;
pub mod prepare;
pub mod prothomology;
pub mod psauron;
pub mod rnaseq;
