//! Core infrastructure
//!
//! Pure text and byte codecs shared by the stack glue and the applications.
//! Nothing here touches the SoftDevice, so it runs unchanged in the on-target
//! test binaries.

pub mod addr;
pub mod adv;
pub mod hex;
pub mod line;
pub mod protocol;
