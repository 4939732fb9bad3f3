//! PDF page viewing core.
//!
//! Loads a PDF through the MuPDF engine, computes fit-to-container and zoom
//! scaling, and renders pages into RGB pixel surfaces on a dedicated worker
//! thread so that renders for one surface never interleave.

pub mod notification;
pub mod settings;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod viewer;
