//! Pipeline stages for study-guide generation and conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different encoder or renderer) without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ classify ──▶ theme ──▶ assemble ──▶ encode ──▶ render
//! (request)  (blocks)    (styles)  (document)   (.docx)    (PDF)
//! ```
//!
//! 1. [`input`]    — validate request payloads and apply defaults
//! 2. [`classify`] — split raw text into header and body blocks
//! 3. [`theme`]    — turn each block into a styled paragraph
//! 4. [`assemble`] — lay paragraphs out in one two-column section
//! 5. [`encode`]   — serialise the document into a `.docx` package
//! 6. [`render`]   — drive external renderers with fallback and cleanup;
//!    the only stage that spawns processes
//!
//! [`decode`] reads an encoded package back into paragraphs.

pub mod assemble;
pub mod classify;
pub mod decode;
pub mod encode;
pub mod input;
pub mod render;
pub mod theme;
