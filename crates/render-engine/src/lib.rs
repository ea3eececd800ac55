//! Slidecast Render Engine
//!
//! Turns a job into a video by staging its assets and handing them to an
//! external encoder.
//!
//! # Pipeline Architecture
//!
//! ```text
//! video_data.json
//!       │
//!       ├── audio (base64) ──────────► <work>/audio.mp3 ──────┐
//!       │                                                     │
//!       └── images (base64) ─► <work>/image_NNN.png           │
//!                                    │                        │
//!                                    ▼                        ▼
//!                           <work>/image_list.txt ──► ffmpeg (concat + audio)
//!                                                             │
//!                                                             ▼
//!                                              output/<name>.mp4 + metadata.json
//! ```
//!
//! `<work>` is a per-run temporary directory that is always removed.

pub mod encoder;
pub mod manifest;
pub mod pipeline;
pub mod staging;

pub use encoder::*;
pub use manifest::*;
pub use pipeline::*;
pub use staging::*;
