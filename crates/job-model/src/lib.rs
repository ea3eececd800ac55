//! Slidecast Job Model
//!
//! Defines the data contracts around a single render job:
//! - **Job:** The descriptor read from `video_data.json` (title, target
//!   duration, embedded audio and ordered images)
//! - **Naming:** How the output video file name is derived from the job
//! - **Metadata:** The sidecar record written next to a finished video

pub mod job;
pub mod metadata;
pub mod naming;

pub use job::*;
pub use metadata::*;
pub use naming::*;
