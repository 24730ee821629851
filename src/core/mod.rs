pub mod batch;
pub mod data;
pub mod error;
pub mod interrupt;
pub mod language;
pub mod lifecycle;
pub mod locate;
pub mod log;
pub mod mp4box;
