// Trade feed: where trades come from, how fast they appear, what is on screen.
pub mod pacing;    // burst/normal tick scheduling
pub mod rng;       // seeded LCG shared by pacing and synthetic generation
pub mod source;    // synthetic or live trade batches
pub mod synthetic; // reproducible synthetic batches
pub mod types;
pub mod window;    // bounded newest-first window
