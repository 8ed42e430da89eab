// Lightweight verbosity-gated logging helper used throughout the crate.
macro_rules! vprintln {
	($verbose:expr, $level:expr, $($arg:tt)*) => {
		if $verbose >= $level {
			eprintln!($($arg)*);
		}
	};
}

// Public library re-exports for integration tests and external use.
pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
pub mod export;
pub mod identity;
pub mod placements;
pub mod progress;
pub mod prompt;
pub mod resolve;
pub mod rows;
pub mod sink;
pub mod types;
