//! CLI Exit Code Registry
//!
//! Single source of truth for `cotrend` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (e.g. no usable input, failed check) |
//! | 2    | Usage error (bad arguments)                        |
//! | 3    | I/O error reading inputs or writing outputs/state  |
//! | 4    | Config file unreadable or invalid                  |
//! | 5    | No overlapping years for the requested country     |
//! | 6    | No saved state to show or export                   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Matches clap's own exit code for argument errors.
pub const EXIT_USAGE: u8 = 2;

/// Input file, output file or state directory could not be read or written.
pub const EXIT_IO: u8 = 3;

/// `--config` (or the default config file) failed to load or validate.
pub const EXIT_CONFIG: u8 = 4;

/// The primary and secondary series share no year for the country.
pub const EXIT_NO_OVERLAP: u8 = 5;

/// `show` / `export` found no persisted result.
pub const EXIT_NO_STATE: u8 = 6;
