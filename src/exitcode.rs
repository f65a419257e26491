//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error (bad node path, missing argument)
pub const USAGE: i32 = 64;

/// Addressed node does not exist
pub const NOINPUT: i32 = 66;

/// Remote service or URL handler unavailable
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// No API token available
pub const NOPERM: i32 = 77;

/// Configuration error
pub const CONFIG: i32 = 78;
