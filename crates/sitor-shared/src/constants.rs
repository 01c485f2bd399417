/// Application name
pub const APP_NAME: &str = "Sitor";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Upper bound for a single store operation, in seconds
pub const STORE_TIMEOUT_SECS: u64 = 5;

/// Default lifetime of an issued bearer token, in hours
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Role carried in every issued token. Roles are not used for authorization.
pub const DEFAULT_ROLE: &str = "neutral";

/// Number of readings returned in the `recent` part of a summary
pub const RECENT_READINGS_LIMIT: usize = 5;

/// Calendar-day format stored alongside each detection
pub const DETECTION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of an ObjectId in bytes
pub const OBJECT_ID_SIZE: usize = 12;
