pub const AUTH_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const ACCEPT_HEADER: &str = "Accept";
pub const SNOWFLAKE_AUTH_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
pub const USER_AGENT_HEADER: &str = "User-Agent";
pub const USER_AGENT: &str = "icefield";

/// Statement timeout sent with every request, in seconds.
pub const STATEMENT_TIMEOUT_SECS: u64 = 600;

/// The database Snowflake ships its own application from. Grants on it carry
/// no grantor.
pub const SNOWFLAKE_DATABASE: &str = "SNOWFLAKE";
