pub const APP_NAME: &str = "hostmap";
pub const CLI_HEADER_MSG: &str = "HostMap - bulk hostname to IP resolution";
pub const CONFIG_FILE: &str = "hostmap.toml";
pub const CURRENT_DIR: &str = ".";
pub const LOGFILE_NAME: &str = "hostmap.log";
pub const LOGGING_JSON: bool = false;
pub const LOGGING_QUIET: bool = false;

/// Number of concurrent resolution workers.
pub const POOL_SIZE: u16 = 16;

/// Per-lookup timeout (in milliseconds). A lookup that exceeds this bound
/// is treated as failed.
pub const LOOKUP_TIMEOUT: u16 = 5000;

pub const REGISTRY_URL: &str = "https://registry.example.net/api/";

/// Registry request timeout (in milliseconds).
pub const REGISTRY_TIMEOUT: u16 = 30000;

// Output record layout: `<hostname> <ip1>[ <ip2>...]\n`
pub const COLUMN_SEP: &str = " ";
pub const RECORD_END: &str = "\n";
