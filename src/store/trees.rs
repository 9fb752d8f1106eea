pub const SESSION_RECORDS: &str = "session_records";
pub const CONFIG_VERSIONS: &str = "config_versions";

// Secondary index trees
pub const SESSION_RECORDS_BY_USER: &str = "session_records_by_user";
pub const SESSION_RECORDS_BY_TIME: &str = "session_records_by_time";
