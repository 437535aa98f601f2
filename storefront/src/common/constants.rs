// doc constants
pub const DOC_ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

// store constants
pub const RECORD_ID: &str = "_id";
pub const DELETED_MARKER: &str = "$$deleted";
pub const COLLECTION_FILE_EXTENSION: &str = "db";
pub const FIXTURE_FILE_EXTENSION: &str = "json";
pub const COMPACTION_SUFFIX: &str = "~";

// update operators
pub const SET_OPERATOR: &str = "$set";
pub const UNSET_OPERATOR: &str = "$unset";
pub const INC_OPERATOR: &str = "$inc";

// listing defaults
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const DEFAULT_SORT_FIELD: &str = CREATED_AT;

// config defaults
pub const DEFAULT_DB_PATH: &str = "./db";
pub const DEFAULT_FIXTURES_DIR: &str = "./mock-data";
pub const DEFAULT_CORRUPT_ALERT_THRESHOLD: f64 = 0.1;

pub const FIELD_SEPARATOR: char = '.';
