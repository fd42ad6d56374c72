//! Reserved names in the feature database.

/// Feature class holding map-project features.
pub const MAP_PROJECT_CLASS: &str = "MapProject";

/// Directory attribute on a map-project feature carrying the branch syscode.
pub const BRANCH_DIRECTORY_ATTR: &str = "Branch";
