pub mod endpoints {
    pub const USER_ANNOTATIONS_BASE: &str = "/api/analytics/v1/manage/annotation/user";
    pub const SYSTEM_ANNOTATIONS_BASE: &str = "/api/analytics/v1/manage/annotation/system";
    pub const AUTH_TOKEN: &str = "/auth/token";
}

pub mod annotations {
    pub const USER_TYPE: &str = "UserAnnotation";
    pub const SYSTEM_TYPE: &str = "SystemAnnotation";
    pub const DEFAULT_VISIBILITY: &str = "private";
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const DEFAULT_OFFSET: u64 = 0;
    pub const SOURCES: &[&str] = &["all", "user", "system"];
}

pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TOKEN_EXPIRY_BUFFER_MS: u64 = 30_000;
    pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";
    pub const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;
}

pub mod env {
    pub const HOST: &str = "PIWIK_PRO_HOST";
    pub const CLIENT_ID: &str = "PIWIK_PRO_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "PIWIK_PRO_CLIENT_SECRET";
    pub const TIMEOUT_MS: &str = "PIWIK_PRO_TIMEOUT_MS";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http:", "https:"];
}
