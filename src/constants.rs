pub mod functions {
    pub const FUNCTIONS_ENDPOINT: &str = "/api/v1/functions";
    pub const BY_PATH_SEGMENT: &str = "/by_path";
    pub const CHAT_ENDPOINT: &str = "/v1/chat";
    pub const STREAM_QUERY: &str = "?stream=True";
}

pub mod indexes {
    pub const INDEXES_ENDPOINT: &str = "/api/v1/indexes";
    pub const ADD_DOCUMENT_SEGMENT: &str = "/index";
    pub const QUERY_SEGMENT: &str = "/query";
    pub const DEFAULT_TOP_K: u32 = 3;
}

pub mod spans {
    pub const SPANS_ENDPOINT: &str = "/api/v1/spans";
    pub const FEEDBACK_SEGMENT: &str = "/feedback";
}
