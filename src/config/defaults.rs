//! Default values for configuration

/// Default base URL for the upstream OpenAI API
pub fn default_base_url() -> String {
    std::env::var("REFDESK_OPENAI_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

/// Default environment variable name for the API key
pub fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default vector store the tools are bound to
pub fn default_vector_store_id() -> String {
    "vs_68ef41d52fe081919cbf5338c6cfa507".to_string()
}

/// Default model for answer generation
pub fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default output length bound for answer generation
pub fn default_max_output_tokens() -> u32 {
    2048
}

/// Default sampling temperature for answer generation
pub fn default_temperature() -> f32 {
    1.0
}

/// Default upstream request timeout in seconds
pub fn default_timeout_secs() -> u64 {
    60
}

/// Default bind host for the HTTP transport
pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Default bind port for the HTTP transport
pub fn default_port() -> u16 {
    8787
}
