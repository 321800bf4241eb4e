use super::*;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__TEST_SB_NONEXISTENT_KEY__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__TEST_SB_EP_VALID__", " 99 ") };
    let val: u64 = env_parse("__TEST_SB_EP_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__TEST_SB_EP_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__TEST_SB_EP_INVALID__", "soon") };
    let val: u64 = env_parse("__TEST_SB_EP_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__TEST_SB_EP_INVALID__") };
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn autosave_defaults_match_constants() {
    let config = AutosaveConfig::default();
    assert_eq!(config.save_delay(), Duration::from_secs(100));
    assert_eq!(config.frame_render_delay(), Duration::from_millis(DEFAULT_FRAME_RENDER_MS));
    assert_eq!(config.shot_render_delay(), Duration::from_millis(DEFAULT_SHOT_RENDER_MS));
}

#[test]
fn config_default_is_complete() {
    let config = Config::default();
    assert_eq!(config.api.base_url, DEFAULT_API_URL);
    assert_eq!(config.api.request_timeout_secs, DEFAULT_API_REQUEST_TIMEOUT_SECS);
    assert_eq!(config.upload.max_bytes, DEFAULT_UPLOAD_MAX_BYTES);
}

#[test]
fn api_config_trims_trailing_slash() {
    unsafe { std::env::set_var("STORYBOARD_API_URL", "https://boards.example.com/api/") };
    let config = ApiConfig::from_env();
    unsafe { std::env::remove_var("STORYBOARD_API_URL") };
    assert_eq!(config.base_url, "https://boards.example.com/api");
}
