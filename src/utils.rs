use once_cell::sync::Lazy;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("roomchat-io")
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// Splits user input like `https://chat.example.com/` into a bare host and
/// whether the endpoint is encrypted. Bare hosts default to plain.
pub fn normalize_server(input: &str) -> (String, bool) {
    let trimmed = input.trim();
    let (rest, secure) = ["https://", "wss://"]
        .iter()
        .find_map(|p| trimmed.strip_prefix(p).map(|r| (r, true)))
        .or_else(|| {
            ["http://", "ws://"]
                .iter()
                .find_map(|p| trimmed.strip_prefix(p).map(|r| (r, false)))
        })
        .unwrap_or((trimmed, false));
    (rest.trim_end_matches('/').to_string(), secure)
}
