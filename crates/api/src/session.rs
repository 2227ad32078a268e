use axum::http::{header, HeaderMap};

pub fn read_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw_cookie| raw_cookie.split(';'))
        .find_map(|part| {
            let mut split = part.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == cookie_name && !value.is_empty() {
                Some(value.to_string())
            } else {
                None
            }
        })
}

pub fn build_session_cookie(
    cookie_name: &str,
    session_id: &str,
    max_age_seconds: u64,
    secure: bool,
) -> String {
    let mut segments = vec![
        format!("{cookie_name}={session_id}"),
        "Path=/".to_string(),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
        format!("Max-Age={max_age_seconds}"),
    ];
    if secure {
        segments.push("Secure".to_string());
    }
    segments.join("; ")
}
