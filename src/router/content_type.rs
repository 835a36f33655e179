// Content type resolution shared by the asset and proxy paths.
//
// Both paths end in `resolve`: an explicit type wins unless it is the known
// `text/plain` misreport for script files, otherwise the path extension is
// sniffed, otherwise the fallback applies. The fallback is a script type
// because extensionless module URLs served as text/plain break module loading.

pub const FALLBACK_CONTENT_TYPE: &str = "application/javascript";
pub const DEFAULT_CHARSET: &str = "utf-8";

const SCRIPT_EXTENSIONS: [&str; 2] = [".js", ".mjs"];

/// Extension-based guess, `None` when the path gives no hint.
pub fn sniff(path: &str) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

pub fn resolve(path: &str, reported: Option<&str>) -> String {
    match reported.map(essence).filter(|ct| !ct.is_empty()) {
        Some(ct) if ct.eq_ignore_ascii_case("text/plain") && is_script_path(path) => {
            FALLBACK_CONTENT_TYPE.to_string()
        }
        Some(ct) => ct.to_string(),
        None => sniff(path).unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
    }
}

fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

fn is_script_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    SCRIPT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
