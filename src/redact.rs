//! Credential redaction for log lines and error messages.
//!
//! Connection URLs carry the database password. They are handed to the
//! schema tool verbatim but must never reach stdout, stderr or a log
//! subscriber in that form.

use url::Url;

/// Redact a database URL (connection string).
///
/// Keeps: scheme, host, port, database name, user
/// Removes: password, query parameters that may contain secrets
pub fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            // sslpassword and friends live in the query string
            url.set_query(None);
            url.to_string()
        }
        Err(_) => {
            // Unparseable: strip everything before the last '@'.
            if let Some(at_pos) = dsn.rfind('@') {
                if let Some(scheme_end) = dsn.find("://") {
                    let scheme = &dsn[..scheme_end + 3];
                    let after_at = &dsn[at_pos + 1..];
                    let host_part = after_at.split('?').next().unwrap_or(after_at);
                    format!("{}***@{}", scheme, host_part)
                } else {
                    "***REDACTED***".to_string()
                }
            } else if let Some(q_pos) = dsn.find('?') {
                dsn[..q_pos].to_string()
            } else {
                dsn.to_string()
            }
        }
    }
}

/// Redact every argument that looks like a database URL.
///
/// `file://` arguments are paths, not credentials, and pass through.
pub fn redact_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if arg.contains("://") && !arg.starts_with("file://") {
                redact_dsn(arg)
            } else {
                arg.clone()
            }
        })
        .collect()
}
