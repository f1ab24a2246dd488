//! Output formatting for resolutions and errors.

use std::fmt::Write as _;
use std::sync::LazyLock;

use anyhow::Result;
use installer_schema::Resolution;
use regex::Regex;

use crate::Format;

static UNSAFE_ERROR_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9 :/.]").unwrap_or_else(|e| panic!("invalid pattern: {e}"))
});

/// Strip anything that could break out of a quoted shell or Ruby string.
pub fn sanitize_error(msg: &str) -> String {
    UNSAFE_ERROR_CHARS.replace_all(msg, "").into_owned()
}

pub fn render(resolution: &Resolution, format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(resolution)?),
        Format::Text => Ok(text(resolution)),
    }
}

fn text(r: &Resolution) -> String {
    let q = &r.query;
    let mut out = String::new();
    let _ = writeln!(out, "repository: https://github.com/{}/{}", q.owner, q.program);
    let _ = writeln!(out, "user: {}", q.owner);
    let _ = writeln!(out, "program: {}", q.as_program.as_deref().unwrap_or(&q.program));
    if q.wants_latest() {
        let _ = writeln!(out, "release: {} (latest)", r.resolved_release);
    } else {
        let _ = writeln!(out, "release: {}", r.resolved_release);
    }
    if let Some(select) = &q.select {
        let _ = writeln!(out, "select: {select}");
    }
    if q.move_to_path {
        let _ = writeln!(out, "move to path: yes");
    }
    if q.insecure {
        let _ = writeln!(out, "insecure: yes");
    }
    let _ = writeln!(out, "release assets:");

    let width = r.assets.iter().map(|a| a.key().len()).max().unwrap_or(0);
    for asset in &r.assets {
        let _ = writeln!(out, "  {:<width$}  {}", asset.key(), asset.name);
        let _ = writeln!(out, "  {:<width$}  {}", "", asset.url);
        if let Some(sha) = &asset.sha256 {
            let _ = writeln!(out, "  {:<width$}  sha256:{sha}", "");
        }
    }
    if r.apple_silicon {
        let _ = writeln!(out, "has native apple silicon build");
    }
    out
}
