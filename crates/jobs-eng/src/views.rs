//! Server-rendered dashboard pages.

use std::{collections::BTreeMap, fmt::Write as _};

use axum::response::Html;

use crate::{deploy_status::ResourceStatus, usage::UsageDetail};

/// Path the deploy-status page opens its live-update socket on.
pub const DEPLOY_STATUS_SOCKET_PATH: &str = "/jobs/eng/giudico/deploy-status/socket";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
table{border-collapse:collapse}\
th,td{border:1px solid #ccc;padding:.3rem .8rem;text-align:left}\
tfoot td{font-weight:bold}";

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str, script: Option<&str>) -> Html<String> {
    let script = script
        .map(|s| format!("<script>{s}</script>"))
        .unwrap_or_default();
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n{script}\n</body>\n</html>\n",
        title = escape(title),
    ))
}

/// Per-author usage of the build tools with grand totals.
pub fn render_usage_detail(detail: &UsageDetail) -> Html<String> {
    let mut rows = String::new();
    for (author, counts) in &detail.total_usages {
        let author = escape(author);
        let _ = writeln!(
            rows,
            "<tr data-author=\"{author}\"><td>{author}</td><td>{}</td><td>{}</td></tr>",
            counts.count_build_sh, counts.count_swagger_py,
        );
    }

    let body = format!(
        "<table>\n<thead><tr><th>Author</th><th>build.sh</th><th>swagger.py</th></tr></thead>\n\
         <tbody>\n{rows}</tbody>\n\
         <tfoot><tr><td>Total</td>\
         <td id=\"total-build-sh\">{}</td>\
         <td id=\"total-swagger-py\">{}</td></tr></tfoot>\n</table>",
        detail.total_build_sh, detail.total_swagger_py,
    );
    page("Build tool usage", &body, None)
}

/// Latest deploy status of every resource; reloads when a new status is pushed.
pub fn render_deploy_status(statuses: &BTreeMap<String, ResourceStatus>) -> Html<String> {
    let mut rows = String::new();
    for (resource, status) in statuses {
        let _ = writeln!(
            rows,
            "<tr data-resource=\"{resource}\"><td>{resource}</td><td class=\"status\">{}</td>\
             <td>{}</td><td class=\"time\">{}</td></tr>",
            escape(&status.event.status),
            escape(&status.event.author),
            escape(&status.time),
            resource = escape(resource),
        );
    }

    let body = format!(
        "<table>\n<thead><tr><th>Resource</th><th>Status</th><th>Author</th><th>Time</th></tr></thead>\n\
         <tbody>\n{rows}</tbody>\n</table>"
    );
    let script = format!(
        "(function(){{var p=location.protocol==='https:'?'wss://':'ws://';\
         var ws=new WebSocket(p+location.host+'{DEPLOY_STATUS_SOCKET_PATH}');\
         ws.onmessage=function(){{location.reload();}};}})();"
    );
    page("Giudico deploy status", &body, Some(&script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deploy_status::latest_per_resource, models::AuthorCount, usage::merge_counts};
    use serde_json::json;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_usage_detail_lists_authors_and_totals() {
        let detail = merge_counts(
            &[AuthorCount::new("alice", 1)],
            &[AuthorCount::new("alice", 1), AuthorCount::new("bob", 1)],
        );
        let Html(html) = render_usage_detail(&detail);

        assert!(html.contains("<tr data-author=\"alice\"><td>alice</td><td>1</td><td>1</td></tr>"));
        assert!(html.contains("<tr data-author=\"bob\"><td>bob</td><td>0</td><td>1</td></tr>"));
        assert!(html.contains("<td id=\"total-build-sh\">1</td>"));
        assert!(html.contains("<td id=\"total-swagger-py\">2</td>"));
    }

    #[test]
    fn test_usage_detail_escapes_authors() {
        let detail = merge_counts(&[AuthorCount::new("<script>", 1)], &[]);
        let Html(html) = render_usage_detail(&detail);
        assert!(!html.contains("<td><script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_deploy_status_page() {
        let events = vec![
            serde_json::from_value(json!({
                "author": "ci", "status": "deployed", "resource": "api", "timestamp": 0
            }))
            .unwrap(),
        ];
        let Html(html) = render_deploy_status(&latest_per_resource(events));

        assert!(html.contains("data-resource=\"api\""));
        assert!(html.contains("<td class=\"status\">deployed</td>"));
        assert!(html.contains("<td class=\"time\">01/01/1970, 01:00:00</td>"));
        assert!(html.contains(DEPLOY_STATUS_SOCKET_PATH));
    }
}
