use super::{AnalysisResult, ExtensionGroup, ExtensionUsage, UserView, popularity, summarize, user_views};
use crate::Result;
use chrono::{DateTime, Local};
use core::fmt::Write;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const MARKETPLACE_ITEM_URL: &str = "https://marketplace.visualstudio.com/items?itemName=";

/// Everything except the URL unreserved characters.
const ITEM_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_').remove(b'~');

pub fn generate<W: Write>(result: &AnalysisResult, timestamp: DateTime<Local>, writer: &mut W) -> Result<()> {
    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "  <meta charset=\"UTF-8\">")?;
    writeln!(writer, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(writer, "  <title>Extension Usage Report</title>")?;
    write_styles(writer)?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;

    write_header(writer, timestamp)?;
    write_summary(writer, result)?;

    let ranking = popularity(result);
    write_usage_stats(writer, &ranking)?;

    writeln!(writer, "  <h2>User Extension Lists</h2>")?;
    for view in user_views(result) {
        write_user_section(writer, &view)?;
    }

    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;

    Ok(())
}

fn write_styles<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "  <style>")?;
    writeln!(writer, "    :root {{")?;
    writeln!(writer, "      --bg-color: #f0f2f5;")?;
    writeln!(writer, "      --card-bg: #ffffff;")?;
    writeln!(writer, "      --text-color: #1a202c;")?;
    writeln!(writer, "      --text-secondary: #64748b;")?;
    writeln!(writer, "      --border-color: #e2e8f0;")?;
    writeln!(writer, "      --accent-color: #0366d6;")?;
    writeln!(writer, "      --tag-bg: #f1f8ff;")?;
    writeln!(writer, "      --shadow: 0 1px 3px rgba(0,0,0,0.08), 0 4px 16px rgba(0,0,0,0.04);")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    @media (prefers-color-scheme: dark) {{")?;
    writeln!(writer, "      :root {{")?;
    writeln!(writer, "        --bg-color: #0f172a;")?;
    writeln!(writer, "        --card-bg: #1e293b;")?;
    writeln!(writer, "        --text-color: #e2e8f0;")?;
    writeln!(writer, "        --text-secondary: #94a3b8;")?;
    writeln!(writer, "        --border-color: #334155;")?;
    writeln!(writer, "        --accent-color: #60a5fa;")?;
    writeln!(writer, "        --tag-bg: #1e3a5f;")?;
    writeln!(writer, "        --shadow: 0 1px 3px rgba(0,0,0,0.3), 0 4px 16px rgba(0,0,0,0.2);")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "    }}")?;

    writeln!(writer, "    * {{ box-sizing: border-box; }}")?;
    writeln!(writer, "    body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 0; padding: 32px; background: var(--bg-color); color: var(--text-color); line-height: 1.5; }}")?;
    writeln!(writer, "    h1 {{ margin: 0 0 2px 0; font-size: 26px; font-weight: 700; letter-spacing: -0.5px; }}")?;
    writeln!(writer, "    h2 {{ font-size: 20px; margin: 28px 0 12px 0; }}")?;
    writeln!(writer, "    a.extension-link {{ color: var(--accent-color); text-decoration: none; font-weight: 600; }}")?;
    writeln!(writer, "    a.extension-link:hover {{ text-decoration: underline; }}")?;
    writeln!(writer, "    .header {{ margin-bottom: 28px; }}")?;
    writeln!(writer, "    .subtitle {{ margin: 0; font-size: 13px; color: var(--text-secondary); }}")?;

    // Summary cards
    writeln!(writer, "    .summary {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(140px, 1fr)); gap: 12px; margin-bottom: 20px; }}")?;
    writeln!(writer, "    .summary-card {{ background: var(--card-bg); border-radius: 10px; padding: 16px 20px; box-shadow: var(--shadow); border: 1px solid var(--border-color); text-align: center; }}")?;
    writeln!(writer, "    .summary-card .label {{ font-size: 11px; text-transform: uppercase; letter-spacing: 0.8px; color: var(--text-secondary); font-weight: 600; margin-bottom: 4px; }}")?;
    writeln!(writer, "    .summary-card .value {{ font-size: 28px; font-weight: 700; color: var(--accent-color); }}")?;
    writeln!(writer, "    .summary-card.failed .value {{ color: #dc2626; }}")?;

    // Usage statistics
    writeln!(writer, "    .extension-stats {{ background: var(--card-bg); border-radius: 12px; box-shadow: var(--shadow); border: 1px solid var(--border-color); }}")?;
    writeln!(writer, "    .extension-stat-item {{ display: flex; align-items: center; justify-content: space-between; gap: 16px; padding: 12px 20px; border-bottom: 1px solid var(--border-color); }}")?;
    writeln!(writer, "    .extension-stat-item:last-child {{ border-bottom: none; }}")?;
    writeln!(writer, "    .description {{ font-size: 13px; color: var(--text-secondary); }}")?;
    writeln!(writer, "    .publisher {{ font-size: 12px; color: var(--accent-color); margin-top: 2px; }}")?;
    writeln!(writer, "    .extension-stat-count {{ text-align: center; min-width: 64px; }}")?;
    writeln!(writer, "    .count-number {{ display: block; font-size: 22px; font-weight: 700; }}")?;
    writeln!(writer, "    .count-label {{ font-size: 11px; color: var(--text-secondary); }}")?;

    // Per-user sections
    writeln!(writer, "    .user-section {{ background: var(--card-bg); border-radius: 12px; box-shadow: var(--shadow); border: 1px solid var(--border-color); margin-bottom: 20px; overflow: hidden; }}")?;
    writeln!(writer, "    .user-header {{ display: flex; justify-content: space-between; padding: 12px 20px; font-weight: 700; border-bottom: 1px solid var(--border-color); }}")?;
    writeln!(writer, "    .extension-count {{ font-weight: 400; font-size: 13px; color: var(--text-secondary); }}")?;
    writeln!(writer, "    .user-extensions {{ list-style: none; margin: 0; padding: 0; }}")?;
    writeln!(writer, "    .extension-item {{ display: flex; justify-content: space-between; gap: 16px; padding: 10px 20px; border-bottom: 1px solid var(--border-color); }}")?;
    writeln!(writer, "    .extension-item:last-child {{ border-bottom: none; }}")?;
    writeln!(writer, "    .extension-versions {{ display: flex; flex-wrap: wrap; gap: 4px; align-items: flex-start; }}")?;
    writeln!(writer, "    .extension-version {{ background: var(--tag-bg); color: var(--accent-color); border-radius: 10px; padding: 2px 8px; font-size: 12px; font-family: monospace; }}")?;
    writeln!(writer, "  </style>")?;
    Ok(())
}

fn write_header<W: Write>(writer: &mut W, timestamp: DateTime<Local>) -> Result<()> {
    let date = timestamp.format("%Y-%m-%d").to_string();
    writeln!(writer, "  <div class=\"header\">")?;
    writeln!(writer, "    <h1>Extension Usage Report</h1>")?;
    writeln!(
        writer,
        "    <p class=\"subtitle\">Produced by extaudit {} on {}</p>",
        env!("CARGO_PKG_VERSION"),
        date
    )?;
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_summary<W: Write>(writer: &mut W, result: &AnalysisResult) -> Result<()> {
    let summary = summarize(result);

    writeln!(writer, "  <div class=\"summary\">")?;
    write_summary_card(writer, "", "Users", summary.total_users)?;
    write_summary_card(writer, "", "Total Extensions", summary.total_entries)?;
    write_summary_card(writer, "", "Unique Extensions", summary.unique_extensions)?;
    if summary.failed_lookups > 0 {
        write_summary_card(writer, " failed", "Failed Lookups", summary.failed_lookups)?;
    }
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_summary_card<W: Write>(writer: &mut W, class: &str, label: &str, value: usize) -> Result<()> {
    writeln!(writer, "    <div class=\"summary-card{class}\">")?;
    writeln!(writer, "      <div class=\"label\">{label}</div>")?;
    writeln!(writer, "      <div class=\"value\">{value}</div>")?;
    writeln!(writer, "    </div>")?;
    Ok(())
}

fn write_usage_stats<W: Write>(writer: &mut W, ranking: &[ExtensionUsage<'_>]) -> Result<()> {
    writeln!(writer, "  <h2>Extension Usage Statistics</h2>")?;
    writeln!(writer, "  <div class=\"extension-stats\">")?;
    for usage in ranking {
        let plural = if usage.users == 1 { "" } else { "s" };
        writeln!(writer, "    <div class=\"extension-stat-item\">")?;
        writeln!(writer, "      <div class=\"extension-stat-info\">")?;
        writeln!(writer, "        <div>{}</div>", extension_link(usage.identifier, &usage.metadata.display_name))?;
        writeln!(writer, "        <div class=\"description\">{}</div>", html_escape(&usage.metadata.description))?;
        writeln!(writer, "        <div class=\"publisher\">by {}</div>", html_escape(&usage.metadata.publisher))?;
        writeln!(writer, "      </div>")?;
        writeln!(writer, "      <div class=\"extension-stat-count\">")?;
        writeln!(writer, "        <span class=\"count-number\">{}</span>", usage.users)?;
        writeln!(writer, "        <span class=\"count-label\">user{plural}</span>")?;
        writeln!(writer, "      </div>")?;
        writeln!(writer, "    </div>")?;
    }
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_user_section<W: Write>(writer: &mut W, view: &UserView<'_>) -> Result<()> {
    writeln!(writer, "  <div class=\"user-section\">")?;
    writeln!(writer, "    <div class=\"user-header\">")?;
    writeln!(writer, "      <span>{}</span>", html_escape(view.name))?;
    writeln!(writer, "      <span class=\"extension-count\">{} unique extensions</span>", view.unique_extensions())?;
    writeln!(writer, "    </div>")?;
    writeln!(writer, "    <ul class=\"user-extensions\">")?;
    for group in &view.groups {
        write_extension_item(writer, group)?;
    }
    writeln!(writer, "    </ul>")?;
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_extension_item<W: Write>(writer: &mut W, group: &ExtensionGroup<'_>) -> Result<()> {
    writeln!(writer, "      <li class=\"extension-item\">")?;
    writeln!(writer, "        <div class=\"extension-info\">")?;
    writeln!(writer, "          <div>{}</div>", extension_link(group.identifier, &group.metadata.display_name))?;
    writeln!(writer, "          <div class=\"description\">{}</div>", html_escape(&group.metadata.description))?;
    writeln!(writer, "          <div class=\"publisher\">by {}</div>", html_escape(&group.metadata.publisher))?;
    writeln!(writer, "        </div>")?;
    write!(writer, "        <div class=\"extension-versions\">")?;
    for version in &group.versions {
        write!(
            writer,
            "<span class=\"extension-version\">v{}</span>",
            html_escape(version.unwrap_or("unknown"))
        )?;
    }
    writeln!(writer, "</div>")?;
    writeln!(writer, "      </li>")?;
    Ok(())
}

fn extension_link(identifier: &str, display_name: &str) -> String {
    format!(
        "<a href=\"{MARKETPLACE_ITEM_URL}{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"extension-link\">{}</a>",
        utf8_percent_encode(identifier, ITEM_NAME),
        html_escape(display_name)
    )
}

fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::decode;
    use crate::marketplace::ExtensionMetadata;
    use chrono::TimeZone;
    use indexmap::IndexMap;

    fn test_timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    fn sample() -> AnalysisResult {
        let inventory = decode("alice:\n  - foo.bar-1.2.3\n  - foo.bar-1.3.0\n  - baz.qux\nbob:\n  - foo.bar-1.2.3\n");
        let mut extensions = IndexMap::new();
        let _ = extensions.insert("foo.bar".to_string(), ExtensionMetadata::new("Foo", "Does foo", "Foo Inc"));
        let _ = extensions.insert("baz.qux".to_string(), ExtensionMetadata::not_found("baz.qux"));
        AnalysisResult::new(extensions, inventory.users)
    }

    fn render(result: &AnalysisResult) -> String {
        let mut output = String::new();
        generate(result, test_timestamp(), &mut output).unwrap();
        output
    }

    #[test]
    fn test_html_escape_all_special_chars() {
        assert_eq!(html_escape("<>&\"'"), "&lt;&gt;&amp;&quot;&#39;");
    }

    #[test]
    fn test_html_escape_plain() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape(""), "");
    }

    #[test]
    fn test_generate_empty() {
        let output = render(&AnalysisResult::default());
        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.contains("</html>"));
        assert!(!output.contains("user-section\""));
    }

    #[test]
    fn test_generate_header() {
        let output = render(&sample());
        assert!(output.contains("<h1>Extension Usage Report</h1>"));
        assert!(output.contains("on 2024-01-15"));
    }

    #[test]
    fn test_generate_summary_cards() {
        let output = render(&sample());
        assert!(output.contains("<div class=\"label\">Users</div>"));
        assert!(output.contains("<div class=\"label\">Total Extensions</div>"));
        assert!(output.contains("<div class=\"value\">4</div>"));
        assert!(!output.contains("Failed Lookups"));
    }

    #[test]
    fn test_generate_failed_card() {
        let mut result = sample();
        let _ = result
            .extensions
            .insert("baz.qux".to_string(), ExtensionMetadata::lookup_error("baz.qux", "timeout"));

        let output = render(&result);
        assert!(output.contains("summary-card failed"));
        assert!(output.contains("Error: timeout"));
    }

    #[test]
    fn test_generate_usage_counts() {
        let output = render(&sample());
        assert!(output.contains("<span class=\"count-number\">2</span>"));
        assert!(output.contains("<span class=\"count-label\">users</span>"));
        assert!(output.contains("<span class=\"count-label\">user</span>"));
    }

    #[test]
    fn test_generate_links() {
        let output = render(&sample());
        assert!(output.contains("href=\"https://marketplace.visualstudio.com/items?itemName=foo.bar\""));
    }

    #[test]
    fn test_extension_link_encoding() {
        let link = extension_link("my-pub.some_ext~x", "Name");
        assert!(link.contains("itemName=my-pub.some_ext~x\""), "link was {link}");

        let link = extension_link("a b&c\"d.e", "Name");
        assert!(link.contains("itemName=a%20b%26c%22d.e\""), "link was {link}");
    }

    #[test]
    fn test_generate_version_tags() {
        let output = render(&sample());
        assert!(output.contains("<span class=\"extension-version\">v1.2.3</span><span class=\"extension-version\">v1.3.0</span>"));
        assert!(output.contains("<span class=\"extension-version\">vunknown</span>"));
        assert!(output.contains("2 unique extensions"));
    }

    #[test]
    fn test_generate_escapes_user_text() {
        let inventory = decode("<script>:\n  - evil.ext-1.0.0\n");
        let mut extensions = IndexMap::new();
        let _ = extensions.insert(
            "evil.ext".to_string(),
            ExtensionMetadata::new("<b>Evil</b>", "\"quoted\" & more", "O'Brien"),
        );

        let output = render(&AnalysisResult::new(extensions, inventory.users));
        assert!(!output.contains("<script>"));
        assert!(!output.contains("<b>Evil</b>"));
        assert!(output.contains("&lt;script&gt;"));
        assert!(output.contains("&quot;quoted&quot; &amp; more"));
        assert!(output.contains("O&#39;Brien"));
    }
}
