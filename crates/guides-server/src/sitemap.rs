use chrono::NaiveDate;

use crate::admin::LAST_UPDATED_FORMAT;
use crate::model::GuideMetadata;

struct Entry<'a> {
    loc: String,
    lastmod: Option<String>,
    changefreq: &'a str,
    priority: &'a str,
}

/// Sitemap for the site root, the guide index and every guide in `guides`.
///
/// Only pass published guides. `lastmod` is emitted when `lastUpdated` parses as a date.
pub fn sitemap_xml(site_url: &str, guides: &[GuideMetadata]) -> String {
    let mut entries = vec![
        Entry {
            loc: site_url.to_string(),
            lastmod: None,
            changefreq: "weekly",
            priority: "1.0",
        },
        Entry {
            loc: format!("{site_url}/guides"),
            lastmod: None,
            changefreq: "daily",
            priority: "0.9",
        },
    ];
    entries.extend(guides.iter().map(|g| Entry {
        loc: format!("{site_url}/guides/{}", g.slug),
        lastmod: NaiveDate::parse_from_str(g.last_updated.trim(), LAST_UPDATED_FORMAT)
            .ok()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        changefreq: "monthly",
        priority: "0.7",
    }));

    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        out.push_str("  <url>\n");
        out.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = entry.lastmod {
            out.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        out.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        out.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        out.push_str("  </url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

pub fn robots_txt(site_url: &str) -> String {
    format!("User-agent: *\nAllow: /\n\nSitemap: {site_url}/sitemap.xml\n")
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
