//! Renders pipeline outcomes for people (Markdown, HTML) and programs (JSON).

use common::Article;

use crate::pipeline::Outcome;
use crate::vectorize::strip_markup;

pub const PAGE_TITLE: &str = "Clustered News Articles";
pub const NO_ARTICLES_MESSAGE: &str = "No articles found at the URL.";

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn display_summary(article: &Article) -> String {
    strip_markup(&article.summary).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `[title](link) - summary` lines under one heading per cluster.
pub fn render_markdown(outcome: &Outcome) -> String {
    let groups = match outcome {
        Outcome::NoArticles => return format!("{}\n", NO_ARTICLES_MESSAGE),
        Outcome::Clustered(groups) => groups,
    };

    let mut md = format!("# {}\n", PAGE_TITLE);
    for (cluster_id, articles) in groups {
        md.push_str(&format!("\n## Cluster {}\n\n", cluster_id));
        for article in articles {
            md.push_str(&format!(
                "- [{}]({}) - {}\n",
                article.title,
                article.link,
                display_summary(article)
            ));
        }
    }
    md
}

pub fn render_json(outcome: &Outcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

/// What the results area of the page shows.
pub enum PageBody<'a> {
    Empty,
    Outcome(&'a Outcome),
    Error(&'a str),
}

/// Full HTML page: the URL form in a sidebar and the results next to it.
pub fn render_page(url: &str, num_clusters: usize, body: PageBody<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\">\n");
    html.push_str(&format!("  <title>{}</title>\n", PAGE_TITLE));
    html.push_str("  <style>\n");
    html.push_str("    body { display: flex; font-family: sans-serif; margin: 0; }\n");
    html.push_str("    aside { width: 280px; padding: 20px; background-color: #f0f2f6; min-height: 100vh; }\n");
    html.push_str("    main { flex: 1; padding: 20px 40px; }\n");
    html.push_str("    aside input { width: 100%; margin: 6px 0 14px 0; }\n");
    html.push_str("    li { margin: 8px 0; }\n");
    html.push_str("    .error { color: #e74c3c; }\n");
    html.push_str("  </style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<aside>\n  <h2>News Clustering</h2>\n");
    html.push_str("  <form method=\"get\" action=\"/clusters\">\n");
    html.push_str("    <label for=\"url\">Enter the URL of the news site:</label>\n");
    html.push_str(&format!(
        "    <input type=\"text\" id=\"url\" name=\"url\" value=\"{}\">\n",
        escape_html(url)
    ));
    html.push_str("    <label for=\"clusters\">Number of clusters:</label>\n");
    html.push_str(&format!(
        "    <input type=\"number\" id=\"clusters\" name=\"clusters\" min=\"1\" value=\"{}\">\n",
        num_clusters
    ));
    html.push_str("    <button type=\"submit\">Fetch and Cluster Articles</button>\n");
    html.push_str("  </form>\n</aside>\n");

    html.push_str("<main>\n");
    match body {
        PageBody::Empty => {}
        PageBody::Error(message) => {
            html.push_str(&format!("  <p class=\"error\">{}</p>\n", escape_html(message)));
        }
        PageBody::Outcome(Outcome::NoArticles) => {
            html.push_str(&format!("  <p>{}</p>\n", NO_ARTICLES_MESSAGE));
        }
        PageBody::Outcome(Outcome::Clustered(groups)) => {
            html.push_str(&format!("  <h1>{}</h1>\n", PAGE_TITLE));
            for (cluster_id, articles) in groups {
                html.push_str(&format!("  <h3>Cluster {}</h3>\n  <ul>\n", cluster_id));
                for article in articles {
                    html.push_str(&format!(
                        "    <li><a href=\"{}\" target=\"_blank\">{}</a> - {}</li>\n",
                        escape_html(&article.link),
                        escape_html(&article.title),
                        escape_html(&display_summary(article))
                    ));
                }
                html.push_str("  </ul>\n");
            }
        }
    }
    html.push_str("</main>\n</body>\n</html>");
    html
}
