//! Small HTML builders.
//!
//! The report is plain concatenated HTML: headings with anchors, an index of
//! links, image tags and borderless tables used to put captions under
//! images. Everything user-provided goes through `escape`.

use std::path::Path;

/// Escape text for element content and double-quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<img>` tag for a chart written next to the page.
///
/// A random query string makes browsers refetch images that are overwritten
/// on every run under the same name.
pub fn img_tag(chart_path: &Path) -> String {
    let name = chart_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix: f64 = rand::random();
    format!("<img src=\"{}?{suffix}\">\n", escape(&name))
}

/// Section heading with a link target of the same name.
pub fn anchor_heading(name: &str) -> String {
    let name = escape(name);
    format!("<H2>{name}</H2><a name=\"{name}\"></a>")
}

/// One link per name, separated by spaces.
pub fn anchor_index<S: AsRef<str>>(names: &[S]) -> String {
    let mut out = String::new();
    for name in names {
        let name = escape(name.as_ref());
        out.push_str(&format!("<a href=\"#{name}\">{name}</a> "));
    }
    out
}

/// `<table>` with fixed attributes.
#[derive(Debug, Clone)]
pub struct Table {
    attributes: String,
}

impl Table {
    pub fn new(attributes: &[(&str, &str)]) -> Self {
        Self {
            attributes: attrs(attributes),
        }
    }

    /// The borderless inline table used for captioned charts.
    pub fn inline() -> Self {
        Self::new(&[("border", "0"), ("style", "display: inline-block;")])
    }

    pub fn row(html: &str, attributes: &[(&str, &str)]) -> String {
        format!("<tr {}>\n{html}\n</tr>\n", attrs(attributes))
    }

    pub fn cell(html: &str, attributes: &[(&str, &str)]) -> String {
        format!("<td {}>\n{html}\n</td>\n", attrs(attributes))
    }

    pub fn html(&self, rows: &[String]) -> String {
        format!("<table {}>{}</table>\n", self.attributes, rows.concat())
    }

    /// An image with a centred caption underneath.
    pub fn captioned(&self, image_html: &str, caption: &str) -> String {
        self.html(&[
            Self::row(&Self::cell(image_html, &[]), &[]),
            Self::row(&Self::cell(&escape(caption), &[("align", "center")]), &[]),
        ])
    }
}

fn attrs(attributes: &[(&str, &str)]) -> String {
    attributes
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("Emilia-Romagna"), "Emilia-Romagna");
        assert_eq!(escape("Korea, South <\"x\">"), "Korea, South &lt;&quot;x&quot;&gt;");
        assert_eq!(escape("Cote d'Ivoire & co"), "Cote d&#39;Ivoire &amp; co");
    }

    #[test]
    fn img_tag_uses_file_name_with_cache_buster() {
        let tag = img_tag(Path::new("/tmp/out/Lombardia_daily.svg"));
        assert!(tag.starts_with("<img src=\"Lombardia_daily.svg?"));
        assert!(tag.ends_with("\">\n"));
    }

    #[test]
    fn anchors_link_to_headings() {
        assert_eq!(anchor_heading("Veneto"), "<H2>Veneto</H2><a name=\"Veneto\"></a>");
        assert_eq!(
            anchor_index(&["A", "B"]),
            "<a href=\"#A\">A</a> <a href=\"#B\">B</a> "
        );
    }

    #[test]
    fn captioned_table_layout() {
        let t = Table::inline();
        let html = t.captioned("<img src=\"x.svg\">", "Fit");
        assert!(html.starts_with("<table border=\"0\" style=\"display: inline-block;\"><tr >"));
        assert!(html.contains("<td align=\"center\">\nFit\n</td>"));
        assert!(html.ends_with("</table>\n"));
    }
}
