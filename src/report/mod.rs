//! Report assembly: HTML page and terminal tables.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays free of presentation concerns
//! - output changes are localized

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Labels;
use crate::error::{AppError, EXIT_OUTPUT};

pub mod format;
pub mod html;

pub use format::*;
pub use html::*;

/// Rendered HTML for one geography.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub html: String,
}

impl Section {
    /// Placeholder shown when a geography could not be processed.
    pub fn failed(name: &str, labels: &Labels, err: &AppError) -> Self {
        let html = format!(
            "{}<p><b>{}</b>: {}</p>\n",
            anchor_heading(name),
            escape(labels.failed),
            escape(err.message())
        );
        Self {
            name: name.to_string(),
            html,
        }
    }
}

/// The report page, built top to bottom.
#[derive(Debug, Clone, Default)]
pub struct Page {
    body: String,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_update(&mut self, labels: &Labels, when: &str) {
        self.body
            .push_str(&format!("{}: {}<br>", escape(labels.last_update), escape(when)));
    }

    pub fn heading(&mut self, text: &str) {
        self.body.push_str(&format!("<H1>{}</H1>\n", escape(text)));
    }

    /// Raw HTML.
    pub fn push(&mut self, html: &str) {
        self.body.push_str(html);
    }

    /// An anchor index followed by the sections themselves.
    pub fn sections(&mut self, sections: &[Section]) {
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        self.body.push_str(&anchor_index(&names));
        self.body.push('\n');
        let html: Vec<&str> = sections.iter().map(|s| s.html.as_str()).collect();
        self.body.push_str(&html.join("\n"));
    }

    /// Append a footer file verbatim.
    pub fn footer(&mut self, path: &Path) -> Result<(), AppError> {
        let footer = fs::read_to_string(path)
            .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to read footer '{}': {e}", path.display())))?;
        self.body.push_str(&footer);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Write the page as `index.html` in `outdir`.
    pub fn write(&self, outdir: &Path) -> Result<PathBuf, AppError> {
        let path = outdir.join("index.html");
        fs::write(&path, &self.body)
            .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to write '{}': {e}", path.display())))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Lang;

    #[test]
    fn page_lists_sections_with_index() {
        let labels = Labels::for_lang(Lang::En);
        let mut page = Page::new();
        page.last_update(&labels, "2020-04-01 18:00");
        page.heading("Regional data");
        page.sections(&[
            Section {
                name: "Lazio".to_string(),
                html: "L".to_string(),
            },
            Section {
                name: "Molise".to_string(),
                html: "M".to_string(),
            },
        ]);

        assert_eq!(
            page.as_str(),
            "Last update: 2020-04-01 18:00<br><H1>Regional data</H1>\n\
             <a href=\"#Lazio\">Lazio</a> <a href=\"#Molise\">Molise</a> \nL\nM"
        );
    }

    #[test]
    fn failed_section_keeps_anchor() {
        let labels = Labels::for_lang(Lang::It);
        let err = AppError::new(4, "window size 4 must be odd");
        let s = Section::failed("Lazio", &labels, &err);
        assert!(s.html.starts_with("<H2>Lazio</H2><a name=\"Lazio\"></a>"));
        assert!(s.html.contains("Elaborazione non riuscita"));
    }

    #[test]
    fn write_and_footer() {
        let dir = tempfile::tempdir().unwrap();
        let footer = dir.path().join("footer.html");
        fs::write(&footer, "<hr>footer").unwrap();

        let mut page = Page::new();
        page.push("body");
        page.footer(&footer).unwrap();
        let path = page.write(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "body<hr>footer");
    }
}
