//! BibTeX record parsing.
//!
//! Converts the raw text produced by the extraction tool into a single
//! normalized [`BibRecord`]. The tool prints diagnostic lines before the
//! actual entry, so everything before the first `@entry{` marker is
//! discarded. Parsing never fails: malformed input degrades to a record
//! with empty fields.

use once_cell::sync::Lazy;
use regex::Regex;

/// A bibliographic record parsed from one BibTeX entry.
///
/// Field values default to the empty string when absent. `year` is kept as
/// the raw text (it may be `"n.d."` or similar); numeric coercion happens at
/// catalog-write time, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibRecord {
    pub title: String,
    pub year: String,
    pub doi: String,
    /// The record text starting at the entry marker, untruncated.
    pub raw_text: String,
}

impl BibRecord {
    /// True when no usable field was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.year.is_empty() && self.doi.is_empty()
    }
}

/// Parse raw record text into a [`BibRecord`].
///
/// Takes the first entry if the text contains several. Title braces and
/// surrounding whitespace are stripped; year and DOI stay raw strings.
pub fn parse_record(raw: &str) -> BibRecord {
    let stripped = strip_preamble(raw);

    let mut record = BibRecord {
        raw_text: stripped.to_string(),
        ..Default::default()
    };

    let Ok(bibliography) = biblatex::Bibliography::parse(stripped) else {
        return record;
    };
    let Some(entry) = bibliography.iter().next() else {
        return record;
    };

    if let Ok(title) = entry.title() {
        record.title = clean_title(&chunks_to_string(title));
    }
    if let Some(year) = entry.get("year") {
        record.year = chunks_to_string(year).trim().to_string();
    }
    if let Some(doi) = entry.get("doi") {
        record.doi = normalize_doi(&chunks_to_string(doi));
    }

    record
}

/// Drop everything before the first `@entry{` marker.
///
/// Returns the input unchanged when no marker is present so that the raw
/// text is preserved even for unparseable input.
fn strip_preamble(raw: &str) -> &str {
    static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+\{").unwrap());
    match ENTRY_RE.find(raw) {
        Some(m) => &raw[m.start()..],
        None => raw,
    }
}

/// Strip literal braces and surrounding whitespace from a title.
fn clean_title(title: &str) -> String {
    title.replace(['{', '}'], "").trim().to_string()
}

/// Reduce a DOI field to the bare identifier.
///
/// Handles the URL and `doi:` prefixed forms that extraction tools emit.
fn normalize_doi(doi: &str) -> String {
    let doi = doi.trim();
    let doi = doi
        .strip_prefix("https://doi.org/")
        .or_else(|| doi.strip_prefix("http://doi.org/"))
        .or_else(|| doi.strip_prefix("https://dx.doi.org/"))
        .or_else(|| doi.strip_prefix("http://dx.doi.org/"))
        .unwrap_or(doi);
    doi.strip_prefix("doi:").unwrap_or(doi).trim().to_string()
}

/// Convert biblatex chunks to a plain string.
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.as_str(),
            biblatex::Chunk::Verbatim(s) => s.as_str(),
            biblatex::Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_entry() {
        let raw = r#"@article{doe2020,
  title = {A Study of Things},
  author = {Doe, Jane},
  year = {2020},
  doi = {10.1234/example}
}"#;
        let record = parse_record(raw);
        assert_eq!(record.title, "A Study of Things");
        assert_eq!(record.year, "2020");
        assert_eq!(record.doi, "10.1234/example");
        assert_eq!(record.raw_text, raw);
    }

    #[test]
    fn double_braced_title() {
        let raw = r#"@article{key, title = {{Some Title}}, year = {2021}}"#;
        let record = parse_record(raw);
        assert_eq!(record.title, "Some Title");
    }

    #[test]
    fn preamble_is_discarded() {
        let clean = "@article{key, title={A Sufficiently Long Title}, year={2019}}";
        let noisy = format!("garbage line\n[tool] looking up metadata...\n{}", clean);
        assert_eq!(parse_record(&noisy), parse_record(clean));
        assert_eq!(parse_record(&noisy).raw_text, clean);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record = parse_record("@misc{key, note = {no useful fields}}");
        assert_eq!(record.title, "");
        assert_eq!(record.year, "");
        assert_eq!(record.doi, "");
    }

    #[test]
    fn malformed_input_degrades() {
        let record = parse_record("this is not bibtex at all");
        assert!(record.is_empty());
        assert_eq!(record.raw_text, "this is not bibtex at all");
    }

    #[test]
    fn empty_input_degrades() {
        let record = parse_record("");
        assert!(record.is_empty());
        assert_eq!(record.raw_text, "");
    }

    #[test]
    fn first_entry_wins() {
        let raw = r#"@article{a, title={First Paper}, year={2001}}
@article{b, title={Second Paper}, year={2002}}"#;
        let record = parse_record(raw);
        assert_eq!(record.title, "First Paper");
        assert_eq!(record.year, "2001");
    }

    #[test]
    fn non_numeric_year_kept_raw() {
        let record = parse_record("@misc{k, title={Undated Report Of Some Length}, year={n.d.}}");
        assert_eq!(record.year, "n.d.");
    }

    #[test]
    fn url_form_doi_normalized() {
        let record =
            parse_record("@article{k, title={T}, doi={https://doi.org/10.1145/3442381.3450048}}");
        assert_eq!(record.doi, "10.1145/3442381.3450048");
    }

    #[test]
    fn doi_prefix_normalized() {
        let record = parse_record("@article{k, title={T}, doi={doi:10.5555/12345}}");
        assert_eq!(record.doi, "10.5555/12345");
    }
}
