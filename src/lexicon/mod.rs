//! Month Lexicon
//!
//! Static bidirectional mapping between calendar months and the English and
//! Spanish names that show up in report filenames ("informe_marzo.pdf",
//! "Report-Sept-2024.pdf", ...).
//!
//! ## Matching
//! Everything is compared in a folded form: lowercase, diacritics stripped
//! ("Diciémbre" → "diciembre"). A name found inside a filename must end on a
//! word boundary: the next character is a non-letter or starts a camelCase
//! word. Full names may begin anywhere ("INFORMEMARZO2025.pdf"), abbreviations
//! need a boundary on both sides. This keeps "junior" or "marcha" from being
//! read as June or March.

mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthToken {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl MonthToken {
    /// All months in calendar order
    pub const ALL: [MonthToken; 12] = [
        MonthToken::January,
        MonthToken::February,
        MonthToken::March,
        MonthToken::April,
        MonthToken::May,
        MonthToken::June,
        MonthToken::July,
        MonthToken::August,
        MonthToken::September,
        MonthToken::October,
        MonthToken::November,
        MonthToken::December,
    ];

    /// Month for a 1-based calendar number
    pub fn from_number(number: u32) -> Option<Self> {
        let index = number.checked_sub(1)? as usize;
        Self::ALL.get(index).copied()
    }

    /// 1-based calendar number
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    fn entry(self) -> &'static MonthEntry {
        &MONTHS[self as usize]
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entry().english)
    }
}

/// Language used when writing a month back into a filename
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum MonthLocale {
    #[default]
    #[serde(rename = "es", alias = "spanish")]
    #[value(name = "es", alias = "spanish")]
    Spanish,
    #[serde(rename = "en", alias = "english")]
    #[value(name = "en", alias = "english")]
    English,
}

impl MonthLocale {
    /// Parse a locale code such as "es", "en", "spanish"
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "es" | "spanish" | "espanol" | "español" => Some(MonthLocale::Spanish),
            "en" | "english" => Some(MonthLocale::English),
            _ => None,
        }
    }
}

struct MonthEntry {
    spanish: &'static str,
    english: &'static str,
    /// Folded full names (lowercase, no diacritics)
    names: &'static [&'static str],
    /// Folded abbreviations
    abbreviations: &'static [&'static str],
}

impl MonthEntry {
    fn forms(&'static self) -> impl Iterator<Item = &'static str> {
        self.names.iter().chain(self.abbreviations.iter()).copied()
    }
}

static MONTHS: [MonthEntry; 12] = [
    MonthEntry { spanish: "ENERO", english: "JANUARY", names: &["january", "enero"], abbreviations: &["jan", "ene"] },
    MonthEntry { spanish: "FEBRERO", english: "FEBRUARY", names: &["february", "febrero"], abbreviations: &["feb"] },
    MonthEntry { spanish: "MARZO", english: "MARCH", names: &["march", "marzo"], abbreviations: &["mar"] },
    MonthEntry { spanish: "ABRIL", english: "APRIL", names: &["april", "abril"], abbreviations: &["apr", "abr"] },
    MonthEntry { spanish: "MAYO", english: "MAY", names: &["mayo"], abbreviations: &["may"] },
    MonthEntry { spanish: "JUNIO", english: "JUNE", names: &["june", "junio"], abbreviations: &["jun"] },
    MonthEntry { spanish: "JULIO", english: "JULY", names: &["july", "julio"], abbreviations: &["jul"] },
    MonthEntry { spanish: "AGOSTO", english: "AUGUST", names: &["august", "agosto"], abbreviations: &["aug", "ago"] },
    MonthEntry {
        spanish: "SEPTIEMBRE",
        english: "SEPTEMBER",
        names: &["september", "septiembre", "setiembre"],
        abbreviations: &["sept", "sep"],
    },
    MonthEntry { spanish: "OCTUBRE", english: "OCTOBER", names: &["october", "octubre"], abbreviations: &["oct"] },
    MonthEntry { spanish: "NOVIEMBRE", english: "NOVEMBER", names: &["november", "noviembre"], abbreviations: &["nov"] },
    MonthEntry { spanish: "DICIEMBRE", english: "DECEMBER", names: &["december", "diciembre"], abbreviations: &["dec", "dic"] },
];

/// One searchable spelling of a month
struct SurfaceForm {
    chars: Vec<char>,
    token: MonthToken,
    /// Full names may start mid-word ("INFORMEMARZO"); abbreviations may not
    full_name: bool,
}

/// Surface forms, longest first so "mayo" wins over "may"
static SURFACE_FORMS: Lazy<Vec<SurfaceForm>> = Lazy::new(|| {
    let mut forms: Vec<SurfaceForm> = Vec::new();
    for token in MonthToken::ALL {
        let entry = token.entry();
        for (list, full_name) in [(entry.names, true), (entry.abbreviations, false)] {
            forms.extend(list.iter().map(|form| SurfaceForm {
                chars: form.chars().collect(),
                token,
                full_name,
            }));
        }
    }
    forms.sort_by(|a, b| b.chars.len().cmp(&a.chars.len()));
    forms
});

/// A month name located inside a larger string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthMatch {
    pub token: MonthToken,
    /// Byte range in the original string
    pub range: Range<usize>,
}

/// Month name lookup plus the clock that defines "current month"
#[derive(Clone)]
pub struct MonthLexicon {
    locale: MonthLocale,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for MonthLexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonthLexicon")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl MonthLexicon {
    pub fn new(locale: MonthLocale, clock: Arc<dyn Clock>) -> Self {
        Self { locale, clock }
    }

    /// Lexicon driven by the local wall clock
    pub fn system(locale: MonthLocale) -> Self {
        Self::new(locale, Arc::new(SystemClock))
    }

    pub fn locale(&self) -> MonthLocale {
        self.locale
    }

    /// Recognize a standalone month name or abbreviation
    pub fn normalize(token: &str) -> Option<MonthToken> {
        let folded: Vec<char> = token
            .trim()
            .trim_end_matches('.')
            .chars()
            .map(fold_char)
            .collect();
        if folded.is_empty() {
            return None;
        }

        SURFACE_FORMS
            .iter()
            .find(|form| form.chars == folded)
            .map(|form| form.token)
    }

    /// Canonical uppercase name used when rewriting filenames
    pub fn display_form(&self, token: MonthToken) -> &'static str {
        let entry = token.entry();
        match self.locale {
            MonthLocale::Spanish => entry.spanish,
            MonthLocale::English => entry.english,
        }
    }

    /// Month of the injected clock's current date
    pub fn current(&self) -> MonthToken {
        use chrono::Datelike;

        let today = self.clock.today();
        // chrono months are always 1..=12
        MonthToken::from_number(today.month()).unwrap_or(MonthToken::January)
    }

    /// Find the first month name embedded in `text`
    pub fn find_in(text: &str) -> Option<MonthMatch> {
        let original: Vec<(usize, char)> = text.char_indices().collect();
        let folded: Vec<char> = original.iter().map(|(_, c)| fold_char(*c)).collect();

        for start in 0..folded.len() {
            for form in SURFACE_FORMS.iter() {
                let end = start + form.chars.len();
                if end > folded.len() || folded[start..end] != form.chars[..] {
                    continue;
                }

                let before = start.checked_sub(1).map(|i| original[i].1);
                let after = original.get(end).map(|(_, c)| *c);
                let first = original[start].1;
                let last = original[end - 1].1;

                let starts_ok = form.full_name || is_word_boundary(before, first);
                if starts_ok && is_word_boundary(Some(last), after.unwrap_or(' ')) {
                    let byte_start = original[start].0;
                    let byte_end = original.get(end).map(|(i, _)| *i).unwrap_or(text.len());
                    return Some(MonthMatch {
                        token: form.token,
                        range: byte_start..byte_end,
                    });
                }
            }
        }

        None
    }
}

/// Fold a character to its lowercase base letter ("É" → 'e')
fn fold_char(c: char) -> char {
    std::iter::once(c)
        .nfd()
        .find(|d| !is_combining_mark(*d))
        .and_then(|base| base.to_lowercase().next())
        .unwrap_or(c)
}

/// Whether a word may start or end between `left` and `right`
fn is_word_boundary(left: Option<char>, right: char) -> bool {
    match left {
        Some(l) if l.is_alphabetic() && right.is_alphabetic() => {
            l.is_lowercase() && right.is_uppercase()
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn april_lexicon(locale: MonthLocale) -> MonthLexicon {
        let date = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
        MonthLexicon::new(locale, Arc::new(FixedClock::new(date)))
    }

    fn matched<'a>(text: &'a str) -> Option<(&'a str, MonthToken)> {
        MonthLexicon::find_in(text).map(|m| (&text[m.range.clone()], m.token))
    }

    #[test]
    fn test_surface_forms_are_disjoint() {
        let mut seen: HashMap<&str, MonthToken> = HashMap::new();
        for token in MonthToken::ALL {
            for form in token.entry().forms() {
                if let Some(previous) = seen.insert(form, token) {
                    panic!("{} maps to both {:?} and {:?}", form, previous, token);
                }
            }
        }
    }

    #[test]
    fn test_normalize_ignores_case_and_diacritics() {
        assert_eq!(MonthLexicon::normalize("MARZO"), Some(MonthToken::March));
        assert_eq!(MonthLexicon::normalize("marzo"), Some(MonthToken::March));
        assert_eq!(MonthLexicon::normalize("Diciémbre"), Some(MonthToken::December));
        assert_eq!(MonthLexicon::normalize("Ábril"), Some(MonthToken::April));
        assert_eq!(MonthLexicon::normalize("Sept."), Some(MonthToken::September));
        assert_eq!(MonthLexicon::normalize("setiembre"), Some(MonthToken::September));
        assert_eq!(MonthLexicon::normalize("Aug"), Some(MonthToken::August));
        assert_eq!(MonthLexicon::normalize("notes"), None);
        assert_eq!(MonthLexicon::normalize(""), None);
    }

    #[test]
    fn test_display_form_per_locale() {
        let es = april_lexicon(MonthLocale::Spanish);
        let en = april_lexicon(MonthLocale::English);
        assert_eq!(es.display_form(MonthToken::September), "SEPTIEMBRE");
        assert_eq!(en.display_form(MonthToken::September), "SEPTEMBER");
    }

    #[test]
    fn test_current_uses_injected_clock() {
        let lexicon = april_lexicon(MonthLocale::Spanish);
        assert_eq!(lexicon.current(), MonthToken::April);
        assert_eq!(lexicon.display_form(lexicon.current()), "ABRIL");
    }

    #[test]
    fn test_find_in_filenames() {
        assert_eq!(matched("informe_marzo.pdf"), Some(("marzo", MonthToken::March)));
        assert_eq!(matched("informe_MARZO.pdf"), Some(("MARZO", MonthToken::March)));
        assert_eq!(matched("Informe_Mayo_2024.docx"), Some(("Mayo", MonthToken::May)));
        assert_eq!(matched("report-dec-2024.pdf"), Some(("dec", MonthToken::December)));
        assert_eq!(matched("InformeMarzo2024.pdf"), Some(("Marzo", MonthToken::March)));
        assert_eq!(matched("acta_diciémbre.pdf"), Some(("diciémbre", MonthToken::December)));
    }

    #[test]
    fn test_find_in_run_together_names() {
        assert_eq!(matched("INFORMEMARZO2025.pdf"), Some(("MARZO", MonthToken::March)));
        assert_eq!(matched("informemarzo.pdf"), Some(("marzo", MonthToken::March)));
        assert_eq!(matched("REPORTEABRIL.docx"), Some(("ABRIL", MonthToken::April)));
        assert_eq!(matched("Actamayo.pdf"), Some(("mayo", MonthToken::May)));
        assert_eq!(matched("resumenseptiembre_v2.pdf"), Some(("septiembre", MonthToken::September)));
        // Abbreviations still need a boundary in front
        assert_eq!(matched("informedec.pdf"), None);
    }

    #[test]
    fn test_find_in_rejects_embedded_words() {
        assert_eq!(matched("notes.txt"), None);
        assert_eq!(matched("junior_developer.pdf"), None);
        assert_eq!(matched("mayor_report.pdf"), None);
        assert_eq!(matched("decision.pdf"), None);
        assert_eq!(matched("informe_de_marcha.pdf"), None);
    }

    #[test]
    fn test_month_numbers_round_trip() {
        for (index, token) in MonthToken::ALL.iter().enumerate() {
            assert_eq!(token.number(), index as u32 + 1);
            assert_eq!(MonthToken::from_number(token.number()), Some(*token));
        }
        assert_eq!(MonthToken::from_number(0), None);
        assert_eq!(MonthToken::from_number(13), None);
    }

    #[test]
    fn test_locale_codes() {
        assert_eq!(MonthLocale::from_code("ES"), Some(MonthLocale::Spanish));
        assert_eq!(MonthLocale::from_code("english"), Some(MonthLocale::English));
        assert_eq!(MonthLocale::from_code("fr"), None);
    }
}
