//! Degree Normalizer: splits free-text education strings into a canonical
//! degree code and a field of study.
//!
//! Matching is whole-word and case-insensitive against a fixed alias table.
//! Variants are tried longest first so that "bachelor of science" wins over
//! "bs", and "bsc" is never found inside "msc".

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

// ────────────────────────────────────────────────────────────────────────────
// Canonical degree codes
// ────────────────────────────────────────────────────────────────────────────

/// Canonical credential tier, independent of how the input spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DegreeCode {
    Phd,
    Mba,
    Msc,
    Ma,
    Mcom,
    Me,
    Mtech,
    Bsc,
    Ba,
    Bcom,
    Be,
    Btech,
    Bba,
    Bca,
    Mca,
    Bs,
    Ms,
    Aa,
    Aas,
    As,
    Associate,
    Diploma,
    #[serde(rename = "HIGH SCHOOL")]
    HighSchool,
    Certificate,
    Others,
    Al,
    Ol,
    Nvq,
    Hnd,
    Cima,
    Acca,
    Ca,
    Slim,
    Nibt,
    Bit,
}

impl DegreeCode {
    /// Every code, in alias-table order.
    pub const ALL: [DegreeCode; 35] = [
        DegreeCode::Phd,
        DegreeCode::Mba,
        DegreeCode::Msc,
        DegreeCode::Ma,
        DegreeCode::Mcom,
        DegreeCode::Me,
        DegreeCode::Mtech,
        DegreeCode::Bsc,
        DegreeCode::Ba,
        DegreeCode::Bcom,
        DegreeCode::Be,
        DegreeCode::Btech,
        DegreeCode::Bba,
        DegreeCode::Bca,
        DegreeCode::Mca,
        DegreeCode::Bs,
        DegreeCode::Ms,
        DegreeCode::Aa,
        DegreeCode::Aas,
        DegreeCode::As,
        DegreeCode::Associate,
        DegreeCode::Diploma,
        DegreeCode::HighSchool,
        DegreeCode::Certificate,
        DegreeCode::Others,
        DegreeCode::Al,
        DegreeCode::Ol,
        DegreeCode::Nvq,
        DegreeCode::Hnd,
        DegreeCode::Cima,
        DegreeCode::Acca,
        DegreeCode::Ca,
        DegreeCode::Slim,
        DegreeCode::Nibt,
        DegreeCode::Bit,
    ];

    /// Upper-case abbreviation, e.g. `"BSC"` or `"HIGH SCHOOL"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DegreeCode::Phd => "PHD",
            DegreeCode::Mba => "MBA",
            DegreeCode::Msc => "MSC",
            DegreeCode::Ma => "MA",
            DegreeCode::Mcom => "MCOM",
            DegreeCode::Me => "ME",
            DegreeCode::Mtech => "MTECH",
            DegreeCode::Bsc => "BSC",
            DegreeCode::Ba => "BA",
            DegreeCode::Bcom => "BCOM",
            DegreeCode::Be => "BE",
            DegreeCode::Btech => "BTECH",
            DegreeCode::Bba => "BBA",
            DegreeCode::Bca => "BCA",
            DegreeCode::Mca => "MCA",
            DegreeCode::Bs => "BS",
            DegreeCode::Ms => "MS",
            DegreeCode::Aa => "AA",
            DegreeCode::Aas => "AAS",
            DegreeCode::As => "AS",
            DegreeCode::Associate => "ASSOCIATE",
            DegreeCode::Diploma => "DIPLOMA",
            DegreeCode::HighSchool => "HIGH SCHOOL",
            DegreeCode::Certificate => "CERTIFICATE",
            DegreeCode::Others => "OTHERS",
            DegreeCode::Al => "AL",
            DegreeCode::Ol => "OL",
            DegreeCode::Nvq => "NVQ",
            DegreeCode::Hnd => "HND",
            DegreeCode::Cima => "CIMA",
            DegreeCode::Acca => "ACCA",
            DegreeCode::Ca => "CA",
            DegreeCode::Slim => "SLIM",
            DegreeCode::Nibt => "NIBT",
            DegreeCode::Bit => "BIT",
        }
    }

    /// Lower-case key used when scanning normalized education text.
    pub fn key(self) -> String {
        self.as_str().to_lowercase()
    }

    /// Education rank: 0 = no credential, 6 = doctorate.
    pub fn rank(self) -> u8 {
        match self {
            DegreeCode::Others => 0,
            DegreeCode::HighSchool | DegreeCode::Certificate | DegreeCode::Ol => 1,
            DegreeCode::Al => 2,
            DegreeCode::Diploma
            | DegreeCode::Associate
            | DegreeCode::Nvq
            | DegreeCode::Hnd
            | DegreeCode::Aa
            | DegreeCode::Aas
            | DegreeCode::As
            | DegreeCode::Slim
            | DegreeCode::Nibt => 3,
            DegreeCode::Bsc
            | DegreeCode::Bs
            | DegreeCode::Ba
            | DegreeCode::Be
            | DegreeCode::Btech
            | DegreeCode::Bit
            | DegreeCode::Cima
            | DegreeCode::Acca
            | DegreeCode::Bcom
            | DegreeCode::Bba
            | DegreeCode::Bca => 4,
            DegreeCode::Msc
            | DegreeCode::Ms
            | DegreeCode::Ma
            | DegreeCode::Me
            | DegreeCode::Mtech
            | DegreeCode::Mcom
            | DegreeCode::Mba
            | DegreeCode::Mca
            | DegreeCode::Ca => 5,
            DegreeCode::Phd => 6,
        }
    }
}

impl fmt::Display for DegreeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Alias table
// ────────────────────────────────────────────────────────────────────────────

const DEGREE_ALIASES: &[(DegreeCode, &[&str])] = &[
    (
        DegreeCode::Phd,
        &["doctor of philosophy", "ph.d", "ph.d.", "phd", "doctorate", "ph.d. in", "phd candidate"],
    ),
    (
        DegreeCode::Mba,
        &[
            "master of business administration",
            "mba executive",
            "executive mba",
            "mba",
            "masters of business administration",
        ],
    ),
    (
        DegreeCode::Msc,
        &[
            "master of science",
            "m.sc",
            "m.s",
            "masters of science",
            "msc",
            "masters in science",
            "m.sc.",
        ],
    ),
    (DegreeCode::Ma, &["master of arts", "m.a", "m.a.", "masters of arts"]),
    (DegreeCode::Mcom, &["master of commerce", "m.com", "mcom"]),
    (
        DegreeCode::Me,
        &["master of engineering", "m.e", "m.eng", "m.e.", "m.engg"],
    ),
    (
        DegreeCode::Mtech,
        &["master of technology", "m.tech", "mtech", "mtech integrated"],
    ),
    (
        DegreeCode::Bsc,
        &[
            "bachelor of science",
            "b.sc",
            "b.s",
            "bsc",
            "b.sc.",
            "b.s.",
            "honours bachelor of science",
            "bachelors of science",
        ],
    ),
    (
        DegreeCode::Ba,
        &["bachelor of arts", "b.a", "ba", "b.a.", "bachelors of arts"],
    ),
    (DegreeCode::Bcom, &["bachelor of commerce", "b.com", "bcom"]),
    (
        DegreeCode::Be,
        &[
            "bachelor of engineering",
            "b.e",
            "b.e.",
            "b.eng",
            "b.engg",
            "bachelor of engineering (b.e",
        ],
    ),
    (
        DegreeCode::Btech,
        &[
            "bachelor of technology",
            "b.tech",
            "b.tech.",
            "btech",
            "b.tech(computers)",
            "dual degree (b.tech + m.tech)",
            "integrated b.tech & m.tech",
        ],
    ),
    (
        DegreeCode::Bba,
        &[
            "bachelor of business administration",
            "b.b.a",
            "bba",
            "bba - accounting",
            "bba - finance",
            "bachelor business administration",
        ],
    ),
    (
        DegreeCode::Bca,
        &["bachelor of computer applications", "b.c.a", "bca"],
    ),
    (
        DegreeCode::Mca,
        &["master of computer applications", "m.c.a", "mca"],
    ),
    (
        DegreeCode::Bs,
        &[
            "bs",
            "b.s",
            "b.s.",
            "b.s in",
            "bachelor's degree in science",
            "bachelor's in science",
        ],
    ),
    (
        DegreeCode::Ms,
        &[
            "ms",
            "m.s",
            "m.s.",
            "master in computer science",
            "masters of science in information technology",
        ],
    ),
    (DegreeCode::Aa, &["associate of arts", "a.a", "aa"]),
    (DegreeCode::Aas, &["associate of applied science", "a.a.s", "aas"]),
    (
        DegreeCode::As,
        &["associate of science", "a.s", "as", "associate of science degree"],
    ),
    (
        DegreeCode::Associate,
        &[
            "associate's degree",
            "associate degree",
            "associates degree",
            "associates",
            "associate",
        ],
    ),
    (
        DegreeCode::Diploma,
        &[
            "technical diploma",
            "associate diploma",
            "polytechnic diploma",
            "diploma",
            "general diploma",
            "pg diploma",
            "master's diploma",
        ],
    ),
    (
        DegreeCode::HighSchool,
        &["high school diploma", "ged", "grade 12", "xii", "x", "kcse"],
    ),
    (
        DegreeCode::Certificate,
        &[
            "certificate of completion",
            "graduate certificate",
            "business certification",
            "epa certification",
            "aws brazing certification",
            "skills",
            "course",
            "certification",
            "minor",
            "training",
            "coaching",
        ],
    ),
    (
        DegreeCode::Others,
        &[
            "n/a",
            "select one",
            "attending",
            "testing computer software",
            "general courses",
        ],
    ),
    (
        DegreeCode::Al,
        &[
            "advanced level",
            "a/l",
            "a.l",
            "gce a/l",
            "gce advanced level",
            "gce (a/l)",
            "gce(al)",
            "gce-a/l",
        ],
    ),
    (
        DegreeCode::Ol,
        &[
            "ordinary level",
            "o/l",
            "o.l",
            "gce o/l",
            "gce ordinary level",
            "gce (o/l)",
            "gce(ol)",
            "gce-o/l",
        ],
    ),
    (
        DegreeCode::Nvq,
        &[
            "nvq",
            "nvq level 3",
            "nvq level 4",
            "nvq level 5",
            "nvq level 6",
            "national vocational qualification",
            "nvq diploma",
        ],
    ),
    (
        DegreeCode::Hnd,
        &["hnd", "higher national diploma", "hnd in", "higher national diploma in"],
    ),
    (
        DegreeCode::Cima,
        &[
            "cima",
            "chartered institute of management accountants",
            "cima qualification",
        ],
    ),
    (
        DegreeCode::Acca,
        &["acca", "association of chartered certified accountants"],
    ),
    (
        DegreeCode::Ca,
        &[
            "chartered accountant",
            "institute of chartered accountants of sri lanka",
            "ica",
            "ca sri lanka",
        ],
    ),
    (
        DegreeCode::Slim,
        &["slim", "slim diploma", "sri lanka institute of marketing", "slim pgd"],
    ),
    (
        DegreeCode::Nibt,
        &["nibt", "national institute of business & technology", "nibt diploma"],
    ),
    (
        DegreeCode::Bit,
        &[
            "bit",
            "bachelor of information technology",
            "bit degree",
            "bit (colombo university)",
        ],
    ),
];

/// A single alias with its precompiled whole-word matcher.
pub struct DegreeVariant {
    pub text: &'static str,
    pub code: DegreeCode,
    pattern: Regex,
}

/// All variants sorted by length, longest first. Equal lengths keep table order.
/// A variant listed under two codes keeps its first position and its last code.
pub static SORTED_VARIANTS: LazyLock<Vec<DegreeVariant>> = LazyLock::new(|| {
    let mut order: Vec<&'static str> = Vec::new();
    let mut owner: HashMap<&'static str, DegreeCode> = HashMap::new();
    for (code, variants) in DEGREE_ALIASES {
        for variant in variants.iter().copied() {
            if owner.insert(variant, *code).is_none() {
                order.push(variant);
            }
        }
    }
    // stable: ties stay in insertion order
    order.sort_by_key(|v| std::cmp::Reverse(v.chars().count()));

    order
        .into_iter()
        .map(|text| DegreeVariant {
            text,
            code: owner[text],
            pattern: Regex::new(&variant_pattern(text)).expect("degree variant pattern is valid"),
        })
        .collect()
});

/// Whole-word matcher for one variant. `\b` is only asserted at edges that
/// are word characters, so "gce(al)" still matches itself.
fn variant_pattern(text: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let start = if is_word(text.chars().next()) { r"\b" } else { "" };
    let end = if is_word(text.chars().last()) { r"\b" } else { "" };
    format!("(?i){start}{}{end}", regex::escape(text))
}

const CONNECTOR_WORDS: &[&str] = &["in", "of", "on", "for", "at", "with", "to", "and"];

const FIELD_TRIM: &[char] = &[' ', ',', ':', '-', '.'];

static QUALIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)eng\(hons\)|eng\s*\(hons\)|\(hons\)|\(honors\)",
        r"|with\s*honors|with\s*honours|with\s*distinction",
        r"|first\s*class|second\s*class|upper\s*division|lower\s*division",
    ))
    .expect("qualifier pattern is valid")
});

static GCE_AL_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)g\.c\.e|gce|a/l|advanced level").expect("G.C.E A/L pattern is valid")
});

static GCE_OL_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)g\.c\.e|gce|o/l|ordinary level").expect("G.C.E O/L pattern is valid")
});

// ────────────────────────────────────────────────────────────────────────────
// Splitting
// ────────────────────────────────────────────────────────────────────────────

/// Result of splitting a raw education string.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeSplit {
    pub code: Option<DegreeCode>,
    /// Honors/distinction text as written, e.g. `"(Hons)"`.
    pub qualifier: Option<String>,
    pub field: String,
}

impl DegreeSplit {
    /// Code plus qualifier, e.g. `"BSC (Hons)"`. `None` when no code was found.
    pub fn label(&self) -> Option<String> {
        self.code.map(|code| match &self.qualifier {
            Some(q) => format!("{code} {q}"),
            None => code.to_string(),
        })
    }
}

/// Splits a degree string into a canonical code and a field of study.
///
/// Unrecognised text comes back as `code: None` with the trimmed input as
/// the field; this never fails.
pub fn split_degree(text: &str) -> DegreeSplit {
    let lower = text.to_lowercase();

    let matched = SORTED_VARIANTS
        .iter()
        .find(|variant| variant.pattern.is_match(&lower))
        .map(|variant| {
            let residue = variant.pattern.replace_all(text, "");
            (variant.code, residue.trim_matches(FIELD_TRIM).to_string())
        })
        .or_else(|| split_gce(text, &lower));

    let Some((code, mut field)) = matched else {
        return DegreeSplit {
            code: None,
            qualifier: None,
            field: text.trim().to_string(),
        };
    };

    let mut qualifier = None;
    if let Some(m) = QUALIFIER_RE.find(&field) {
        qualifier = Some(m.as_str().to_string());
        field = QUALIFIER_RE
            .replace_all(&field, "")
            .trim_matches(FIELD_TRIM)
            .to_string();
    }

    if let Some((_, after)) = field.split_once(',') {
        field = after.trim().to_string();
    }

    let field = field
        .split_whitespace()
        .skip_while(|token| CONNECTOR_WORDS.contains(&token.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ");

    DegreeSplit {
        code: Some(code),
        qualifier,
        field,
    }
}

/// G.C.E Advanced/Ordinary level detection for texts the alias table missed.
fn split_gce(text: &str, lower: &str) -> Option<(DegreeCode, String)> {
    if !(lower.contains("g.c.e") || lower.contains("gce")) {
        return None;
    }

    let (code, tokens) = if lower.contains("a/l") || lower.contains("advanced level") {
        (DegreeCode::Al, &*GCE_AL_TOKENS)
    } else if lower.contains("o/l") || lower.contains("ordinary level") {
        (DegreeCode::Ol, &*GCE_OL_TOKENS)
    } else {
        return None;
    };

    let field = tokens.replace_all(text, "");
    Some((code, field.trim_matches(FIELD_TRIM).to_string()))
}
