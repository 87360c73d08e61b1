//! The markup reformatter: flat paragraph text to a LaTeX article source.
//!
//! Recognised page text already carries LaTeX-ish constructs: `\title{…}`,
//! `\author{…}`, `\footnotetext{…}` blocks and literal `\newpage` marker
//! paragraphs. This module reinterprets those for the fixed article preamble
//! and turns paragraph newlines into forced line breaks.
//!
//! ## Rule Order
//!
//! The rules are order-sensitive and non-idempotent: braced blocks are
//! rewritten before newline expansion so their embedded newlines collapse
//! inside the braces, and the literal cleanups afterwards fold the break
//! artifacts expansion leaves around `\newpage` markers and closing braces.
//! Reordering the passes changes the output. Malformed input (unbalanced
//! braces, nested blocks) produces undefined output; no well-formedness
//! check is performed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed document preamble every output starts with.
pub const LATEX_PREAMBLE: &str = r"\documentclass[14pt]{extarticle}
\usepackage[utf8]{inputenc}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{geometry}
\usepackage{fontspec}
\setmainfont{Times New Roman}
\geometry{
a4paper,
left=1in,
right=1in,
top=0.6in,
bottom=0.6in
}
\begin{document}
";

/// Fixed closing marker every output ends with.
pub const LATEX_CLOSING: &str = "\n\n\\end{document}\n";

/// Reformat recognised paragraph texts into a complete LaTeX source string.
///
/// Paragraphs are trimmed, joined with single newlines, rewritten by the
/// rules below, and wrapped in [`LATEX_PREAMBLE`] and [`LATEX_CLOSING`].
/// Pure and deterministic: identical input yields an identical string.
///
/// Rules (applied in order):
/// 1. `\title{…}` → `\section*{…}`; embedded newlines become spaces
/// 2. `\author{…}` → `\textbf{…}`; `\\` markers stripped, newlines become
///    spaces, result trimmed
/// 3. `\footnotetext{…}` keeps its name; embedded newlines removed
/// 4. Every remaining newline becomes a forced line break (`\\` plus a
///    blank line); the preamble is prefixed after this step
/// 5. Four literal replacements fold the artifacts rule 4 leaves around
///    `\newpage` markers and closing braces
/// 6. `\footnotetext` becomes `\let\thefootnote\relax\footnotetext`, so
///    footnotes render unnumbered
pub fn paragraphs_to_latex(paragraphs: &[String]) -> String {
    let joined = paragraphs
        .iter()
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join("\n");

    let s = rewrite_title_blocks(&joined);
    let s = rewrite_author_blocks(&s);
    let s = rewrite_footnote_blocks(&s);
    let s = break_lines(&s);

    let s = format!("{}{}", LATEX_PREAMBLE, s);
    let s = collapse_break_artifacts(&s);
    let s = suppress_footnote_numbering(&s);

    format!("{}{}", s, LATEX_CLOSING)
}

// ── Rule 1: title blocks become unnumbered sections ─────────────────────────

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\title\{([^}]*)\}").unwrap());

fn rewrite_title_blocks(input: &str) -> String {
    RE_TITLE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            format!("\\section*{{{}}}", caps[1].replace('\n', " "))
        })
        .to_string()
}

// ── Rule 2: author blocks become bold text ───────────────────────────────────

static RE_AUTHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\author\{([^}]*)\}").unwrap());

fn rewrite_author_blocks(input: &str) -> String {
    RE_AUTHOR
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let cleaned = caps[1].replace("\\\\", "").replace('\n', " ");
            format!("\\textbf{{{}}}", cleaned.trim())
        })
        .to_string()
}

// ── Rule 3: unwrap footnote text onto one line ───────────────────────────────

static RE_FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\footnotetext\{([^}]*)\}").unwrap());

fn rewrite_footnote_blocks(input: &str) -> String {
    RE_FOOTNOTE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            format!("\\footnotetext{{{}}}", caps[1].replace('\n', ""))
        })
        .to_string()
}

// ── Rule 4: newline → forced line break ──────────────────────────────────────

fn break_lines(input: &str) -> String {
    input.replace('\n', "\\\\\n\n")
}

// ── Rule 5: fold forced-break artifacts ──────────────────────────────────────
//
// Rule 4 expands every newline, including those around `\newpage` marker
// paragraphs and directly after rewritten `}` blocks. These four literal
// replacements undo exactly those expansions; the later patterns depend on
// what the earlier ones leave behind.

fn collapse_break_artifacts(input: &str) -> String {
    input
        .replace("\\newpage\\\\\n\n\\\\", "\\newpage")
        .replace("\\\\\n\n\\\\\n", "\\\\\n")
        .replace("\\\\\n\n\\newpage\n", "\n\n\\newpage\n")
        .replace("}\\\\", "}")
}

// ── Rule 6: unnumbered footnotes ─────────────────────────────────────────────

fn suppress_footnote_numbering(input: &str) -> String {
    input.replace("\\footnotetext", "\\let\\thefootnote\\relax\\footnotetext")
}

// ── Tests ────────────────────────────────────────────────────────────────────
