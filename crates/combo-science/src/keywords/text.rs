//! Word-level normalisation of titles and abstracts for phrase counting.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static DISPLAY_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$.*?\$\$").unwrap());
static INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[^$]*?\$").unwrap());
// \H{o}, \c{s}, \v{c}: keep the base letter
static LETTER_ACCENT_BRACED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[Hcvkrudbt]\{([a-zA-Z])\}").unwrap());
// \"{o}, \'{e}
static SYMBOL_ACCENT_BRACED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\\["'`^~.=]\{([a-zA-Z])\}"#).unwrap());
// \"o, \'e
static SYMBOL_ACCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\\["'`^~.=]([a-zA-Z])"#).unwrap());
static COMMAND_WITH_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[a-zA-Z]+\{[^}]*\}").unwrap());
static BARE_COMMAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[a-zA-Z]+").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+(?:-[a-z]+)*").unwrap());

/// English function words and paper boilerplate, sorted for binary search.
pub(crate) static STOPWORDS: &[&str] = &[
    "a", "about", "above", "acting", "active", "acute", "added", "adding", "additionally",
    "adjacent", "admit", "admitting", "after", "al", "all", "allow", "allowing", "almost",
    "also", "alternately", "always", "an", "analytic", "analytical", "and", "another",
    "answer", "any", "apart", "application", "approach", "appropriate", "arbitrary", "are",
    "argument", "arise", "as", "asked", "assigned", "assignment", "associated", "assume",
    "assuming", "at", "based", "be", "been", "behavior", "behaviour", "behind", "being",
    "belief", "belonging", "below", "between", "bijective", "both", "but", "by", "call",
    "called", "calling", "can", "case", "certain", "characterise", "characterize", "choose",
    "chosen", "classical", "clear", "combination", "combinatorial", "combine", "combining",
    "common", "compare", "competition", "computing", "concerning", "condition", "conjecture",
    "conjectured", "connecting", "consider", "consideration", "considered", "consisting",
    "constant", "construction", "constructive", "contain", "containing", "conventional",
    "corresponding", "could", "counting", "current", "declaring", "deep", "defined", "denote",
    "denoting", "depend", "depending", "describe", "describing", "determine", "determined",
    "determining", "did", "differ", "different", "direction", "disjoint", "do", "does", "draw",
    "due", "e", "each", "easier", "easily", "effective", "efficient", "efficiently",
    "enumerate", "enumerating", "equal", "equinumerous", "et", "eventually", "every",
    "exactly", "example", "excess", "exhibit", "exhibiting", "exist", "exists", "expanding",
    "explaining", "explicit", "exploit", "expression", "extend", "extending", "extension",
    "fairly", "few", "find", "first", "following", "for", "formalism", "found", "from", "full",
    "further", "furthermore", "g", "gave", "general", "generalise", "generalised",
    "generalising", "generalization", "generalize", "generalized", "generalizing",
    "generating", "generic", "give", "given", "gives", "had", "has", "have", "having", "hence",
    "her", "here", "hidden", "him", "his", "historic", "holding", "holds", "how", "however",
    "i", "if", "ii", "iii", "immediate", "immediately", "implicit", "important", "improve",
    "improved", "improving", "in", "include", "including", "independent", "independently",
    "induced", "infinite", "influence", "initial", "instance", "interest", "interesting",
    "intermediate", "into", "introduce", "intuition", "investigate", "involving", "is", "it",
    "its", "just", "key", "known", "large", "largest", "lead", "leading", "leads", "least",
    "left", "lemma", "less", "let", "literature", "london", "lying", "main", "many", "math",
    "may", "me", "mentioned", "method", "might", "moderate", "more", "moreover", "most",
    "much", "natural", "near", "needed", "new", "newly", "next", "nice", "no", "nontrivial",
    "not", "note", "now", "observe", "observing", "obtain", "obtained", "obvious", "occur",
    "occurring", "of", "often", "on", "one", "only", "opposite", "or", "other", "our", "out",
    "over", "paper", "parameter", "parameterise", "parameterised", "parameterize",
    "parameterized", "parameterizing", "parametrise", "parametrised", "parametrize",
    "parametrized", "parametrizing", "part", "per", "perhaps", "possible", "precisely",
    "prescribed", "present", "preserving", "pretty", "previous", "previously", "probably",
    "problem", "proc", "procedure", "produced", "producing", "proof", "property", "proportion",
    "prove", "proved", "proven", "proves", "quite", "quote", "quoting", "rare", "rather",
    "realized", "realizing", "reasonable", "recall", "recalling", "recent", "recently",
    "related", "relation", "relative", "relatively", "remain", "remaining", "require",
    "required", "research", "resp", "respectively", "restricted", "result", "results", "right",
    "robustly", "same", "satisfied", "satisfy", "satisfying", "say", "saying", "second",
    "seeming", "seems", "select", "setting", "several", "shall", "should", "show", "shown",
    "shows", "since", "slow", "small", "so", "so-called", "solvable", "some", "special",
    "specified", "staller", "stated", "straightforward", "structural", "structure", "studied",
    "studies", "study", "subject", "successively", "such", "sufficiently", "suppose",
    "supposing", "swap", "systematic", "technique", "technology", "than", "that", "the",
    "their", "them", "then", "theoretic", "there", "thereby", "therefore", "thereof", "these",
    "thesis", "they", "third", "this", "those", "three", "thus", "to", "triangle", "trivial",
    "two", "typical", "under", "underlying", "unexpected", "up", "us", "use", "used", "using",
    "usual", "variation", "various", "verifying", "via", "was", "way", "we", "well", "were",
    "what", "when", "where", "whereas", "whereby", "which", "while", "who", "whose", "will",
    "with", "without", "work", "would", "yield", "yielding",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Plurals that suffix rules get wrong, and singular words that look plural.
fn singular_override(word: &str) -> Option<&'static str> {
    Some(match word {
        "tableaux" => "tableau",
        "vertices" => "vertex",
        "matrices" => "matrix",
        "indices" => "index",
        "axes" => "axis",
        "bases" => "basis",
        "simplices" => "simplex",
        "radii" => "radius",
        "foci" => "focus",
        "tori" => "torus",
        "lemmata" => "lemma",
        "automata" => "automaton",
        "criteria" => "criterion",
        "phenomena" => "phenomenon",
        "strata" => "stratum",
        "series" => "series",
        "species" => "species",
        "erdos" => "erdos",
        "mobius" => "mobius",
        "thesis" => "thesis",
        "axis" => "axis",
        _ => return None,
    })
}

/// Singular form of a lowercase word.
pub fn singularize(word: &str) -> String {
    if let Some(singular) = singular_override(word) {
        return singular.to_string();
    }
    if is_stopword(word) || word.len() <= 3 {
        return word.to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

/// Remove LaTeX markup and fold to ASCII, keeping the natural-language words.
pub fn strip_latex(text: &str) -> String {
    let text = DISPLAY_MATH.replace_all(text, " ");
    let text = INLINE_MATH.replace_all(&text, " ");
    let text = LETTER_ACCENT_BRACED.replace_all(&text, "$1");
    let text = SYMBOL_ACCENT_BRACED.replace_all(&text, "$1");
    let text = SYMBOL_ACCENT.replace_all(&text, "$1");
    let text = COMMAND_WITH_ARG.replace_all(&text, " ");
    let text = BARE_COMMAND.replace_all(&text, " ");
    let text = text.replace(['{', '}'], " ");
    text.nfkd().filter(char::is_ascii).collect()
}

/// Lowercased, singularised word tokens; hyphenated compounds stay whole.
pub fn tokenize(text: &str) -> Vec<String> {
    let text = strip_latex(text).to_lowercase();
    WORD.find_iter(&text).map(|m| singularize(m.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwords_sorted() {
        assert!(STOPWORDS.windows(2).all(|w| w[0] < w[1]));
        assert!(is_stopword("the"));
        assert!(!is_stopword("tableau"));
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("tableaux"), "tableau");
        assert_eq!(singularize("polynomials"), "polynomial");
        assert_eq!(singularize("properties"), "property");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("classes"), "class");
        assert_eq!(singularize("sequences"), "sequence");
        assert_eq!(singularize("q-analogs"), "q-analog");
        assert_eq!(singularize("calculus"), "calculus");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("this"), "this");
        assert_eq!(singularize("was"), "was");
    }

    #[test]
    fn test_strip_latex() {
        let text = r#"M\"{o}bius functions of $S_n$ and Erd\H{o}s--Ko--Rado via \emph{shifting} $$x^2$$ {done}"#;
        let stripped = strip_latex(text);
        assert!(stripped.contains("Mobius functions of"));
        assert!(stripped.contains("Erdos--Ko--Rado"));
        assert!(!stripped.contains("S_n"));
        assert!(!stripped.contains("shifting"));
        assert!(!stripped.contains('{'));
        assert!(!stripped.contains("x^2"));
    }

    #[test]
    fn test_strip_latex_folds_unicode() {
        assert_eq!(strip_latex("Möbius Erdős"), "Mobius Erdos");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Standard Young Tableaux and q-Analogs of $\\binom{n}{k}$"),
            vec!["standard", "young", "tableau", "and", "q-analog", "of"]
        );
    }
}
