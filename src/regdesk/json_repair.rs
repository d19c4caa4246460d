//! Best-effort normalization of model-produced tool arguments into valid JSON.
//!
//! Small language models routinely emit almost-JSON: fenced code blocks, bare
//! object keys, single quotes, trailing commas. [`repair`] rewrites the common
//! defect classes in a fixed order so that a subsequent `serde_json` parse has
//! a fighting chance. The output is "probably-JSON", not validated JSON —
//! callers must still guard the parse and fall back to an empty argument
//! object when it fails (the dispatcher does exactly that).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"```(?:json)?([^`]+)```").unwrap();
    static ref BARE_KEY: Regex = Regex::new(r"(\s*?)(\w+)(:)").unwrap();
    static ref TRAILING_COMMA_OBJ: Regex = Regex::new(r",\s*\}").unwrap();
    static ref TRAILING_COMMA_ARR: Regex = Regex::new(r",\s*\]").unwrap();
}

/// Rewrite `raw` so it is syntactically closer to valid JSON.
///
/// Transformations, each best-effort and applied in this order:
/// 1. strip Markdown code-fence wrappers (with an optional `json` tag);
/// 2. quote bare object keys (word characters followed by a colon);
/// 3. replace single quotes with double quotes;
/// 4. remove trailing commas before `}` or `]`.
///
/// Never fails; on input with none of those defects the text passes through
/// unchanged (already-quoted keys are not re-quoted).
pub fn repair(raw: &str) -> String {
    let fixed = CODE_FENCE.replace_all(raw, "${1}");
    let fixed = fixed.trim();

    let fixed = BARE_KEY.replace_all(fixed, "${1}\"${2}\"${3}");
    let fixed = fixed.replace('\'', "\"");

    let fixed = TRAILING_COMMA_OBJ.replace_all(&fixed, "}");
    let fixed = TRAILING_COMMA_ARR.replace_all(&fixed, "]");

    fixed.into_owned()
}
