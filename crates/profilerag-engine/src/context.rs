use profilerag_core::types::Source;

const SEPARATOR: &str = "\n\n";

/// Concatenate passages in order while they fit in `char_budget` characters.
///
/// Stops at the first passage that would overflow; passages are never cut.
pub fn assemble_context(results: &[Source], char_budget: usize) -> String {
    let sep_chars = SEPARATOR.chars().count();
    let mut ctx = String::new();
    let mut used = 0usize;
    for r in results {
        let len = r.text.chars().count();
        if used + len + sep_chars > char_budget {
            break;
        }
        ctx.push_str(&r.text);
        ctx.push_str(SEPARATOR);
        used += len + sep_chars;
    }
    ctx.trim_end().to_string()
}
