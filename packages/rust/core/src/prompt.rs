//! Rewrite prompt construction.

/// Build the SEO rewrite prompt.
///
/// Pure and deterministic: `knowledge`, `keyword` and `original` are embedded
/// verbatim. The model is told to answer in a fixed `Before:` /
/// `After (LLM-generated):` layout.
pub fn build_prompt(original: &str, keyword: &str, knowledge: &str) -> String {
    format!(
        "Use the following website knowledge to rewrite the content with SEO improvements:\n\
         - Optimize keyword placement for '{keyword}'.\n\
         - Improve readability while maintaining factual accuracy.\n\
         \n\
         Website Knowledge:\n\
         {knowledge}\n\
         \n\
         Strictly format the output as follows:\n\
         Before: {original}\n\
         After (LLM-generated): <Optimized Content>\n"
    )
}
