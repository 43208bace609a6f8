/// Topic categories the automation rotates through, in order.
pub const BLOG_CATEGORIES: [&str; 8] = [
    "Software Development",
    "Artificial Intelligence",
    "Cloud Architecture",
    "DevOps",
    "Product Design",
    "Data Engineering",
    "Cybersecurity",
    "Digital Transformation",
];

pub fn default_categories() -> Vec<String> {
    BLOG_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Prompt template for one automation tick.
pub fn build_prompt(category: &str) -> String {
    format!(
        "Write an insightful blog post for our company blog in the \"{category}\" category.\n\
         \n\
         Pick a specific, current topic within {category} that is useful to engineering \
         leaders and product teams. Aim for 800 to 1200 words with a clear introduction, \
         three to five sections with Markdown headings, concrete examples and a short \
         conclusion with practical takeaways.\n\
         \n\
         Include \"{category}\" related tags."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_category() {
        let prompt = build_prompt("DevOps");
        assert!(prompt.contains("\"DevOps\" category"));
    }

    #[test]
    fn test_default_categories_are_unique() {
        let categories = default_categories();
        let mut deduped = categories.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), categories.len());
    }
}
