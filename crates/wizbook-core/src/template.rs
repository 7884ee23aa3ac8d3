//! Template Fallback Writer
//!
//! Deterministic book generation used when no LLM provider is reachable.
//! This is a product behavior, not an error path: generation must always
//! return content, and the template output is sold and exported like any
//! provider completion.

use crate::content::GenerateRequest;

/// Provider name recorded on template-generated content
pub const PROVIDER_NAME: &str = "template";

/// Write a complete book for the request without any provider call
///
/// Output is a pure function of the request fields.
pub fn write_book(request: &GenerateRequest) -> String {
    let topic = request.topic.trim();
    let lower = topic.to_lowercase();
    let audience = request.audience();

    format!(
        "# The Complete Guide to {topic}\n\
         \n\
         *Your step-by-step roadmap to mastering {lower}, written for {audience}.*\n\
         \n\
         ## Table of Contents\n\
         1. Introduction\n\
         2. Getting Started\n\
         3. Core Principles\n\
         4. Practical Applications\n\
         5. Advanced Techniques\n\
         6. Common Mistakes\n\
         7. Best Practices\n\
         8. Next Steps\n\
         \n\
         ## Introduction\n\
         \n\
         Welcome to your comprehensive guide to {lower}. This book is designed \
         to take you from complete beginner to confident practitioner.\n\
         \n\
         💡 **Pro Tip:** The fastest way to learn {lower} is through consistent \
         practice and real-world application.\n\
         \n\
         ### What You'll Learn\n\
         - Fundamental concepts and terminology\n\
         - Step-by-step implementation guides\n\
         - Industry best practices\n\
         - Common pitfalls and how to avoid them\n\
         \n\
         ## Getting Started\n\
         \n\
         Before diving into {lower}, make sure you have a clear understanding \
         of your goals, access to the necessary tools, and a commitment to \
         regular practice.\n\
         \n\
         1. **Assess your current knowledge level**\n\
         2. **Set specific, measurable goals**\n\
         3. **Create a learning schedule**\n\
         4. **Find a community of practitioners**\n\
         \n\
         ## Core Principles\n\
         \n\
         ### Foundation First\n\
         Master the basics before attempting advanced techniques. A solid \
         foundation ensures long-term success with {lower}.\n\
         \n\
         ### Practice Regularly\n\
         Consistency beats intensity. Daily practice, even for 15-30 minutes, \
         yields better results than occasional marathon sessions.\n\
         \n\
         ### Learn by Doing\n\
         Theory is important, but hands-on experience is irreplaceable. Apply \
         concepts immediately after learning them.\n\
         \n\
         ## Practical Applications\n\
         \n\
         Start with a small project: define clear objectives, break the work \
         into manageable tasks, set realistic timelines, and monitor progress. \
         When you hit a complex challenge, research similar problems, test \
         solutions incrementally, and document what works.\n\
         \n\
         💡 **Pro Tip:** Keep a learning journal to track progress and insights.\n\
         \n\
         ## Advanced Techniques\n\
         \n\
         Once the fundamentals feel routine, identify bottlenecks in your \
         workflow and implement incremental improvements. Join professional \
         communities, contribute to open projects, and teach others what you \
         have learned about {lower}.\n\
         \n\
         ## Common Mistakes\n\
         \n\
         ### Skipping Fundamentals\n\
         Rushing to advanced topics without solid basics. Invest time in core \
         concepts first.\n\
         \n\
         ### Working in Isolation\n\
         Trying to learn everything alone. Connect with communities and find \
         mentors.\n\
         \n\
         ### Analysis Paralysis\n\
         Over-researching without taking action. Set learning deadlines and \
         prioritize doing.\n\
         \n\
         ## Best Practices\n\
         \n\
         Set aside dedicated learning time daily, review your progress weekly, \
         and tackle a more ambitious project each month. Share your results; \
         feedback accelerates learning more than any resource.\n\
         \n\
         ## Next Steps\n\
         \n\
         Within the next week, set up your environment, define three specific \
         goals, and complete your first practice exercise. Within a month, \
         finish a small project and connect with other learners. Mastering \
         {lower} is a journey; progress over perfection.\n\
         \n\
         💡 **Final Pro Tip:** The best time to start was yesterday. The second \
         best time is now.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::count_words;

    #[test]
    fn test_template_is_deterministic() {
        let request = GenerateRequest::new("Rust Programming");
        assert_eq!(write_book(&request), write_book(&request));
    }

    #[test]
    fn test_template_mentions_topic() {
        let request = GenerateRequest::new("Urban Gardening");
        let body = write_book(&request);
        assert!(body.contains("Urban Gardening"));
        assert!(body.contains("urban gardening"));
    }

    #[test]
    fn test_template_has_substantial_content() {
        let request = GenerateRequest::new("Chess");
        let body = write_book(&request);
        assert!(count_words(&body) > 300);
        assert!(body.starts_with("# The Complete Guide to Chess"));
    }
}
