pub mod generate;

pub use generate::{
    generate_blog_post, merge_tags, parse_generated_post, GenerateRequest, GeneratedPost,
    GenerationError,
};
