pub mod editing;
pub mod inline_query;
