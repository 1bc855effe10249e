pub mod trends_parser;

pub use trends_parser::TrendsParser;
