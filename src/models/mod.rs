mod article;
mod collection;

pub use article::{Article, ArticleStatus};
pub use collection::{Collection, Partition, Watermark};
