//! 服务模块

pub mod external;
pub mod memoization;
pub mod resolver;

pub use external::{DuckDuckGoResolver, ExternalResolver, create_external_resolver};
pub use memoization::MemoizationStore;
pub use resolver::{AnswerSource, Resolution, Resolver, ResolverOptions};
