//! Remote tier implementations.
//!
//! - [`ProxyClient`]: hosted proxy function, the primary tier.
//! - [`OpenRouterClient`]: direct chat-completions client, the fallback tier.
//!
//! Both implement [`RecipeService`]; payload normalisation shared between
//! them lives in [`parse`].

mod http;
pub mod openrouter;
pub mod parse;
pub mod prompt;
pub mod proxy;
pub mod traits;

pub use http::DEFAULT_HTTP_TIMEOUT;
pub use openrouter::OpenRouterClient;
pub use proxy::ProxyClient;
pub use traits::RecipeService;
