pub mod crawl;
pub mod extract;

// Re-export command functions for convenience
pub use crawl::crawl;
pub use extract::extract;
