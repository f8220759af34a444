/// State management module
/// 
/// This module handles all catalog-side state, including:
/// - Database connections and queries (library.rs)
/// - Shared data structures (data.rs)
/// - Loading record files into the catalog (import.rs)

pub mod library;
pub mod data;
pub mod import;
