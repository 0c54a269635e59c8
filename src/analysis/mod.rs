//! Analysis modules.
//!
//! An analyzer drains the collector's output stream until it closes. It may
//! not assume any ordering across users. Within one user, cached entries come
//! before freshly fetched ones, but cached entries are in no particular order.
//!
//! Analyzers are selected by name from an [`AnalyzerRegistry`] built at
//! startup.

mod averages;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::PostEntry;

pub use averages::{Averages, UserAverages};

/// A consumer of the collected post stream.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Name used to select this module on the command line.
    fn name(&self) -> &'static str;

    /// One-line description shown in module listings.
    fn description(&self) -> &'static str;

    /// Drain `entries` until the stream closes and report the result.
    async fn analyze(&self, entries: mpsc::Receiver<PostEntry>) -> Result<()>;
}

/// Name-indexed set of analysis modules.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing every built-in module.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Averages::new()));
        registry
    }

    /// Add a module, replacing any module registered under the same name.
    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.retain(|a| a.name() != analyzer.name());
        self.analyzers.push(analyzer);
    }

    /// Look up a module by name.
    pub fn get(&self, name: &str) -> Result<&dyn Analyzer> {
        self.analyzers
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
            .ok_or_else(|| AppError::UnknownModule(name.to_string()))
    }

    /// Iterate over registered modules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Analyzer> {
        self.analyzers.iter().map(|a| a.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|a| a.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Discard;

    #[async_trait]
    impl Analyzer for Discard {
        fn name(&self) -> &'static str {
            "discard"
        }

        fn description(&self) -> &'static str {
            "Drops every entry"
        }

        async fn analyze(&self, mut entries: mpsc::Receiver<PostEntry>) -> Result<()> {
            while entries.recv().await.is_some() {}
            Ok(())
        }
    }

    #[test]
    fn test_defaults_include_averages() {
        let registry = AnalyzerRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["averages"]);
        assert_eq!(registry.get("averages").unwrap().name(), "averages");
    }

    #[test]
    fn test_unknown_module() {
        let registry = AnalyzerRegistry::with_defaults();
        let err = registry.get("sentiment").err().unwrap();
        assert!(matches!(err, AppError::UnknownModule(ref name) if name == "sentiment"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = AnalyzerRegistry::new();
        registry.register(Box::new(Discard));
        registry.register(Box::new(Discard));
        registry.register(Box::new(Averages::new()));
        assert_eq!(registry.names(), vec!["discard", "averages"]);
    }

    #[tokio::test]
    async fn test_analyzer_drains_until_closed() {
        let registry = {
            let mut registry = AnalyzerRegistry::new();
            registry.register(Box::new(Discard));
            registry
        };
        let (tx, rx) = mpsc::channel(1);
        let producer = async move {
            for id in 1..=5 {
                tx.send(PostEntry::new("jack", crate::models::Post::new(id)))
                    .await
                    .unwrap();
            }
        };

        let (_, result) = tokio::join!(producer, registry.get("discard").unwrap().analyze(rx));
        assert!(result.is_ok());
    }
}
