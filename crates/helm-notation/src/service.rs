use std::sync::Arc;

use crate::{
    HelmConfig, Hypergraph, NotationCache, ParseError, ParsedDocument, Result, build, parse, serialize,
};

/// The entry point for applications: owns the configuration and the cache of derived views
///
/// Construct one at startup and share it (it's `Send + Sync`) with anything that needs to read notation. `V` is the
/// type of view cached by [`NotationService::view()`].
#[derive(Debug)]
pub struct NotationService<V> {
    config: HelmConfig,
    cache: NotationCache<V>,
}

impl<V> NotationService<V> {
    #[must_use]
    pub fn new(config: HelmConfig) -> Self {
        let cache = NotationCache::with_capacity(config.cache.effective_capacity());
        Self { config, cache }
    }

    #[must_use]
    pub const fn config(&self) -> &HelmConfig {
        &self.config
    }

    #[must_use]
    pub const fn cache(&self) -> &NotationCache<V> {
        &self.cache
    }

    /// # Errors
    ///
    /// Fails if `notation` isn't valid HELM notation.
    pub fn parse(&self, notation: &str) -> Result<ParsedDocument, ParseError> {
        parse(notation)
    }

    /// Parses `notation` and builds its hypergraph
    ///
    /// # Errors
    ///
    /// Fails if `notation` can't be parsed, or describes a graph that can't be built.
    pub fn load(&self, notation: &str) -> Result<Hypergraph> {
        let document = parse(notation)?;
        Ok(build(&document)?)
    }

    /// # Errors
    ///
    /// Fails for the same reasons as [`NotationService::load()`].
    pub fn canonicalize(&self, notation: &str) -> Result<String> {
        self.load(notation).map(|graph| serialize(&graph))
    }

    /// Returns the view derived from the hypergraph of `notation`, computing and caching it only if the cache has
    /// nothing for an equivalent notation
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as [`NotationService::load()`], in which case nothing is cached.
    pub fn view(&self, notation: &str, derive: impl FnOnce(&Hypergraph) -> V) -> Result<Arc<V>> {
        self.cache
            .get_or_compute(notation, || self.load(notation).map(|graph| derive(&graph)))
    }
}

impl<V> Default for NotationService<V> {
    fn default() -> Self {
        Self::new(HelmConfig::default())
    }
}

static_assertions::assert_impl_all!(NotationService<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{CacheConfig, Error, GraphError, MAXIMUM_CACHE_SIZE};

    #[test]
    fn configured_capacity() {
        let service: NotationService<()> = NotationService::default();
        assert_eq!(service.cache().capacity(), service.config().cache.capacity);

        let config = HelmConfig {
            cache: CacheConfig { capacity: 99 },
        };
        let service: NotationService<()> = NotationService::new(config);
        assert_eq!(service.config().cache.capacity, 99);
        assert_eq!(service.cache().capacity(), MAXIMUM_CACHE_SIZE);
    }

    #[test]
    fn canonicalize() {
        let service: NotationService<()> = NotationService::default();
        assert_eq!(
            service.canonicalize("RNA2{R(A)P}|CHEM4{SMCC}$RNA2,CHEM4,3:R2-1:R1$$$").unwrap(),
            "RNA1{R(A)P}|CHEM1{SMCC}$RNA1,CHEM1,3:R2-1:R1$$$"
        );
        assert!(matches!(service.canonicalize("RNA1{R(A)P}$$$"), Err(Error::Parse(_))));
        assert!(matches!(
            service.canonicalize("RNA1{R(A)P}$RNA1,RNA1,4:R2-1:R1$$$"),
            Err(Error::Graph(GraphError::DanglingConnection { .. }))
        ));
        // Nothing is cached outside of `view()`
        assert!(service.cache().is_empty());
    }

    #[test]
    fn views_are_cached() {
        let service = NotationService::default();
        let derivations = Cell::new(0);
        let monomer_count = |graph: &Hypergraph| {
            derivations.set(derivations.get() + 1);
            graph.node_count()
        };

        let view = service.view("RNA1{R(A)P.R(C)}$$$$", monomer_count).unwrap();
        assert_eq!(*view, 5);
        let view = service.view("RNA1{R(A)P.R(C)} $ $ $ $", monomer_count).unwrap();
        assert_eq!(*view, 5);
        assert_eq!(derivations.get(), 1);
        assert_eq!(service.cache().usage("RNA1{R(A)P.R(C)}$$$$"), Some(1));

        let view = service.view("PEPTIDE1{G'4'}$$$$", monomer_count).unwrap();
        assert_eq!(*view, 4);
        assert_eq!(derivations.get(), 2);
        assert_eq!(service.cache().len(), 2);
    }

    #[test]
    fn annotations_keep_views_apart() {
        let service = NotationService::default();
        let first = service.view("RNA1{R}$$$RNA1{x[}$", serialize).unwrap();
        let second = service.view("RNA1{R}$$$RNA1{y[}$", serialize).unwrap();
        assert_eq!(*first, "RNA1{R}$$$RNA1{x[}$");
        assert_eq!(*second, service.canonicalize("RNA1{R}$$$RNA1{y[}$").unwrap());
        assert_eq!(*second, "RNA1{R}$$$RNA1{y[}$");

        let nested = service.view("RNA1{R}$$$RNA1{a{b}$", serialize).unwrap();
        assert_eq!(*nested, "RNA1{R}$$$RNA1{a{b}$");
        assert_eq!(service.cache().len(), 3);
    }

    #[test]
    fn failed_views_are_not_cached() {
        let service: NotationService<usize> = NotationService::default();
        let result = service.view("RNA1{R(A)}$$$CHEM1{linker}$", Hypergraph::node_count);
        assert!(matches!(
            result,
            Err(Error::Graph(GraphError::DanglingAnnotation { .. }))
        ));
        assert!(service.cache().is_empty());
    }

    #[test]
    fn parse() {
        let service: NotationService<()> = NotationService::default();
        let document = service.parse("RNA1{R(A)P}|RNA2{R(U)P}$$$$").unwrap();
        assert_eq!(document.polymers().len(), 2);
        assert!(service.parse("DNA1{A}$$$$").is_err());
    }
}
