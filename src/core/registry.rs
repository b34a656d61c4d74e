use crate::domain::ports::Scanner;
use crate::utils::error::{Result, SweepError};
use std::collections::HashMap;
use std::sync::Arc;

/// Scanners keyed by argument name, iterated in registration order.
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: Vec<Arc<dyn Scanner>>,
    index: HashMap<String, usize>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Scanner + 'static>(&mut self, scanner: S) -> Result<()> {
        self.register_arc(Arc::new(scanner))
    }

    pub fn register_arc(&mut self, scanner: Arc<dyn Scanner>) -> Result<()> {
        let name = scanner.argument_name().to_string();
        if self.index.contains_key(&name) {
            return Err(SweepError::DuplicateScanner { name });
        }

        tracing::debug!("Registered scanner {} ({})", name, scanner.label());
        self.index.insert(name, self.scanners.len());
        self.scanners.push(scanner);
        Ok(())
    }

    pub fn get(&self, argument_name: &str) -> Option<Arc<dyn Scanner>> {
        self.index
            .get(argument_name)
            .map(|&i| Arc::clone(&self.scanners[i]))
    }

    pub fn all(&self) -> &[Arc<dyn Scanner>] {
        &self.scanners
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scanners.iter().map(|s| s.argument_name())
    }

    /// Resolves CLI selectors. An empty selection means every scanner;
    /// repeated names are run once, in the order first given.
    pub fn select(&self, names: &[String]) -> Result<Vec<Arc<dyn Scanner>>> {
        if names.is_empty() {
            return Ok(self.scanners.clone());
        }

        let mut selected: Vec<Arc<dyn Scanner>> = Vec::with_capacity(names.len());
        for name in names {
            let scanner = self.get(name).ok_or_else(|| SweepError::UnknownScanner {
                name: name.clone(),
            })?;
            if !selected
                .iter()
                .any(|s| s.argument_name() == scanner.argument_name())
            {
                selected.push(scanner);
            }
        }
        Ok(selected)
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}
