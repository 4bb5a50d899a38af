use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::RecordType;
use crate::error::RegistrationError;

#[derive(Default)]
struct Tables {
    by_name: HashMap<String, Arc<RecordType>>,
    by_type: HashMap<TypeId, Arc<RecordType>>,
}

/// Declared name → record type table.
///
/// The only way a decoded `__class__` string turns into a type. Names are
/// never evaluated or imported: an unregistered name is a hard failure.
/// Writers are serialized by a mutex and publish a fresh snapshot; readers
/// load the current snapshot without locking.
pub struct RecordTypeRegistry {
    tables: ArcSwap<Tables>,
    write: Mutex<()>,
    frozen: AtomicBool,
}

impl RecordTypeRegistry {
    pub fn new() -> Self {
        Self {
            tables: ArcSwap::from_pointee(Tables::default()),
            write: Mutex::new(()),
            frozen: AtomicBool::new(false),
        }
    }

    /// Register `record_type` under its declared name.
    pub fn register(&self, record_type: RecordType) -> Result<(), RegistrationError> {
        let _guard = self.write.lock();
        if self.frozen.load(Ordering::Acquire) {
            return Err(RegistrationError::Frozen(record_type.name().to_string()));
        }

        let current = self.tables.load();
        if current.by_name.contains_key(record_type.name()) {
            return Err(RegistrationError::DuplicateRecordName(
                record_type.name().to_string(),
            ));
        }
        if let Some(existing) = current.by_type.get(&record_type.rust_type()) {
            return Err(RegistrationError::DuplicateRecordImpl {
                rust_type: record_type.rust_type_name(),
                name: existing.name().to_string(),
            });
        }

        let record_type = Arc::new(record_type);
        let mut by_name = current.by_name.clone();
        let mut by_type = current.by_type.clone();
        by_name.insert(record_type.name().to_string(), record_type.clone());
        by_type.insert(record_type.rust_type(), record_type.clone());
        self.tables.store(Arc::new(Tables { by_name, by_type }));

        tracing::debug!(
            name = record_type.name(),
            rust_type = record_type.rust_type_name(),
            attributes = ?record_type.exposed_attributes(),
            "registered record type"
        );
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<RecordType>> {
        self.tables.load().by_name.get(name).cloned()
    }

    pub fn by_type(&self, rust_type: TypeId) -> Option<Arc<RecordType>> {
        self.tables.load().by_type.get(&rust_type).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.load().by_name.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.load().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.load().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End the registration phase.
    pub fn freeze(&self) {
        let _guard = self.write.lock();
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

impl Default for RecordTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
