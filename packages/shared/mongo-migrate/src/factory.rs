use crate::{Migration, MigrationRegistry, Result};

/// Migration registration submitted by the `register_migration!` macro.
pub struct MigrationRegistration {
    pub name: &'static str,
    pub constructor: fn() -> Box<dyn Migration>,
}

impl MigrationRegistration {
    pub const fn new(name: &'static str, constructor: fn() -> Box<dyn Migration>) -> Self {
        Self { name, constructor }
    }
}

inventory::collect!(MigrationRegistration);

/// Assemble a registry from every `register_migration!` submission in the
/// binary. Duplicate versions surface as a configuration error.
pub fn collect_registry() -> Result<MigrationRegistry> {
    let mut registry = MigrationRegistry::new();

    for registration in inventory::iter::<MigrationRegistration>() {
        let migration = (registration.constructor)();
        tracing::debug!(name = registration.name, version = migration.version(), "discovered migration");
        registry = registry.register_boxed(migration)?;
    }

    tracing::info!("migration registry assembled with {} migrations", registry.count());
    Ok(registry)
}

/// Names of all migrations registered through the inventory system.
pub fn registered_migration_names() -> Vec<&'static str> {
    inventory::iter::<MigrationRegistration>()
        .map(|reg| reg.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_registry() {
        // No migrations are registered inside the framework crate itself;
        // collection must still succeed.
        let registry = collect_registry().unwrap();
        assert_eq!(registry.count(), registered_migration_names().len());
    }
}
