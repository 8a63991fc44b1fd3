//! Filesystem discovery of migration source files.
//!
//! Migration files follow the `mNNN_snake_case_name.rs` convention; the
//! struct inside is the CamelCase form of the name. Discovery is a
//! development aid (`discover`/`generate` CLI commands); at runtime the
//! registry is assembled through the inventory system.

use std::fs;
use std::path::PathBuf;

use regex::Regex;

use crate::{MigrationError, Result};

const DEFAULT_FILE_PATTERN: &str = r"^m(\d{3})_([a-z][a-z0-9_]*)\.rs$";

/// A migration source file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFileInfo {
    pub version: u32,
    /// File name, e.g. `m001_seed_users.rs`
    pub file_name: String,
    /// Module name, e.g. `m001_seed_users`
    pub module_name: String,
    /// Expected struct name, e.g. `SeedUsers`
    pub struct_name: String,
}

/// Scans a directory for migration files.
pub struct MigrationLoader {
    directory: PathBuf,
    pattern: Regex,
}

impl MigrationLoader {
    /// Create a loader for `directory`. A custom file pattern may be given;
    /// it must capture the version digits and the snake_case name.
    pub fn new(directory: impl Into<PathBuf>, pattern: Option<Regex>) -> Result<Self> {
        let pattern = match pattern {
            Some(pattern) => pattern,
            None => Regex::new(DEFAULT_FILE_PATTERN)
                .map_err(|e| MigrationError::Config(format!("invalid file pattern: {}", e)))?,
        };

        Ok(Self {
            directory: directory.into(),
            pattern,
        })
    }

    /// Discover migration files, sorted by version.
    pub fn discover(&self) -> Result<Vec<MigrationFileInfo>> {
        let mut found = Vec::new();

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(captures) = self.pattern.captures(&file_name) else {
                continue;
            };

            let version: u32 = captures[1].parse().map_err(|_| {
                MigrationError::Config(format!("invalid version digits in '{}'", file_name))
            })?;

            let module_name = file_name.trim_end_matches(".rs").to_string();
            let struct_name = camel_case(&captures[2]);

            found.push(MigrationFileInfo {
                version,
                file_name,
                module_name,
                struct_name,
            });
        }

        found.sort_by_key(|info| info.version);
        Ok(found)
    }

    /// Print the discovered files with their expected struct names.
    pub fn print_discovered_migrations(&self) -> Result<()> {
        let found = self.discover()?;

        if found.is_empty() {
            println!("No migration files found in {}", self.directory.display());
            return Ok(());
        }

        println!("Found {} migration file(s) in {}:", found.len(), self.directory.display());
        for info in &found {
            println!("  {:>3}  {}  ->  {}", info.version, info.file_name, info.struct_name);
        }
        Ok(())
    }

    /// Generate module declarations for the discovered files (legacy; with
    /// inventory-based discovery this is mainly for reference).
    pub fn generate_registry_code(&self) -> Result<String> {
        let found = self.discover()?;

        let mut code = String::new();
        code.push_str("//! Migration module declarations.\n");
        code.push_str("//!\n");
        code.push_str("//! Generated by `migrate generate`; migrations self-register through\n");
        code.push_str("//! the inventory system when their module is included.\n\n");

        for info in &found {
            code.push_str(&format!("pub mod {};\n", info.module_name));
        }

        Ok(code)
    }
}

/// `seed_users` -> `SeedUsers`
fn camel_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("seed_users"), "SeedUsers");
        assert_eq!(camel_case("seed_orders"), "SeedOrders");
        assert_eq!(camel_case("add_v2_index"), "AddV2Index");
    }

    #[test]
    fn test_discover_and_generate() {
        let dir = std::env::temp_dir().join(format!("mongo-migrate-loader-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("m002_seed_orders.rs"), "").unwrap();
        fs::write(dir.join("m001_seed_users.rs"), "").unwrap();
        fs::write(dir.join("mod.rs"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();

        let loader = MigrationLoader::new(&dir, None).unwrap();
        let found = loader.discover().unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].version, 1);
        assert_eq!(found[0].module_name, "m001_seed_users");
        assert_eq!(found[0].struct_name, "SeedUsers");
        assert_eq!(found[1].version, 2);
        assert_eq!(found[1].struct_name, "SeedOrders");

        let code = loader.generate_registry_code().unwrap();
        assert!(code.contains("pub mod m001_seed_users;"));
        assert!(code.contains("pub mod m002_seed_orders;"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_discover_missing_directory() {
        let loader = MigrationLoader::new("/nonexistent/migrations/path", None).unwrap();
        assert!(loader.discover().is_err());
    }
}
