use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to find the path under which the mapper
/// crate is visible to generated code.
///
/// # Resolution rules
///
/// 1. If the requested crate is listed in `dependencies`, return `::crate_name`.
/// 2. If the requested crate name begins with `docmap_` and the caller depends
///    on the facade crate `docmap`, return `::docmap::short_name`
///    (e.g. `docmap_mapper` -> `::docmap::mapper`).
/// 3. Repeat steps 1-2 in `dev-dependencies`.
/// 4. Otherwise, fall back to `::crate_name`.
///
/// The mapper crate names itself through `extern crate self as docmap_mapper;`,
/// so the fallback is also correct inside the crate and its doctests.
#[derive(Debug)]
pub(crate) struct Manifest {
    manifest: Option<Document<Box<str>>>,
    modified_time: Option<SystemTime>,
}

const FACADE_NAME: &str = "docmap";
const FACADE_PREFIX: &str = "docmap_";

impl Manifest {
    fn manifest_path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        path.exists().then_some(path)
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok()
    }

    fn read(path: &Path) -> Option<Document<Box<str>>> {
        let manifest = std::fs::read_to_string(path).ok()?.into_boxed_str();
        Document::parse(manifest).ok()
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return syn::parse_str(&format!("::{name}")).ok();
        }
        let module = name.strip_prefix(FACADE_PREFIX)?;
        if deps.contains_key(FACADE_NAME) {
            return syn::parse_str(&format!("::{FACADE_NAME}::{module}")).ok();
        }
        None
    }

    /// Returns the path of the crate `name` as seen from the caller.
    pub(crate) fn get_crate_path(&self, name: &str) -> syn::Path {
        if let Some(manifest) = &self.manifest {
            for table in ["dependencies", "dev-dependencies"] {
                if let Some(Item::Table(deps)) = manifest.get(table)
                    && let Some(path) = Self::find_in_deps(deps, name)
                {
                    return path;
                }
            }
        }
        let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
        syn::parse_quote!(::#ident)
    }

    /// Runs `func` with the caller's manifest, reading it at most once per
    /// modification.
    pub(crate) fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let Some(path) = Self::manifest_path() else {
            return func(&Manifest {
                manifest: None,
                modified_time: None,
            });
        };
        let modified_time = Self::modified_time(&path);

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time.is_some()
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}

/// The path of the mapper crate as seen from the caller.
pub(crate) fn docmap_mapper() -> syn::Path {
    Manifest::shared(|manifest| manifest.get_crate_path("docmap_mapper"))
}
