use std::fmt;
use std::fs::{self, DirBuilder};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thingbase_locator::{ResolvedThingLocation, Resolver};
use thingbase_record::{codec, extract_document, Thing};
use thingbase_schema::ValidationOutcome;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::remote::RemoteSource;

const TEMP_PREFIX: &str = ".thingbase-";

/// Reads, writes and validates Things addressed by locators.
///
/// Every operation first resolves its locator against the given context,
/// so containment and scheme policy apply uniformly. Only read-write local
/// locations are ever written.
pub struct ThingStore {
    resolver: Resolver,
    config: StoreConfig,
    remote: Option<Box<dyn RemoteSource>>,
}

impl ThingStore {
    pub fn new(resolver: Resolver, config: StoreConfig) -> Self {
        Self {
            resolver,
            config,
            remote: None,
        }
    }

    /// Serve read-only remote locations from `remote`.
    pub fn with_remote(mut self, remote: impl RemoteSource + 'static) -> Self {
        self.remote = Some(Box::new(remote));
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Read and parse the Thing at `locator`.
    ///
    /// A Thing stored without an identifier comes back with a fresh one; the
    /// file itself is not touched.
    pub fn read(&self, locator: &str, context: &str, context_required: bool) -> StoreResult<Thing> {
        let document = self.read_bytes(locator, context, context_required)?;
        Ok(codec::parse(document.as_bytes())?)
    }

    /// The single YAML document at `locator`, without its `---` marker.
    pub fn read_bytes(
        &self,
        locator: &str,
        context: &str,
        context_required: bool,
    ) -> StoreResult<String> {
        let location = self.resolver.resolve(locator, context, context_required)?;
        let raw = self.fetch(&location)?;
        let text = String::from_utf8(raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        extract_document(&text).map_err(|source| StoreError::NoSensibleDocument {
            location: location.to_string(),
            source,
        })
    }

    /// Write `thing` to `locator`, assigning an identifier if it has none.
    ///
    /// Without `overwrite`, an existing entry fails with
    /// [`StoreError::AlreadyExists`] and is left as it was, even if another
    /// process creates it between the check and the final link.
    pub fn write(
        &self,
        thing: &mut Thing,
        locator: &str,
        context: &str,
        context_required: bool,
        overwrite: bool,
    ) -> StoreResult<PathBuf> {
        let location = self.resolver.resolve(locator, context, context_required)?;
        let path = target_file(&location)?;
        let dir = match path.parent() {
            Some(dir) => dir.to_path_buf(),
            None => return Err(StoreError::NotAFile { path }),
        };

        check_ancestors(&dir)?;
        if !overwrite && entry_exists(&path)? {
            return Err(StoreError::AlreadyExists { path });
        }

        let bytes = codec::to_file_bytes(thing)?;
        self.create_dir(&dir)?;
        self.persist(&dir, &path, &bytes, overwrite)?;

        info!(
            path = %path.display(),
            id = thing.identifier(),
            overwrite,
            "wrote thing"
        );
        Ok(path)
    }

    /// Create a new Thing at `locator`. Never replaces an existing entry.
    pub fn create_new(
        &self,
        locator: &str,
        context: &str,
        context_required: bool,
    ) -> StoreResult<(Thing, PathBuf)> {
        let mut thing = Thing::new();
        let path = self.write(&mut thing, locator, context, context_required, false)?;
        Ok((thing, path))
    }

    /// Validate the document at `thing` against the schema at `schema`.
    ///
    /// Both locators resolve against the same context.
    pub fn validate(
        &self,
        thing: &str,
        schema: &str,
        context: &str,
        context_required: bool,
    ) -> StoreResult<ValidationOutcome> {
        let document = self.read_bytes(thing, context, context_required)?;
        let schema_document = self.read_bytes(schema, context, context_required)?;
        let outcome = thingbase_schema::validate(schema_document.as_bytes(), document.as_bytes())?;
        debug!(
            thing,
            schema,
            violations = outcome.violations().len(),
            "validated thing"
        );
        Ok(outcome)
    }

    fn fetch(&self, location: &ResolvedThingLocation) -> StoreResult<Vec<u8>> {
        if location.writable() {
            let path = local_path(location)?;
            debug!(path = %path.display(), "reading local thing");
            return Ok(fs::read(&path)?);
        }
        match &self.remote {
            Some(remote) => {
                debug!(%location, "fetching remote thing");
                remote
                    .fetch(location)
                    .map_err(|source| StoreError::Remote {
                        location: location.to_string(),
                        source,
                    })
            }
            None => Err(StoreError::NotLocal {
                location: location.to_string(),
            }),
        }
    }

    fn create_dir(&self, dir: &Path) -> StoreResult<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.config.dir_mode);
        }
        builder.create(dir)?;
        Ok(())
    }

    /// Write to a temp file beside `path`, fsync, then link it into place.
    fn persist(&self, dir: &Path, path: &Path, bytes: &[u8], overwrite: bool) -> StoreResult<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(self.config.file_mode))?;
        }
        temp.as_file().sync_all()?;

        let linked = if overwrite {
            temp.persist(path)
        } else {
            temp.persist_noclobber(path)
        };
        match linked {
            Ok(_) => Ok(()),
            Err(e) if !overwrite && e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(StoreError::Io(e.error)),
        }
    }
}

impl Default for ThingStore {
    fn default() -> Self {
        Self::new(Resolver::default(), StoreConfig::default())
    }
}

impl fmt::Debug for ThingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThingStore")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

fn local_path(location: &ResolvedThingLocation) -> StoreResult<PathBuf> {
    if !location.writable() {
        return Err(StoreError::NotLocal {
            location: location.to_string(),
        });
    }
    Ok(location.local_path()?)
}

/// The file a write lands on. The last segment must be a plain name and the
/// path must not be the context directory itself, so that the parent of the
/// target never lies above the context.
fn target_file(location: &ResolvedThingLocation) -> StoreResult<PathBuf> {
    let path = local_path(location)?;
    let last = location.absolute_path().rsplit('/').next().unwrap_or_default();
    let names_a_file = !matches!(last, "" | "." | "..")
        && !path.components().eq(Path::new(location.context_path()).components());
    if !names_a_file {
        return Err(StoreError::NotAFile { path });
    }
    Ok(path)
}

/// Walk from the root down and fail on the first ancestor that exists but is
/// not a directory. Stops at the first missing one.
fn check_ancestors(dir: &Path) -> StoreResult<()> {
    let chain: Vec<&Path> = dir.ancestors().collect();
    for ancestor in chain.into_iter().rev() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        match fs::metadata(ancestor) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StoreError::NotADirectory {
                    path: ancestor.to_path_buf(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Any entry counts, including a dangling symlink.
fn entry_exists(path: &Path) -> StoreResult<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thingbase_locator::ResolutionError;
    use thingbase_record::DocumentError;

    fn context(dir: &tempfile::TempDir) -> String {
        dir.path().to_str().unwrap().to_string()
    }

    struct FixedRemote(&'static str);

    impl RemoteSource for FixedRemote {
        fn fetch(&self, _location: &ResolvedThingLocation) -> io::Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct FailingRemote;

    impl RemoteSource for FailingRemote {
        fn fetch(&self, _location: &ResolvedThingLocation) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
    }

    #[test]
    fn create_new_makes_parents_and_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let store = ThingStore::default();

        let (thing, path) = store.create_new("sub/new.yml", &ctx, true).unwrap();
        assert_eq!(path, dir.path().join("sub/new.yml"));
        assert!(dir.path().join("sub").is_dir());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("---\n"));
        assert!(text.contains("urn:uuid:"));
        assert!(text.contains(thing.identifier()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join("sub")).unwrap().permissions().mode();
            // The umask may only take bits away from 0755.
            assert_eq!(mode & 0o777 & !0o755, 0);
            assert_eq!(mode & 0o700, 0o700);
        }
    }

    #[cfg(unix)]
    #[test]
    fn dir_mode_is_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let config = StoreConfig {
            dir_mode: 0o700,
            ..StoreConfig::default()
        };
        ThingStore::new(Resolver::default(), config)
            .create_new("private/a.yml", &ctx, true)
            .unwrap();
        let mode = fs::metadata(dir.path().join("private")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn exclusive_link_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        fs::write(&path, b"orig").unwrap();

        let store = ThingStore::default();
        let err = store.persist(dir.path(), &path, b"new", false).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"orig");

        store.persist(dir.path(), &path, b"new", true).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn write_needs_a_file_name_under_the_context() {
        let outer = tempfile::tempdir().unwrap();
        fs::create_dir(outer.path().join("ctx")).unwrap();
        let ctx = outer.path().join("ctx").to_str().unwrap().to_string();
        let store = ThingStore::default();

        for locator in [".", "./", "sub/", "sub/.", ctx.as_str()] {
            for overwrite in [false, true] {
                let mut thing = Thing::new();
                let err = store
                    .write(&mut thing, locator, &ctx, true, overwrite)
                    .unwrap_err();
                assert!(
                    matches!(err, StoreError::NotAFile { .. }),
                    "{locator:?}: {err}"
                );
            }
        }

        let outer_entries: Vec<String> = fs::read_dir(outer.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(outer_entries, vec!["ctx".to_string()]);
        assert_eq!(fs::read_dir(outer.path().join("ctx")).unwrap().count(), 0);
    }

    #[test]
    fn second_create_fails_and_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let store = ThingStore::default();

        let (_, path) = store.create_new("a.yml", &ctx, true).unwrap();
        let before = fs::read(&path).unwrap();

        let mut other = Thing::new();
        let err = store.write(&mut other, "a.yml", &ctx, true, false).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);

        let err = store.create_new("a.yml", &ctx, true).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let store = ThingStore::default();

        let (mut thing, _) = store.create_new("a.yml", &ctx, true).unwrap();
        thing.id.name = "renamed".into();
        store.write(&mut thing, "a.yml", &ctx, true, true).unwrap();

        let back = store.read("a.yml", &ctx, true).unwrap();
        assert_eq!(back, thing);
        assert_eq!(back.name(), "renamed");
    }

    #[test]
    fn write_assigns_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let store = ThingStore::default();

        let mut thing = Thing::default();
        store.write(&mut thing, "b.yml", &ctx, true, false).unwrap();
        assert!(thing.has_identifier());
        let back = store.read("b.yml", &ctx, true).unwrap();
        assert_eq!(back.identifier(), thing.identifier());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let store = ThingStore::default();
        store.create_new("a.yml", &ctx, true).unwrap();
        let _ = store.create_new("a.yml", &ctx, true);

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.yml".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn file_mode_is_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let (_, path) = ThingStore::default().create_new("a.yml", &ctx, true).unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn file_in_the_way_of_parent() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("blocker"), b"x").unwrap();

        let err = ThingStore::default()
            .create_new("blocker/a.yml", &ctx, true)
            .unwrap_err();
        match err {
            StoreError::NotADirectory { path } => assert_eq!(path, dir.path().join("blocker")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn escaping_the_context_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let err = ThingStore::default().create_new("../a.yml", &ctx, true).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Resolution(ResolutionError::OutsideContext { .. })
        ));
    }

    #[test]
    fn remote_write_is_not_local() {
        let mut thing = Thing::new();
        let err = ThingStore::default()
            .write(&mut thing, "a.yml", "https://example.org/kb", true, false)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotLocal { .. }));
    }

    #[test]
    fn remote_read_without_source_is_not_local() {
        let err = ThingStore::default()
            .read("a.yml", "https://example.org/kb", true)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotLocal { .. }));
    }

    #[test]
    fn remote_read_with_source() {
        let store = ThingStore::default().with_remote(FixedRemote("---\nid:\n  name: remote\n"));
        let thing = store.read("a.yml", "https://example.org/kb", true).unwrap();
        assert_eq!(thing.name(), "remote");
        assert!(thing.has_identifier());
    }

    #[test]
    fn remote_failure_is_reported() {
        let store = ThingStore::default().with_remote(FailingRemote);
        let err = store.read("a.yml", "https://example.org/kb", true).unwrap_err();
        assert!(matches!(err, StoreError::Remote { .. }));
    }

    #[test]
    fn multiple_documents_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("two.yml"), "---\na: 1\n---\nb: 2\n").unwrap();

        let err = ThingStore::default().read("two.yml", &ctx, true).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NoSensibleDocument {
                source: DocumentError::MultipleDocuments { line: 3 },
                ..
            }
        ));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("empty.yml"), "").unwrap();

        let err = ThingStore::default().read("empty.yml", &ctx, true).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NoSensibleDocument {
                source: DocumentError::Empty,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let err = ThingStore::default().read("nope.yml", &ctx, true).unwrap_err();
        match err {
            StoreError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_bytes_strips_marker() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("a.yml"), "# header\n---\nid:\n  name: a\n").unwrap();
        let doc = ThingStore::default().read_bytes("a.yml", &ctx, true).unwrap();
        assert_eq!(doc, "id:\n  name: a");
    }

    #[test]
    fn validate_against_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("thing.yml"), "---\nid:\n  version: '0.1'\n").unwrap();
        fs::write(
            dir.path().join("object.yml"),
            "type: object\nproperties:\n  id:\n    type: object\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("array.yml"),
            "type: object\nproperties:\n  id:\n    type: array\n",
        )
        .unwrap();

        let store = ThingStore::default();
        let ok = store.validate("thing.yml", "object.yml", &ctx, true).unwrap();
        assert!(ok.is_valid());

        let bad = store.validate("thing.yml", "array.yml", &ctx, true).unwrap();
        assert!(!bad.is_valid());
        assert!(!bad.violations().is_empty());
    }

    #[test]
    fn validate_reports_unparseable_schema() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        fs::write(dir.path().join("thing.yml"), "id: {}\n").unwrap();
        fs::write(dir.path().join("broken.yml"), "type: [unclosed\n").unwrap();

        let err = ThingStore::default()
            .validate("thing.yml", "broken.yml", &ctx, true)
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
