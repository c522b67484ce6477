use crate::GraphError;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout for one build tree, keyed by architecture and target OS.
///
/// All packaging paths hang off `topdir/<arch>/<os-name>/<os-version>`, so
/// builds for different targets never collide. Appliance image outputs live
/// under `appliances/` with the same key. Subdirectories are created lazily
/// on [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct BuildLayout {
    root: PathBuf,
    source_root: PathBuf,
    arch: String,
    os_name: String,
    os_version: String,
}

impl BuildLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        arch: impl Into<String>,
        os_name: impl Into<String>,
        os_version: impl Into<String>,
    ) -> Self {
        let root = root.into();
        Self {
            source_root: root.clone(),
            root,
            arch: arch.into(),
            os_name: os_name.into(),
            os_version: os_version.into(),
        }
    }

    /// Anchor the local source trees (`src/`, `sources/`) somewhere other
    /// than the build root. A session anchors them at the project root,
    /// next to `appliances/` and `specs/`, while build outputs stay under
    /// the build tree.
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = source_root.into();
        self
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// `<root>/topdir/<arch>/<os-name>/<os-version>`
    #[inline]
    pub fn topdir(&self) -> PathBuf {
        self.root
            .join("topdir")
            .join(&self.arch)
            .join(&self.os_name)
            .join(&self.os_version)
    }

    #[inline]
    pub fn rpms_dir(&self, arch: &str) -> PathBuf {
        self.topdir().join("RPMS").join(arch)
    }

    /// Staging directory packaging inputs are copied into before a build.
    #[inline]
    pub fn sources_dir(&self) -> PathBuf {
        self.topdir().join("SOURCES")
    }

    #[inline]
    pub fn specs_dir(&self) -> PathBuf {
        self.topdir().join("SPECS")
    }

    /// Download cache shared by every unit referencing the same basename.
    #[inline]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("sources-cache")
    }

    #[inline]
    pub fn cache_path(&self, basename: &str) -> PathBuf {
        self.cache_dir().join(basename)
    }

    #[inline]
    pub fn staged_source_path(&self, basename: &str) -> PathBuf {
        self.sources_dir().join(basename)
    }

    /// Output directory for one appliance's disk and descriptor files.
    #[inline]
    pub fn appliance_dir(&self, name: &str) -> PathBuf {
        self.root
            .join("appliances")
            .join(&self.arch)
            .join(&self.os_name)
            .join(&self.os_version)
            .join(name)
    }

    /// `<name>-sda.<format>`
    pub fn disk_image_path(&self, name: &str, format: &str) -> PathBuf {
        self.appliance_dir(name).join(format!("{name}-sda.{format}"))
    }

    /// `<name>.xml`
    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.appliance_dir(name).join(format!("{name}.xml"))
    }

    /// Build-output path for one packaging artifact:
    /// `RPMS/<arch>/<name>-<version>-<release>.<arch>.rpm`.
    pub fn artifact_path(&self, name: &str, version: &str, release: &str, arch: &str) -> PathBuf {
        self.rpms_dir(arch)
            .join(artifact_file_name(name, version, release, arch, "rpm"))
    }

    /// Ordered source-tree roots a bare local `Source`/`Patch` path is
    /// resolved against; the first root containing the file wins.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        vec![
            self.source_root.join("src"),
            self.source_root.join("sources"),
        ]
    }

    /// Probe the source roots for `relative`; read-only, used when staging.
    pub fn resolve_local_source(&self, relative: &Path) -> Option<PathBuf> {
        self.source_roots()
            .into_iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.exists())
    }

    pub fn initialize(&self) -> Result<(), GraphError> {
        fs::create_dir_all(self.rpms_dir(&self.arch))?;
        fs::create_dir_all(self.rpms_dir("noarch"))?;
        fs::create_dir_all(self.sources_dir())?;
        fs::create_dir_all(self.specs_dir())?;
        fs::create_dir_all(self.cache_dir())?;
        Ok(())
    }
}

/// `<name>-<version>-<release>.<arch>.<ext>`
pub fn artifact_file_name(
    name: &str,
    version: &str,
    release: &str,
    arch: &str,
    ext: &str,
) -> String {
    format!("{name}-{version}-{release}.{arch}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BuildLayout {
        BuildLayout::new("/build", "x86_64", "fedora", "12")
    }

    #[test]
    fn layout_paths_are_correct() {
        let layout = layout();
        assert_eq!(
            layout.topdir(),
            PathBuf::from("/build/topdir/x86_64/fedora/12")
        );
        assert_eq!(
            layout.sources_dir(),
            PathBuf::from("/build/topdir/x86_64/fedora/12/SOURCES")
        );
        assert_eq!(
            layout.cache_path("foo.tar.gz"),
            PathBuf::from("/build/sources-cache/foo.tar.gz")
        );
        assert_eq!(
            layout.appliance_dir("web"),
            PathBuf::from("/build/appliances/x86_64/fedora/12/web")
        );
    }

    #[test]
    fn artifact_naming_is_bit_exact() {
        assert_eq!(
            artifact_file_name("web", "2", "1", "noarch", "rpm"),
            "web-2-1.noarch.rpm"
        );
        assert_eq!(
            layout().artifact_path("web", "2", "1", "x86_64"),
            PathBuf::from("/build/topdir/x86_64/fedora/12/RPMS/x86_64/web-2-1.x86_64.rpm")
        );
    }

    #[test]
    fn appliance_output_naming_is_bit_exact() {
        let layout = layout();
        assert_eq!(
            layout.disk_image_path("web", "raw"),
            PathBuf::from("/build/appliances/x86_64/fedora/12/web/web-sda.raw")
        );
        assert_eq!(
            layout.descriptor_path("web"),
            PathBuf::from("/build/appliances/x86_64/fedora/12/web/web.xml")
        );
    }

    #[test]
    fn initialize_creates_directories_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(dir.path(), "x86_64", "fedora", "12");
        layout.initialize().unwrap();
        layout.initialize().unwrap();

        assert!(layout.sources_dir().is_dir());
        assert!(layout.rpms_dir("noarch").is_dir());
        assert!(layout.cache_dir().is_dir());
    }

    #[test]
    fn local_source_resolution_prefers_first_root() {
        let dir = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(dir.path(), "x86_64", "fedora", "12");

        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("sources")).unwrap();
        fs::write(dir.path().join("src/a.patch"), "first").unwrap();
        fs::write(dir.path().join("sources/a.patch"), "second").unwrap();
        fs::write(dir.path().join("sources/b.patch"), "only").unwrap();

        assert_eq!(
            layout.resolve_local_source(Path::new("a.patch")),
            Some(dir.path().join("src/a.patch"))
        );
        assert_eq!(
            layout.resolve_local_source(Path::new("b.patch")),
            Some(dir.path().join("sources/b.patch"))
        );
        assert_eq!(layout.resolve_local_source(Path::new("missing")), None);
    }

    #[test]
    fn source_root_is_anchored_independently_of_the_build_tree() {
        let project = tempfile::tempdir().unwrap();
        let layout = BuildLayout::new(project.path().join("build"), "x86_64", "fedora", "12")
            .with_source_root(project.path());

        assert_eq!(
            layout.source_roots(),
            vec![project.path().join("src"), project.path().join("sources")]
        );

        fs::create_dir_all(project.path().join("src")).unwrap();
        fs::write(project.path().join("src/tuning.conf"), "x").unwrap();
        assert_eq!(
            layout.resolve_local_source(Path::new("tuning.conf")),
            Some(project.path().join("src/tuning.conf"))
        );
    }
}
