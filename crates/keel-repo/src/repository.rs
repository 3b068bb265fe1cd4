use keel_refs::{RefStore, Reflog, HEAD};
use keel_store::{peel_to_commit_with_depth, ObjectStore};
use keel_types::{ObjectId, Signature};
use tracing::{debug, info};

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};

/// A repository: an object store, a ref store and the settings that govern
/// how HEAD moves between them.
///
/// All state lives in the two stores. The handle itself is immutable and is
/// passed explicitly to every operation; several handles may share stores.
pub struct Repository {
    objects: Box<dyn ObjectStore>,
    refs: Box<dyn RefStore>,
    config: RepoConfig,
}

impl Repository {
    /// Open a repository over `objects` and `refs`.
    ///
    /// If the ref store has no `HEAD` yet, it is created pointing at the
    /// (unborn) default branch. An existing `HEAD` is left alone.
    pub fn init(
        objects: impl ObjectStore + 'static,
        refs: impl RefStore + 'static,
        config: RepoConfig,
    ) -> RepoResult<Self> {
        config.validate()?;
        let repo = Self {
            objects: Box::new(objects),
            refs: Box::new(refs),
            config,
        };

        if repo.refs.read_ref(HEAD)?.is_none() {
            let target = repo.config.default_branch_ref();
            match repo
                .refs
                .create_or_update_symbolic(HEAD, &target, false, None, None)
            {
                Ok(_) => info!(branch = %target, "initialized HEAD"),
                // Another handle created HEAD first; theirs stands.
                Err(keel_refs::RefError::Conflict { .. }) => {
                    debug!("HEAD created concurrently during init")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(repo)
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Read the reflog of `name`, failing `NotFound` if it has none.
    pub fn reflog(&self, name: &str) -> RepoResult<Reflog> {
        self.refs
            .read_reflog(name)?
            .ok_or_else(|| RepoError::NotFound(format!("reflog for {name}")))
    }

    /// Delete the reflog of `name`. Returns `true` if one existed.
    pub fn delete_reflog(&self, name: &str) -> RepoResult<bool> {
        Ok(self.refs.delete_reflog(name)?)
    }

    /// Peel `id` through annotated tags to the commit it names.
    pub fn peel_to_commit(&self, id: &ObjectId) -> RepoResult<ObjectId> {
        Ok(peel_to_commit_with_depth(
            self.objects.as_ref(),
            id,
            self.config.max_peel_depth,
        )?)
    }

    /// The caller's signature, or one for the configured identity.
    pub(crate) fn committer(&self, signature: Option<&Signature>) -> RepoResult<Signature> {
        match signature {
            Some(sig) => Ok(sig.clone()),
            None => self.config.signature(),
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use keel_refs::{InMemoryRefStore, RefValue};
    use keel_store::InMemoryObjectStore;

    #[test]
    fn init_creates_unborn_head() {
        let repo = Repository::init(
            InMemoryObjectStore::new(),
            InMemoryRefStore::new(),
            RepoConfig::default(),
        )
        .unwrap();
        assert_eq!(
            repo.refs().read_ref(HEAD).unwrap(),
            Some(RefValue::Symbolic("refs/heads/main".into()))
        );
        assert!(repo.head_unborn().unwrap());
        assert!(repo.refs().read_reflog(HEAD).unwrap().is_none());
    }

    #[test]
    fn init_honours_default_branch() {
        let config = RepoConfig {
            default_branch: "trunk".into(),
            ..RepoConfig::default()
        };
        let repo =
            Repository::init(InMemoryObjectStore::new(), InMemoryRefStore::new(), config).unwrap();
        assert_eq!(
            repo.refs().read_ref(HEAD).unwrap(),
            Some(RefValue::Symbolic("refs/heads/trunk".into()))
        );
    }

    #[test]
    fn init_keeps_existing_head() {
        let refs = InMemoryRefStore::new();
        refs.create_or_update_symbolic(HEAD, "refs/heads/develop", true, None, None)
            .unwrap();
        let repo =
            Repository::init(InMemoryObjectStore::new(), refs, RepoConfig::default()).unwrap();
        assert_eq!(
            repo.refs().read_ref(HEAD).unwrap(),
            Some(RefValue::Symbolic("refs/heads/develop".into()))
        );
    }

    #[test]
    fn init_rejects_invalid_config() {
        let config = RepoConfig {
            default_branch: "bad name".into(),
            ..RepoConfig::default()
        };
        let err = Repository::init(InMemoryObjectStore::new(), InMemoryRefStore::new(), config)
            .unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }

    #[test]
    fn missing_reflog_is_not_found() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.repo.reflog("refs/heads/main"),
            Err(RepoError::NotFound(_))
        ));
        assert!(!fx.repo.delete_reflog("refs/heads/main").unwrap());
    }

    #[test]
    fn peel_respects_configured_depth() {
        let fx = Fixture::with_config(RepoConfig {
            max_peel_depth: 0,
            ..RepoConfig::default()
        });
        assert_eq!(fx.repo.peel_to_commit(&fx.main).unwrap(), fx.main);
        assert!(matches!(
            fx.repo.peel_to_commit(&fx.annotated_tag),
            Err(RepoError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn explicit_signature_wins() {
        let fx = Fixture::new();
        let sig = Fixture::signature();
        assert_eq!(fx.repo.committer(Some(&sig)).unwrap(), sig);
        assert_eq!(fx.repo.committer(None).unwrap().name, "unknown");
    }
}
