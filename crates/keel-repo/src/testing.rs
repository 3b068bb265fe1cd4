//! Shared repository fixture for tests.
//!
//! Branches `main`, `br2` and `haacked` each point at their own commit.
//! `refs/tags/test` points at an annotated tag whose target is a fourth
//! commit, and `refs/tags/point_to_blob` points straight at a blob. HEAD is
//! attached to `main`.

use keel_refs::{InMemoryRefStore, RefStore, HEAD};
use keel_store::{Blob, Commit, InMemoryObjectStore, ObjectKind, ObjectStore, Tag, Tree};
use keel_types::{ObjectId, Signature, Timestamp};

use crate::config::RepoConfig;
use crate::repository::Repository;

/// Branch HEAD is pointed at to make it unborn.
pub(crate) const NON_EXISTING_HEAD: &str = "refs/heads/doesnt_exist";

pub(crate) struct Fixture {
    pub repo: Repository,
    pub main: ObjectId,
    pub br2: ObjectId,
    pub haacked: ObjectId,
    /// The annotated tag object behind `refs/tags/test`.
    pub annotated_tag: ObjectId,
    /// The commit that tag points at.
    pub tag_target: ObjectId,
    pub blob: ObjectId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RepoConfig::default())
    }

    pub fn with_config(config: RepoConfig) -> Self {
        let objects = InMemoryObjectStore::new();
        let tree = objects
            .write(&Tree.to_stored_object().unwrap())
            .unwrap();

        let main = commit(&objects, tree, "initial commit");
        let br2 = commit(&objects, tree, "work on br2");
        let haacked = commit(&objects, tree, "haacked");
        let tag_target = commit(&objects, tree, "tagged release");
        let annotated_tag = objects
            .write(
                &Tag {
                    target: tag_target,
                    target_kind: ObjectKind::Commit,
                    name: "test".into(),
                    tagger: Some(Self::signature()),
                    message: "annotated tag".into(),
                }
                .to_stored_object()
                .unwrap(),
            )
            .unwrap();
        let blob = objects
            .write(&Blob::new(b"just a blob".to_vec()).to_stored_object())
            .unwrap();

        let refs = InMemoryRefStore::new();
        for (name, id) in [
            ("refs/heads/main", main),
            ("refs/heads/br2", br2),
            ("refs/heads/haacked", haacked),
            ("refs/tags/test", annotated_tag),
            ("refs/tags/point_to_blob", blob),
        ] {
            refs.create_or_update_direct(name, id, true, None, None)
                .unwrap();
        }
        refs.create_or_update_symbolic(HEAD, "refs/heads/main", true, None, None)
            .unwrap();

        Self {
            repo: Repository::init(objects, refs, config).unwrap(),
            main,
            br2,
            haacked,
            annotated_tag,
            tag_target,
            blob,
        }
    }

    pub fn signature() -> Signature {
        Signature::new("me", "foo@example.com", Timestamp::new(1_234_567_890, 60).unwrap())
            .unwrap()
    }

    /// Point HEAD at a branch that has no commits.
    pub fn make_head_unborn(&self) {
        self.repo
            .refs()
            .create_or_update_symbolic(HEAD, NON_EXISTING_HEAD, true, None, None)
            .unwrap();
    }

    pub fn delete_head(&self) {
        self.repo.refs().delete(HEAD, None).unwrap();
    }

    pub fn head_log_len(&self) -> usize {
        self.repo
            .refs()
            .read_reflog(HEAD)
            .unwrap()
            .map_or(0, |log| log.len())
    }
}

fn commit(objects: &InMemoryObjectStore, tree: ObjectId, message: &str) -> ObjectId {
    let commit = Commit {
        tree,
        parents: vec![],
        author: Fixture::signature(),
        message: message.into(),
    };
    objects.write(&commit.to_stored_object().unwrap()).unwrap()
}
