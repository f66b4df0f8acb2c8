use std::collections::{HashMap, HashSet};
use std::fs;
use std::os::unix::fs::{symlink, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use dirwalk::{walk, walk_tree, walk_with, Control, Visit, WalkError};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory tree for testing.
///
/// Structure:
/// ```
/// tmp/
///   a          (100 bytes)
///   b          (2 bytes)
///   c/
///     d        (50 bytes)
/// ```
fn setup_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("a"), vec![0u8; 100]).unwrap();
    fs::write(root.join("b"), b"bb").unwrap();
    fs::create_dir(root.join("c")).unwrap();
    fs::write(root.join("c").join("d"), vec![0u8; 50]).unwrap();

    dir
}

/// Stream a walk and collect every visited path in visit order.
fn visited_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    walk_with(root, Control::empty(), |v: &mut Visit<'_, ()>| {
        paths.push(v.path());
        Control::RECURSE
    })
    .unwrap();
    paths
}

/// Tests that rely on permission bits are meaningless when running as root,
/// since root bypasses them.
fn running_as_root() -> bool {
    rustix::process::geteuid().is_root()
}

// ---------------------------------------------------------------------------
// Streaming walks
// ---------------------------------------------------------------------------

#[test]
fn visits_every_entry_parent_first() {
    let dir = setup_tree();
    let root = dir.path();

    let paths = visited_paths(root);
    let expected: HashSet<PathBuf> = [
        root.to_path_buf(),
        root.join("a"),
        root.join("b"),
        root.join("c"),
        root.join("c").join("d"),
    ]
    .into_iter()
    .collect();

    assert_eq!(paths.len(), 5, "each entry visited exactly once");
    assert_eq!(paths.iter().cloned().collect::<HashSet<_>>(), expected);

    // Pre-order: the root comes first, and c before c/d.
    assert_eq!(paths[0], root);
    let pos = |p: &Path| paths.iter().position(|q| q == p).unwrap();
    assert!(pos(&root.join("c")) < pos(&root.join("c").join("d")));
}

#[test]
fn depth_starts_at_one_and_steps_by_one() {
    let dir = setup_tree();
    let root = dir.path();

    let mut depths: HashMap<PathBuf, usize> = HashMap::new();
    walk_with(root, Control::empty(), |v: &mut Visit<'_, ()>| {
        depths.insert(v.path(), v.depth());
        Control::RECURSE
    })
    .unwrap();

    assert_eq!(depths[&root.to_path_buf()], 1);
    assert_eq!(depths[&root.join("a")], 2);
    assert_eq!(depths[&root.join("c")], 2);
    assert_eq!(depths[&root.join("c").join("d")], 3);
}

#[test]
fn empty_root_yields_a_single_visit() {
    let dir = tempfile::tempdir().unwrap();

    let report = walk(dir.path())
        .flags(Control::RECURSE)
        .run(|_: &mut Visit<'_, ()>| Control::empty())
        .unwrap();

    assert_eq!(report.visited, 1);
    assert_eq!(report.dirs, 1);
    assert_eq!(report.skipped, 0);
}

#[test]
fn file_root_is_a_single_leaf() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("only.txt");
    fs::write(&file, b"data").unwrap();

    let mut visits = 0;
    let report = walk_with(&file, Control::empty(), |v: &mut Visit<'_, ()>| {
        visits += 1;
        assert!(!v.is_dir());
        assert_eq!(v.depth(), 1);
        assert_eq!(v.path(), file);
        Control::RECURSE // nothing to recurse into
    })
    .unwrap();

    assert_eq!(visits, 1);
    assert_eq!(report.visited, 1);
    assert_eq!(report.dirs, 0);
}

#[test]
fn walk_level_flags_drive_a_trivial_visitor() {
    let dir = setup_tree();

    let report = walk(dir.path())
        .flags(Control::RECURSE)
        .run(|_: &mut Visit<'_, ()>| Control::empty())
        .unwrap();

    assert_eq!(report.visited, 5);
    assert_eq!(report.dirs, 2);
}

#[test]
fn streams_wide_directories() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..300 {
        fs::write(dir.path().join(format!("f{i:03}")), b"x").unwrap();
    }

    let report = walk(dir.path())
        .flags(Control::RECURSE)
        .run(|_: &mut Visit<'_, ()>| Control::empty())
        .unwrap();

    assert_eq!(report.visited, 301);
    assert_eq!(report.dirs, 1);
    assert_eq!(report.skipped, 0);
}

// ---------------------------------------------------------------------------
// Root failures
// ---------------------------------------------------------------------------

#[test]
fn missing_root_is_a_stat_error() {
    let err = walk_tree("/nonexistent/path/for/dirwalk").unwrap_err();

    assert!(matches!(err, WalkError::RootStat { .. }));
    assert!(err.is_not_found());
    assert_eq!(err.path(), Path::new("/nonexistent/path/for/dirwalk"));
}

#[test]
fn unreadable_root_is_an_open_error() {
    if running_as_root() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let err = walk_tree(&locked).unwrap_err();
    assert!(matches!(err, WalkError::RootOpen { .. }));
    assert_eq!(err.path(), locked);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

// ---------------------------------------------------------------------------
// Entry failures
// ---------------------------------------------------------------------------

#[test]
fn unreadable_entry_skips_not_aborts() {
    if running_as_root() {
        return;
    }

    let dir = setup_tree();
    let root = dir.path();
    let locked = root.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden"), b"x").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let mut paths = Vec::new();
    let report = walk(root)
        .quiet(true)
        .run(|v: &mut Visit<'_, ()>| {
            paths.push(v.path());
            Control::RECURSE
        })
        .unwrap();

    // The locked directory itself is still visited (its lstat worked);
    // only the descent into it is skipped, and the siblings are unharmed.
    let set: HashSet<PathBuf> = paths.into_iter().collect();
    assert!(set.contains(&locked));
    assert!(!set.contains(&locked.join("hidden")));
    assert!(set.contains(&root.join("a")));
    assert!(set.contains(&root.join("b")));
    assert!(set.contains(&root.join("c").join("d")));
    assert_eq!(report.visited, 6);
    assert_eq!(report.skipped, 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn suppressing_diagnostics_changes_nothing_but_noise() {
    if running_as_root() {
        return;
    }

    let dir = setup_tree();
    let root = dir.path();
    let locked = root.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let loud = walk(root)
        .flags(Control::RECURSE)
        .run(|_: &mut Visit<'_, ()>| Control::empty())
        .unwrap();
    let silent = walk(root)
        .flags(Control::RECURSE | Control::SHUTUP)
        .run(|_: &mut Visit<'_, ()>| Control::empty())
        .unwrap();

    assert_eq!(loud.visited, silent.visited);
    assert_eq!(loud.skipped, silent.skipped);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

// ---------------------------------------------------------------------------
// Symlinks and cycles
// ---------------------------------------------------------------------------

#[test]
fn symlink_to_directory_is_a_leaf_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("real")).unwrap();
    fs::write(root.join("real").join("inner.txt"), b"data").unwrap();
    symlink(root.join("real"), root.join("link")).unwrap();

    let paths: HashSet<PathBuf> = visited_paths(root).into_iter().collect();

    assert!(paths.contains(&root.join("link")));
    assert!(!paths.contains(&root.join("link").join("inner.txt")));
    assert!(paths.contains(&root.join("real").join("inner.txt")));
}

#[test]
fn symfollow_descends_through_directory_links() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("real")).unwrap();
    fs::write(root.join("real").join("inner.txt"), b"data").unwrap();
    symlink(root.join("real"), root.join("link")).unwrap();

    let mut paths = Vec::new();
    let mut targets = Vec::new();
    walk_with(
        root,
        Control::SYMFOLLOW,
        |v: &mut Visit<'_, ()>| {
            if let Some(target) = v.link_target() {
                targets.push(target.to_path_buf());
            }
            paths.push(v.path());
            Control::RECURSE
        },
    )
    .unwrap();

    let set: HashSet<PathBuf> = paths.into_iter().collect();
    assert!(set.contains(&root.join("link").join("inner.txt")));
    assert_eq!(targets, vec![root.join("real")]);
}

#[test]
fn symlink_cycle_terminates_as_a_leaf() {
    let dir = setup_tree();
    let root = dir.path();
    // c/loop resolves back to c, an ancestor of the entries under c.
    symlink("../c", root.join("c").join("loop")).unwrap();

    let mut paths = Vec::new();
    walk_with(
        root,
        Control::SYMFOLLOW,
        |v: &mut Visit<'_, ()>| {
            paths.push(v.path());
            Control::RECURSE
        },
    )
    .unwrap();

    let loop_visits = paths
        .iter()
        .filter(|p| **p == root.join("c").join("loop"))
        .count();
    assert_eq!(loop_visits, 1, "the link is visited once, as a leaf");
    assert!(!paths
        .iter()
        .any(|p| p.starts_with(root.join("c").join("loop")) && *p != root.join("c").join("loop")));
    assert_eq!(paths.len(), 6); // root, a, b, c, c/d, c/loop
}

#[test]
fn dangling_symlink_is_a_leaf_even_with_symfollow() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    symlink("no/such/target", root.join("dangling")).unwrap();

    let mut seen = Vec::new();
    let report = walk_with(
        root,
        Control::SYMFOLLOW,
        |v: &mut Visit<'_, ()>| {
            seen.push(v.path());
            Control::RECURSE
        },
    )
    .unwrap();

    assert!(seen.contains(&root.join("dangling")));
    assert_eq!(report.visited, 2);
    assert_eq!(report.skipped, 0);
}

// ---------------------------------------------------------------------------
// Come-again revisits and aggregation
// ---------------------------------------------------------------------------

#[test]
fn comeagain_pairs_pre_and_post_visits() {
    let dir = setup_tree();
    let root = dir.path();

    let mut events: Vec<(PathBuf, bool)> = Vec::new();
    walk_with(root, Control::empty(), |v: &mut Visit<'_, ()>| {
        events.push((v.path(), v.again()));
        Control::RECURSE | Control::COMEAGAIN
    })
    .unwrap();

    // Exactly one pre and one post event per entry.
    let mut pre: HashMap<PathBuf, usize> = HashMap::new();
    let mut post: HashMap<PathBuf, usize> = HashMap::new();
    for (i, (path, again)) in events.iter().enumerate() {
        let bucket = if *again { &mut post } else { &mut pre };
        assert!(bucket.insert(path.clone(), i).is_none(), "duplicate visit");
    }
    assert_eq!(pre.len(), 5);
    assert_eq!(post.len(), 5);

    // A post-order visit happens only after every descendant is done.
    for (path, post_idx) in &post {
        for (other, other_post) in &post {
            if other != path && other.starts_with(path) {
                assert!(other_post < post_idx, "{other:?} finishes before {path:?}");
            }
        }
    }
    assert_eq!(events.last().unwrap(), &(root.to_path_buf(), true));
}

#[test]
fn comeagain_without_recurse_scans_no_children() {
    let dir = setup_tree();

    let mut events = 0;
    let report = walk_with(dir.path(), Control::empty(), |_: &mut Visit<'_, ()>| {
        events += 1;
        Control::COMEAGAIN
    })
    .unwrap();

    assert_eq!(report.visited, 1, "only the root node exists");
    assert_eq!(events, 2, "but it is visited twice");
}

#[test]
fn post_order_return_value_is_advisory() {
    let dir = setup_tree();

    let report = walk_with(dir.path(), Control::empty(), |v: &mut Visit<'_, ()>| {
        if v.again() {
            // Asking for recursion after the fact must do nothing.
            Control::RECURSE
        } else {
            Control::COMEAGAIN
        }
    })
    .unwrap();

    assert_eq!(report.visited, 1);
}

#[test]
fn sizes_roll_up_through_parent_extra() {
    let dir = setup_tree();
    let root = dir.path();

    let mut totals: HashMap<PathBuf, u64> = HashMap::new();
    walk_with(root, Control::empty(), |v: &mut Visit<'_, u64>| {
        if v.is_dir() {
            if v.again() {
                let subtree = *v.extra();
                totals.insert(v.path(), subtree);
                if let Some(parent) = v.parent_extra() {
                    *parent += subtree;
                }
                Control::empty()
            } else {
                Control::RECURSE | Control::COMEAGAIN
            }
        } else {
            let len = v.metadata().len();
            if let Some(parent) = v.parent_extra() {
                *parent += len;
            }
            Control::empty()
        }
    })
    .unwrap();

    assert_eq!(totals[&root.join("c")], 50);
    assert_eq!(totals[&root.to_path_buf()], 152); // a + b + c/d
}

// ---------------------------------------------------------------------------
// Caller-side recursion policy
// ---------------------------------------------------------------------------

#[test]
fn visitor_enforces_numeric_name_restriction() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("123")).unwrap();
    fs::write(root.join("123").join("status"), b"ok").unwrap();
    fs::create_dir(root.join("abc")).unwrap();
    fs::write(root.join("abc").join("status"), b"no").unwrap();

    let mut paths = Vec::new();
    walk_with(root, Control::empty(), |v: &mut Visit<'_, ()>| {
        paths.push(v.path());
        let numeric = v
            .name()
            .to_str()
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if v.depth() == 1 || numeric {
            Control::RECURSE
        } else {
            Control::empty()
        }
    })
    .unwrap();

    let set: HashSet<PathBuf> = paths.into_iter().collect();
    assert!(set.contains(&root.join("123").join("status")));
    assert!(set.contains(&root.join("abc")));
    assert!(!set.contains(&root.join("abc").join("status")));
}

// ---------------------------------------------------------------------------
// Materialized trees
// ---------------------------------------------------------------------------

#[test]
fn materialized_tree_matches_an_independent_walker() {
    let dir = setup_tree();
    let root = dir.path();
    fs::create_dir_all(root.join("c").join("e").join("f")).unwrap();
    fs::write(root.join("c").join("e").join("g"), b"g").unwrap();

    let tree = walk_tree(root).unwrap();

    let ours: HashSet<PathBuf> = tree.iter().map(|(id, _)| tree.path(id)).collect();
    let theirs: HashSet<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap().path().to_path_buf())
        .collect();
    assert_eq!(ours, theirs);
    assert_eq!(tree.len(), theirs.len());
}

#[test]
fn materialized_tree_links_are_consistent() {
    let dir = setup_tree();
    let root = dir.path();

    let tree = walk_tree(root).unwrap();
    let root_id = tree.root();
    assert_eq!(tree.path(root_id), root);
    assert_eq!(tree[root_id].depth(), 1);
    assert!(tree[root_id].parent().is_none());

    for (id, node) in tree.iter() {
        match node.parent() {
            Some(parent) => {
                assert!(tree[parent].children().contains(&id));
                assert_eq!(node.depth(), tree[parent].depth() + 1);
            }
            None => assert_eq!(id, root_id),
        }
        for &child in node.children() {
            assert_eq!(tree[child].parent(), Some(id));
        }
    }
}

#[test]
fn materialized_paths_resolve_back_to_their_entries() {
    let dir = setup_tree();

    let tree = walk_tree(dir.path()).unwrap();
    for (id, node) in tree.iter() {
        let on_disk = fs::symlink_metadata(tree.path(id)).unwrap();
        assert_eq!(on_disk.dev(), node.metadata().dev());
        assert_eq!(on_disk.ino(), node.metadata().ino());
        assert_eq!(on_disk.is_dir(), node.metadata().is_dir());
    }
}

#[test]
fn collect_with_symfollow_stays_finite() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("real")).unwrap();
    fs::write(root.join("real").join("x.txt"), b"x").unwrap();
    symlink(root.join("real"), root.join("link")).unwrap();
    // A link straight back to the root: must not expand.
    symlink(root, root.join("real").join("up")).unwrap();

    let tree = walk(root).flags(Control::SYMFOLLOW).collect().unwrap();

    let paths: HashSet<PathBuf> = tree.iter().map(|(id, _)| tree.path(id)).collect();
    assert!(paths.contains(&root.join("link").join("x.txt")));

    // The cycle link exists in the tree as a childless leaf.
    let (up_id, up) = tree
        .iter()
        .find(|(_, n)| n.name() == "up")
        .expect("cycle link materialized");
    assert!(up.children().is_empty());
    assert!(up.metadata().is_symlink());
    assert_eq!(tree.path(up_id), root.join("real").join("up"));
}

#[test]
fn symlink_targets_are_recorded_in_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("file"), b"x").unwrap();
    symlink("file", root.join("ln")).unwrap();

    let tree = walk_tree(root).unwrap();
    let (_, ln) = tree.iter().find(|(_, n)| n.name() == "ln").unwrap();
    assert_eq!(ln.link_target(), Some(Path::new("file")));
    let (_, file) = tree.iter().find(|(_, n)| n.name() == "file").unwrap();
    assert_eq!(file.link_target(), None);
}
