//! End-to-end policy runs against real git repositories

mod harness;

use std::sync::Arc;

use harness::World;
use pretty_assertions::assert_eq;
use repo_ci::{EnvVar, RepositorySettings};
use repo_policy::{Coordinator, DocumentFormat, Policy, SessionReport};
use repo_test_utils::git::{MAIN_REF, commit_count, file_at};
use serde_json::{Value, json};

fn policy(entries: Value) -> Arc<Policy> {
    Arc::new(Policy::parse(DocumentFormat::Json, &entries.to_string()).unwrap())
}

fn coordinator(world: &Arc<World>, entries: Value) -> Coordinator {
    Coordinator::new(Arc::new(world.registry()), policy(entries))
}

fn changed_goals(report: &SessionReport) -> Vec<&str> {
    report.changes.iter().map(|c| c.goal.as_str()).collect()
}

fn env_var(id: &str, name: &str, value: &str) -> EnvVar {
    EnvVar {
        id: id.into(),
        name: name.into(),
        value: Some(value.into()),
        public: false,
    }
}

#[tokio::test]
async fn test_reapplying_a_file_policy_makes_no_new_commit() {
    let world = World::new();
    let target = world.add_repo("widgets", &[("README.md", "# Old")]);
    let coordinator = coordinator(
        &world,
        json!([{"file": {"state": "present", "path": "README.md", "content": "# Widgets\n"}}]),
    );

    let first = coordinator.run(vec![target.clone()]).await;
    assert!(first.is_success());
    assert_eq!(commit_count(&world.git("widgets"), MAIN_REF), 2);
    assert_eq!(
        file_at(&world.git("widgets"), MAIN_REF, "README.md").as_deref(),
        Some("# Widgets\n")
    );

    let second = coordinator.run(vec![target]).await;
    assert!(second.is_success());
    assert_eq!(commit_count(&world.git("widgets"), MAIN_REF), 2);
    let report = second.outcomes[0].result.as_ref().unwrap();
    assert!(report.changes.is_empty());
    assert_eq!(report.goals_applied, 1);
}

#[tokio::test]
async fn test_policy_spanning_both_services() {
    let world = World::new();
    let target = world.add_repo("widgets", &[("README.md", "# Widgets")]);
    world.remote("widgets").lock().unwrap().env_vars = vec![
        env_var("ev-a", "DEPLOY", "old"),
        env_var("ev-b", "DEPLOY", "older"),
        env_var("ev-c", "OTHER", "keep"),
    ];

    let summary = coordinator(
        &world,
        json!([
            {"github_file": {"state": "present", "path": ".travis.yml", "content": "language: rust\n"}},
            {"webhook": {"state": "present", "url": "https://notify.example.com"}},
            {"env_var": {"state": "present", "name": "DEPLOY", "value": "new"}},
            {"travis_repository_settings": {"build_pushes": true}}
        ]),
    )
    .run(vec![target])
    .await;

    let report = summary.outcomes[0].result.as_ref().unwrap();
    assert_eq!(
        changed_goals(report),
        vec!["github_file", "webhook", "env_var", "travis_repository_settings"]
    );

    let remote = world.remote("widgets");
    let remote = remote.lock().unwrap();
    assert_eq!(remote.hooks.len(), 1);
    assert_eq!(remote.hooks[0].url(), Some("https://notify.example.com"));
    assert_eq!(
        remote.env_vars,
        vec![env_var("ev-b", "DEPLOY", "new"), env_var("ev-c", "OTHER", "keep")]
    );
    assert_eq!(
        remote.settings_updates,
        vec![RepositorySettings {
            build_pushes: Some(true),
            ..RepositorySettings::default()
        }]
    );
    assert_eq!(
        file_at(&world.git("widgets"), MAIN_REF, ".travis.yml").as_deref(),
        Some("language: rust\n")
    );
}

#[tokio::test]
async fn test_first_failing_goal_stops_its_target() {
    let world = World::new();
    let target = world.add_repo("widgets", &[("README.md", "# Widgets")]);

    let summary = coordinator(
        &world,
        json!([
            {"file": {"state": "present", "path": "a.txt", "content": "a"}},
            {"file": {"state": "present", "path": "b.txt", "content": "b", "ref": "refs/heads/missing"}},
            {"webhook": {"state": "present", "url": "https://notify.example.com"}}
        ]),
    )
    .run(vec![target])
    .await;

    let err = summary.outcomes[0].result.as_ref().unwrap_err();
    assert!(matches!(err, repo_policy::Error::GoalFailed { goal, .. } if goal == "file"));
    assert_eq!(file_at(&world.git("widgets"), MAIN_REF, "a.txt").as_deref(), Some("a"));
    assert_eq!(file_at(&world.git("widgets"), MAIN_REF, "b.txt"), None);
    assert!(world.remote("widgets").lock().unwrap().hooks.is_empty());
}

#[tokio::test]
async fn test_failing_target_does_not_affect_siblings() {
    let world = World::new();
    let widgets = world.add_repo("widgets", &[("README.md", "# Widgets")]);
    let gadgets = world.add_repo("gadgets", &[("README.md", "# Gadgets")]);
    let ghost = World::target("ghost");

    let summary = coordinator(
        &world,
        json!([{"file": {"state": "present", "path": "LICENSE", "content": "MIT\n"}}]),
    )
    .run(vec![widgets, ghost, gadgets])
    .await;

    let targets: Vec<&str> = summary.outcomes.iter().map(|o| o.target.name()).collect();
    assert_eq!(targets, vec!["widgets", "ghost", "gadgets"]);
    assert_eq!(summary.failed().count(), 1);
    assert!(matches!(
        summary.outcomes[1].result,
        Err(repo_policy::Error::Construction { .. })
    ));
    for name in ["widgets", "gadgets"] {
        assert_eq!(file_at(&world.git(name), MAIN_REF, "LICENSE").as_deref(), Some("MIT\n"));
    }
}

#[tokio::test]
async fn test_aliases_share_one_handler_per_target() {
    let world = World::new();
    let targets = vec![
        world.add_repo("widgets", &[("README.md", "# Widgets")]),
        world.add_repo("gadgets", &[("README.md", "# Gadgets")]),
    ];

    let summary = coordinator(
        &world,
        json!([
            {"file": {"state": "present", "path": "a.txt", "content": "a"}},
            {"github_file": {"state": "present", "path": "b.txt", "content": "b"}},
            {"github_webhook": {"state": "absent", "url": "https://notify.example.com"}}
        ]),
    )
    .run(targets)
    .await;

    assert!(summary.is_success());
    assert_eq!(world.github_handlers(), 2);
    assert_eq!(world.travis_handlers(), 0);
    assert_eq!(commit_count(&world.git("widgets"), MAIN_REF), 3);
}

#[tokio::test]
async fn test_absent_policy_with_concurrency_cap() {
    let world = World::new();
    let names = ["one", "two", "three", "four"];
    let targets = names
        .iter()
        .map(|name| world.add_repo(name, &[("README.md", "# Repo"), ("legacy/old.txt", "old")]))
        .collect();
    for name in names {
        world.remote(name).lock().unwrap().env_vars = vec![env_var("ev-x", "LEGACY", "1")];
    }

    let summary = coordinator(
        &world,
        json!([
            {"file": {"state": "absent", "path": "legacy"}},
            {"env_var": {"state": "absent", "name": "LEGACY"}}
        ]),
    )
    .with_concurrency(2)
    .run(targets)
    .await;

    assert!(summary.is_success());
    for name in names {
        let git = world.git(name);
        assert_eq!(file_at(&git, MAIN_REF, "legacy/old.txt"), None);
        assert_eq!(file_at(&git, MAIN_REF, "README.md").as_deref(), Some("# Repo"));
        assert!(world.remote(name).lock().unwrap().env_vars.is_empty());
    }
}
