// tests/real_processes.rs
#![cfg(unix)]

mod common;
use crate::common::builders::JobSpecBuilder;
use crate::common::{PROCESS_TIMEOUT, init_tracing, scheduler, state_of, with_timeout};

use std::fs;

use dagrun::dag::RunRecord;
use dagrun::exec::TokioLauncher;
use dagrun::types::{JobState, Outcome};

#[tokio::test]
async fn stdout_stderr_and_stat_land_in_log_dir() {
    with_timeout(PROCESS_TIMEOUT, async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut s = scheduler(
            vec![
                JobSpecBuilder::new("hello")
                    .shell("echo to-stdout; echo to-stderr >&2")
                    .build(),
            ],
            TokioLauncher::new(),
            dir.path(),
        );

        let records = s.run().await;
        assert_eq!(records.len(), 1);

        let out = fs::read_to_string(dir.path().join("hello.out")).unwrap();
        let err = fs::read_to_string(dir.path().join("hello.err")).unwrap();
        assert_eq!(out, "to-stdout\n");
        assert_eq!(err, "to-stderr\n");

        let record = RunRecord::read_from_path(dir.path().join("hello.stat")).unwrap();
        assert_eq!(record.job_id, "hello");
        assert_eq!(record.outcome, Outcome::Succeeded);
        assert_eq!(record.exit_code, Some(0));
        assert!(record.pid.is_some());
        assert!(record.start_time.unwrap() <= record.end_time);
    })
    .await
}

#[tokio::test]
async fn exit_status_decides_outcome() {
    with_timeout(PROCESS_TIMEOUT, async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut s = scheduler(
            vec![
                JobSpecBuilder::new("ok").command(&["true"]).build(),
                JobSpecBuilder::new("three").shell("exit 3").build(),
                JobSpecBuilder::new("signalled").shell("kill -9 $$").build(),
            ],
            TokioLauncher::new(),
            dir.path(),
        );

        s.run().await;

        let graph = s.graph();
        assert_eq!(graph.job("ok").unwrap().exit_code(), Some(0));
        assert_eq!(state_of(&s, "ok"), JobState::Succeeded);

        assert_eq!(state_of(&s, "three"), JobState::Failed);
        assert_eq!(graph.job("three").unwrap().exit_code(), Some(3));

        assert_eq!(state_of(&s, "signalled"), JobState::Failed);
        assert_eq!(graph.job("signalled").unwrap().exit_code(), None);
    })
    .await
}

#[tokio::test]
async fn failing_job_starves_dependents_on_disk() {
    with_timeout(PROCESS_TIMEOUT, async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("child-ran");
        let mut s = scheduler(
            vec![
                JobSpecBuilder::new("parent").shell("exit 1").build(),
                JobSpecBuilder::new("child")
                    .after("parent")
                    .command(&["touch", marker.to_str().unwrap()])
                    .build(),
            ],
            TokioLauncher::new(),
            dir.path(),
        );

        s.run().await;

        assert!(!marker.exists(), "starved job must never run");
        let record = RunRecord::read_from_path(dir.path().join("child.stat")).unwrap();
        assert_eq!(record.outcome, Outcome::Starved);
        assert_eq!(record.start_time, None);
        assert_eq!(record.exit_code, None);
    })
    .await
}

#[tokio::test]
async fn missing_binary_is_a_spawn_failure() {
    with_timeout(PROCESS_TIMEOUT, async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut s = scheduler(
            vec![
                JobSpecBuilder::new("missing")
                    .command(&["/definitely/not/a/real/binary"])
                    .build(),
                JobSpecBuilder::new("after").after("missing").build(),
            ],
            TokioLauncher::new(),
            dir.path(),
        );

        s.run().await;

        assert_eq!(state_of(&s, "missing"), JobState::Failed);
        assert_eq!(s.graph().job("missing").unwrap().exit_code(), None);
        assert_eq!(s.graph().job("missing").unwrap().pid(), None);
        assert_eq!(state_of(&s, "after"), JobState::Starved);
    })
    .await
}

#[tokio::test]
async fn env_overrides_and_homedir_are_applied() {
    with_timeout(PROCESS_TIMEOUT, async {
        init_tracing();
        let logs = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let mut s = scheduler(
            vec![
                JobSpecBuilder::new("env")
                    .shell("printf %s \"$DAGRUN_TEST_VALUE\"")
                    .env("DAGRUN_TEST_VALUE", "from-spec")
                    .build(),
                JobSpecBuilder::new("inherits")
                    .shell("printf %s \"$PATH\"")
                    .build(),
                JobSpecBuilder::new("pwd")
                    .command(&["pwd"])
                    .homedir(home.path())
                    .build(),
            ],
            TokioLauncher::new(),
            logs.path(),
        );

        s.run().await;

        let env_out = fs::read_to_string(logs.path().join("env.out")).unwrap();
        assert_eq!(env_out, "from-spec");

        let path_out = fs::read_to_string(logs.path().join("inherits.out")).unwrap();
        assert!(!path_out.is_empty(), "inherited environment should be kept");

        let pwd_out = fs::read_to_string(logs.path().join("pwd.out")).unwrap();
        assert_eq!(
            fs::canonicalize(pwd_out.trim()).unwrap(),
            fs::canonicalize(home.path()).unwrap()
        );
    })
    .await
}

#[tokio::test]
async fn independent_jobs_run_concurrently() {
    with_timeout(PROCESS_TIMEOUT, async {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut s = scheduler(
            vec![
                JobSpecBuilder::new("a").shell("sleep 0.3").build(),
                JobSpecBuilder::new("b").shell("sleep 0.3").build(),
            ],
            TokioLauncher::new(),
            dir.path(),
        );

        // First tick launches both without waiting on either.
        assert!(!s.tick());
        assert_eq!(state_of(&s, "a"), JobState::Running);
        assert_eq!(state_of(&s, "b"), JobState::Running);

        s.run().await;
        let graph = s.graph();
        let a = graph.job("a").unwrap();
        let b = graph.job("b").unwrap();
        assert!(a.started_at().unwrap() < b.ended_at().unwrap());
        assert!(b.started_at().unwrap() < a.ended_at().unwrap());
    })
    .await
}
