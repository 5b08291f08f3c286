#![allow(clippy::arithmetic_side_effects)]
//! End-to-end approval flows through a governed tool.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{GatedWorkbench, write_args};
use serde_json::json;
use toolwarden_approval::{ApprovalGateway, FnDecision};
use toolwarden_core::{ApprovalDecision, RiskTier};
use toolwarden_test::{Workbench, test_dir};
use toolwarden_tools::{Governed, OperationRegistry, RejectionKind};

#[test]
fn test_approved_call_returns_real_result() {
    let mut bench = GatedWorkbench::new();
    let tool = Arc::clone(&bench.tool);

    let caller = thread::spawn(move || tool.invoke("write_file", write_args("notes.txt", "hello")));

    let prompt = bench.prompts.recv_blocking().expect("prompt presented");
    assert_eq!(prompt.operation, "write_file");
    assert_eq!(prompt.tier, RiskTier::Sensitive);
    assert_eq!(prompt.tool, "workbench");
    assert!(prompt.description.contains("notes.txt"));
    assert_eq!(bench.gateway.pending_ids(), vec![prompt.invocation_id]);
    assert!(prompt.approve());

    let result = caller.join().unwrap().unwrap();
    assert_eq!(result, json!(5));
    assert_eq!(bench.calls.count("write_file"), 1);
    assert_eq!(
        std::fs::read_to_string(bench.dir.path().join("notes.txt")).unwrap(),
        "hello"
    );
    assert_eq!(bench.gateway.pending_count(), 0);
}

#[test]
fn test_denied_call_never_runs() {
    let mut bench = GatedWorkbench::new();
    let tool = Arc::clone(&bench.tool);

    let caller = thread::spawn(move || tool.invoke("write_file", write_args("notes.txt", "hello")));

    let prompt = bench.prompts.recv_blocking().expect("prompt presented");
    assert!(prompt.deny("no"));

    let err = caller.join().unwrap().unwrap_err();
    let rejection = err.rejection().expect("rejection");
    assert_eq!(rejection.reason, "no");
    assert_eq!(rejection.kind, RejectionKind::Denied);
    assert_eq!(rejection.operation, "write_file");
    assert_eq!(rejection.arguments, write_args("notes.txt", "hello"));
    assert_eq!(bench.calls.total(), 0);
    assert!(!bench.dir.path().join("notes.txt").exists());
}

#[test]
fn test_cancel_releases_caller_promptly() {
    let mut bench = GatedWorkbench::with_timeout(None);
    let tool = Arc::clone(&bench.tool);

    let caller = thread::spawn(move || tool.invoke("write_file", write_args("a.txt", "x")));

    let prompt = bench.prompts.recv_blocking().expect("prompt presented");
    let started = Instant::now();
    assert!(bench.gateway.cancel(&prompt.invocation_id, "user interrupted"));

    let err = caller.join().unwrap().unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(1));
    let rejection = err.rejection().expect("rejection");
    assert_eq!(rejection.kind, RejectionKind::Cancelled);
    assert_eq!(rejection.reason, "user interrupted");
    assert_eq!(bench.calls.count("write_file"), 0);

    // The dialog answering afterwards changes nothing.
    assert!(!prompt.approve());
    assert_eq!(bench.calls.count("write_file"), 0);
}

#[test]
fn test_unanswered_prompt_times_out() {
    let bench = GatedWorkbench::with_timeout(Some(Duration::from_millis(100)));

    let err = bench
        .tool
        .invoke("write_file", write_args("a.txt", "x"))
        .unwrap_err();

    let rejection = err.rejection().expect("rejection");
    assert_eq!(rejection.kind, RejectionKind::TimedOut);
    assert_eq!(bench.calls.total(), 0);
    assert_eq!(bench.gateway.pending_count(), 0);
}

#[test]
fn test_timed_out_prompt_is_not_delivered() {
    let mut bench = GatedWorkbench::with_timeout(Some(Duration::from_millis(50)));

    let err = bench
        .tool
        .invoke("write_file", write_args("a.txt", "x"))
        .unwrap_err();
    assert_eq!(err.rejection().unwrap().kind, RejectionKind::TimedOut);

    // A UI attaching late sees nothing to answer.
    assert!(bench.prompts.try_recv().is_none());
    assert_eq!(bench.calls.total(), 0);
}

#[test]
fn test_closed_prompt_queue_denies() {
    let bench = GatedWorkbench::new();
    let GatedWorkbench {
        tool,
        prompts,
        calls,
        dir: _dir,
        ..
    } = bench;
    drop(prompts);

    let err = tool
        .invoke("write_file", write_args("a.txt", "x"))
        .unwrap_err();

    assert_eq!(err.rejection().unwrap().kind, RejectionKind::ChannelFailure);
    assert_eq!(calls.total(), 0);
}

fn crash(_description: &str) -> bool {
    panic!("dialog crashed");
}

#[test]
fn test_panicking_decision_function_denies() {
    let dir = test_dir();
    let workbench = Workbench::new(dir.path()).unwrap();
    let calls = workbench.calls();
    let gateway = ApprovalGateway::new().with_channel(Arc::new(FnDecision::new(crash)));
    let tool = Governed::new(workbench, &OperationRegistry::new(), Arc::new(gateway)).unwrap();

    let err = tool
        .invoke("write_file", write_args("a.txt", "x"))
        .unwrap_err();

    assert_eq!(err.rejection().unwrap().kind, RejectionKind::ChannelFailure);
    assert_eq!(calls.total(), 0);
}

fn slow_approve(_description: &str) -> bool {
    thread::sleep(Duration::from_millis(400));
    true
}

#[test]
fn test_slow_decision_function_times_out() {
    let dir = test_dir();
    let workbench = Workbench::new(dir.path()).unwrap();
    let calls = workbench.calls();
    let gateway = ApprovalGateway::new()
        .with_channel(Arc::new(FnDecision::new(slow_approve)))
        .with_timeout(Some(Duration::from_millis(50)));
    let tool = Governed::new(workbench, &OperationRegistry::new(), Arc::new(gateway)).unwrap();

    let started = Instant::now();
    let err = tool
        .invoke("write_file", write_args("a.txt", "x"))
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(err.rejection().unwrap().kind, RejectionKind::TimedOut);

    // The late approval lands on a settled invocation.
    thread::sleep(Duration::from_millis(500));
    assert_eq!(calls.total(), 0);
}

#[test]
fn test_decision_function_sees_description() {
    let dir = test_dir();
    let workbench = Workbench::new(dir.path()).unwrap();
    let calls = workbench.calls();
    let gateway = ApprovalGateway::new()
        .with_channel(Arc::new(FnDecision::new(|text: &str| text.contains("safe.txt"))));
    let tool = Governed::new(workbench, &OperationRegistry::new(), Arc::new(gateway)).unwrap();

    assert!(tool.invoke("write_file", write_args("safe.txt", "ok")).is_ok());
    let err = tool
        .invoke("write_file", write_args("other.txt", "no"))
        .unwrap_err();

    assert_eq!(err.rejection().unwrap().reason, "declined by user");
    assert_eq!(calls.count("write_file"), 1);
    assert!(dir.path().join("safe.txt").exists());
    assert!(!dir.path().join("other.txt").exists());
}

#[test]
fn test_no_channel_denies() {
    let dir = test_dir();
    let workbench = Workbench::new(dir.path()).unwrap();
    let calls = workbench.calls();
    let tool = Governed::new(
        workbench,
        &OperationRegistry::new(),
        Arc::new(ApprovalGateway::new()),
    )
    .unwrap();

    let err = tool.invoke("run_build", vec![]).unwrap_err();

    assert_eq!(err.rejection().unwrap().kind, RejectionKind::ChannelFailure);
    assert_eq!(calls.total(), 0);
}

#[test]
fn test_concurrent_invocations_are_independent() {
    let mut bench = GatedWorkbench::new();

    let callers: Vec<_> = (0..4)
        .map(|i| {
            let tool = Arc::clone(&bench.tool);
            thread::spawn(move || tool.invoke("write_file", write_args(&format!("f{i}.txt"), "x")))
        })
        .collect();

    let prompts: Vec<_> = (0..4)
        .map(|_| bench.prompts.recv_blocking().expect("prompt presented"))
        .collect();
    assert_eq!(bench.gateway.pending_count(), 4);

    // Answer out of arrival order; only the first prompt is denied.
    for prompt in prompts.iter().skip(1).rev() {
        assert!(prompt.approve());
    }
    assert!(prompts[0].deny("not this one"));

    let outcomes: Vec<_> = callers.into_iter().map(|c| c.join().unwrap()).collect();
    let rejected: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].rejection().unwrap().reason, "not this one");
    assert_eq!(bench.calls.count("write_file"), 3);
    assert_eq!(bench.gateway.pending_count(), 0);
}

#[test]
fn test_invocation_resolves_exactly_once() {
    let mut bench = GatedWorkbench::new();
    let tool = Arc::clone(&bench.tool);

    let caller = thread::spawn(move || tool.invoke("run_build", vec![]));

    let prompt = bench.prompts.recv_blocking().expect("prompt presented");
    let id = prompt.invocation_id;
    assert!(prompt.approve());
    assert!(!prompt.deny("changed my mind"));
    assert!(!bench.gateway.resolve(&id, ApprovalDecision::deny(id, "too late")));
    assert!(!bench.gateway.cancel(&id, "too late"));

    assert_eq!(caller.join().unwrap().unwrap(), json!("ok"));
    assert_eq!(bench.calls.count("run_build"), 1);
}

#[test]
fn test_cancel_all_releases_every_caller() {
    let mut bench = GatedWorkbench::with_timeout(None);

    let callers: Vec<_> = (0..3)
        .map(|_| {
            let tool = Arc::clone(&bench.tool);
            thread::spawn(move || tool.invoke("run_build", vec![]))
        })
        .collect();
    for _ in 0..3 {
        bench.prompts.recv_blocking().expect("prompt presented");
    }

    assert_eq!(bench.gateway.cancel_all("shutting down"), 3);

    for caller in callers {
        let err = caller.join().unwrap().unwrap_err();
        assert_eq!(err.rejection().unwrap().kind, RejectionKind::Cancelled);
    }
    assert_eq!(bench.calls.total(), 0);
}
