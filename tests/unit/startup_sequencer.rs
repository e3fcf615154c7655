//! Startup confirmation scenarios: the single grace-period retry and the
//! resource-monitor provisioning sweep.

#![allow(clippy::expect_used)]

use stevedore::config::AgentKind;
use stevedore::output::OutputContext;
use stevedore::startup;
use stevedore::status::AgentStatus;

use crate::mocks::{ScriptedToolchain, test_config};

fn out() -> OutputContext {
    OutputContext::new(true, true)
}

#[tokio::test]
async fn test_active_on_first_query_confirms_immediately() {
    let tc = ScriptedToolchain::with_statuses(&["Agent SRC  ACTIVE"]);
    let status = startup::start_and_confirm(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect("startup should confirm");
    assert_eq!(status, AgentStatus::Active);
    assert_eq!(tc.count("start_agent"), 1);
    assert_eq!(tc.count("agent_status"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_then_ready_retries_exactly_once() {
    let tc = ScriptedToolchain::with_statuses(&["Agent SRC  STOPPED", "Agent SRC  READY"]);
    let status = startup::start_and_confirm(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect("startup should confirm after grace period");
    assert_eq!(status, AgentStatus::Ready);
    assert_eq!(tc.count("agent_status"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_still_stopped_after_retry_fails_startup() {
    let tc = ScriptedToolchain::with_statuses(&["Agent SRC  STOPPED", "Agent SRC  STOPPED"]);
    let err = startup::start_and_confirm(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect_err("startup should fail");
    assert!(
        err.to_string().contains("did not reach READY or ACTIVE"),
        "got: {err:#}"
    );
    // Exactly one retry; no further re-checks at this stage.
    assert_eq!(tc.count("agent_status"), 2);
}

#[tokio::test]
async fn test_unknown_status_fails_without_retry() {
    // Only STOPPED earns the grace period; UNKNOWN right after a start is
    // already a failed startup.
    let tc = ScriptedToolchain::with_statuses(&["Agent SRC  UNKNOWN"]);
    startup::start_and_confirm(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect_err("startup should fail");
    assert_eq!(tc.count("agent_status"), 1);
}

#[tokio::test]
async fn test_failed_start_command_skips_status_query() {
    let tc = ScriptedToolchain::new().failing("start_agent");
    let err = startup::start_and_confirm(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect_err("startup should fail");
    assert!(err.to_string().contains("fteStartAgent"), "got: {err:#}");
    assert_eq!(tc.count("agent_status"), 0);
}

#[tokio::test]
async fn test_monitor_sweep_continues_past_failure() {
    let mut cfg = test_config(AgentKind::Standard);
    cfg.agent.resource_monitors = [
        ("DIRMON".to_string(), "/mftdata/inbox".to_string()),
        ("QMON".to_string(), "/mftdata/queue".to_string()),
    ]
    .into();
    let tc = ScriptedToolchain::new().failing("create_monitor");
    startup::provision_monitors(&tc, &cfg, &out()).await;
    // Both monitors attempted despite every creation failing.
    assert_eq!(tc.count("create_monitor"), 2);
}
