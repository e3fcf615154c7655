//! Setup pipeline scenarios: step ordering, agent-variant exclusivity,
//! abort-on-failure, start-only skipping.

#![allow(clippy::expect_used)]

use stevedore::config::AgentKind;
use stevedore::output::OutputContext;
use stevedore::{paths, setup, supervisor};

use crate::mocks::{ScriptedToolchain, test_config};

fn out() -> OutputContext {
    OutputContext::new(true, true)
}

#[tokio::test]
async fn test_steps_run_in_order_for_standard_agent() {
    let tc = ScriptedToolchain::new();
    // Empty additional-properties map makes the patch step a no-op, so the
    // recorded calls are exactly the three toolchain steps, in order.
    setup::run(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect("setup should succeed");
    assert_eq!(
        tc.calls(),
        vec!["setup_coordination", "setup_commands", "create_standard_agent"]
    );
}

#[tokio::test]
async fn test_bridge_agent_selects_bridge_creation_only() {
    let tc = ScriptedToolchain::new();
    setup::run(&tc, &test_config(AgentKind::Bridge), &out())
        .await
        .expect("setup should succeed");
    assert_eq!(tc.count("create_bridge_agent"), 1);
    assert_eq!(tc.count("create_standard_agent"), 0);
}

#[tokio::test]
async fn test_standard_agent_never_creates_bridge() {
    let tc = ScriptedToolchain::new();
    setup::run(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect("setup should succeed");
    assert_eq!(tc.count("create_standard_agent"), 1);
    assert_eq!(tc.count("create_bridge_agent"), 0);
}

#[tokio::test]
async fn test_failed_step_aborts_pipeline() {
    let tc = ScriptedToolchain::new().failing("setup_commands");
    let err = setup::run(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect_err("setup should fail");
    assert!(err.to_string().contains("fteSetupCommands"), "got: {err:#}");
    // No agent creation after the failing step, no rollback of step one.
    assert_eq!(tc.calls(), vec!["setup_coordination", "setup_commands"]);
}

#[tokio::test]
async fn test_failed_creation_reports_captured_output() {
    let tc = ScriptedToolchain::new().failing("create_standard_agent");
    let err = setup::run(&tc, &test_config(AgentKind::Standard), &out())
        .await
        .expect_err("setup should fail");
    assert!(err.to_string().contains("simulated failure"), "got: {err:#}");
}

#[tokio::test]
async fn test_additional_properties_appended_to_properties_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = test_config(AgentKind::Standard);
    cfg.data_path = dir.path().display().to_string();
    cfg.agent.additional_properties = [
        ("enableQueueInputOutput".to_string(), "true".to_string()),
        ("maxSourceTransfers".to_string(), "5".to_string()),
    ]
    .into();

    let props = paths::agent_properties(&cfg.data_path, "COORDQM", "SRC");
    std::fs::create_dir_all(props.parent().expect("parent")).expect("create config dirs");
    std::fs::write(&props, "agentQMgr=AGENTQM\n").expect("seed properties file");

    let tc = ScriptedToolchain::new();
    setup::run(&tc, &cfg, &out()).await.expect("setup should succeed");

    let content = std::fs::read_to_string(&props).expect("read properties");
    assert!(content.starts_with("agentQMgr=AGENTQM\n"), "existing content kept");
    assert!(content.contains("enableQueueInputOutput=true\n"));
    assert!(content.contains("maxSourceTransfers=5\n"));
}

// ── Start-only mode (scenario B) ─────────────────────────────────────────────

#[tokio::test]
async fn test_start_only_skips_setup_and_monitors() {
    let mut cfg = test_config(AgentKind::Standard);
    cfg.agent.resource_monitors =
        [("DIRMON".to_string(), "/mftdata/inbox".to_string())].into();
    let tc = ScriptedToolchain::with_statuses(&["Agent SRC  READY"]);

    supervisor::provision_and_start(&tc, &cfg, true, &out())
        .await
        .expect("start-only flow should succeed");

    assert_eq!(tc.calls(), vec!["start_agent", "agent_status"]);
}

#[tokio::test]
async fn test_full_flow_provisions_then_starts() {
    let mut cfg = test_config(AgentKind::Standard);
    cfg.agent.resource_monitors =
        [("DIRMON".to_string(), "/mftdata/inbox".to_string())].into();
    let tc = ScriptedToolchain::with_statuses(&["Agent SRC  ACTIVE"]);

    supervisor::provision_and_start(&tc, &cfg, false, &out())
        .await
        .expect("full flow should succeed");

    assert_eq!(
        tc.calls(),
        vec![
            "setup_coordination",
            "setup_commands",
            "create_standard_agent",
            "start_agent",
            "agent_status",
            "create_monitor",
        ]
    );
}
